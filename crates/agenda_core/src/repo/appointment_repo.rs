//! Appointment repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist appointment instances, including whole recurrence series in
//!   one transaction.
//! - Keep list ordering (`date, start_time, id`) inside the storage boundary.
//!
//! # Invariants
//! - `recurrence_kind` and `recurrence_group` are both set or both null.
//! - Batch writes either apply every row or none.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::model::appointment::{Appointment, AppointmentId, RecurrenceKind, RecurrenceTag};
use crate::repo::{ensure_table_exists, next_id, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const APPOINTMENT_SELECT_SQL: &str = "SELECT
    id,
    title,
    date,
    start_time,
    end_time,
    description,
    participants,
    recurrence_kind,
    recurrence_group,
    created_at
FROM appointments";

const SCHEDULE_ORDER_SQL: &str = " ORDER BY date ASC, start_time ASC, id ASC";

/// Repository interface for appointment storage.
pub trait AppointmentRepository {
    fn next_appointment_id(&self) -> RepoResult<AppointmentId>;
    /// Inserts all appointments atomically.
    fn insert_appointments(&self, appointments: &[Appointment]) -> RepoResult<()>;
    /// Rewrites all appointments atomically. Fails with `NotFound` if any id
    /// is missing.
    fn update_appointments(&self, appointments: &[Appointment]) -> RepoResult<()>;
    fn get_appointment(&self, id: AppointmentId) -> RepoResult<Option<Appointment>>;
    /// Lists every appointment in schedule order.
    fn list_appointments(&self) -> RepoResult<Vec<Appointment>>;
    /// Lists the instances of one series in schedule order.
    fn list_series(&self, group_id: &str) -> RepoResult<Vec<Appointment>>;
    fn series_exists(&self, group_id: &str) -> RepoResult<bool>;
    /// Deletes all ids atomically. Fails with `NotFound` if any id is missing.
    fn delete_appointments(&self, ids: &[AppointmentId]) -> RepoResult<()>;
}

/// SQLite-backed appointment repository.
pub struct SqliteAppointmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAppointmentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_exists(conn, "appointments")?;
        Ok(Self { conn })
    }

    fn query_appointments(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut appointments = Vec::new();
        while let Some(row) = rows.next()? {
            appointments.push(parse_appointment_row(row)?);
        }
        Ok(appointments)
    }
}

impl AppointmentRepository for SqliteAppointmentRepository<'_> {
    fn next_appointment_id(&self) -> RepoResult<AppointmentId> {
        next_id(self.conn, "appointments")
    }

    fn insert_appointments(&self, appointments: &[Appointment]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for appointment in appointments {
            let participants = encode_participants(&appointment.participants)?;
            tx.execute(
                "INSERT INTO appointments (
                    id,
                    title,
                    date,
                    start_time,
                    end_time,
                    description,
                    participants,
                    recurrence_kind,
                    recurrence_group,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    appointment.id,
                    appointment.title.as_str(),
                    appointment.date,
                    appointment.start_time,
                    appointment.end_time,
                    appointment.description.as_deref(),
                    participants,
                    appointment.recurrence.as_ref().map(|tag| tag.kind.label()),
                    appointment.group_id(),
                    appointment.created_at,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn update_appointments(&self, appointments: &[Appointment]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for appointment in appointments {
            let participants = encode_participants(&appointment.participants)?;
            let changed = tx.execute(
                "UPDATE appointments
                 SET
                    title = ?2,
                    date = ?3,
                    start_time = ?4,
                    end_time = ?5,
                    description = ?6,
                    participants = ?7,
                    recurrence_kind = ?8,
                    recurrence_group = ?9
                 WHERE id = ?1;",
                params![
                    appointment.id,
                    appointment.title.as_str(),
                    appointment.date,
                    appointment.start_time,
                    appointment.end_time,
                    appointment.description.as_deref(),
                    participants,
                    appointment.recurrence.as_ref().map(|tag| tag.kind.label()),
                    appointment.group_id(),
                ],
            )?;
            if changed == 0 {
                // Dropping `tx` rolls back rows already rewritten.
                return Err(RepoError::NotFound {
                    table: "appointments",
                    id: appointment.id,
                });
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_appointment(&self, id: AppointmentId) -> RepoResult<Option<Appointment>> {
        let mut found =
            self.query_appointments(&format!("{APPOINTMENT_SELECT_SQL} WHERE id = ?1;"), [id])?;
        Ok(found.pop())
    }

    fn list_appointments(&self) -> RepoResult<Vec<Appointment>> {
        self.query_appointments(&format!("{APPOINTMENT_SELECT_SQL}{SCHEDULE_ORDER_SQL};"), [])
    }

    fn list_series(&self, group_id: &str) -> RepoResult<Vec<Appointment>> {
        self.query_appointments(
            &format!("{APPOINTMENT_SELECT_SQL} WHERE recurrence_group = ?1{SCHEDULE_ORDER_SQL};"),
            [group_id],
        )
    }

    fn series_exists(&self, group_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM appointments
                WHERE recurrence_group = ?1
            );",
            [group_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete_appointments(&self, ids: &[AppointmentId]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for &id in ids {
            let changed = tx.execute("DELETE FROM appointments WHERE id = ?1;", [id])?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    table: "appointments",
                    id,
                });
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_appointment_row(row: &Row<'_>) -> RepoResult<Appointment> {
    let id: AppointmentId = row.get("id")?;

    let participants_text: String = row.get("participants")?;
    let participants = serde_json::from_str::<Vec<String>>(&participants_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid participants in appointments.participants for id {id}: {err}"
        ))
    })?;

    let kind: Option<String> = row.get("recurrence_kind")?;
    let group: Option<String> = row.get("recurrence_group")?;
    let recurrence = match (kind, group) {
        (None, None) => None,
        (Some(kind_text), Some(group_id)) => {
            let kind = RecurrenceKind::from_label(&kind_text).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid recurrence kind `{kind_text}` in appointments.recurrence_kind"
                ))
            })?;
            Some(RecurrenceTag { kind, group_id })
        }
        _ => {
            return Err(RepoError::InvalidData(format!(
                "appointment {id} has a partial recurrence tag"
            )));
        }
    };

    Ok(Appointment {
        id,
        title: row.get("title")?,
        date: row.get("date")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        description: row.get("description")?,
        participants,
        created_at: row.get("created_at")?,
        recurrence,
    })
}

fn encode_participants(participants: &[String]) -> RepoResult<String> {
    serde_json::to_string(participants)
        .map_err(|err| RepoError::InvalidData(format!("participants not serializable: {err}")))
}
