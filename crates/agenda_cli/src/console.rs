//! Interactive console menu over the agenda services.
//!
//! # Responsibility
//! - Collect fields line by line and hand them to the core services.
//! - Ask for the series scope before editing or deleting a repeating
//!   appointment.
//!
//! # Invariants
//! - End of input leaves the menu loop without error.
//! - Service errors are shown to the user and never end the session.
//! - Edit prompts keep the stored value on blank input; `-` clears an
//!   optional field.

use agenda_core::{
    format_date, format_time, Appointment, AppointmentPatch, AppointmentService, Clock, Contact,
    ContactPatch, ContactService, ContactServiceError, Listing, NewAppointment, NewContact, Period,
    RecurrenceKind, RecurrenceRequest, RepoResult, ScheduleError, SeriesScope,
    SqliteAppointmentRepository, SqliteContactRepository,
};
use log::{error, info};
use rusqlite::Connection;
use std::io::{self, BufRead, ErrorKind, Write};

const CLEAR_MARKER: &str = "-";
const ENTRY_ACTIONS: [&str; 5] = ["Add", "List", "Search", "Edit", "Delete"];

/// Line-oriented agenda console.
pub struct Console<'conn, In, Out, C: Clock + Clone> {
    input: In,
    output: Out,
    contacts: ContactService<SqliteContactRepository<'conn>, C>,
    appointments: AppointmentService<SqliteAppointmentRepository<'conn>, C>,
}

impl<'conn, In: BufRead, Out: Write, C: Clock + Clone> Console<'conn, In, Out, C> {
    /// Builds a console over a migrated connection.
    pub fn new(conn: &'conn Connection, clock: C, input: In, output: Out) -> RepoResult<Self> {
        Ok(Self {
            input,
            output,
            contacts: ContactService::with_clock(
                SqliteContactRepository::try_new(conn)?,
                clock.clone(),
            ),
            appointments: AppointmentService::with_clock(
                SqliteAppointmentRepository::try_new(conn)?,
                clock,
            ),
        })
    }

    pub fn into_output(self) -> Out {
        self.output
    }

    /// Runs the main menu until the user exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        info!("event=console_session module=cli status=start");
        let result = match self.main_menu() {
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => writeln!(self.output),
            other => other,
        };
        info!(
            "event=console_session module=cli status={}",
            if result.is_ok() { "ok" } else { "error" }
        );
        result
    }

    fn main_menu(&mut self) -> io::Result<()> {
        loop {
            self.print_menu("Agenda", &["Contacts", "Appointments"], "Exit")?;
            match self.prompt("Choose: ")?.as_str() {
                "1" => self.contacts_menu()?,
                "2" => self.appointments_menu()?,
                "0" => return self.say("Bye."),
                _ => self.say("Invalid option.")?,
            }
        }
    }

    fn contacts_menu(&mut self) -> io::Result<()> {
        loop {
            self.print_menu("Contacts", &ENTRY_ACTIONS, "Back")?;
            match self.prompt("Choose: ")?.as_str() {
                "1" => self.add_contact()?,
                "2" => self.list_contacts()?,
                "3" => self.search_contacts()?,
                "4" => self.edit_contact()?,
                "5" => self.delete_contact()?,
                "0" => return Ok(()),
                _ => self.say("Invalid option.")?,
            }
        }
    }

    fn appointments_menu(&mut self) -> io::Result<()> {
        loop {
            self.print_menu("Appointments", &ENTRY_ACTIONS, "Back")?;
            match self.prompt("Choose: ")?.as_str() {
                "1" => self.add_appointment()?,
                "2" => self.list_appointments()?,
                "3" => self.search_appointments()?,
                "4" => self.edit_appointment()?,
                "5" => self.delete_appointment()?,
                "0" => return Ok(()),
                _ => self.say("Invalid option.")?,
            }
        }
    }

    fn add_contact(&mut self) -> io::Result<()> {
        let name = self.prompt("Name: ")?;
        if name.is_empty() {
            return self.say("Name is required.");
        }
        let phone = self.prompt("Phone: ")?;
        if phone.is_empty() {
            return self.say("Phone is required.");
        }
        let input = NewContact {
            name,
            phone,
            email: self.prompt_optional("Email (optional): ")?,
            address: self.prompt_optional("Address (optional): ")?,
        };

        match self.contacts.add(&input) {
            Ok(contact) => writeln!(self.output, "Contact {} added.", contact.id),
            Err(err) => self.report_contact_error("contact_add", err),
        }
    }

    fn list_contacts(&mut self) -> io::Result<()> {
        match self.contacts.list() {
            Ok(listing) => self.print_contacts(listing),
            Err(err) => self.report_contact_error("contact_list", err),
        }
    }

    fn search_contacts(&mut self) -> io::Result<()> {
        let term = self.prompt("Search name or phone: ")?;
        match self.contacts.search(&term) {
            Ok(listing) => self.print_contacts(listing),
            Err(err) => self.report_contact_error("contact_search", err),
        }
    }

    fn edit_contact(&mut self) -> io::Result<()> {
        let Some(id) = self.prompt_id("Contact id: ")? else {
            return Ok(());
        };
        let current = match self.contacts.get(id) {
            Ok(contact) => contact,
            Err(err) => return self.report_contact_error("contact_edit", err),
        };

        self.say("Blank keeps the current value, - clears optional fields.")?;
        let patch = ContactPatch {
            name: self.prompt_edit("Name", &current.name)?,
            phone: self.prompt_edit("Phone", &current.phone)?,
            email: self.prompt_edit_optional("Email", current.email.as_deref())?,
            address: self.prompt_edit_optional("Address", current.address.as_deref())?,
        };
        if patch.is_empty() {
            return self.say("Nothing to change.");
        }

        match self.contacts.edit(id, &patch) {
            Ok(contact) => writeln!(self.output, "Updated {}", describe_contact(&contact)),
            Err(err) => self.report_contact_error("contact_edit", err),
        }
    }

    fn delete_contact(&mut self) -> io::Result<()> {
        let Some(id) = self.prompt_id("Contact id: ")? else {
            return Ok(());
        };
        let current = match self.contacts.get(id) {
            Ok(contact) => contact,
            Err(err) => return self.report_contact_error("contact_delete", err),
        };
        if !self.confirm(&format!("Delete contact {}?", current.name))? {
            return self.say("Kept.");
        }

        match self.contacts.delete(id) {
            Ok(contact) => writeln!(self.output, "Contact {} removed.", contact.id),
            Err(err) => self.report_contact_error("contact_delete", err),
        }
    }

    fn add_appointment(&mut self) -> io::Result<()> {
        let title = self.prompt("Title: ")?;
        if title.is_empty() {
            return self.say("Title is required.");
        }
        let date = self.prompt("Date (DD/MM/YYYY): ")?;
        let start_time = self.prompt("Start (HH:MM): ")?;
        let end_time = self.prompt_optional("End (HH:MM, optional): ")?;
        let description = self.prompt_optional("Description (optional): ")?;
        let participants = split_list(&self.prompt("Participants (comma separated): ")?);
        let recurrence = self.prompt_recurrence()?;

        let request = NewAppointment {
            title,
            date,
            start_time,
            end_time,
            description,
            participants,
            recurrence,
        };
        match self.appointments.create(&request) {
            Ok(created) => {
                writeln!(self.output, "Created {} appointment(s).", created.len())?;
                self.print_appointment_lines(&created)
            }
            Err(err) => self.report_schedule_error("appointment_create", err),
        }
    }

    fn list_appointments(&mut self) -> io::Result<()> {
        let answer = self.prompt("Period [all/today/week/month]: ")?;
        let Some(period) = Period::from_label(&answer) else {
            return self.say("Unknown period.");
        };
        match self.appointments.list(period) {
            Ok(listing) => self.print_appointments(listing),
            Err(err) => self.report_schedule_error("appointment_list", err),
        }
    }

    fn search_appointments(&mut self) -> io::Result<()> {
        let term = self.prompt("Search title or description: ")?;
        match self.appointments.search(&term) {
            Ok(listing) => self.print_appointments(listing),
            Err(err) => self.report_schedule_error("appointment_search", err),
        }
    }

    fn edit_appointment(&mut self) -> io::Result<()> {
        let Some(id) = self.prompt_id("Appointment id: ")? else {
            return Ok(());
        };
        let current = match self.appointments.get(id) {
            Ok(appointment) => appointment,
            Err(err) => return self.report_schedule_error("appointment_edit", err),
        };
        let scope = self.prompt_scope(&current)?;

        self.say("Blank keeps the current value, - clears optional fields.")?;
        let title = self.prompt_edit("Title", &current.title)?;
        // Series edits keep every instance on its own date.
        let date = match scope {
            SeriesScope::Single => self.prompt_edit("Date", &format_date(current.date))?,
            SeriesScope::Series => None,
        };
        let start_time = self.prompt_edit("Start", &format_time(current.start_time))?;
        let end_time = self.prompt_edit_optional(
            "End",
            current.end_time.map(format_time).as_deref(),
        )?;
        let description =
            self.prompt_edit_optional("Description", current.description.as_deref())?;
        let joined = current.participants.join(", ");
        let participants = self
            .prompt_edit_optional("Participants", Some(joined.as_str()).filter(|s| !s.is_empty()))?
            .map(|value| value.map(|names| split_list(&names)).unwrap_or_default());

        let patch = AppointmentPatch {
            title,
            date,
            start_time,
            end_time,
            description,
            participants,
        };
        match self.appointments.edit(id, &patch, scope) {
            Ok(updated) => {
                writeln!(self.output, "Updated {} appointment(s).", updated.len())?;
                self.print_appointment_lines(&updated)
            }
            Err(err) => self.report_schedule_error("appointment_edit", err),
        }
    }

    fn delete_appointment(&mut self) -> io::Result<()> {
        let Some(id) = self.prompt_id("Appointment id: ")? else {
            return Ok(());
        };
        let current = match self.appointments.get(id) {
            Ok(appointment) => appointment,
            Err(err) => return self.report_schedule_error("appointment_delete", err),
        };
        let scope = self.prompt_scope(&current)?;
        if !self.confirm(&format!("Delete {}?", describe_appointment(&current)))? {
            return self.say("Kept.");
        }

        match self.appointments.delete(id, scope) {
            Ok(removed) => writeln!(self.output, "Removed {} appointment(s).", removed.len()),
            Err(err) => self.report_schedule_error("appointment_delete", err),
        }
    }

    /// Asks for the recurrence of a new appointment. Blank means none.
    fn prompt_recurrence(&mut self) -> io::Result<Option<RecurrenceRequest>> {
        let kind = loop {
            let answer = self.prompt("Repeat [none/daily/weekly/weekdays/monthly]: ")?;
            if answer.is_empty() || answer.eq_ignore_ascii_case("none") {
                return Ok(None);
            }
            match RecurrenceKind::from_label(&answer) {
                Some(kind) => break kind,
                None => self.say("Unknown repeat option.")?,
            }
        };
        let until = self.prompt("Repeat until (DD/MM/YYYY): ")?;
        let weekdays = if kind == RecurrenceKind::Weekdays {
            loop {
                let answer = self.prompt("Weekdays (0=Mon .. 6=Sun, comma separated): ")?;
                match parse_weekdays(&answer) {
                    Some(days) => break days,
                    None => self.say("Weekdays must be numbers separated by commas.")?,
                }
            }
        } else {
            Vec::new()
        };

        Ok(Some(RecurrenceRequest {
            kind,
            until,
            weekdays,
        }))
    }

    fn prompt_scope(&mut self, appointment: &Appointment) -> io::Result<SeriesScope> {
        if !appointment.is_recurring() {
            return Ok(SeriesScope::Single);
        }
        if self.confirm("This appointment repeats. Apply to the whole series?")? {
            Ok(SeriesScope::Series)
        } else {
            Ok(SeriesScope::Single)
        }
    }

    fn print_menu(&mut self, title: &str, entries: &[&str], leave: &str) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "== {title} ==")?;
        for (index, entry) in entries.iter().enumerate() {
            writeln!(self.output, "{}) {entry}", index + 1)?;
        }
        writeln!(self.output, "0) {leave}")
    }

    fn print_contacts(&mut self, listing: Listing<Contact>) -> io::Result<()> {
        match listing {
            Listing::NoRecords => self.say("No contacts registered."),
            Listing::NoMatches => self.say("No contacts found."),
            found => {
                for contact in found.into_items() {
                    writeln!(self.output, "{}", describe_contact(&contact))?;
                }
                Ok(())
            }
        }
    }

    fn print_appointments(&mut self, listing: Listing<Appointment>) -> io::Result<()> {
        match listing {
            Listing::NoRecords => self.say("No appointments registered."),
            Listing::NoMatches => self.say("No appointments found."),
            found => self.print_appointment_lines(found.items()),
        }
    }

    fn print_appointment_lines(&mut self, appointments: &[Appointment]) -> io::Result<()> {
        for appointment in appointments {
            writeln!(self.output, "{}", describe_appointment(appointment))?;
        }
        Ok(())
    }

    fn report_contact_error(
        &mut self,
        event: &'static str,
        err: ContactServiceError,
    ) -> io::Result<()> {
        if let ContactServiceError::Repo(source) = &err {
            error!("event={event} module=cli status=error error={source}");
        }
        writeln!(self.output, "Error: {err}")
    }

    fn report_schedule_error(&mut self, event: &'static str, err: ScheduleError) -> io::Result<()> {
        if let ScheduleError::Repo(source) = &err {
            error!("event={event} module=cli status=error error={source}");
        }
        writeln!(self.output, "Error: {err}")
    }

    fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }

    /// Reads one trimmed line. End of input surfaces as `UnexpectedEof`.
    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    fn prompt_optional(&mut self, label: &str) -> io::Result<Option<String>> {
        let value = self.prompt(label)?;
        Ok((!value.is_empty()).then_some(value))
    }

    fn prompt_id(&mut self, label: &str) -> io::Result<Option<i64>> {
        let value = self.prompt(label)?;
        match value.parse::<i64>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                self.say("Invalid id.")?;
                Ok(None)
            }
        }
    }

    /// Edit prompt for a required field. `None` keeps the stored value.
    fn prompt_edit(&mut self, label: &str, current: &str) -> io::Result<Option<String>> {
        self.prompt_optional(&format!("{label} [{current}]: "))
    }

    /// Edit prompt for an optional field. `Some(None)` clears it.
    fn prompt_edit_optional(
        &mut self,
        label: &str,
        current: Option<&str>,
    ) -> io::Result<Option<Option<String>>> {
        let value = self.prompt(&format!("{label} [{}]: ", current.unwrap_or("")))?;
        Ok(match value.as_str() {
            "" => None,
            CLEAR_MARKER => Some(None),
            _ => Some(Some(value)),
        })
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.prompt(&format!("{question} (y/N): "))?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

fn describe_contact(contact: &Contact) -> String {
    format!(
        "[{}] {} | {} | {} | {}",
        contact.id,
        contact.name,
        contact.phone,
        contact.email.as_deref().unwrap_or(CLEAR_MARKER),
        contact.address.as_deref().unwrap_or(CLEAR_MARKER)
    )
}

fn describe_appointment(appointment: &Appointment) -> String {
    let mut line = format!(
        "[{}] {} {}",
        appointment.id,
        format_date(appointment.date),
        format_time(appointment.start_time)
    );
    if let Some(end_time) = appointment.end_time {
        line.push_str(&format!("-{}", format_time(end_time)));
    }
    line.push_str(&format!(" {}", appointment.title));
    if let Some(tag) = &appointment.recurrence {
        line.push_str(&format!(" ({})", tag.kind));
    }
    if let Some(description) = &appointment.description {
        line.push_str(&format!(" | {description}"));
    }
    if !appointment.participants.is_empty() {
        line.push_str(&format!(" | with {}", appointment.participants.join(", ")));
    }
    line
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_weekdays(value: &str) -> Option<Vec<u8>> {
    split_list(value)
        .iter()
        .map(|day| day.parse::<u8>().ok())
        .collect()
}
