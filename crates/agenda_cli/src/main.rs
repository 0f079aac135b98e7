//! Console entry point.
//!
//! # Responsibility
//! - Resolve configuration from the environment, start file logging and open
//!   the agenda database.
//! - Hand stdin/stdout to the interactive console.

mod console;

use agenda_core::db::open_db;
use agenda_core::{init_logging, AgendaConfig, SystemClock};
use console::Console;
use log::{error, info};
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match AgendaConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    // The console stays usable without file logging.
    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        agenda_core::core_version()
    );

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            error!("event=cli_start module=cli status=error error={err}");
            eprintln!("cannot open {}: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let result = Console::new(&conn, SystemClock, stdin.lock(), stdout.lock())
        .map_err(|err| err.to_string())
        .and_then(|mut console| console.run().map_err(|err| err.to_string()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=app_exit module=cli status=error error={message}");
            eprintln!("agenda: {message}");
            ExitCode::FAILURE
        }
    }
}
