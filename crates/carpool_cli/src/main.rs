//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `carpool_core` linkage and storage bootstrap from a shell.
//! - Print the next carpool and its per-slot summary.
//!
//! Usage: `carpool_cli [config.json]`

use carpool_core::db::open_db;
use carpool_core::{
    init_logging, slot_summary, CarpoolService, CarpoolTarget, CoreConfig,
    SqliteCarpoolRepository,
};
use log::error;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("carpool_core ping={}", carpool_core::ping());
    println!("carpool_core version={}", carpool_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let conn = open_db(&config.db_path)?;
    let repo = SqliteCarpoolRepository::try_new(&conn)?;
    let service = CarpoolService::new(&repo);

    let target = CarpoolTarget::now(&config.schedule);
    let stored = service.get_or_create(target.date)?;
    println!(
        "next carpool date={} shift={} id={}",
        stored.document.date_key(),
        target.shift,
        stored.id
    );

    for slot in target.shift.slots() {
        let summary = slot_summary(&stored.document, target.shift, *slot);
        println!(
            "slot={slot} cars={} available={} seats={}/{} unassigned={}",
            summary.total_cars,
            summary.available_cars,
            summary.occupied_seats,
            summary.total_seats,
            summary.unassigned_count
        );
    }

    Ok(())
}
