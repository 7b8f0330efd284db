//! Core roster generation pipeline: entity model, snapshot loader,
//! constraint model builder and solver driver.
//!
//! This crate has no knowledge of HTTP, sessions, or background jobs — it
//! takes a store and a start date and either commits a horizon's worth of
//! assignments or returns a classified [`error::GenerationError`]. The
//! asynchronous job layer around it lives in `roster-service`.

pub mod entities;
pub mod error;
pub mod model;
pub mod reader;
pub mod snapshot;
pub mod solver;
pub mod store;
pub mod writer;

use std::time::Duration;

use chrono::NaiveDate;

pub use error::{GenerationError, Result};
pub use store::EntityStore;

/// Runs the full C2→C5 pipeline over `store` for the horizon starting at
/// `start_date`, committing assignments on success.
pub fn generate(store: &dyn EntityStore, start_date: NaiveDate, time_budget: Duration) -> Result<()> {
    let snapshot = snapshot::load(store, start_date)?;
    let built = model::build(&snapshot)?;
    let solved = solver::solve(built, time_budget)?;
    writer::commit(store, &solved);
    Ok(())
}
