//! Roster writer (C5).
//!
//! Takes a solved model and commits the current horizon's assignments in a
//! single bulk write. Previous-period links are never touched here — the
//! solver only ever creates decision variables for the current range, so
//! there is nothing else to commit.

use crate::solver::SolvedModel;
use crate::store::EntityStore;

/// Persists every 1-valued assignment as a single bulk operation.
///
/// Links are deduplicated by `(timeslot, worker)` before the call reaches
/// the store, since a worker holding more than one role on the same
/// timeslot would otherwise produce the same link twice.
pub fn commit(store: &dyn EntityStore, solved: &SolvedModel) {
    let mut links: Vec<(crate::entities::TimeSlotId, crate::entities::WorkerId)> = solved
        .assigned
        .iter()
        .filter(|(_, &on)| on)
        .map(|(&(worker, _role, timeslot), _)| (timeslot, worker))
        .collect();
    links.sort_by_key(|&(t, w)| (t.0, w.0));
    links.dedup();
    store.bulk_insert_links(&links);
}
