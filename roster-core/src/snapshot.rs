//! Snapshot loader (C2).
//!
//! Reads a self-consistent view of the entity store into memory, keyed for
//! O(1) lookup during model building. Everything downstream (the model
//! builder, the writer) reads only from the [`Snapshot`] — never the store
//! directly — so the whole generation run sees one consistent point in time
//! (§4.1: "The loader owns one short read transaction").

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::entities::{
    Leave, Role, RoleId, Shift, ShiftId, ShiftSequenceId, StaffRequest, TimeSlot, TimeSlotId,
    Worker, WorkerId,
};
use crate::error::GenerationError;
use crate::store::EntityStore;

/// A shift sequence normalised for model building: an ordered, contiguous
/// list of `(position, alternatives)` plus the day numbers its day group
/// covers.
#[derive(Debug, Clone)]
pub struct NormalizedSequence {
    pub id: ShiftSequenceId,
    pub name: String,
    pub day_group_days: Vec<u32>,
    pub positions: Vec<(u32, Vec<Option<ShiftId>>)>,
}

pub struct Snapshot {
    pub start_date: NaiveDate,
    pub num_days: usize,
    /// Current horizon, `dates[0] == start_date`, length `num_days`.
    pub dates: Vec<NaiveDate>,
    pub previous_range: (NaiveDate, NaiveDate),
    pub current_range: (NaiveDate, NaiveDate),
    /// `previous_range.0 ..= current_range.1`, length `2 * num_days`.
    pub extended_dates: Vec<NaiveDate>,

    pub roles: Vec<Role>,
    pub workers: Vec<Worker>,
    pub worker_num: HashMap<WorkerId, usize>,
    pub shifts: Vec<Shift>,
    pub shift_num: HashMap<ShiftId, usize>,

    pub leaves: Vec<Leave>,
    pub leaves_by_worker: HashMap<WorkerId, Vec<NaiveDate>>,
    pub staff_requests: Vec<StaffRequest>,

    /// Timeslots covering the extended range, sorted by `shift_type` within each date.
    pub timeslots_by_date: HashMap<NaiveDate, Vec<TimeSlot>>,
    pub timeslot_id_by_date_shift: HashMap<(NaiveDate, ShiftId), TimeSlotId>,
    /// Previous-range timeslots, with their pre-existing staff preserved.
    pub previous_timeslots: Vec<TimeSlot>,
    /// Current-range timeslots (freshly (re)created for this run).
    pub current_timeslots: Vec<TimeSlot>,

    /// Normalised `{role -> count}` per rule, per shift; every role present.
    pub skill_mix_rules_by_shift: HashMap<ShiftId, Vec<HashMap<RoleId, u32>>>,
    pub sequences_by_worker: HashMap<WorkerId, Vec<NormalizedSequence>>,

    /// `request[worker_num][day_num][shift_num]`, signed priority, 0 by default.
    pub request_matrix: Vec<Vec<Vec<i64>>>,
}

impl Snapshot {
    pub fn day_number_in_window(&self, date: NaiveDate) -> i64 {
        day_number_in_window(date, self.dates[0], self.num_days as i64)
    }
}

/// 1-based day number of `date` relative to `window_start`, wrapping dates
/// before the window into the tail of the previous period (§4.2.5).
pub fn day_number_in_window(date: NaiveDate, window_start: NaiveDate, n: i64) -> i64 {
    let delta = (date - window_start).num_days();
    if delta < 0 {
        delta + n + 1
    } else {
        delta + 1
    }
}

/// Validates the configured `Day` rows and derives the current, previous
/// and extended date ranges for a horizon starting at `start_date`. Shared
/// by the loader and the roster reader, which both need the same horizon
/// shape without either one depending on the other.
pub fn compute_dates(
    store: &dyn EntityStore,
    start_date: NaiveDate,
) -> Result<(Vec<NaiveDate>, Vec<NaiveDate>), GenerationError> {
    let days = store.days_sorted_by_number();
    let num_days = days.len();
    if num_days == 0 {
        return Err(GenerationError::Misconfigured {
            detail: "no days are configured for the roster horizon".to_string(),
        });
    }
    for (idx, day) in days.iter().enumerate() {
        if day.number != (idx as u32) + 1 {
            return Err(GenerationError::Misconfigured {
                detail: "day numbers must be contiguous starting at 1".to_string(),
            });
        }
    }

    let dates: Vec<NaiveDate> = (0..num_days as i64)
        .map(|n| start_date + chrono::Duration::days(n))
        .collect();
    let previous_start = dates[0] - chrono::Duration::days(num_days as i64);
    let extended_dates: Vec<NaiveDate> = (0..(2 * num_days) as i64)
        .map(|n| previous_start + chrono::Duration::days(n))
        .collect();
    Ok((dates, extended_dates))
}

pub fn load(store: &dyn EntityStore, start_date: NaiveDate) -> Result<Snapshot, GenerationError> {
    let (dates, extended_dates) = compute_dates(store, start_date)?;
    let num_days = dates.len();
    let current_range = (dates[0], dates[num_days - 1]);
    let previous_range = (extended_dates[0], dates[0] - chrono::Duration::days(1));

    // Fresh timeslots for this horizon: delete, then recreate one per active date/shift pair.
    store.delete_timeslots_in_range(current_range.0, current_range.1);
    let shifts = store.shifts_sorted_by_type();
    for shift in &shifts {
        let Some(group) = shift.day_group else {
            return Err(GenerationError::Misconfigured {
                detail: format!("shift '{}' has no day group assigned", shift.shift_type),
            });
        };
        for day_number in store.day_group_day_numbers(group) {
            if day_number == 0 || (day_number as usize) > num_days {
                continue;
            }
            store.create_timeslot(dates[(day_number - 1) as usize], shift.id);
        }
    }

    let workers = store.workers_available();
    let worker_num: HashMap<WorkerId, usize> = workers
        .iter()
        .enumerate()
        .map(|(n, w)| (w.id, n))
        .collect();
    let shift_num: HashMap<ShiftId, usize> = shifts
        .iter()
        .enumerate()
        .map(|(n, s)| (s.id, n))
        .collect();
    let roles = store.roles();

    let leaves = store.leaves_in_range(current_range.0, current_range.1);
    let mut leaves_by_worker: HashMap<WorkerId, Vec<NaiveDate>> = HashMap::new();
    for leave in &leaves {
        leaves_by_worker.entry(leave.worker).or_default().push(leave.date);
    }

    let staff_requests = store.staff_requests_in_range(current_range.0, current_range.1);

    let mut timeslots_by_date: HashMap<NaiveDate, Vec<TimeSlot>> = HashMap::new();
    let mut timeslot_id_by_date_shift: HashMap<(NaiveDate, ShiftId), TimeSlotId> = HashMap::new();
    let shift_type_by_id: HashMap<ShiftId, &str> = shifts
        .iter()
        .map(|s| (s.id, s.shift_type.as_str()))
        .collect();
    for &date in &extended_dates {
        let mut slots = store.timeslots_in_range(date, date);
        slots.sort_by(|a, b| {
            shift_type_by_id
                .get(&a.shift)
                .unwrap_or(&"")
                .cmp(shift_type_by_id.get(&b.shift).unwrap_or(&""))
        });
        for slot in &slots {
            timeslot_id_by_date_shift.insert((date, slot.shift), slot.id);
        }
        timeslots_by_date.insert(date, slots);
    }

    let previous_timeslots = store.timeslots_in_range(previous_range.0, previous_range.1);
    let current_timeslots = store.timeslots_in_range(current_range.0, current_range.1);

    let mut skill_mix_rules_by_shift: HashMap<ShiftId, Vec<HashMap<RoleId, u32>>> = HashMap::new();
    for shift in &shifts {
        let rules = store.skill_mix_rules_for_shift(shift.id);
        let normalized: Vec<HashMap<RoleId, u32>> = rules
            .iter()
            .map(|rule| {
                let mut counts: HashMap<RoleId, u32> = roles.iter().map(|r| (r.id, 0)).collect();
                for (role_id, count) in &rule.role_counts {
                    counts.insert(*role_id, *count);
                }
                counts
            })
            .collect();
        skill_mix_rules_by_shift.insert(shift.id, normalized);
    }

    let mut sequences_by_worker: HashMap<WorkerId, Vec<NormalizedSequence>> = HashMap::new();
    for worker in &workers {
        let mut sequences = Vec::new();
        for seq in store.shift_sequences_for_worker(worker.id) {
            let Some(group) = seq.day_group else {
                return Err(GenerationError::Misconfigured {
                    detail: format!("shift sequence '{}' has no day group assigned", seq.name),
                });
            };
            let day_group_days = store.day_group_day_numbers(group);
            let mut positions = seq.positions.clone();
            positions.sort_by_key(|(pos, _)| *pos);
            sequences.push(NormalizedSequence {
                id: seq.id,
                name: seq.name.clone(),
                day_group_days,
                positions,
            });
        }
        sequences_by_worker.insert(worker.id, sequences);
    }

    let mut request_matrix = vec![vec![vec![0i64; shifts.len()]; num_days]; workers.len()];
    for request in &staff_requests {
        let (Some(&w), Some(&s)) = (
            worker_num.get(&request.worker),
            shift_num.get(&request.shift),
        ) else {
            continue;
        };
        let Some(d) = dates.iter().position(|&d| d == request.date) else {
            continue;
        };
        request_matrix[w][d][s] = request.signed_priority();
    }

    Ok(Snapshot {
        start_date,
        num_days,
        dates,
        previous_range,
        current_range,
        extended_dates,
        roles,
        workers,
        worker_num,
        shifts,
        shift_num,
        leaves,
        leaves_by_worker,
        staff_requests,
        timeslots_by_date,
        timeslot_id_by_date_shift,
        previous_timeslots,
        current_timeslots,
        skill_mix_rules_by_shift,
        sequences_by_worker,
        request_matrix,
    })
}
