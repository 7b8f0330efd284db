//! Roster reader (C7).
//!
//! A read-only view of the current horizon's assignments, independent of
//! any particular generation run — it reflects whatever links the store
//! currently holds. Used by CSV export and, as a supplementary report, by
//! staff-request satisfaction readback.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::entities::{RoleId, ShiftId, WorkerId};
use crate::error::GenerationError;
use crate::snapshot::compute_dates;
use crate::store::EntityStore;

pub struct RosterRow {
    pub first_name: String,
    pub last_name: String,
    pub role_names: Vec<String>,
    pub shifts_per_roster: u32,
    /// One label per horizon date, in order.
    pub labels: Vec<String>,
}

impl RosterRow {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// Space-separated role names with a trailing space, matching the export format.
    pub fn roles_field(&self) -> String {
        let mut s = self.role_names.join(" ");
        if !s.is_empty() {
            s.push(' ');
        }
        s
    }
}

pub fn roster_by_staff(
    store: &dyn EntityStore,
    start_date: NaiveDate,
) -> Result<(Vec<NaiveDate>, Vec<RosterRow>), GenerationError> {
    let (dates, _extended) = compute_dates(store, start_date)?;
    let start = dates[0];
    let end = dates[dates.len() - 1];

    let role_names: HashMap<RoleId, String> =
        store.roles().into_iter().map(|r| (r.id, r.name)).collect();
    let shift_types: HashMap<ShiftId, String> = store
        .shifts_sorted_by_type()
        .into_iter()
        .map(|s| (s.id, s.shift_type))
        .collect();

    let leaves = store.leaves_in_range(start, end);
    let mut leave_by_worker_date: HashMap<(WorkerId, NaiveDate), &str> = HashMap::new();
    for leave in &leaves {
        leave_by_worker_date.insert((leave.worker, leave.date), leave.description.as_str());
    }

    let timeslots = store.timeslots_in_range(start, end);
    let mut shift_types_by_worker_date: HashMap<(WorkerId, NaiveDate), Vec<String>> = HashMap::new();
    for slot in &timeslots {
        let Some(shift_type) = shift_types.get(&slot.shift) else {
            continue;
        };
        for &worker in &slot.staff {
            shift_types_by_worker_date
                .entry((worker, slot.date))
                .or_default()
                .push(shift_type.clone());
        }
    }

    let mut rows: Vec<RosterRow> = store
        .workers_all()
        .into_iter()
        .map(|worker| {
            let labels = dates
                .iter()
                .map(|&date| {
                    if let Some(types) = shift_types_by_worker_date.get(&(worker.id, date)) {
                        types.join(", ")
                    } else if let Some(description) = leave_by_worker_date.get(&(worker.id, date)) {
                        description.to_string()
                    } else {
                        "X".to_string()
                    }
                })
                .collect();
            RosterRow {
                first_name: worker.first_name,
                last_name: worker.last_name,
                role_names: worker
                    .roles
                    .iter()
                    .filter_map(|r| role_names.get(r).cloned())
                    .collect(),
                shifts_per_roster: worker.shifts_per_roster,
                labels,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        let role_a = a.role_names.first().cloned().unwrap_or_default();
        let role_b = b.role_names.first().cloned().unwrap_or_default();
        (role_a, &a.last_name, &a.first_name).cmp(&(role_b, &b.last_name, &b.first_name))
    });

    Ok((dates, rows))
}

/// Renders the header and one row per worker, per the export format.
pub fn to_csv(dates: &[NaiveDate], rows: &[RosterRow]) -> String {
    let mut out = String::new();
    out.push_str("Staff Member,Roles,Shifts");
    for date in dates {
        out.push(',');
        out.push_str(&date.format("%a %d-%b-%Y").to_string());
    }
    out.push('\n');

    for row in rows {
        out.push('"');
        out.push_str(&row.display_name().replace('"', "\"\""));
        out.push_str("\",");
        out.push('"');
        out.push_str(&row.roles_field().replace('"', "\"\""));
        out.push_str("\",");
        out.push_str(&row.shifts_per_roster.to_string());
        for label in &row.labels {
            out.push(',');
            if label.contains(',') || label.contains('"') {
                out.push('"');
                out.push_str(&label.replace('"', "\"\""));
                out.push('"');
            } else {
                out.push_str(label);
            }
        }
        out.push('\n');
    }
    out
}

/// One staff request and whether the generated roster satisfied it.
///
/// Not named in the core interface list, but the same computation the host
/// UI's request-status report reads off the freshly written roster; kept
/// here since it needs the same timeslot lookups as the CSV export.
/// `description` is the human-readable "<staff member> given <shift> on
/// <date>" / "... not given ..." line the original request-status view
/// renders, for a host that wants to display it verbatim.
pub struct RequestOutcome {
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub shift: ShiftId,
    pub like: bool,
    pub priority: u32,
    pub satisfied: bool,
    pub description: String,
}

pub fn staff_request_satisfaction(
    store: &dyn EntityStore,
    start_date: NaiveDate,
) -> Result<Vec<RequestOutcome>, GenerationError> {
    let (dates, _extended) = compute_dates(store, start_date)?;
    let start = dates[0];
    let end = dates[dates.len() - 1];

    let worker_names: HashMap<WorkerId, String> = store
        .workers_all()
        .into_iter()
        .map(|w| (w.id, format!("{} {}", w.first_name, w.last_name)))
        .collect();
    let shift_types: HashMap<ShiftId, String> = store
        .shifts_sorted_by_type()
        .into_iter()
        .map(|s| (s.id, s.shift_type))
        .collect();

    let requests = store.staff_requests_in_range(start, end);
    let timeslots = store.timeslots_in_range(start, end);
    let mut staffed: HashMap<(NaiveDate, ShiftId), Vec<WorkerId>> = HashMap::new();
    for slot in &timeslots {
        staffed.insert((slot.date, slot.shift), slot.staff.clone());
    }

    Ok(requests
        .into_iter()
        .map(|request| {
            let assigned = staffed
                .get(&(request.date, request.shift))
                .map_or(false, |staff| staff.contains(&request.worker));
            let satisfied = if request.like { assigned } else { !assigned };
            let worker_name = worker_names
                .get(&request.worker)
                .cloned()
                .unwrap_or_default();
            let shift_name = shift_types.get(&request.shift).cloned().unwrap_or_default();
            let verb = if assigned { "given" } else { "not given" };
            let description = format!("{worker_name} {verb} {shift_name} on {}", request.date);
            RequestOutcome {
                worker: request.worker,
                date: request.date,
                shift: request.shift,
                like: request.like,
                priority: request.priority,
                satisfied,
                description,
            }
        })
        .collect())
}
