//! Constraint model builder (C3).
//!
//! Translates a [`Snapshot`] into a 0-1 integer program: boolean decision
//! variables for worker/role/timeslot assignment, linear constraints for
//! every roster rule, and a linear objective maximising satisfied
//! preferences. Conditional rules (skill-mix enforcement, forbidden shift
//! sequences) are encoded with indicator variables and big-M reification,
//! the standard substitute for a CP solver's `OnlyEnforceIf` when the
//! backend only understands linear constraints over a single LP relaxation.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use good_lp::{constraint, variable, variables, Constraint, Expression, ProblemVariables, Variable};

use crate::entities::{RoleId, ShiftId, TimeSlotId, WorkerId};
use crate::error::GenerationError;
use crate::snapshot::{day_number_in_window, Snapshot};

pub struct BuiltModel {
    pub vars: ProblemVariables,
    pub objective: Expression,
    pub constraints: Vec<Constraint>,
    /// Primary decision variables: worker assigned under a role to a timeslot.
    pub primary: HashMap<(WorkerId, RoleId, TimeSlotId), Variable>,
}

fn sum_vars(terms: Vec<Variable>) -> Expression {
    terms.into_iter().map(Expression::from).sum()
}

/// A worker's target shift count for the horizon, scaled by their leave
/// fraction and rounded per `max_shifts` (§4.2.6).
pub fn shifts_per_roster_target(shifts_per_roster: u32, max_shifts: bool, leave_days: u32, horizon_days: u32) -> i64 {
    let frac = 1.0 - (leave_days as f64) / (horizon_days as f64);
    let raw = frac * shifts_per_roster as f64;
    if max_shifts {
        raw.ceil() as i64
    } else {
        raw.floor() as i64
    }
}

fn historical_assignment(snapshot: &Snapshot, worker: WorkerId, date: NaiveDate, shift: ShiftId) -> f64 {
    snapshot
        .timeslots_by_date
        .get(&date)
        .and_then(|slots| slots.iter().find(|s| s.shift == shift))
        .map(|s| if s.staff.contains(&worker) { 1.0 } else { 0.0 })
        .unwrap_or(0.0)
}

fn historical_any_assignment(snapshot: &Snapshot, worker: WorkerId, date: NaiveDate) -> f64 {
    snapshot
        .timeslots_by_date
        .get(&date)
        .map(|slots| if slots.iter().any(|s| s.staff.contains(&worker)) { 1.0 } else { 0.0 })
        .unwrap_or(0.0)
}

pub fn build(snapshot: &Snapshot) -> Result<BuiltModel, GenerationError> {
    let mut vars = variables!();
    let mut primary: HashMap<(WorkerId, RoleId, TimeSlotId), Variable> = HashMap::new();
    let mut vars_by_timeslot: HashMap<TimeSlotId, Vec<Variable>> = HashMap::new();
    let mut timeslot_info: HashMap<TimeSlotId, (NaiveDate, ShiftId)> = HashMap::new();
    for slot in snapshot
        .current_timeslots
        .iter()
        .chain(snapshot.previous_timeslots.iter())
    {
        timeslot_info.insert(slot.id, (slot.date, slot.shift));
    }

    for worker in &snapshot.workers {
        let leave_dates = snapshot.leaves_by_worker.get(&worker.id);
        for &date in &snapshot.dates {
            if leave_dates.map_or(false, |ds| ds.contains(&date)) {
                continue; // 4.2.1 leave exclusion: no variable at all for that day
            }
            let Some(slots) = snapshot.timeslots_by_date.get(&date) else {
                continue;
            };
            for slot in slots {
                for &role in &worker.roles {
                    let v = vars.add(variable().binary());
                    primary.insert((worker.id, role, slot.id), v);
                    vars_by_timeslot.entry(slot.id).or_default().push(v);
                }
            }
        }
    }

    let mut constraints = Vec::new();

    // 4.2.2 one shift per day (opt-in per worker)
    for worker in &snapshot.workers {
        if !worker.enforce_one_shift_per_day {
            continue;
        }
        for &date in &snapshot.dates {
            let Some(slots) = snapshot.timeslots_by_date.get(&date) else {
                continue;
            };
            let terms: Vec<Variable> = slots
                .iter()
                .flat_map(|slot| {
                    worker
                        .roles
                        .iter()
                        .filter_map(|&r| primary.get(&(worker.id, r, slot.id)).copied())
                })
                .collect();
            if terms.is_empty() {
                continue;
            }
            let expr = sum_vars(terms);
            constraints.push(constraint!(expr <= 1.0));
        }
    }

    // 4.2.3 / 4.2.4 skill mix selection and enforcement, 4.2.8 staffing bounds
    let workers_with_role: HashMap<RoleId, f64> = {
        let mut counts: HashMap<RoleId, f64> = HashMap::new();
        for worker in &snapshot.workers {
            for &role in &worker.roles {
                *counts.entry(role).or_insert(0.0) += 1.0;
            }
        }
        counts
    };

    for slot in &snapshot.current_timeslots {
        let rules = snapshot
            .skill_mix_rules_by_shift
            .get(&slot.shift)
            .cloned()
            .unwrap_or_default();
        let total_terms = vars_by_timeslot.get(&slot.id).cloned().unwrap_or_default();
        let total_expr = sum_vars(total_terms);

        if rules.is_empty() {
            // "if no rules, both are 0": a shift with no skill-mix rule at all carries no staff.
            constraints.push(constraint!(total_expr <= 0.0));
            continue;
        }

        let k_vars: Vec<Variable> = rules.iter().map(|_| vars.add(variable().binary())).collect();
        let k_sum = sum_vars(k_vars.clone());
        constraints.push(constraint!(k_sum == 1.0));

        for (j, rule) in rules.iter().enumerate() {
            let k = k_vars[j];
            for (&role_id, &count) in rule.iter() {
                let assigned_terms: Vec<Variable> = snapshot
                    .workers
                    .iter()
                    .filter(|w| w.roles.contains(&role_id))
                    .filter_map(|w| primary.get(&(w.id, role_id, slot.id)).copied())
                    .collect();
                let bound = workers_with_role.get(&role_id).copied().unwrap_or(0.0) + 1.0;
                let assigned = sum_vars(assigned_terms);
                let target = count as f64;
                constraints.push(constraint!(
                    assigned.clone() - target <= bound * (1.0 - k)
                ));
                constraints.push(constraint!(
                    assigned - target >= -bound * (1.0 - k)
                ));
            }
        }

        let sizes: Vec<u32> = rules.iter().map(|r| r.values().sum()).collect();
        let min_size = *sizes.iter().min().unwrap() as f64;
        let max_size = *sizes.iter().max().unwrap() as f64;
        constraints.push(constraint!(total_expr.clone() >= min_size));
        constraints.push(constraint!(total_expr <= max_size));
    }

    // 4.2.5 forbidden shift sequences
    for worker in &snapshot.workers {
        let Some(sequences) = snapshot.sequences_by_worker.get(&worker.id) else {
            continue;
        };
        for seq in sequences {
            for &d0 in &snapshot.extended_dates {
                let mut emitted: Vec<Variable> = Vec::new();
                let mut all_positions_in_group = true;

                for (position, alternatives) in &seq.positions {
                    let date = d0 + Duration::days((*position as i64) - 1);
                    let day_num = day_number_in_window(date, snapshot.dates[0], snapshot.num_days as i64);
                    if !seq.day_group_days.contains(&(day_num as u32)) {
                        // this position runs off the day group: the pattern can
                        // never complete at this anchor (invariant 7 only
                        // applies where every position lands in-group), so no
                        // later position can change that outcome either.
                        all_positions_in_group = false;
                        break;
                    }

                    let some_shifts: Vec<ShiftId> = alternatives.iter().filter_map(|a| *a).collect();
                    let is_null_step = alternatives.iter().any(|a| a.is_none());

                    if !some_shifts.is_empty() {
                        let mut on_terms: Vec<Variable> = Vec::new();
                        let mut fixed_on = 0.0f64;
                        for &shift_id in &some_shifts {
                            if date < snapshot.current_range.0 {
                                fixed_on += historical_assignment(snapshot, worker.id, date, shift_id);
                            } else if let Some(&tid) =
                                snapshot.timeslot_id_by_date_shift.get(&(date, shift_id))
                            {
                                for &role in &worker.roles {
                                    if let Some(&v) = primary.get(&(worker.id, role, tid)) {
                                        on_terms.push(v);
                                    }
                                }
                            }
                        }
                        if !on_terms.is_empty() || fixed_on > 0.0 {
                            let m = vars.add(variable().binary());
                            let bound = on_terms.len() as f64 + some_shifts.len() as f64 + 1.0;
                            let expr = sum_vars(on_terms) + fixed_on;
                            constraints.push(constraint!(expr <= bound * (1.0 - m)));
                            emitted.push(m);
                        }
                    } else if is_null_step {
                        let mut off_terms: Vec<Variable> = Vec::new();
                        let mut fixed_off = 0.0f64;
                        if date < snapshot.current_range.0 {
                            fixed_off = historical_any_assignment(snapshot, worker.id, date);
                        } else if let Some(slots) = snapshot.timeslots_by_date.get(&date) {
                            for slot in slots {
                                for &role in &worker.roles {
                                    if let Some(&v) = primary.get(&(worker.id, role, slot.id)) {
                                        off_terms.push(v);
                                    }
                                }
                            }
                        }
                        if !off_terms.is_empty() || fixed_off > 0.0 {
                            let m = vars.add(variable().binary());
                            let expr = sum_vars(off_terms) + fixed_off;
                            constraints.push(constraint!(expr >= m));
                            emitted.push(m);
                        }
                    }
                    // a position with no alternatives at all carries no data; it is
                    // simply not emitted, without breaking the run.
                }

                // The pattern can only ever be realized where every position
                // lands inside the sequence's day group (invariant 7); an
                // anchor that runs off the window's edge is a no-op, not a
                // constraint over whatever partial run it did see.
                if all_positions_in_group && !emitted.is_empty() {
                    let total = sum_vars(emitted);
                    constraints.push(constraint!(total >= 1.0));
                }
            }
        }
    }

    // 4.2.6 / 4.2.7 shifts-per-roster and balanced halves
    for worker in &snapshot.workers {
        if !worker.enforce_shifts_per_roster {
            continue;
        }
        let leave_dates: HashSet<NaiveDate> = snapshot
            .leaves_by_worker
            .get(&worker.id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect();
        let target = shifts_per_roster_target(
            worker.shifts_per_roster,
            worker.max_shifts,
            leave_dates.len() as u32,
            snapshot.num_days as u32,
        ) as f64;

        let all_terms: Vec<Variable> = snapshot
            .dates
            .iter()
            .filter_map(|date| snapshot.timeslots_by_date.get(date))
            .flatten()
            .flat_map(|slot| {
                worker
                    .roles
                    .iter()
                    .filter_map(|&r| primary.get(&(worker.id, r, slot.id)).copied())
            })
            .collect();
        let total_expr = sum_vars(all_terms);
        constraints.push(constraint!(total_expr == target));

        let working_dates: Vec<NaiveDate> = snapshot
            .dates
            .iter()
            .copied()
            .filter(|d| !leave_dates.contains(d))
            .collect();
        let first_half_len = working_dates.len() / 2;
        let first_half_terms: Vec<Variable> = working_dates[..first_half_len]
            .iter()
            .filter_map(|date| snapshot.timeslots_by_date.get(date))
            .flatten()
            .flat_map(|slot| {
                worker
                    .roles
                    .iter()
                    .filter_map(|&r| primary.get(&(worker.id, r, slot.id)).copied())
            })
            .collect();
        let first_half_expr = sum_vars(first_half_terms);
        let half_target = (target as i64) / 2;
        constraints.push(constraint!(first_half_expr == half_target as f64));
    }

    // 4.2.9 objective: maximise satisfied preferences
    let mut weighted_terms: Vec<Expression> = Vec::new();
    for (&(worker_id, _role, timeslot_id), &var) in primary.iter() {
        let Some(&(date, shift)) = timeslot_info.get(&timeslot_id) else {
            continue;
        };
        let Some(day_num) = snapshot.dates.iter().position(|&d| d == date) else {
            continue;
        };
        let Some(&w) = snapshot.worker_num.get(&worker_id) else {
            continue;
        };
        let Some(&s) = snapshot.shift_num.get(&shift) else {
            continue;
        };
        let weight = snapshot.request_matrix[w][day_num][s] as f64;
        if weight != 0.0 {
            weighted_terms.push(Expression::from(var) * weight);
        }
    }
    let objective: Expression = weighted_terms.into_iter().sum();

    Ok(BuiltModel {
        vars,
        objective,
        constraints,
        primary,
    })
}
