//! The boundary between `roster-core` and the CRUD layer that owns entities.
//!
//! `spec.md` §6 lists the exact reads and writes the core needs from the
//! entity store. Everything else about persistence (schema, migrations,
//! permissions, editing UIs) is the host's concern; `EntityStore` is the
//! seam. `InMemoryStore` is a reference implementation used by this crate's
//! own tests and suitable as a fixture for scenario tests elsewhere.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::entities::{
    Day, DayGroupId, Leave, Role, RoleId, Shift, ShiftId, ShiftSequence, SkillMixRule, StaffRequest,
    TimeSlot, TimeSlotId, Worker, WorkerId,
};

/// Read/write boundary the snapshot loader and roster writer consume.
///
/// Methods take `&self`; implementations are expected to use interior
/// mutability (a lock, a transaction handle, …) since the entity store is a
/// shared resource that CRUD edits and generation runs both touch (§5).
pub trait EntityStore: Send + Sync {
    fn workers_available(&self) -> Vec<Worker>;
    fn workers_all(&self) -> Vec<Worker>;
    fn roles(&self) -> Vec<Role>;
    fn shifts_sorted_by_type(&self) -> Vec<Shift>;
    fn days_sorted_by_number(&self) -> Vec<Day>;
    fn day_group_day_numbers(&self, group: DayGroupId) -> Vec<u32>;
    fn skill_mix_rules_for_shift(&self, shift: ShiftId) -> Vec<SkillMixRule>;
    fn shift_sequences_for_worker(&self, worker: WorkerId) -> Vec<ShiftSequence>;
    fn leaves_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Leave>;
    fn staff_requests_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<StaffRequest>;
    /// Timeslots whose date falls in `[start, end]`, with their current staff.
    fn timeslots_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<TimeSlot>;

    fn delete_timeslots_in_range(&self, start: NaiveDate, end: NaiveDate);
    /// Creates a timeslot for `(date, shift)` if one doesn't already exist, returning its id.
    fn create_timeslot(&self, date: NaiveDate, shift: ShiftId) -> TimeSlotId;
    /// Bulk-inserts (timeslot, worker) links, ignoring duplicates.
    fn bulk_insert_links(&self, links: &[(TimeSlotId, WorkerId)]);
}

/// In-memory `EntityStore`, used by this crate's tests and as a fixture
/// builder. Not part of the external interface — the real store is a host
/// concern (database-backed CRUD layer, out of scope per `spec.md` §1).
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<InMemoryInner>,
}

#[derive(Default)]
struct InMemoryInner {
    workers: Vec<Worker>,
    roles: Vec<Role>,
    days: Vec<Day>,
    day_group_days: HashMap<DayGroupId, Vec<u32>>,
    shifts: Vec<Shift>,
    skill_mix_rules: Vec<SkillMixRule>,
    shift_sequences: Vec<ShiftSequence>,
    leaves: Vec<Leave>,
    staff_requests: Vec<StaffRequest>,
    timeslots: Vec<TimeSlot>,
    next_timeslot_id: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_worker(&self, worker: Worker) {
        self.inner.lock().unwrap().workers.push(worker);
    }

    pub fn add_role(&self, role: Role) {
        self.inner.lock().unwrap().roles.push(role);
    }

    pub fn add_day(&self, day: Day) {
        self.inner.lock().unwrap().days.push(day);
    }

    pub fn add_day_group(&self, group: DayGroupId, day_numbers: Vec<u32>) {
        self.inner
            .lock()
            .unwrap()
            .day_group_days
            .insert(group, day_numbers);
    }

    pub fn add_shift(&self, shift: Shift) {
        self.inner.lock().unwrap().shifts.push(shift);
    }

    pub fn add_skill_mix_rule(&self, rule: SkillMixRule) {
        self.inner.lock().unwrap().skill_mix_rules.push(rule);
    }

    pub fn add_shift_sequence(&self, sequence: ShiftSequence) {
        self.inner.lock().unwrap().shift_sequences.push(sequence);
    }

    pub fn add_leave(&self, leave: Leave) {
        self.inner.lock().unwrap().leaves.push(leave);
    }

    pub fn add_staff_request(&self, request: StaffRequest) {
        self.inner.lock().unwrap().staff_requests.push(request);
    }

    /// Seeds a pre-existing timeslot (e.g. the previous roster period) with staff.
    pub fn seed_timeslot(&self, date: NaiveDate, shift: ShiftId, staff: Vec<WorkerId>) -> TimeSlotId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_timeslot_id += 1;
        let id = TimeSlotId(inner.next_timeslot_id);
        inner.timeslots.push(TimeSlot {
            id,
            date,
            shift,
            staff,
        });
        id
    }
}

impl EntityStore for InMemoryStore {
    fn workers_available(&self) -> Vec<Worker> {
        self.inner
            .lock()
            .unwrap()
            .workers
            .iter()
            .filter(|w| w.available)
            .cloned()
            .collect()
    }

    fn workers_all(&self) -> Vec<Worker> {
        self.inner.lock().unwrap().workers.clone()
    }

    fn roles(&self) -> Vec<Role> {
        self.inner.lock().unwrap().roles.clone()
    }

    fn shifts_sorted_by_type(&self) -> Vec<Shift> {
        let mut shifts = self.inner.lock().unwrap().shifts.clone();
        shifts.sort_by(|a, b| a.shift_type.cmp(&b.shift_type));
        shifts
    }

    fn days_sorted_by_number(&self) -> Vec<Day> {
        let mut days = self.inner.lock().unwrap().days.clone();
        days.sort_by_key(|d| d.number);
        days
    }

    fn day_group_day_numbers(&self, group: DayGroupId) -> Vec<u32> {
        self.inner
            .lock()
            .unwrap()
            .day_group_days
            .get(&group)
            .cloned()
            .unwrap_or_default()
    }

    fn skill_mix_rules_for_shift(&self, shift: ShiftId) -> Vec<SkillMixRule> {
        self.inner
            .lock()
            .unwrap()
            .skill_mix_rules
            .iter()
            .filter(|r| r.shift == shift)
            .cloned()
            .collect()
    }

    fn shift_sequences_for_worker(&self, worker: WorkerId) -> Vec<ShiftSequence> {
        self.inner
            .lock()
            .unwrap()
            .shift_sequences
            .iter()
            .filter(|s| s.workers.contains(&worker))
            .cloned()
            .collect()
    }

    fn leaves_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Leave> {
        self.inner
            .lock()
            .unwrap()
            .leaves
            .iter()
            .filter(|l| l.date >= start && l.date <= end)
            .cloned()
            .collect()
    }

    fn staff_requests_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<StaffRequest> {
        self.inner
            .lock()
            .unwrap()
            .staff_requests
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect()
    }

    fn timeslots_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<TimeSlot> {
        let mut slots: Vec<TimeSlot> = self
            .inner
            .lock()
            .unwrap()
            .timeslots
            .iter()
            .filter(|t| t.date >= start && t.date <= end)
            .cloned()
            .collect();
        slots.sort_by(|a, b| a.date.cmp(&b.date));
        slots
    }

    fn delete_timeslots_in_range(&self, start: NaiveDate, end: NaiveDate) {
        self.inner
            .lock()
            .unwrap()
            .timeslots
            .retain(|t| t.date < start || t.date > end);
    }

    fn create_timeslot(&self, date: NaiveDate, shift: ShiftId) -> TimeSlotId {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .timeslots
            .iter()
            .find(|t| t.date == date && t.shift == shift)
        {
            return existing.id;
        }
        inner.next_timeslot_id += 1;
        let id = TimeSlotId(inner.next_timeslot_id);
        inner.timeslots.push(TimeSlot {
            id,
            date,
            shift,
            staff: Vec::new(),
        });
        id
    }

    fn bulk_insert_links(&self, links: &[(TimeSlotId, WorkerId)]) {
        let mut inner = self.inner.lock().unwrap();
        for (timeslot_id, worker_id) in links {
            if let Some(slot) = inner.timeslots.iter_mut().find(|t| t.id == *timeslot_id) {
                if !slot.staff.contains(worker_id) {
                    slot.staff.push(*worker_id);
                }
            }
        }
    }
}
