//! Domain entities for the roster generator.
//!
//! These mirror the CRUD-owned tables described in the entity model: plain
//! data, no persistence or validation logic of their own. Referential
//! integrity and lifecycle rules are enforced by the [`crate::store::EntityStore`]
//! implementation the host provides; this module only carries the shapes.

use chrono::NaiveDate;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);
    };
}

id_type!(WorkerId);
id_type!(RoleId);
id_type!(DayId);
id_type!(DayGroupId);
id_type!(ShiftId);
id_type!(SkillMixRuleId);
id_type!(ShiftSequenceId);
id_type!(TimeSlotId);
id_type!(LeaveId);
id_type!(StaffRequestId);

#[derive(Debug, Clone)]
pub struct Worker {
    pub id: WorkerId,
    pub first_name: String,
    pub last_name: String,
    pub available: bool,
    pub shifts_per_roster: u32,
    /// `true` rounds leave-scaled targets up (ceil), `false` rounds down (floor).
    pub max_shifts: bool,
    pub enforce_shifts_per_roster: bool,
    pub enforce_one_shift_per_day: bool,
    /// Ordered set of roles; the first entry seeds previous-period anchors.
    pub roles: Vec<RoleId>,
}

#[derive(Debug, Clone)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Day {
    pub id: DayId,
    pub number: u32,
}

#[derive(Debug, Clone)]
pub struct DayGroup {
    pub id: DayGroupId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Shift {
    pub id: ShiftId,
    pub shift_type: String,
    /// `None` means a dangling reference (the day group was deleted); this
    /// makes the shift's active dates undefined, which the loader reports
    /// as `MISCONFIGURED` rather than silently treating it as "never active".
    pub day_group: Option<DayGroupId>,
}

#[derive(Debug, Clone)]
pub struct SkillMixRule {
    pub id: SkillMixRuleId,
    pub name: String,
    pub shift: ShiftId,
    /// Role -> required headcount. Roles absent from this list are implicitly 0.
    pub role_counts: Vec<(RoleId, u32)>,
}

#[derive(Debug, Clone)]
pub struct ShiftSequence {
    pub id: ShiftSequenceId,
    pub name: String,
    pub day_group: Option<DayGroupId>,
    pub workers: Vec<WorkerId>,
    /// Ordered, 1-based, contiguous positions. `None` in the shift list means
    /// "not working" is a legal step; a position may list more than one
    /// alternative shift (and/or `None`).
    pub positions: Vec<(u32, Vec<Option<ShiftId>>)>,
}

#[derive(Debug, Clone)]
pub struct TimeSlot {
    pub id: TimeSlotId,
    pub date: NaiveDate,
    pub shift: ShiftId,
    /// Workers currently linked to this timeslot (pre-existing, e.g. from a
    /// previous run, or post-commit for a freshly generated one).
    pub staff: Vec<WorkerId>,
}

#[derive(Debug, Clone)]
pub struct StaffRequest {
    pub id: StaffRequestId,
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub shift: ShiftId,
    pub like: bool,
    pub priority: u32,
}

impl StaffRequest {
    /// Signed priority: positive for a liked shift, negative for a disliked one.
    pub fn signed_priority(&self) -> i64 {
        if self.like {
            self.priority as i64
        } else {
            -(self.priority as i64)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Leave {
    pub id: LeaveId,
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub description: String,
}
