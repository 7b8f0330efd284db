use std::time::Duration;

use chrono::NaiveDate;
use roster_core::entities::{
    Day, DayGroupId, Leave, Role, RoleId, Shift, ShiftId, ShiftSequence, SkillMixRule, Worker,
    WorkerId,
};
use roster_core::store::InMemoryStore;
use roster_core::{model, snapshot, EntityStore, GenerationError};

fn start(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn day_group(store: &InMemoryStore, id: u64, days: Vec<u32>) -> DayGroupId {
    let group = DayGroupId(id);
    store.add_day_group(group, days);
    group
}

fn seed_days(store: &InMemoryStore, n: u32) {
    for i in 1..=n {
        store.add_day(Day {
            id: roster_core::entities::DayId(i as u64),
            number: i,
        });
    }
}

/// S2/S3-shaped fixture: one role, one shift active every day of a
/// 10-day horizon, exactly one skill-mix rule forcing 2 of that role per
/// day, and two workers whose combined `shifts_per_roster` targets either
/// match or exceed the 20 slots the skill-mix rule demands.
fn build_two_rn_fixture(first_target: u32, second_target: u32) -> (InMemoryStore, RoleId, ShiftId) {
    let store = InMemoryStore::new();
    seed_days(&store, 10);
    let role = RoleId(1);
    store.add_role(Role {
        id: role,
        name: "RN".to_string(),
    });
    let group = day_group(&store, 1, (1..=10).collect());
    let shift = ShiftId(1);
    store.add_shift(Shift {
        id: shift,
        shift_type: "Early".to_string(),
        day_group: Some(group),
    });
    store.add_skill_mix_rule(SkillMixRule {
        id: roster_core::entities::SkillMixRuleId(1),
        name: "two RNs".to_string(),
        shift,
        role_counts: vec![(role, 2)],
    });
    store.add_worker(Worker {
        id: WorkerId(1),
        first_name: "Ann".to_string(),
        last_name: "Adams".to_string(),
        available: true,
        shifts_per_roster: first_target,
        max_shifts: false,
        enforce_shifts_per_roster: true,
        enforce_one_shift_per_day: true,
        roles: vec![role],
    });
    store.add_worker(Worker {
        id: WorkerId(2),
        first_name: "Beth".to_string(),
        last_name: "Brown".to_string(),
        available: true,
        shifts_per_roster: second_target,
        max_shifts: false,
        enforce_shifts_per_roster: true,
        enforce_one_shift_per_day: true,
        roles: vec![role],
    });
    (store, role, shift)
}

#[test]
fn s2_infeasible_when_targets_undersupply_the_skill_mix() {
    let (store, _role, _shift) = build_two_rn_fixture(10, 9); // 19 < 20 required slots
    let err = roster_core::generate(&store, start(2030, 1, 7), Duration::from_secs(5)).unwrap_err();
    assert!(matches!(err, GenerationError::Infeasible));
}

#[test]
fn s3_infeasible_when_targets_exceed_the_skill_mix_capacity() {
    let (store, _role, _shift) = build_two_rn_fixture(10, 11); // 21 > 20 required slots
    let err = roster_core::generate(&store, start(2030, 1, 7), Duration::from_secs(5)).unwrap_err();
    assert!(matches!(err, GenerationError::Infeasible));
}

#[test]
fn s1_basic_feasible_generation_succeeds_and_satisfies_skill_mix() {
    let (store, _role, shift) = build_two_rn_fixture(10, 10); // 20 == 20 required slots exactly
    let start_date = start(2030, 1, 7);
    roster_core::generate(&store, start_date, Duration::from_secs(5)).unwrap();

    let end_date = start_date + chrono::Duration::days(9);
    let timeslots = store.timeslots_in_range(start_date, end_date);
    assert_eq!(timeslots.len(), 10);
    for slot in &timeslots {
        assert_eq!(slot.shift, shift);
        assert_eq!(slot.staff.len(), 2, "every day needs exactly two RNs");
    }

    let mut shifts_per_worker: std::collections::HashMap<WorkerId, u32> = std::collections::HashMap::new();
    for slot in &timeslots {
        for &worker in &slot.staff {
            *shifts_per_worker.entry(worker).or_insert(0) += 1;
        }
    }
    assert_eq!(shifts_per_worker.get(&WorkerId(1)).copied().unwrap_or(0), 10);
    assert_eq!(shifts_per_worker.get(&WorkerId(2)).copied().unwrap_or(0), 10);
}

/// Exercises the highest-weight constraint group directly: a "no Early
/// after Late" sequence applied to both workers, on a 3-day horizon where
/// every day needs exactly one Early and one Late covered by exactly two
/// workers. The sequence's own day group is restricted to days 2-3 (not the
/// shifts' day group, which covers every day) so the only anchors that can
/// ever emit a guard are day 2 (fully interior) and day 3 (the edge case
/// that used to break: its second position, the following Early, falls
/// outside the day group, which must make that anchor a no-op rather than
/// forbidding Late altogether on the final day). A buggy model makes this
/// horizon INFEASIBLE (Late on day 3 can never be staffed); the fixed model
/// finds an assignment and never lets a Late day k worker work Early on day
/// k+1.
#[test]
fn forbidden_sequence_never_appears_and_does_not_forbid_the_last_day() {
    let store = InMemoryStore::new();
    seed_days(&store, 3);
    let role = RoleId(1);
    store.add_role(Role {
        id: role,
        name: "RN".to_string(),
    });
    let group = day_group(&store, 1, vec![1, 2, 3]);
    let early = ShiftId(1);
    let late = ShiftId(2);
    store.add_shift(Shift {
        id: early,
        shift_type: "Early".to_string(),
        day_group: Some(group),
    });
    store.add_shift(Shift {
        id: late,
        shift_type: "Late".to_string(),
        day_group: Some(group),
    });
    store.add_skill_mix_rule(SkillMixRule {
        id: roster_core::entities::SkillMixRuleId(1),
        name: "one RN on Early".to_string(),
        shift: early,
        role_counts: vec![(role, 1)],
    });
    store.add_skill_mix_rule(SkillMixRule {
        id: roster_core::entities::SkillMixRuleId(2),
        name: "one RN on Late".to_string(),
        shift: late,
        role_counts: vec![(role, 1)],
    });

    let workers = vec![WorkerId(1), WorkerId(2)];
    store.add_worker(Worker {
        id: workers[0],
        first_name: "Ann".to_string(),
        last_name: "Adams".to_string(),
        available: true,
        shifts_per_roster: 0,
        max_shifts: false,
        enforce_shifts_per_roster: false,
        enforce_one_shift_per_day: true,
        roles: vec![role],
    });
    store.add_worker(Worker {
        id: workers[1],
        first_name: "Beth".to_string(),
        last_name: "Brown".to_string(),
        available: true,
        shifts_per_roster: 0,
        max_shifts: false,
        enforce_shifts_per_roster: false,
        enforce_one_shift_per_day: true,
        roles: vec![role],
    });

    let sequence_group = day_group(&store, 2, vec![2, 3]);
    store.add_shift_sequence(ShiftSequence {
        id: roster_core::entities::ShiftSequenceId(1),
        name: "no Early after Late".to_string(),
        day_group: Some(sequence_group),
        workers: workers.clone(),
        positions: vec![(1, vec![Some(late)]), (2, vec![Some(early)])],
    });

    let start_date = start(2030, 1, 7);
    roster_core::generate(&store, start_date, Duration::from_secs(5)).unwrap();

    let dates: Vec<NaiveDate> = (0..3).map(|n| start_date + chrono::Duration::days(n)).collect();
    let timeslots = store.timeslots_in_range(dates[0], dates[2]);

    let staff_of = |date: NaiveDate, shift: ShiftId| -> Vec<WorkerId> {
        timeslots
            .iter()
            .find(|t| t.date == date && t.shift == shift)
            .map(|t| t.staff.clone())
            .unwrap_or_default()
    };

    for &date in &dates {
        assert_eq!(staff_of(date, early).len(), 1, "every day needs one Early");
        assert_eq!(staff_of(date, late).len(), 1, "every day needs one Late");
    }
    // The fix: Late on the last day must still be staffed, not spuriously forbidden.
    assert_eq!(staff_of(dates[2], late).len(), 1);

    for pair in dates.windows(2) {
        let late_today = staff_of(pair[0], late);
        let early_tomorrow = staff_of(pair[1], early);
        for worker in &late_today {
            assert!(
                !early_tomorrow.contains(worker),
                "worker {worker:?} worked Late on {} and Early on {}",
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn s4_misconfigured_when_a_shift_sequence_has_no_day_group() {
    let store = InMemoryStore::new();
    seed_days(&store, 5);
    let role = RoleId(1);
    store.add_role(Role {
        id: role,
        name: "RN".to_string(),
    });
    let group = day_group(&store, 1, (1..=5).collect());
    let shift = ShiftId(1);
    store.add_shift(Shift {
        id: shift,
        shift_type: "Early".to_string(),
        day_group: Some(group),
    });
    store.add_skill_mix_rule(SkillMixRule {
        id: roster_core::entities::SkillMixRuleId(1),
        name: "one RN".to_string(),
        shift,
        role_counts: vec![(role, 1)],
    });
    let worker = WorkerId(1);
    store.add_worker(Worker {
        id: worker,
        first_name: "Cleo".to_string(),
        last_name: "Chan".to_string(),
        available: true,
        shifts_per_roster: 5,
        max_shifts: false,
        enforce_shifts_per_roster: false,
        enforce_one_shift_per_day: true,
        roles: vec![role],
    });
    store.add_shift_sequence(ShiftSequence {
        id: roster_core::entities::ShiftSequenceId(1),
        name: "no back-to-back".to_string(),
        day_group: None, // dangling reference: the group was deleted
        workers: vec![worker],
        positions: vec![(1, vec![Some(shift)]), (2, vec![Some(shift)])],
    });

    let err = roster_core::generate(&store, start(2030, 1, 7), Duration::from_secs(5)).unwrap_err();
    match err {
        GenerationError::Misconfigured { detail } => {
            assert!(detail.to_lowercase().contains("day group"));
        }
        other => panic!("expected Misconfigured, got {other:?}"),
    }
}

#[test]
fn s5_leave_scaling_rounds_per_max_shifts() {
    use roster_core::model::shifts_per_roster_target;
    // 10 shifts_per_roster, 5 leave days of 10 -> frac 0.5 -> raw 5.0, exact either way.
    assert_eq!(shifts_per_roster_target(10, false, 5, 10), 5);
    assert_eq!(shifts_per_roster_target(10, true, 5, 10), 5);
    // 7 shifts_per_roster, 2 leave days of 10 -> frac 0.8 -> raw 5.6
    assert_eq!(shifts_per_roster_target(7, false, 2, 10), 5);
    assert_eq!(shifts_per_roster_target(7, true, 2, 10), 6);
}

#[test]
fn leave_excludes_variable_creation_entirely() {
    let store = InMemoryStore::new();
    seed_days(&store, 5);
    let role = RoleId(1);
    store.add_role(Role {
        id: role,
        name: "RN".to_string(),
    });
    let group = day_group(&store, 1, (1..=5).collect());
    let shift = ShiftId(1);
    store.add_shift(Shift {
        id: shift,
        shift_type: "Early".to_string(),
        day_group: Some(group),
    });
    store.add_skill_mix_rule(SkillMixRule {
        id: roster_core::entities::SkillMixRuleId(1),
        name: "one RN".to_string(),
        shift,
        role_counts: vec![(role, 1)],
    });
    let worker = WorkerId(1);
    store.add_worker(Worker {
        id: worker,
        first_name: "Dee".to_string(),
        last_name: "Diaz".to_string(),
        available: true,
        shifts_per_roster: 0,
        max_shifts: false,
        enforce_shifts_per_roster: false,
        enforce_one_shift_per_day: true,
        roles: vec![role],
    });
    let leave_date = start(2030, 1, 9); // third day of the horizon
    store.add_leave(Leave {
        id: roster_core::entities::LeaveId(1),
        worker,
        date: leave_date,
        description: "annual leave".to_string(),
    });

    let snap = snapshot::load(&store, start(2030, 1, 7)).unwrap();
    let built = model::build(&snap).unwrap();

    let slot_on_leave_day = snap
        .timeslots_by_date
        .get(&leave_date)
        .and_then(|slots| slots.first())
        .expect("a timeslot exists on the leave day");
    assert!(!built.primary.contains_key(&(worker, role, slot_on_leave_day.id)));
}

#[test]
fn csv_export_formats_header_and_labels() {
    let store = InMemoryStore::new();
    seed_days(&store, 2);
    let role = RoleId(1);
    store.add_role(Role {
        id: role,
        name: "RN".to_string(),
    });
    let group = day_group(&store, 1, vec![1, 2]);
    let shift = ShiftId(1);
    store.add_shift(Shift {
        id: shift,
        shift_type: "Early".to_string(),
        day_group: Some(group),
    });
    let worker = WorkerId(1);
    store.add_worker(Worker {
        id: worker,
        first_name: "Eve".to_string(),
        last_name: "Ellis".to_string(),
        available: true,
        shifts_per_roster: 1,
        max_shifts: false,
        enforce_shifts_per_roster: false,
        enforce_one_shift_per_day: true,
        roles: vec![role],
    });

    let start_date = start(2030, 1, 7); // a Monday
    let day_one = store.create_timeslot(start_date, shift);
    store.bulk_insert_links(&[(day_one, worker)]);
    store.add_leave(Leave {
        id: roster_core::entities::LeaveId(1),
        worker,
        date: start_date + chrono::Duration::days(1),
        description: "annual leave".to_string(),
    });

    let (dates, rows) = roster_core::reader::roster_by_staff(&store, start_date).unwrap();
    let csv = roster_core::reader::to_csv(&dates, &rows);

    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Staff Member,Roles,Shifts,Mon 07-Jan-2030,Tue 08-Jan-2030"
    );
    let row = lines.next().unwrap();
    assert_eq!(row, "\"Ellis, Eve\",\"RN \",1,Early,annual leave");
}

#[test]
fn staff_request_satisfaction_reports_given_and_not_given() {
    let store = InMemoryStore::new();
    seed_days(&store, 2);
    let role = RoleId(1);
    store.add_role(Role {
        id: role,
        name: "RN".to_string(),
    });
    let group = day_group(&store, 1, vec![1, 2]);
    let early = ShiftId(1);
    let late = ShiftId(2);
    store.add_shift(Shift {
        id: early,
        shift_type: "Early".to_string(),
        day_group: Some(group),
    });
    store.add_shift(Shift {
        id: late,
        shift_type: "Late".to_string(),
        day_group: Some(group),
    });
    let worker = WorkerId(1);
    store.add_worker(Worker {
        id: worker,
        first_name: "Eve".to_string(),
        last_name: "Ellis".to_string(),
        available: true,
        shifts_per_roster: 1,
        max_shifts: false,
        enforce_shifts_per_roster: false,
        enforce_one_shift_per_day: true,
        roles: vec![role],
    });

    let start_date = start(2030, 1, 7);
    let day_one_early = store.create_timeslot(start_date, early);
    store.bulk_insert_links(&[(day_one_early, worker)]);

    store.add_staff_request(roster_core::entities::StaffRequest {
        id: roster_core::entities::StaffRequestId(1),
        worker,
        date: start_date,
        shift: early,
        like: true,
        priority: 1,
    });
    store.add_staff_request(roster_core::entities::StaffRequest {
        id: roster_core::entities::StaffRequestId(2),
        worker,
        date: start_date,
        shift: late,
        like: false,
        priority: 1,
    });

    let outcomes =
        roster_core::reader::staff_request_satisfaction(&store, start_date).unwrap();
    assert_eq!(outcomes.len(), 2);

    let early_outcome = outcomes.iter().find(|o| o.shift == early).unwrap();
    assert!(early_outcome.satisfied);
    assert_eq!(early_outcome.description, "Eve Ellis given Early on 2030-01-07");

    let late_outcome = outcomes.iter().find(|o| o.shift == late).unwrap();
    assert!(late_outcome.satisfied);
    assert_eq!(late_outcome.description, "Eve Ellis not given Late on 2030-01-07");
}
