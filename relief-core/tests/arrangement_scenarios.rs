use relief_core::{
    ArrangementEngine, AssignmentStatus, Category, CustomRule, InMemoryLedger, SubjectCatalog,
    SubjectMatch, TeacherProfile, Timetable, UnassignedReason, WorkloadLedger,
};
use std::collections::{BTreeMap, BTreeSet};

fn replacement_id(r: &relief_core::AssignmentResult) -> Option<&str> {
    r.replacement.as_ref().map(|rep| rep.teacher_id.as_str())
}

/// A busier school day: 12 teachers over 6 periods, each free in a
/// different pair of periods.
fn school_day() -> Timetable {
    let rows = [
        ("P01", "Anita", "PRT", "Maths, EVS"),
        ("P02", "Bharat", "PRT", "English"),
        ("P03", "Chitra", "P.R.T", "Hindi"),
        ("P04", "Dinesh", "PRT", "Maths"),
        ("T01", "Esha", "TGT", "Maths"),
        ("T02", "Farhan", "TGT", "Science"),
        ("T03", "Gita", "T.G.T", "Hindi, Sanskrit"),
        ("T04", "Harish", "TGT", "English"),
        ("G01", "Indu", "PGT", "Physics"),
        ("G02", "Jatin", "PGT", "Mathematics"),
        ("G03", "Kavya", "PGT", "Accountancy"),
        ("G04", "Lalit", "PGT", "English"),
    ];
    let classes = |cat: &str, subject: &str, p: u8| -> String {
        let grade = match cat {
            "PRT" | "P.R.T" => ["I", "II", "III", "IV", "V"][usize::from(p) % 5],
            "PGT" => ["XI", "XII"][usize::from(p) % 2],
            _ => ["VI", "VII", "VIII", "IX", "X"][usize::from(p) % 5],
        };
        format!("{grade}-A {subject}")
    };

    let teachers = rows
        .iter()
        .enumerate()
        .map(|(i, (id, name, cat, subjects))| {
            let first = subjects.split(',').next().unwrap_or_default().trim().to_uppercase();
            let mut t = TeacherProfile::new(*id, *name, cat).with_subjects(subjects);
            for p in 1..=6u8 {
                let free = (usize::from(p) + i) % 3 == 0;
                if !free {
                    t = t.with_period(p, &classes(*cat, first.as_str(), p));
                }
            }
            t
        })
        .collect();
    Timetable::new(6, teachers)
}

#[test]
fn scenario_same_category_same_subject() {
    let tt = Timetable::new(
        7,
        vec![
            TeacherProfile::new("P1", "Ravi", "PRT")
                .with_subjects("Maths")
                .with_period(2, "III MATH"),
            TeacherProfile::new("P2", "Sita", "PRT").with_subjects("Maths"),
        ],
    );
    let catalog = SubjectCatalog::standard();
    let results = ArrangementEngine::new(&catalog, &tt, InMemoryLedger::new())
        .run(&["P1"])
        .unwrap();

    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.period, Some(2));
    assert_eq!(replacement_id(r), Some("P2"));
    assert_eq!(r.status, AssignmentStatus::Assigned);
    assert_eq!(r.quality, "Ideal - Same Category, Same Subject");
}

#[test]
fn scenario_second_absentee_falls_through_to_next_tier() {
    let tt = Timetable::new(
        7,
        vec![
            TeacherProfile::new("P1", "Ravi", "PRT").with_subjects("Maths").with_period(3, "III MATH"),
            TeacherProfile::new("P2", "Rekha", "PRT").with_subjects("Maths").with_period(3, "IV MATH"),
            TeacherProfile::new("S1", "Sita", "PRT").with_subjects("Maths"),
            TeacherProfile::new("S2", "Uma", "PRT").with_subjects("English"),
        ],
    );
    let catalog = SubjectCatalog::standard();
    let results = ArrangementEngine::new(&catalog, &tt, InMemoryLedger::new())
        .run(&["P1", "P2"])
        .unwrap();

    assert_eq!(replacement_id(&results[0]), Some("S1"));
    assert_eq!(replacement_id(&results[1]), Some("S2"));
    assert_eq!(results[1].quality, "Acceptable - Same Category, Any Subject");
}

#[test]
fn scenario_second_absentee_unassigned_when_pool_runs_dry() {
    let tt = Timetable::new(
        7,
        vec![
            TeacherProfile::new("P1", "Ravi", "PRT").with_subjects("Maths").with_period(3, "III MATH"),
            TeacherProfile::new("P2", "Rekha", "PRT").with_subjects("Maths").with_period(3, "IV MATH"),
            TeacherProfile::new("S1", "Sita", "PRT").with_subjects("Maths"),
        ],
    );
    let catalog = SubjectCatalog::standard();
    let results = ArrangementEngine::new(&catalog, &tt, InMemoryLedger::new())
        .run(&["P1", "P2"])
        .unwrap();

    assert_eq!(replacement_id(&results[0]), Some("S1"));
    assert_eq!(results[1].status, AssignmentStatus::Unassigned);
    assert_eq!(results[1].reason, Some(UnassignedReason::NoFreeTeachers));
}

#[test]
fn scenario_absentee_missing_from_timetable() {
    let tt = school_day();
    let catalog = SubjectCatalog::standard();
    let results = ArrangementEngine::new(&catalog, &tt, InMemoryLedger::new())
        .run(&["NOPE"])
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].absent_teacher_id, "NOPE");
    assert_eq!(results[0].quality, "Teacher Not in Schedule");
    assert!(results[0].replacement.is_none());
}

#[test]
fn scenario_custom_rule_overrides_builtin_order() {
    let tt = Timetable::new(
        7,
        vec![
            TeacherProfile::new("T1", "Vikas", "TGT").with_subjects("Maths").with_period(1, "VII MATH"),
            TeacherProfile::new("T2", "Wasim", "TGT").with_subjects("Maths"),
            TeacherProfile::new("G1", "Yamini", "PGT").with_subjects("Mathematics"),
        ],
    );
    let rules = vec![CustomRule {
        name: "TGT covered by PGT".into(),
        absent_categories: vec![Category::Graduate],
        candidate_category: Category::PostGraduate,
        subject_match: SubjectMatch::Exact,
    }];
    let catalog = SubjectCatalog::standard();
    let results = ArrangementEngine::new(&catalog, &tt, InMemoryLedger::new())
        .with_custom_rules(&rules)
        .run(&["T1"])
        .unwrap();

    assert_eq!(replacement_id(&results[0]), Some("G1"));
    assert_eq!(results[0].quality, "TGT covered by PGT");
}

/// A PRT absent in period 1, with a middle-school Maths TGT and an English
/// PRT as the only free teachers.
fn primary_absence_with_middle_tgt_free(grade: &str) -> Timetable {
    Timetable::new(
        2,
        vec![
            TeacherProfile::new("P1", "Ravi", "PRT")
                .with_subjects("Maths")
                .with_period(1, &format!("{grade} MATH")),
            TeacherProfile::new("T1", "Vikas", "TGT").with_subjects("Maths").with_period(2, "VII MATH"),
            TeacherProfile::new("P2", "Uma", "PRT").with_subjects("English"),
        ],
    )
}

#[test]
fn scenario_adjacent_class_tier_skipped_below_grade_five() {
    let tt = primary_absence_with_middle_tgt_free("III");
    let catalog = SubjectCatalog::standard();
    let results = ArrangementEngine::new(&catalog, &tt, InMemoryLedger::new())
        .run(&["P1"])
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(replacement_id(&results[0]), Some("P2"));
    assert_eq!(results[0].quality, "Acceptable - Same Category, Any Subject");
}

#[test]
fn scenario_adjacent_class_tier_used_for_grade_five() {
    let tt = primary_absence_with_middle_tgt_free("V");
    let catalog = SubjectCatalog::standard();
    let results = ArrangementEngine::new(&catalog, &tt, InMemoryLedger::new())
        .run(&["P1"])
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(replacement_id(&results[0]), Some("T1"));
    assert_eq!(results[0].quality, "Good - TGT (Class 6-8) for Adjacent Class");
}

#[test]
fn scenario_fully_free_teacher_outranks_busier_history() {
    let tt = Timetable::new(
        7,
        vec![
            TeacherProfile::new("P1", "Ravi", "PRT").with_subjects("Maths").with_period(1, "II MATH"),
            TeacherProfile::new("A", "Aarti", "PRT").with_subjects("Maths"),
            TeacherProfile::new("B", "Zubin", "PRT").with_subjects("Maths"),
        ],
    );
    let catalog = SubjectCatalog::standard();
    let mut ledger = InMemoryLedger::new().with_count("A", 1);
    let results = ArrangementEngine::new(&catalog, &tt, &mut ledger).run(&["P1"]).unwrap();
    assert_eq!(replacement_id(&results[0]), Some("B"));

    // Daily load dominates history.
    let tt = Timetable::new(
        7,
        vec![
            TeacherProfile::new("P1", "Ravi", "PRT").with_subjects("Maths").with_period(1, "II MATH"),
            TeacherProfile::new("A", "Aarti", "PRT").with_subjects("Maths").with_period(2, "I MATH"),
            TeacherProfile::new("B", "Zubin", "PRT").with_subjects("Maths"),
        ],
    );
    let mut ledger = InMemoryLedger::new().with_count("B", 5);
    let results = ArrangementEngine::new(&catalog, &tt, &mut ledger).run(&["P1"]).unwrap();
    assert_eq!(replacement_id(&results[0]), Some("B"));
}

#[test]
fn no_teacher_is_booked_twice_in_a_period() {
    let tt = school_day();
    let catalog = SubjectCatalog::standard();
    let absent = ["P01", "T02", "G01", "P03", "T04"];
    let results = ArrangementEngine::new(&catalog, &tt, InMemoryLedger::new())
        .run(&absent)
        .unwrap();

    let mut seen: BTreeSet<(u8, String)> = BTreeSet::new();
    for r in &results {
        if let (Some(p), Some(id)) = (r.period, replacement_id(r)) {
            assert!(seen.insert((p, id.to_string())), "{id} booked twice in period {p}");
        }
    }
    assert!(!seen.is_empty());
}

#[test]
fn absentees_never_cover_for_anyone() {
    let tt = school_day();
    let catalog = SubjectCatalog::standard();
    let absent = ["P01", "T02", "G01", "P03", "T04"];
    let results = ArrangementEngine::new(&catalog, &tt, InMemoryLedger::new())
        .run(&absent)
        .unwrap();

    for r in &results {
        if let Some(id) = replacement_id(r) {
            assert!(!absent.contains(&id), "absent teacher {id} was assigned");
        }
    }
}

#[test]
fn identical_inputs_give_identical_results() {
    let tt = school_day();
    let catalog = SubjectCatalog::standard();
    let absent = ["T01", "P02", "G02"];
    let ledger = InMemoryLedger::new().with_count("P04", 2).with_count("G03", 1);

    let first = ArrangementEngine::new(&catalog, &tt, ledger.clone()).run(&absent).unwrap();
    let second = ArrangementEngine::new(&catalog, &tt, ledger).run(&absent).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn each_assignment_adds_exactly_one_to_the_replacement() {
    let tt = school_day();
    let catalog = SubjectCatalog::standard();
    let before = InMemoryLedger::new().with_count("T03", 4);
    let mut after = before.clone();
    let results = ArrangementEngine::new(&catalog, &tt, &mut after)
        .run(&["P01", "T02", "G01"])
        .unwrap();

    let mut expected: BTreeMap<String, u32> = BTreeMap::new();
    for id in results.iter().filter_map(replacement_id) {
        *expected.entry(id.to_string()).or_default() += 1;
    }
    for t in &tt.teachers {
        let delta = after.count(&t.teacher_id) - before.count(&t.teacher_id);
        assert_eq!(delta, expected.get(&t.teacher_id).copied().unwrap_or(0), "{}", t.teacher_id);
    }
}

#[test]
fn empty_pools_yield_unassigned_results() {
    // Nobody is free in period 1. In period 2 the librarian is free but
    // belongs to no tier, so only the fallback PGT tier finds anyone.
    let tt = Timetable::new(
        2,
        vec![
            TeacherProfile::new("G1", "Indu", "PGT")
                .with_subjects("Physics")
                .with_period(1, "XI PHYSICS")
                .with_period(2, "XII PHYSICS"),
            TeacherProfile::new("G2", "Jatin", "PGT").with_subjects("Maths").with_period(1, "XI MATH"),
            TeacherProfile::new("L1", "Lata", "LIB").with_period(1, "LIBRARY"),
        ],
    );
    let catalog = SubjectCatalog::standard();
    let mut ledger = InMemoryLedger::new();
    let results = ArrangementEngine::new(&catalog, &tt, &mut ledger).run(&["G1"]).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].reason, Some(UnassignedReason::NoFreeTeachers));
    assert_eq!(replacement_id(&results[1]), Some("G2"));
    assert_eq!(results[1].quality, "Fallback - Any free PGT teacher");
    assert_eq!(ledger.historical(&["G2"]).unwrap()["G2"], 1);
}

#[test]
fn exhausted_pipeline_reports_no_suitable_replacement() {
    let tt = Timetable::new(
        1,
        vec![
            TeacherProfile::new("P1", "Ravi", "PRT").with_subjects("Maths").with_period(1, "II MATH"),
            TeacherProfile::new("G1", "Indu", "PGT").with_subjects("Physics"),
        ],
    );
    let catalog = SubjectCatalog::standard();
    let results = ArrangementEngine::new(&catalog, &tt, InMemoryLedger::new())
        .run(&["P1"])
        .unwrap();
    assert_eq!(results[0].reason, Some(UnassignedReason::NoSuitableReplacement));
    assert_eq!(results[0].quality, "No Suitable Replacement");
}
