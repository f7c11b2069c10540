//! End-to-end scenarios on an explicitly constructed hospital

use std::collections::VecDeque;
use std::io::Write;

use mockall::mock;
use vitalflow::config::load_config_from;
use vitalflow::{
    calculate_eta, AllocationAction, AllocationFailure, Bed, BedId, Config, Hospital, PatientId,
    RiskTier, SampleSource, Severity, Staff,
};

mock! {
    pub Sensor {}
    impl SampleSource for Sensor {
        fn next_sample(&mut self, critical_hint: bool) -> u8;
    }
}

/// Plays back a fixed list of samples, repeating the last one
fn scripted(samples: &[u8]) -> MockSensor {
    let mut queue: VecDeque<u8> = samples.iter().copied().collect();
    let mut last = samples.last().copied().unwrap_or(50);
    let mut sensor = MockSensor::new();
    sensor.expect_next_sample().returning(move |_| {
        if let Some(next) = queue.pop_front() {
            last = next;
        }
        last
    });
    sensor
}

fn demo(samples: &[u8]) -> Hospital<MockSensor> {
    Hospital::demo(Config::default(), scripted(samples)).unwrap()
}

fn actions(hospital: &Hospital<MockSensor>) -> Vec<String> {
    hospital
        .decision_log()
        .iter()
        .map(|e| e.action().to_string())
        .collect()
}

#[test]
fn direct_allocation_to_the_free_icu_bed() {
    let mut hospital = demo(&[50]);
    hospital.admit_to_bed("A", &BedId::from("ICU-1"), true, 85).unwrap();
    hospital.admit_to_bed("B", &BedId::from("ICU-3"), true, 90).unwrap();
    let p = hospital.admit("P", "Emergency", true).unwrap();

    let result = hospital.request_icu(&p).unwrap();

    assert!(result.success);
    assert_eq!(result.action, AllocationAction::DirectAllocation);
    assert_eq!(result.bed_id, Some(BedId::from("ICU-2")));
    hospital.check_consistency().unwrap();
}

#[test]
fn swap_picks_lowest_risk_recovering_patient() {
    let mut hospital = Hospital::new(Config::default(), scripted(&[50]));
    hospital.add_bed(Bed::icu("A")).unwrap();
    hospital.add_bed(Bed::icu("B")).unwrap();
    hospital.add_bed(Bed::general("G")).unwrap();
    let x = hospital.admit_to_bed("X", &BedId::from("A"), true, 35).unwrap();
    let y = hospital.admit_to_bed("Y", &BedId::from("B"), true, 20).unwrap();
    let z = hospital.admit("Z", "Emergency", true).unwrap();

    let result = hospital.request_icu(&z).unwrap();

    assert_eq!(result.action, AllocationAction::TetrisSwap);
    assert_eq!(result.bed_id, Some(BedId::from("B")));
    assert_eq!(result.swapped_patient_id, Some(y.clone()));

    let y = hospital.patient(&y).unwrap();
    assert!(!y.in_icu);
    assert_eq!(y.bed(), Some(&BedId::from("G")));
    let z = hospital.patient(&z).unwrap();
    assert!(z.in_icu);
    assert_eq!(z.bed(), Some(&BedId::from("B")));
    assert_eq!(hospital.patient(&x).unwrap().bed(), Some(&BedId::from("A")));
    hospital.check_consistency().unwrap();
}

#[test]
fn total_failure_leaves_state_untouched() {
    let mut hospital = demo(&[50]);
    hospital.admit_to_bed("A", &BedId::from("ICU-1"), true, 40).unwrap();
    hospital.admit_to_bed("B", &BedId::from("ICU-2"), true, 60).unwrap();
    hospital.admit_to_bed("C", &BedId::from("ICU-3"), true, 95).unwrap();
    let p = hospital.admit("P", "Emergency", true).unwrap();
    let before = hospital.snapshot();

    let result = hospital.request_icu(&p).unwrap();

    assert!(!result.success);
    assert_eq!(result.action, AllocationAction::Failed);
    assert_eq!(result.failure, Some(AllocationFailure::NoRecoveryCandidate));
    let after = hospital.snapshot();
    assert_eq!(after.beds, before.beds);
    assert_eq!(after.patients, before.patients);
    assert_eq!(
        hospital.recent_decisions(1)[0].severity(),
        Severity::Error
    );
}

#[test]
fn eta_contract() {
    assert_eq!(calculate_eta(40.0), 60);
    assert_eq!(calculate_eta(12.0), 18);
}

#[test]
fn escalation_threshold_is_strict() {
    // window [75] -> 75, then [75, 77] -> 76
    let mut hospital = demo(&[75, 77]);
    let id = hospital.admit("Kiran", "Ward A", true).unwrap();

    let first = hospital.monitor(&id, true).unwrap();
    assert_eq!(first.update.risk, 75);
    assert_eq!(first.evaluation.tier, RiskTier::Warning);
    assert!(first.escalation.is_none());

    let second = hospital.monitor(&id, true).unwrap();
    assert_eq!(second.update.risk, 76);
    assert_eq!(second.evaluation.tier, RiskTier::Critical);
    let escalation = second.escalation.unwrap();
    assert!(escalation.allocation.success);
    assert!(hospital.patient(&id).unwrap().in_icu);
}

#[test]
fn deterioration_in_full_icu_triggers_swap() {
    let mut hospital = demo(&[90]);
    hospital.admit_to_bed("Suresh", &BedId::from("ICU-1"), true, 35).unwrap();
    hospital.admit_to_bed("Anita", &BedId::from("ICU-2"), true, 88).unwrap();
    hospital.admit_to_bed("Mohan", &BedId::from("ICU-3"), true, 92).unwrap();
    let ramesh = hospital.admit("Ramesh", "Ward A", true).unwrap();

    let tick = hospital.monitor(&ramesh, true).unwrap();
    let escalation = tick.escalation.unwrap();

    assert_eq!(escalation.responders.doctor.name, "Dr. Reddy");
    assert_eq!(escalation.responders.nurse.name, "Anjali");
    assert_eq!(escalation.allocation.action, AllocationAction::TetrisSwap);
    assert_eq!(escalation.allocation.bed_id, Some(BedId::from("ICU-1")));
    assert_eq!(
        escalation.allocation.displaced_to,
        Some(BedId::from("GEN-1"))
    );
    assert!(actions(&hospital).ends_with(&[
        "Critical Vitals".to_string(),
        "Escalation Triggered".to_string(),
        "Doctor Assigned".to_string(),
        "Nurse Assigned".to_string(),
        "Tetris Swap".to_string(),
        "ICU Reallocated".to_string(),
    ]));
    hospital.check_consistency().unwrap();
}

#[test]
fn ambulance_heart_attack_stages_and_preallocates() {
    let mut hospital = demo(&[88]);
    let vijay = hospital.admit("Vijay", "Ambulance", true).unwrap();

    let intake = hospital
        .handle_ambulance_call(&vijay, "heart_attack", 12.0)
        .unwrap();

    assert_eq!(intake.eta_minutes, 18);
    assert_eq!(intake.field_vitals.risk, 88);
    assert!(intake.protocol.is_some());
    assert_eq!(
        intake.icu_allocation.as_ref().unwrap().bed_id,
        Some(BedId::from("ICU-1"))
    );

    assert_eq!(
        actions(&hospital),
        vec![
            "Patient Admitted",
            "Ambulance Incoming",
            "Ambulance Vitals Transmitted",
            "Emergency Protocol Loaded",
            "Trolley Ready",
            "Medicine Staged",
            "Medicine Staged",
            "Medicine Staged",
            "Medicine Staged",
            "ICU Bed Assigned",
        ]
    );
    let log = hospital.decision_log();
    let entries: Vec<_> = log.iter().collect();
    assert_eq!(entries[1].severity(), Severity::Critical);
    assert_eq!(entries[2].severity(), Severity::Warning);
    assert_eq!(entries[4].reason(), "Prepare Cardiac Crash Trolley");
    assert_eq!(entries[5].reason(), "Aspirin 325mg");
}

#[test]
fn ambulance_unknown_condition_skips_allocation() {
    let mut hospital = demo(&[60]);
    let id = hospital.admit("Neha", "Ambulance", true).unwrap();

    let intake = hospital.handle_ambulance_call(&id, "snakebite", 8.0).unwrap();

    assert!(intake.protocol.is_none());
    assert!(intake.icu_allocation.is_none());
    assert!(!hospital.patient(&id).unwrap().in_icu);
    assert_eq!(hospital.occupancy().icu_occupied, 0);
    // field vitals at 60 are logged as info
    let entries: Vec<_> = hospital.decision_log().iter().collect();
    assert_eq!(entries[2].severity(), Severity::Info);
    assert_eq!(entries.last().unwrap().action(), "Protocol Lookup Failed");
}

#[test]
fn fall_event_dispatches_least_loaded_pair() {
    let mut hospital = demo(&[50]);

    let response = hospital
        .handle_fall_event("General Ward - Bed 7", 2)
        .unwrap()
        .unwrap();

    assert_eq!(response.responders.doctor.name, "Dr. Reddy");
    assert_eq!(response.responders.nurse.name, "Anjali");
    assert_eq!(
        actions(&hospital),
        vec!["Fall Detected", "Pose Analysis", "Emergency Response"]
    );
    assert_eq!(
        hospital.recent_decisions(1)[0].reason(),
        "Dr. Reddy and Anjali dispatched"
    );
}

#[test]
fn escalation_without_staff_is_an_error() {
    let mut hospital = Hospital::new(Config::default(), scripted(&[95]));
    hospital.add_bed(Bed::icu("ICU-1")).unwrap();
    hospital.add_staff(Staff::nurse("Priya", 0));
    let id = hospital.admit("Kiran", "Ward A", true).unwrap();

    assert!(hospital.monitor(&id, true).is_err());
    assert!(!hospital.patient(&id).unwrap().in_icu);
    assert!(hospital.beds().find_free_icu().is_some());
}

#[test]
fn configured_recovery_threshold_is_respected() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[allocation]\nrecovery_risk_below = 30").unwrap();
    let config = load_config_from(file.path()).unwrap();

    let mut hospital = Hospital::new(config, scripted(&[50]));
    hospital.add_bed(Bed::icu("ICU-1")).unwrap();
    hospital.add_bed(Bed::general("GEN-1")).unwrap();
    hospital.admit_to_bed("X", &BedId::from("ICU-1"), true, 35).unwrap();
    let z = hospital.admit("Z", "Emergency", true).unwrap();

    let result = hospital.request_icu(&z).unwrap();
    assert_eq!(result.failure, Some(AllocationFailure::NoRecoveryCandidate));
}

#[test]
fn decision_log_chain_survives_a_full_shift() {
    let mut hospital = demo(&[40, 80, 90, 95]);
    hospital.admit_to_bed("Suresh", &BedId::from("ICU-1"), true, 30).unwrap();
    let ramesh = hospital.admit("Ramesh", "Ward A", true).unwrap();
    for _ in 0..4 {
        hospital.monitor(&ramesh, true).unwrap();
    }
    let vijay = hospital.admit("Vijay", "Ambulance", true).unwrap();
    hospital.handle_ambulance_call(&vijay, "stroke", 20.0).unwrap();
    hospital.handle_fall_event("Corridor", 5).unwrap();

    assert!(hospital.decision_log().verify_integrity());
    hospital.check_consistency().unwrap();
    assert!(hospital.patient(&PatientId::from("Ramesh")).unwrap().window.len() <= 5);
}
