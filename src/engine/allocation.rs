//! ICU bed allocation
//!
//! A request ends in one of three terminal states:
//!
//! - direct placement into a free ICU bed
//! - a "Tetris" swap: the lowest-risk recovering ICU patient moves to a free
//!   general bed and the incoming patient takes the vacated ICU bed
//! - failure, with bed and patient state exactly as before the call
//!
//! Every precondition is resolved before the first write so a failed
//! request can never leave a half-applied swap behind.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::audit::{DecisionLog, Severity};
use crate::config::AllocationConfig;
use crate::engine::beds::BedInventory;
use crate::models::bed::BedId;
use crate::models::patient::{Location, PatientId, PatientRegistry};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationAction {
    DirectAllocation,
    TetrisSwap,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationFailure {
    /// ICU full and nobody in it is below the recovery threshold
    NoRecoveryCandidate,
    /// A recovery candidate exists but there is nowhere to move them
    NoFreeGeneralBed,
}

impl fmt::Display for AllocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationFailure::NoRecoveryCandidate => {
                write!(f, "All ICU patients are critical - no swap possible")
            }
            AllocationFailure::NoFreeGeneralBed => write!(f, "No general beds available for swap"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub success: bool,
    pub action: AllocationAction,
    /// ICU bed the patient ended up in
    pub bed_id: Option<BedId>,
    /// Patient moved out to make room (swap only)
    pub swapped_patient_id: Option<PatientId>,
    /// General bed the displaced patient moved to (swap only)
    pub displaced_to: Option<BedId>,
    pub failure: Option<AllocationFailure>,
    /// Operator-facing summary
    pub detail: String,
}

impl AllocationResult {
    fn direct(bed_id: BedId, detail: String) -> Self {
        Self {
            success: true,
            action: AllocationAction::DirectAllocation,
            bed_id: Some(bed_id),
            swapped_patient_id: None,
            displaced_to: None,
            failure: None,
            detail,
        }
    }

    fn swap(bed_id: BedId, swapped: PatientId, displaced_to: BedId, detail: String) -> Self {
        Self {
            success: true,
            action: AllocationAction::TetrisSwap,
            bed_id: Some(bed_id),
            swapped_patient_id: Some(swapped),
            displaced_to: Some(displaced_to),
            failure: None,
            detail,
        }
    }

    fn failed(failure: AllocationFailure) -> Self {
        Self {
            success: false,
            action: AllocationAction::Failed,
            bed_id: None,
            swapped_patient_id: None,
            displaced_to: None,
            failure: Some(failure),
            detail: failure.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AllocationEngine {
    recovery_risk_below: u8,
}

impl AllocationEngine {
    pub fn new(config: &AllocationConfig) -> Self {
        Self {
            recovery_risk_below: config.recovery_risk_below,
        }
    }

    pub fn recovery_risk_below(&self) -> u8 {
        self.recovery_risk_below
    }

    /// Find an ICU bed for `patient_id`, swapping out a recovering patient
    /// if the ICU is full.
    ///
    /// Only an unknown patient id is an `Err`; running out of beds is a
    /// failed [`AllocationResult`].
    ///
    /// A full ICU is reported through `tracing` only. The decision log gets
    /// "Tetris Swap" and "ICU Reallocated" when a swap succeeds, or a single
    /// error entry when it cannot.
    pub fn request_icu(
        &self,
        patient_id: &PatientId,
        beds: &mut BedInventory,
        patients: &mut PatientRegistry,
        log: &mut DecisionLog,
    ) -> Result<AllocationResult> {
        let patient = patients.require(patient_id)?;
        let current_bed = patient.bed().cloned();

        if patient.in_icu {
            if let Some(bed_id) = current_bed {
                info!(patient_id = %patient_id, bed_id = %bed_id, "patient already in ICU");
                log.log(
                    "ICU Bed Confirmed",
                    format!("{} already in {}", patient_id, bed_id),
                    Severity::Info,
                );
                let detail = format!("{} already allocated to {}", patient_id, bed_id);
                return Ok(AllocationResult::direct(bed_id, detail));
            }
        }

        if let Some(bed) = beds.find_free_icu() {
            let bed_id = bed.id.clone();
            Self::place(patient_id, &bed_id, current_bed.as_ref(), beds, patients)?;

            info!(patient_id = %patient_id, bed_id = %bed_id, "direct ICU allocation");
            log.log(
                "ICU Bed Assigned",
                format!("{} -> {}", patient_id, bed_id),
                Severity::Info,
            );
            let detail = format!("Direct ICU allocation to {}", bed_id);
            return Ok(AllocationResult::direct(bed_id, detail));
        }

        warn!(patient_id = %patient_id, "ICU full, looking for a recovery candidate");

        let Some((icu_bed, displaced)) = beds
            .find_recovery_candidate(patients, self.recovery_risk_below)
            .and_then(|b| Some((b.id.clone(), b.occupant.clone()?)))
        else {
            return Ok(self.fail(patient_id, AllocationFailure::NoRecoveryCandidate, log));
        };

        let Some(general_bed) = beds.find_free_general().map(|b| b.id.clone()) else {
            return Ok(self.fail(patient_id, AllocationFailure::NoFreeGeneralBed, log));
        };

        let displaced_risk = patients.require(&displaced)?.risk;
        log.log(
            "Tetris Swap",
            format!(
                "Moving {} (Risk:{}%) to General Ward",
                displaced, displaced_risk
            ),
            Severity::Warning,
        );

        // preconditions all hold; apply both moves
        beds.set_occupant(&general_bed, Some(displaced.clone()))?;
        {
            let moved = patients.require_mut(&displaced)?;
            moved.location = Location::Bed(general_bed.clone());
            moved.in_icu = false;
        }
        Self::place(patient_id, &icu_bed, current_bed.as_ref(), beds, patients)?;

        warn!(
            patient_id = %patient_id,
            bed_id = %icu_bed,
            displaced = %displaced,
            displaced_to = %general_bed,
            "tetris swap completed"
        );
        log.log(
            "ICU Reallocated",
            format!("{} -> {}", patient_id, icu_bed),
            Severity::Info,
        );

        let detail = format!(
            "Swapped {} to {}, {} to ICU",
            displaced, general_bed, patient_id
        );
        Ok(AllocationResult::swap(icu_bed, displaced, general_bed, detail))
    }

    /// Move a patient into an ICU bed, releasing the bed they came from.
    fn place(
        patient_id: &PatientId,
        icu_bed: &BedId,
        previous_bed: Option<&BedId>,
        beds: &mut BedInventory,
        patients: &mut PatientRegistry,
    ) -> Result<()> {
        if let Some(previous) = previous_bed {
            beds.set_occupant(previous, None)?;
        }
        beds.set_occupant(icu_bed, Some(patient_id.clone()))?;

        let patient = patients.require_mut(patient_id)?;
        patient.location = Location::Bed(icu_bed.clone());
        patient.in_icu = true;
        Ok(())
    }

    fn fail(
        &self,
        patient_id: &PatientId,
        failure: AllocationFailure,
        log: &mut DecisionLog,
    ) -> AllocationResult {
        error!(patient_id = %patient_id, reason = %failure, "ICU allocation failed");
        let (action, reason) = match failure {
            AllocationFailure::NoRecoveryCandidate => {
                ("No Recovery Candidates", "All ICU patients are critical")
            }
            AllocationFailure::NoFreeGeneralBed => ("No General Beds", "Cannot perform swap"),
        };
        log.log(action, format!("{} for {}", reason, patient_id), Severity::Error);
        AllocationResult::failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bed::Bed;
    use crate::models::patient::Patient;

    struct Ward {
        beds: BedInventory,
        patients: PatientRegistry,
        log: DecisionLog,
        engine: AllocationEngine,
    }

    impl Ward {
        fn new(icu: usize, general: usize) -> Self {
            let mut beds = BedInventory::new();
            for i in 1..=icu {
                beds.add(Bed::icu(format!("ICU-{i}"))).unwrap();
            }
            for i in 1..=general {
                beds.add(Bed::general(format!("GEN-{i}"))).unwrap();
            }
            Self {
                beds,
                patients: PatientRegistry::new(),
                log: DecisionLog::new(),
                engine: AllocationEngine::new(&AllocationConfig::default()),
            }
        }

        fn occupy(&mut self, name: &str, bed: &str, risk: u8) {
            let bed_id = BedId::from(bed);
            let mut p = Patient::new(name, Location::Bed(bed_id.clone()), true);
            p.risk = risk;
            p.window.push_back(risk);
            p.in_icu = self.beds.get(&bed_id).unwrap().is_icu();
            let id = self.patients.admit(p).unwrap();
            self.beds.set_occupant(&bed_id, Some(id)).unwrap();
        }

        fn arrive(&mut self, name: &str) -> PatientId {
            self.patients
                .admit(Patient::new(name, Location::ward("Emergency"), true))
                .unwrap()
        }

        fn request(&mut self, id: &PatientId) -> AllocationResult {
            self.engine
                .request_icu(id, &mut self.beds, &mut self.patients, &mut self.log)
                .unwrap()
        }

        fn bed_state(&self) -> Vec<Bed> {
            self.beds.iter().cloned().collect()
        }

        fn patient_state(&self) -> Vec<Patient> {
            self.patients.iter().cloned().collect()
        }
    }

    #[test]
    fn direct_allocation_takes_first_free_icu() {
        let mut ward = Ward::new(3, 2);
        ward.occupy("A", "ICU-1", 90);
        ward.occupy("B", "ICU-3", 90);
        let z = ward.arrive("Z");

        let result = ward.request(&z);
        assert!(result.success);
        assert_eq!(result.action, AllocationAction::DirectAllocation);
        assert_eq!(result.bed_id, Some(BedId::from("ICU-2")));

        let z = ward.patients.get(&z).unwrap();
        assert!(z.in_icu);
        assert_eq!(z.location, Location::Bed(BedId::from("ICU-2")));
        assert_eq!(ward.log.len(), 1);
        assert_eq!(ward.log.recent(1)[0].severity(), Severity::Info);
        ward.beds.verify_consistency(&ward.patients).unwrap();
    }

    #[test]
    fn swap_moves_lowest_risk_recovering_patient() {
        let mut ward = Ward::new(2, 1);
        ward.occupy("X", "ICU-1", 35);
        ward.occupy("Y", "ICU-2", 20);
        let z = ward.arrive("Z");

        let result = ward.request(&z);
        assert_eq!(result.action, AllocationAction::TetrisSwap);
        assert_eq!(result.bed_id, Some(BedId::from("ICU-2")));
        assert_eq!(result.swapped_patient_id, Some(PatientId::from("Y")));
        assert_eq!(result.displaced_to, Some(BedId::from("GEN-1")));

        let y = ward.patients.get(&PatientId::from("Y")).unwrap();
        assert!(!y.in_icu);
        assert_eq!(y.location, Location::Bed(BedId::from("GEN-1")));

        let severities: Vec<_> = ward.log.iter().map(|e| e.severity()).collect();
        assert_eq!(severities, vec![Severity::Warning, Severity::Info]);
        ward.beds.verify_consistency(&ward.patients).unwrap();
    }

    #[test]
    fn all_critical_fails_without_mutation() {
        let mut ward = Ward::new(2, 2);
        ward.occupy("A", "ICU-1", 40);
        ward.occupy("B", "ICU-2", 88);
        let z = ward.arrive("Z");
        let beds_before = ward.bed_state();
        let patients_before = ward.patient_state();

        let result = ward.request(&z);
        assert!(!result.success);
        assert_eq!(result.failure, Some(AllocationFailure::NoRecoveryCandidate));
        assert_eq!(result.detail, "All ICU patients are critical - no swap possible");
        assert_eq!(ward.bed_state(), beds_before);
        assert_eq!(ward.patient_state(), patients_before);
        assert_eq!(ward.log.len(), 1);
        assert_eq!(ward.log.recent(1)[0].severity(), Severity::Error);
    }

    #[test]
    fn no_general_bed_fails_without_mutation() {
        let mut ward = Ward::new(1, 1);
        ward.occupy("A", "ICU-1", 10);
        ward.occupy("B", "GEN-1", 10);
        let z = ward.arrive("Z");
        let beds_before = ward.bed_state();
        let patients_before = ward.patient_state();

        let result = ward.request(&z);
        assert_eq!(result.failure, Some(AllocationFailure::NoFreeGeneralBed));
        assert_eq!(result.detail, "No general beds available for swap");
        assert_eq!(ward.bed_state(), beds_before);
        assert_eq!(ward.patient_state(), patients_before);
        assert_eq!(ward.log.len(), 1);
        assert_eq!(ward.log.recent(1)[0].action(), "No General Beds");
    }

    #[test]
    fn already_in_icu_is_confirmed_in_place() {
        let mut ward = Ward::new(2, 1);
        ward.occupy("A", "ICU-2", 90);
        let beds_before = ward.bed_state();

        let result = ward.request(&PatientId::from("A"));
        assert_eq!(result.action, AllocationAction::DirectAllocation);
        assert_eq!(result.bed_id, Some(BedId::from("ICU-2")));
        assert_eq!(ward.bed_state(), beds_before);
        assert_eq!(ward.log.len(), 1);
    }

    #[test]
    fn general_bed_is_released_on_upgrade() {
        let mut ward = Ward::new(1, 1);
        ward.occupy("A", "ICU-1", 20);
        ward.occupy("B", "GEN-1", 85);

        // B's own general bed does not count as free for the swap
        let result = ward.request(&PatientId::from("B"));
        assert_eq!(result.failure, Some(AllocationFailure::NoFreeGeneralBed));

        let mut ward = Ward::new(2, 1);
        ward.occupy("B", "GEN-1", 85);
        let result = ward.request(&PatientId::from("B"));
        assert_eq!(result.bed_id, Some(BedId::from("ICU-1")));
        assert!(ward.beds.get(&BedId::from("GEN-1")).unwrap().is_free());
        ward.beds.verify_consistency(&ward.patients).unwrap();
    }

    #[test]
    fn unknown_patient_is_error() {
        let mut ward = Ward::new(1, 1);
        let err = ward
            .engine
            .request_icu(
                &PatientId::from("nobody"),
                &mut ward.beds,
                &mut ward.patients,
                &mut ward.log,
            )
            .unwrap_err();
        assert!(matches!(err, crate::VitalFlowError::UnknownPatient(_)));
        assert!(ward.log.is_empty());
    }
}
