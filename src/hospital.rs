//! Hospital context
//!
//! Owns every piece of mutable state (patients, beds, staff, decision log)
//! and the engine components that act on it. Each public operation runs to
//! completion before returning; callers construct as many isolated
//! instances as they need.

use serde::Serialize;
use tracing::{info, instrument};

use crate::audit::{DecisionLog, DecisionLogEntry, Severity};
use crate::config::Config;
use crate::engine::allocation::{AllocationEngine, AllocationResult};
use crate::engine::beds::{BedInventory, OccupancyStats};
use crate::engine::escalation::{Escalation, EscalationPolicy, Evaluation};
use crate::engine::intake::{eta_minutes, is_fall, AmbulanceIntake, FallResponse};
use crate::engine::protocols::EmergencyProtocol;
use crate::engine::roster::StaffRoster;
use crate::engine::vitals::{RandomSampleSource, RiskUpdate, SampleSource, VitalsTracker};
use crate::models::bed::{Bed, BedId};
use crate::models::patient::{Location, Patient, PatientId, PatientRegistry};
use crate::models::staff::Staff;
use crate::{Result, VitalFlowError};

/// One monitoring tick for a patient
#[derive(Debug, Clone, Serialize)]
pub struct Monitoring {
    pub update: RiskUpdate,
    pub evaluation: Evaluation,
    /// Present when the evaluation was critical
    pub escalation: Option<Escalation>,
}

pub struct Hospital<S = RandomSampleSource> {
    pub(crate) config: Config,
    pub(crate) patients: PatientRegistry,
    pub(crate) beds: BedInventory,
    pub(crate) roster: StaffRoster,
    pub(crate) log: DecisionLog,
    pub(crate) tracker: VitalsTracker<S>,
    pub(crate) policy: EscalationPolicy,
    pub(crate) allocator: AllocationEngine,
}

impl<S: SampleSource> Hospital<S> {
    /// Empty hospital: no beds, no staff, no patients
    pub fn new(config: Config, sample_source: S) -> Self {
        let tracker = VitalsTracker::new(sample_source, &config.vitals);
        let policy = EscalationPolicy::new(&config.escalation);
        let allocator = AllocationEngine::new(&config.allocation);
        Self {
            config,
            patients: PatientRegistry::new(),
            beds: BedInventory::new(),
            roster: StaffRoster::new(),
            log: DecisionLog::new(),
            tracker,
            policy,
            allocator,
        }
    }

    /// Three ICU beds, four general beds and the standard duty roster
    pub fn demo(config: Config, sample_source: S) -> Result<Self> {
        let mut hospital = Self::new(config, sample_source);
        for i in 1..=3 {
            hospital.add_bed(Bed::icu(format!("ICU-{i}")))?;
        }
        for i in 1..=4 {
            hospital.add_bed(Bed::general(format!("GEN-{i}")))?;
        }

        for doctor in [
            Staff::doctor("Dr. Sharma", "Cardiology", 2),
            Staff::doctor("Dr. Patel", "Emergency Medicine", 3),
            Staff::doctor("Dr. Reddy", "Internal Medicine", 1),
        ] {
            hospital.add_staff(doctor);
        }
        for nurse in [
            Staff::nurse("Priya", 4),
            Staff::nurse("Anjali", 3),
            Staff::nurse("Kavita", 5),
        ] {
            hospital.add_staff(nurse);
        }

        info!(beds = hospital.beds.len(), "demo hospital ready");
        Ok(hospital)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn patients(&self) -> &PatientRegistry {
        &self.patients
    }

    pub fn patient(&self, id: &PatientId) -> Option<&Patient> {
        self.patients.get(id)
    }

    pub fn beds(&self) -> &BedInventory {
        &self.beds
    }

    pub fn roster(&self) -> &StaffRoster {
        &self.roster
    }

    pub fn decision_log(&self) -> &DecisionLog {
        &self.log
    }

    /// Register an empty bed
    pub fn add_bed(&mut self, bed: Bed) -> Result<()> {
        if !bed.is_free() {
            return Err(VitalFlowError::InvalidInput(format!(
                "bed {} must be registered empty",
                bed.id
            )));
        }
        self.beds.add(bed)
    }

    pub fn add_staff(&mut self, member: Staff) {
        self.roster.add(member);
    }

    /// Admit a patient outside any tracked bed
    pub fn admit(
        &mut self,
        name: impl Into<String>,
        location: impl Into<String>,
        insured: bool,
    ) -> Result<PatientId> {
        let name = non_empty_name(name.into())?;
        let location = location.into();
        let id = self
            .patients
            .admit(Patient::new(name, Location::ward(location.clone()), insured))?;

        info!(patient_id = %id, location = %location, "patient admitted");
        self.log.log(
            "Patient Admitted",
            format!("{} at {}", id, location),
            Severity::Info,
        );
        Ok(id)
    }

    /// Admit a patient straight into a free bed with one baseline sample
    pub fn admit_to_bed(
        &mut self,
        name: impl Into<String>,
        bed_id: &BedId,
        insured: bool,
        baseline_risk: u8,
    ) -> Result<PatientId> {
        let name = non_empty_name(name.into())?;
        let bed = self
            .beds
            .get(bed_id)
            .ok_or_else(|| VitalFlowError::UnknownBed(bed_id.clone()))?;
        if !bed.is_free() {
            return Err(VitalFlowError::InvalidInput(format!(
                "bed {} is already occupied",
                bed_id
            )));
        }

        let mut patient = Patient::new(name, Location::Bed(bed_id.clone()), insured);
        patient.in_icu = bed.is_icu();
        self.tracker.ingest(&mut patient, baseline_risk);

        let id = self.patients.admit(patient)?;
        self.beds.set_occupant(bed_id, Some(id.clone()))?;

        info!(patient_id = %id, bed_id = %bed_id, "patient admitted to bed");
        self.log.log(
            "Patient Admitted",
            format!("{} -> {}", id, bed_id),
            Severity::Info,
        );
        Ok(id)
    }

    /// Record one sample, evaluate it and escalate if critical
    #[instrument(skip_all, fields(patient_id = %patient_id))]
    pub fn monitor(&mut self, patient_id: &PatientId, critical_hint: bool) -> Result<Monitoring> {
        let patient = self.patients.require_mut(patient_id)?;
        let update = self.tracker.record_sample(patient, critical_hint);
        let evaluation = self.policy.evaluate(patient, &mut self.log);

        let escalation = if evaluation.should_escalate {
            Some(self.escalate(patient_id)?)
        } else {
            None
        };

        Ok(Monitoring {
            update,
            evaluation,
            escalation,
        })
    }

    /// Manual escalation without a new sample
    pub fn escalate(&mut self, patient_id: &PatientId) -> Result<Escalation> {
        self.policy.escalate(
            patient_id,
            &mut self.roster,
            &self.allocator,
            &mut self.beds,
            &mut self.patients,
            &mut self.log,
        )
    }

    pub fn request_icu(&mut self, patient_id: &PatientId) -> Result<AllocationResult> {
        self.allocator
            .request_icu(patient_id, &mut self.beds, &mut self.patients, &mut self.log)
    }

    /// Incoming ambulance: ETA, field vitals, protocol, ICU pre-allocation
    #[instrument(skip_all, fields(patient_id = %patient_id))]
    pub fn handle_ambulance_call(
        &mut self,
        patient_id: &PatientId,
        condition: &str,
        distance_km: f64,
    ) -> Result<AmbulanceIntake> {
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(VitalFlowError::InvalidInput(format!(
                "distance must be a non-negative number of km, got {}",
                distance_km
            )));
        }
        self.patients.require(patient_id)?;

        let eta = eta_minutes(distance_km, self.config.intake.average_speed_kmh);
        self.log.log(
            "Ambulance Incoming",
            format!("ETA: {} minutes, Distance: {}km", eta, distance_km),
            Severity::Critical,
        );

        let patient = self.patients.require_mut(patient_id)?;
        let field_vitals = self.tracker.record_sample(patient, true);
        let severity = if field_vitals.risk > self.config.vitals.abnormal_risk_above {
            Severity::Warning
        } else {
            Severity::Info
        };
        self.log.log(
            "Ambulance Vitals Transmitted",
            format!("Patient: {}, Risk Score: {}%", patient.name, field_vitals.risk),
            severity,
        );

        let protocol = EmergencyProtocol::lookup(condition, &mut self.log);
        let icu_allocation = match protocol {
            Some(protocol) => {
                let spec = protocol.spec();
                self.log.log(
                    "Trolley Ready",
                    format!("Prepare {}", spec.trolley),
                    Severity::Warning,
                );
                for medicine in spec.medicines {
                    self.log.log("Medicine Staged", *medicine, Severity::Info);
                }
                Some(self.request_icu(patient_id)?)
            }
            None => None,
        };

        Ok(AmbulanceIntake {
            patient_id: patient_id.clone(),
            distance_km,
            eta_minutes: eta,
            field_vitals,
            protocol,
            protocol_spec: protocol.map(|p| p.spec()),
            icu_allocation,
        })
    }

    /// Inactivity alert from a camera zone
    pub fn handle_fall_event(
        &mut self,
        zone: &str,
        inactive_minutes: u32,
    ) -> Result<Option<FallResponse>> {
        if !is_fall(inactive_minutes, self.config.intake.fall_inactivity_minutes) {
            return Ok(None);
        }

        self.log.log(
            "Fall Detected",
            format!("Zone: {}", zone),
            Severity::Critical,
        );
        self.log.log(
            "Pose Analysis",
            format!("No movement for {} minutes", inactive_minutes),
            Severity::Warning,
        );

        let responders = self.roster.assign_pair()?;
        self.log.log(
            "Emergency Response",
            format!(
                "{} and {} dispatched",
                responders.doctor.name, responders.nurse.name
            ),
            Severity::Info,
        );

        Ok(Some(FallResponse {
            zone: zone.to_string(),
            inactive_minutes,
            responders,
        }))
    }

    pub fn occupancy(&self) -> OccupancyStats {
        self.beds.occupancy()
    }

    pub fn check_consistency(&self) -> Result<()> {
        self.beds.verify_consistency(&self.patients)
    }

    pub fn recent_decisions(&self, n: usize) -> &[DecisionLogEntry] {
        self.log.recent(n)
    }
}

fn non_empty_name(name: String) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(VitalFlowError::InvalidInput("patient name is empty".into()));
    }
    Ok(trimmed.to_string())
}
