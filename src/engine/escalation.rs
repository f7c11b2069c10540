//! Risk tiers and escalation
//!
//! Every evaluation writes exactly one decision log entry. A critical tier
//! triggers escalation: responders are assigned first, then an ICU bed is
//! requested.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::{DecisionLog, Severity};
use crate::config::EscalationConfig;
use crate::engine::allocation::{AllocationEngine, AllocationResult};
use crate::engine::beds::BedInventory;
use crate::engine::roster::{ResponderPair, StaffRoster};
use crate::models::patient::{Patient, PatientId, PatientRegistry};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Normal,
    Warning,
    Critical,
}

impl RiskTier {
    /// Decision log severity for an evaluation at this tier
    pub fn severity(&self) -> Severity {
        match self {
            RiskTier::Normal => Severity::Info,
            RiskTier::Warning => Severity::Warning,
            RiskTier::Critical => Severity::Critical,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Normal => write!(f, "normal"),
            RiskTier::Warning => write!(f, "warning"),
            RiskTier::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub patient_id: PatientId,
    pub risk: u8,
    pub tier: RiskTier,
    pub should_escalate: bool,
}

/// Outcome of an escalation: who responded and where the patient went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Escalation {
    pub patient_id: PatientId,
    pub responders: ResponderPair,
    pub allocation: AllocationResult,
}

#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    critical_above: u8,
    warning_above: u8,
}

impl EscalationPolicy {
    pub fn new(config: &EscalationConfig) -> Self {
        Self {
            critical_above: config.critical_above,
            warning_above: config.warning_above,
        }
    }

    pub fn classify(&self, risk: u8) -> RiskTier {
        if risk > self.critical_above {
            RiskTier::Critical
        } else if risk > self.warning_above {
            RiskTier::Warning
        } else {
            RiskTier::Normal
        }
    }

    pub fn evaluate(&self, patient: &Patient, log: &mut DecisionLog) -> Evaluation {
        let tier = self.classify(patient.risk);
        let action = match tier {
            RiskTier::Critical => "Critical Vitals",
            RiskTier::Warning => "Elevated Risk",
            RiskTier::Normal => "Vitals Normal",
        };
        log.log(
            action,
            format!("{} Risk={}%", patient.name, patient.risk),
            tier.severity(),
        );

        Evaluation {
            patient_id: patient.id.clone(),
            risk: patient.risk,
            tier,
            should_escalate: tier == RiskTier::Critical,
        }
    }

    /// Assign a responder pair, then request an ICU bed.
    ///
    /// If no pair can be assigned nothing is logged and no bed is requested.
    pub fn escalate(
        &self,
        patient_id: &PatientId,
        roster: &mut StaffRoster,
        allocator: &AllocationEngine,
        beds: &mut BedInventory,
        patients: &mut PatientRegistry,
        log: &mut DecisionLog,
    ) -> Result<Escalation> {
        let name = patients.require(patient_id)?.name.clone();
        let responders = roster.assign_pair()?;

        warn!(patient_id = %patient_id, "escalation triggered");
        log.log(
            "Escalation Triggered",
            format!("Patient {} requires immediate attention", name),
            Severity::Critical,
        );
        log.log(
            "Doctor Assigned",
            format!(
                "{} ({})",
                responders.doctor.name,
                responders.doctor.specialization.as_deref().unwrap_or("General")
            ),
            Severity::Info,
        );
        log.log("Nurse Assigned", responders.nurse.name.clone(), Severity::Info);

        let allocation = allocator.request_icu(patient_id, beds, patients, log)?;
        info!(
            patient_id = %patient_id,
            action = ?allocation.action,
            success = allocation.success,
            "escalation finished"
        );

        Ok(Escalation {
            patient_id: patient_id.clone(),
            responders,
            allocation,
        })
    }
}
