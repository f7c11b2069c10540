//! Hospital state snapshots
//!
//! Point-in-time JSON export of patients, beds and staff, plus the tail of
//! the decision log for reference. Restoring rebuilds a live [`Hospital`]
//! and refuses snapshots whose beds and patients disagree or whose risk
//! scores do not match their sample windows.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audit::{DecisionLogEntry, Severity};
use crate::config::Config;
use crate::engine::beds::OccupancyStats;
use crate::engine::roster::StaffRoster;
use crate::engine::vitals::SampleSource;
use crate::hospital::Hospital;
use crate::models::bed::Bed;
use crate::models::patient::Patient;
use crate::models::staff::Staff;
use crate::{Result, VitalFlowError};

/// Decision log entries carried in a snapshot
pub const SNAPSHOT_DECISIONS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalSnapshot {
    pub taken_at: DateTime<Utc>,
    pub patients: Vec<Patient>,
    pub beds: Vec<Bed>,
    pub staff: Vec<Staff>,
    /// Read-only history; not replayed on restore
    pub recent_decisions: Vec<DecisionLogEntry>,
    pub occupancy: OccupancyStats,
}

impl HospitalSnapshot {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), "snapshot saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl<S: SampleSource> Hospital<S> {
    pub fn snapshot(&self) -> HospitalSnapshot {
        HospitalSnapshot {
            taken_at: Utc::now(),
            patients: self.patients.iter().cloned().collect(),
            beds: self.beds.iter().cloned().collect(),
            staff: self.roster.iter().cloned().collect(),
            recent_decisions: self.log.recent(SNAPSHOT_DECISIONS).to_vec(),
            occupancy: self.beds.occupancy(),
        }
    }

    /// Rebuild a hospital from a snapshot with a fresh decision log
    pub fn restore(snapshot: &HospitalSnapshot, config: Config, sample_source: S) -> Result<Self> {
        config.validate()?;
        let mut hospital = Self::new(config, sample_source);
        let capacity = hospital.tracker.capacity();

        for bed in &snapshot.beds {
            hospital.beds.add(bed.clone())?;
        }
        for patient in &snapshot.patients {
            if patient.window.len() > capacity {
                return Err(VitalFlowError::Inconsistent(format!(
                    "patient {} has {} samples, window holds {}",
                    patient.id,
                    patient.window.len(),
                    capacity
                )));
            }
            if let Some(sample) = patient.window.iter().find(|&&s| s > 100) {
                return Err(VitalFlowError::Inconsistent(format!(
                    "patient {} has sample {} above 100",
                    patient.id, sample
                )));
            }
            let expected = window_risk(patient);
            if patient.risk != expected {
                return Err(VitalFlowError::Inconsistent(format!(
                    "patient {} has risk {}, window implies {}",
                    patient.id, patient.risk, expected
                )));
            }
            hospital.patients.admit(patient.clone())?;
        }
        hospital.roster = StaffRoster::from_staff(snapshot.staff.clone());
        hospital.check_consistency()?;

        hospital.log.log(
            "State Restored",
            format!(
                "{} patients, {} beds, {} staff from snapshot taken at {}",
                snapshot.patients.len(),
                snapshot.beds.len(),
                snapshot.staff.len(),
                snapshot.taken_at.to_rfc3339()
            ),
            Severity::Info,
        );
        Ok(hospital)
    }
}

/// Floor of the window mean; 0 for an empty window
fn window_risk(patient: &Patient) -> u8 {
    if patient.window.is_empty() {
        return 0;
    }
    let sum: u32 = patient.window.iter().map(|&s| u32::from(s)).sum();
    (sum / patient.window.len() as u32) as u8
}
