use serde::Serialize;
use tracing::info;

use crate::models::staff::{Staff, StaffId, StaffRole};
use crate::{Result, VitalFlowError};

/// Doctor and nurse assigned to one escalation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponderPair {
    pub doctor: Staff,
    pub nurse: Staff,
}

/// Doctors and nurses in roster order
#[derive(Debug, Clone, Default)]
pub struct StaffRoster {
    staff: Vec<Staff>,
}

impl StaffRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_staff(staff: Vec<Staff>) -> Self {
        Self { staff }
    }

    pub fn add(&mut self, member: Staff) {
        self.staff.push(member);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Staff> {
        self.staff.iter()
    }

    pub fn get(&self, id: &StaffId) -> Option<&Staff> {
        self.staff.iter().find(|s| &s.id == id)
    }

    fn least_loaded(&self, role: StaffRole) -> Result<usize> {
        // first minimum wins
        self.staff
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role == role)
            .min_by_key(|(_, s)| s.active_cases)
            .map(|(idx, _)| idx)
            .ok_or(VitalFlowError::NoStaff(role))
    }

    /// Pick the least-loaded doctor and nurse and bump both case counts.
    ///
    /// Fails without touching any counter when either role is empty.
    pub fn assign_pair(&mut self) -> Result<ResponderPair> {
        let doctor_idx = self.least_loaded(StaffRole::Doctor)?;
        let nurse_idx = self.least_loaded(StaffRole::Nurse)?;

        self.staff[doctor_idx].active_cases += 1;
        self.staff[nurse_idx].active_cases += 1;

        let pair = ResponderPair {
            doctor: self.staff[doctor_idx].clone(),
            nurse: self.staff[nurse_idx].clone(),
        };
        info!(
            doctor = %pair.doctor.name,
            doctor_cases = pair.doctor.active_cases,
            nurse = %pair.nurse.name,
            nurse_cases = pair.nurse.active_cases,
            "responders assigned"
        );
        Ok(pair)
    }

    /// First doctor whose specialization matches, ignoring case
    pub fn get_specialist(&self, specialization: &str) -> Option<&Staff> {
        self.staff.iter().find(|s| {
            s.role == StaffRole::Doctor
                && s.specialization
                    .as_deref()
                    .map_or(false, |spec| spec.eq_ignore_ascii_case(specialization))
        })
    }
}
