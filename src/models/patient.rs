use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::bed::BedId;
use crate::{Result, VitalFlowError};

/// Patient identifier. Patients are registered under their display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Where a patient currently is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Location {
    /// Not in a tracked bed (ward, ambulance, waiting area)
    Ward(String),
    Bed(BedId),
}

impl Location {
    pub fn ward(name: impl Into<String>) -> Self {
        Location::Ward(name.into())
    }

    pub fn bed_id(&self) -> Option<&BedId> {
        match self {
            Location::Bed(id) => Some(id),
            Location::Ward(_) => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Ward(name) => f.write_str(name),
            Location::Bed(id) => write!(f, "{}", id),
        }
    }
}

/// Display vitals derived from the risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryVitals {
    pub spo2: u8,
    pub heart_rate: u16,
    pub systolic: u16,
    pub diastolic: u16,
}

impl SecondaryVitals {
    pub fn blood_pressure(&self) -> String {
        format!("{}/{}", self.systolic, self.diastolic)
    }
}

impl Default for SecondaryVitals {
    fn default() -> Self {
        Self {
            spo2: 98,
            heart_rate: 75,
            systolic: 120,
            diastolic: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub location: Location,
    /// Most recent raw samples, oldest first
    pub window: VecDeque<u8>,
    /// Floor of the window mean, 0..=100
    pub risk: u8,
    pub in_icu: bool,
    pub insured: bool,
    pub vitals: SecondaryVitals,
}

impl Patient {
    pub fn new(name: impl Into<String>, location: Location, insured: bool) -> Self {
        let name = name.into();
        Self {
            id: PatientId::new(name.clone()),
            name,
            location,
            window: VecDeque::new(),
            risk: 0,
            in_icu: false,
            insured,
            vitals: SecondaryVitals::default(),
        }
    }

    /// Current bed, if the patient is in one
    pub fn bed(&self) -> Option<&BedId> {
        self.location.bed_id()
    }
}

/// All admitted patients, keyed and iterated by id
#[derive(Debug, Clone, Default)]
pub struct PatientRegistry {
    patients: BTreeMap<PatientId, Patient>,
}

impl PatientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, patient: Patient) -> Result<PatientId> {
        if self.patients.contains_key(&patient.id) {
            return Err(VitalFlowError::DuplicatePatient(patient.id));
        }
        let id = patient.id.clone();
        self.patients.insert(id.clone(), patient);
        Ok(id)
    }

    pub fn get(&self, id: &PatientId) -> Option<&Patient> {
        self.patients.get(id)
    }

    pub fn get_mut(&mut self, id: &PatientId) -> Option<&mut Patient> {
        self.patients.get_mut(id)
    }

    /// Like [`get`](Self::get) but unknown ids are an error
    pub fn require(&self, id: &PatientId) -> Result<&Patient> {
        self.patients
            .get(id)
            .ok_or_else(|| VitalFlowError::UnknownPatient(id.clone()))
    }

    pub fn require_mut(&mut self, id: &PatientId) -> Result<&mut Patient> {
        self.patients
            .get_mut(id)
            .ok_or_else(|| VitalFlowError::UnknownPatient(id.clone()))
    }

    pub fn contains(&self, id: &PatientId) -> bool {
        self.patients.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Patient> {
        self.patients.values()
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}
