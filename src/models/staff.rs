use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(String);

impl StaffId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Doctor,
    Nurse,
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaffRole::Doctor => write!(f, "doctor"),
            StaffRole::Nurse => write!(f, "nurse"),
        }
    }
}

/// A clinician on the roster.
///
/// `active_cases` only ever grows; case completion is handled outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    pub name: String,
    pub role: StaffRole,
    /// Doctors only
    pub specialization: Option<String>,
    pub active_cases: u32,
}

impl Staff {
    pub fn doctor(
        name: impl Into<String>,
        specialization: impl Into<String>,
        active_cases: u32,
    ) -> Self {
        let name = name.into();
        Self {
            id: StaffId::new(name.clone()),
            name,
            role: StaffRole::Doctor,
            specialization: Some(specialization.into()),
            active_cases,
        }
    }

    pub fn nurse(name: impl Into<String>, active_cases: u32) -> Self {
        let name = name.into();
        Self {
            id: StaffId::new(name.clone()),
            name,
            role: StaffRole::Nurse,
            specialization: None,
            active_cases,
        }
    }
}
