use std::fmt;

use serde::{Deserialize, Serialize};

use super::patient::PatientId;

/// Bed identifier, e.g. `ICU-1` or `GEN-3`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BedId(String);

impl BedId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BedId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedType {
    Icu,
    General,
}

impl fmt::Display for BedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BedType::Icu => write!(f, "ICU"),
            BedType::General => write!(f, "General"),
        }
    }
}

/// A bed holds at most one patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub id: BedId,
    pub bed_type: BedType,
    pub occupant: Option<PatientId>,
}

impl Bed {
    pub fn new(id: impl Into<String>, bed_type: BedType) -> Self {
        Self {
            id: BedId::new(id),
            bed_type,
            occupant: None,
        }
    }

    pub fn icu(id: impl Into<String>) -> Self {
        Self::new(id, BedType::Icu)
    }

    pub fn general(id: impl Into<String>) -> Self {
        Self::new(id, BedType::General)
    }

    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn is_icu(&self) -> bool {
        self.bed_type == BedType::Icu
    }
}
