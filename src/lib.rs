//! VitalFlow hospital command center core library
//!
//! This module exports the decision engine behind the VitalFlow command
//! center: rolling vitals risk scores, escalation tiers, responder
//! assignment and ICU bed allocation with the "Tetris" swap, every step
//! recorded in an append-only decision log.
//!
//! ```text
//! vitals sample ─▶ VitalsTracker ─▶ EscalationPolicy ─┬─▶ DecisionLog
//!                                                     │
//!                         (critical) StaffRoster ◀────┤
//!                                                     │
//!                         AllocationEngine ◀──────────┘
//!                              │
//!                              ▼
//!                         BedInventory
//! ```
//!
//! Everything hangs off an explicitly constructed [`Hospital`] so that
//! callers and tests own isolated instances.

pub mod audit;
pub mod config;
pub mod engine;
pub mod hospital;
pub mod models;
pub mod snapshot;

pub use audit::{DecisionLog, DecisionLogEntry, Severity};
pub use config::Config;
pub use engine::{
    allocation::{AllocationAction, AllocationEngine, AllocationFailure, AllocationResult},
    beds::{BedInventory, OccupancyStats},
    escalation::{Escalation, EscalationPolicy, Evaluation, RiskTier},
    intake::{calculate_eta, AmbulanceIntake, FallResponse},
    protocols::{EmergencyProtocol, ProtocolSpec, UnknownProtocol},
    roster::{ResponderPair, StaffRoster},
    vitals::{RandomSampleSource, RiskUpdate, SampleSource, VitalsTracker},
};
pub use hospital::{Hospital, Monitoring};
pub use models::{
    bed::{Bed, BedId, BedType},
    patient::{Location, Patient, PatientId, PatientRegistry, SecondaryVitals},
    staff::{Staff, StaffId, StaffRole},
};
pub use snapshot::HospitalSnapshot;

/// Common result type for VitalFlow operations
pub type Result<T> = std::result::Result<T, VitalFlowError>;

/// Unified error type for VitalFlow operations.
///
/// Expected clinical outcomes (no ICU bed, unknown protocol) are not errors;
/// they come back as values. These variants cover malformed input and
/// broken setup.
#[derive(Debug, thiserror::Error)]
pub enum VitalFlowError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Patient id not present in the registry
    #[error("Unknown patient: {0}")]
    UnknownPatient(PatientId),

    /// Patient id already admitted
    #[error("Patient already admitted: {0}")]
    DuplicatePatient(PatientId),

    /// Bed id not present in the inventory
    #[error("Unknown bed: {0}")]
    UnknownBed(BedId),

    /// Bed id already registered
    #[error("Bed already registered: {0}")]
    DuplicateBed(BedId),

    /// No staff member of the role is on the roster
    #[error("No {0} on the roster")]
    NoStaff(StaffRole),

    /// Bed occupancy and patient locations disagree
    #[error("Inconsistent bed state: {0}")]
    Inconsistent(String),

    /// Caller supplied an invalid value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<::config::ConfigError> for VitalFlowError {
    fn from(err: ::config::ConfigError) -> Self {
        VitalFlowError::Config(err.to_string())
    }
}
