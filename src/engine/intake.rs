//! Ambulance and fall-alert intake
//!
//! The flows themselves run on [`Hospital`](crate::Hospital); this module
//! holds the ETA contract and the result types.

use serde::Serialize;

use crate::engine::allocation::AllocationResult;
use crate::engine::protocols::{EmergencyProtocol, ProtocolSpec};
use crate::engine::roster::ResponderPair;
use crate::engine::vitals::RiskUpdate;
use crate::models::patient::PatientId;

/// Average city ambulance speed
pub const DEFAULT_SPEED_KMH: f64 = 40.0;

/// ETA in whole minutes at the default city speed
pub fn calculate_eta(distance_km: f64) -> u32 {
    eta_minutes(distance_km, DEFAULT_SPEED_KMH)
}

/// ETA in whole minutes, truncated. Negative, NaN or non-positive-speed
/// inputs give 0.
pub fn eta_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    if !(distance_km > 0.0) || !(speed_kmh > 0.0) {
        return 0;
    }
    // float-to-int casts saturate
    (distance_km / speed_kmh * 60.0) as u32
}

/// Inactivity at or over the threshold counts as a fall
pub fn is_fall(inactive_minutes: u32, threshold_minutes: u32) -> bool {
    inactive_minutes >= threshold_minutes
}

#[derive(Debug, Clone, Serialize)]
pub struct AmbulanceIntake {
    pub patient_id: PatientId,
    pub distance_km: f64,
    pub eta_minutes: u32,
    /// Vitals transmitted from the field
    pub field_vitals: RiskUpdate,
    /// `None` when the condition did not match a protocol
    pub protocol: Option<EmergencyProtocol>,
    pub protocol_spec: Option<&'static ProtocolSpec>,
    /// ICU pre-allocation, attempted only when a protocol was found
    pub icu_allocation: Option<AllocationResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FallResponse {
    pub zone: String,
    pub inactive_minutes: u32,
    pub responders: ResponderPair,
}
