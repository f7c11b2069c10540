//! Data models for VitalFlow
//!
//! Patients, beds and staff as owned by the [`Hospital`](crate::Hospital)
//! context. Relationships are expressed through ids, never references.

pub mod bed;
pub mod patient;
pub mod staff;
