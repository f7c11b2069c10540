//! Rolling vitals risk score
//!
//! Each call ingests one raw sample (0-100) into the patient's bounded
//! window and recomputes the risk as the floor of the window mean.
//! Samples come from a [`SampleSource`]; the random source stands in for
//! bedside sensors.

use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::config::VitalsConfig;
use crate::models::patient::{Patient, PatientId, SecondaryVitals};

/// Produces the next raw vitals-derived risk sample
#[cfg_attr(test, mockall::automock)]
pub trait SampleSource {
    /// `critical_hint` asks for a deteriorating reading
    fn next_sample(&mut self, critical_hint: bool) -> u8;
}

/// Uniform samples from the configured critical or stable range
#[derive(Debug)]
pub struct RandomSampleSource<R: Rng = StdRng> {
    rng: R,
    critical: RangeInclusive<u8>,
    stable: RangeInclusive<u8>,
}

impl RandomSampleSource<StdRng> {
    pub fn new(config: &VitalsConfig) -> Self {
        Self::with_rng(StdRng::from_entropy(), config)
    }

    /// Reproducible source for demos and tests
    pub fn seeded(seed: u64, config: &VitalsConfig) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), config)
    }
}

impl<R: Rng> RandomSampleSource<R> {
    pub fn with_rng(rng: R, config: &VitalsConfig) -> Self {
        let [clo, chi] = config.critical_sample_range;
        let [slo, shi] = config.stable_sample_range;
        Self {
            rng,
            critical: clo.min(chi)..=chi.max(clo),
            stable: slo.min(shi)..=shi.max(slo),
        }
    }
}

impl<R: Rng> SampleSource for RandomSampleSource<R> {
    fn next_sample(&mut self, critical_hint: bool) -> u8 {
        let range = if critical_hint {
            self.critical.clone()
        } else {
            self.stable.clone()
        };
        self.rng.gen_range(range)
    }
}

/// Outcome of one recorded sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskUpdate {
    pub patient_id: PatientId,
    /// Sample after clamping to 0..=100
    pub sample: u8,
    pub previous_risk: u8,
    pub risk: u8,
    pub window_len: usize,
    pub vitals: SecondaryVitals,
}

pub struct VitalsTracker<S> {
    source: S,
    capacity: usize,
    abnormal_risk_above: u8,
}

impl<S: SampleSource> VitalsTracker<S> {
    pub fn new(source: S, config: &VitalsConfig) -> Self {
        Self {
            source,
            capacity: config.window_capacity.max(1),
            abnormal_risk_above: config.abnormal_risk_above,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Draw one sample from the source and fold it into the patient's window
    pub fn record_sample(&mut self, patient: &mut Patient, critical_hint: bool) -> RiskUpdate {
        let raw = self.source.next_sample(critical_hint);
        self.ingest(patient, raw)
    }

    /// Fold a known sample into the patient's window
    pub fn ingest(&self, patient: &mut Patient, raw: u8) -> RiskUpdate {
        let sample = raw.min(100);
        let previous_risk = patient.risk;

        while patient.window.len() >= self.capacity {
            patient.window.pop_front();
        }
        patient.window.push_back(sample);

        let sum: u32 = patient.window.iter().map(|&s| u32::from(s)).sum();
        // window is non-empty here
        patient.risk = (sum / patient.window.len() as u32) as u8;
        patient.vitals = self.derive_vitals(patient.risk);

        debug!(
            patient_id = %patient.id,
            sample,
            risk = patient.risk,
            window = patient.window.len(),
            "vitals sample recorded"
        );

        RiskUpdate {
            patient_id: patient.id.clone(),
            sample,
            previous_risk,
            risk: patient.risk,
            window_len: patient.window.len(),
            vitals: patient.vitals,
        }
    }

    /// Secondary vitals are a pure function of risk
    pub fn derive_vitals(&self, risk: u8) -> SecondaryVitals {
        let threshold = self.abnormal_risk_above;
        if risk > threshold {
            let excess = u16::from(risk - threshold);
            SecondaryVitals {
                spo2: 92u8.saturating_sub((excess / 5) as u8).max(85),
                heart_rate: 110 + excess,
                systolic: 160,
                diastolic: 100,
            }
        } else {
            SecondaryVitals {
                spo2: 98 - risk / 35,
                heart_rate: 60 + u16::from(risk) / 4,
                systolic: 120,
                diastolic: 80,
            }
        }
    }
}
