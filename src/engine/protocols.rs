//! Emergency treatment protocols for ambulance intake

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::audit::{DecisionLog, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyProtocol {
    HeartAttack,
    Trauma,
    Stroke,
    RespiratoryFailure,
}

/// Fixed treatment plan for one protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolSpec {
    pub name: &'static str,
    pub medicines: &'static [&'static str],
    pub trolley: &'static str,
    pub equipment: &'static [&'static str],
    pub ot_required: bool,
    /// 1 is most urgent
    pub priority: u8,
    /// Display only
    pub golden_hour_minutes: Option<u32>,
}

const HEART_ATTACK: ProtocolSpec = ProtocolSpec {
    name: "Cardiac Emergency Protocol",
    medicines: &["Aspirin 325mg", "Nitroglycerin SL", "Heparin IV", "Morphine PRN"],
    trolley: "Cardiac Crash Trolley",
    equipment: &["Defibrillator", "ECG Monitor", "Oxygen Cylinder"],
    ot_required: true,
    priority: 1,
    golden_hour_minutes: Some(90),
};

const TRAUMA: ProtocolSpec = ProtocolSpec {
    name: "Trauma Protocol",
    medicines: &[
        "IV Fluids 1L",
        "Tranexamic Acid",
        "Tetanus Toxoid",
        "Broad-spectrum Antibiotics",
    ],
    trolley: "Trauma Trolley",
    equipment: &["Cervical Collar", "Splints", "Wound Care Kit"],
    ot_required: true,
    priority: 1,
    golden_hour_minutes: Some(60),
};

const STROKE: ProtocolSpec = ProtocolSpec {
    name: "Stroke Protocol",
    medicines: &["tPA (if eligible)", "Aspirin", "Antihypertensives"],
    trolley: "Neuro Trolley",
    equipment: &["CT Scanner Ready", "BP Monitor"],
    ot_required: false,
    priority: 1,
    golden_hour_minutes: Some(270),
};

const RESPIRATORY_FAILURE: ProtocolSpec = ProtocolSpec {
    name: "Respiratory Emergency Protocol",
    medicines: &["Bronchodilators", "Corticosteroids", "Oxygen"],
    trolley: "Respiratory Trolley",
    equipment: &["Ventilator", "BiPAP", "Intubation Kit"],
    ot_required: false,
    priority: 2,
    golden_hour_minutes: None,
};

impl EmergencyProtocol {
    pub const ALL: [EmergencyProtocol; 4] = [
        EmergencyProtocol::HeartAttack,
        EmergencyProtocol::Trauma,
        EmergencyProtocol::Stroke,
        EmergencyProtocol::RespiratoryFailure,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            EmergencyProtocol::HeartAttack => "heart_attack",
            EmergencyProtocol::Trauma => "trauma",
            EmergencyProtocol::Stroke => "stroke",
            EmergencyProtocol::RespiratoryFailure => "respiratory_failure",
        }
    }

    pub fn spec(&self) -> &'static ProtocolSpec {
        match self {
            EmergencyProtocol::HeartAttack => &HEART_ATTACK,
            EmergencyProtocol::Trauma => &TRAUMA,
            EmergencyProtocol::Stroke => &STROKE,
            EmergencyProtocol::RespiratoryFailure => &RESPIRATORY_FAILURE,
        }
    }

    /// Resolve a condition string and record the outcome.
    ///
    /// Unknown conditions are logged at error severity and yield `None`.
    pub fn lookup(condition: &str, log: &mut DecisionLog) -> Option<EmergencyProtocol> {
        match condition.parse::<EmergencyProtocol>() {
            Ok(protocol) => {
                let spec = protocol.spec();
                info!(protocol = protocol.key(), "emergency protocol loaded");
                log.log(
                    "Emergency Protocol Loaded",
                    format!("{} (Priority {})", spec.name, spec.priority),
                    Severity::Critical,
                );
                Some(protocol)
            }
            Err(err) => {
                error!(condition, "unknown emergency protocol");
                log.log("Protocol Lookup Failed", err.to_string(), Severity::Error);
                None
            }
        }
    }
}

impl fmt::Display for EmergencyProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown condition: {0}")]
pub struct UnknownProtocol(pub String);

impl FromStr for EmergencyProtocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim();
        EmergencyProtocol::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| UnknownProtocol(key.to_string()))
    }
}
