//! Application configuration
//!
//! Layered the same way for every entry point: built-in defaults, then
//! `config/default`, then `config/{VITALFLOW_ENV}`, then `VITALFLOW_*`
//! environment variables (`__` separates nested keys).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, VitalFlowError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vitals: VitalsConfig,
    pub escalation: EscalationConfig,
    pub allocation: AllocationConfig,
    pub intake: IntakeConfig,
    pub logging: LoggingConfig,
}

/// Rolling risk window and the simulated sample ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    /// Number of raw samples kept per patient
    pub window_capacity: usize,
    /// Inclusive raw-sample range while deteriorating
    pub critical_sample_range: [u8; 2],
    /// Inclusive raw-sample range while stable
    pub stable_sample_range: [u8; 2],
    /// Risk above which secondary vitals read abnormal
    pub abnormal_risk_above: u8,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            window_capacity: 5,
            critical_sample_range: [75, 95],
            stable_sample_range: [30, 60],
            abnormal_risk_above: 70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Risk strictly above this is critical
    pub critical_above: u8,
    /// Risk strictly above this (and not critical) is a warning
    pub warning_above: u8,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            critical_above: 75,
            warning_above: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// ICU patients with risk strictly below this may be moved out
    pub recovery_risk_below: u8,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            recovery_risk_below: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Average ambulance speed used for ETA
    pub average_speed_kmh: f64,
    /// Inactivity (minutes) at which a fall is assumed
    pub fall_inactivity_minutes: u32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: 40.0,
            fall_inactivity_minutes: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of the human format
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            json: false,
        }
    }
}

impl Config {
    /// Check cross-field constraints the types can't express.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(VitalFlowError::Config(msg));

        if self.vitals.window_capacity == 0 {
            return invalid("vitals.window_capacity must be at least 1".into());
        }
        for (name, [lo, hi]) in [
            ("vitals.critical_sample_range", self.vitals.critical_sample_range),
            ("vitals.stable_sample_range", self.vitals.stable_sample_range),
        ] {
            if lo > hi || hi > 100 {
                return invalid(format!(
                    "{name} must satisfy lo <= hi <= 100, got [{lo}, {hi}]"
                ));
            }
        }
        if self.vitals.abnormal_risk_above > 100 {
            return invalid("vitals.abnormal_risk_above must be <= 100".into());
        }
        if self.escalation.critical_above > 100 {
            return invalid("escalation.critical_above must be <= 100".into());
        }
        if self.escalation.warning_above >= self.escalation.critical_above {
            return invalid(format!(
                "escalation.warning_above ({}) must be below escalation.critical_above ({})",
                self.escalation.warning_above, self.escalation.critical_above
            ));
        }
        if self.allocation.recovery_risk_below > 100 {
            return invalid("allocation.recovery_risk_below must be <= 100".into());
        }
        if !(self.intake.average_speed_kmh > 0.0) {
            return invalid("intake.average_speed_kmh must be positive".into());
        }
        Ok(())
    }
}

fn defaults() -> Result<::config::Config> {
    Ok(::config::Config::try_from(&Config::default())?)
}

/// Load configuration from the `config/` directory and the environment
pub fn load_config() -> Result<Config> {
    let env = std::env::var("VITALFLOW_ENV").unwrap_or_else(|_| "development".into());

    let settings = ::config::Config::builder()
        .add_source(defaults()?)
        .add_source(::config::File::with_name("config/default").required(false))
        .add_source(::config::File::with_name(&format!("config/{}", env)).required(false))
        .add_source(
            ::config::Environment::with_prefix("VITALFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    finish(settings)
}

/// Load defaults overlaid with one explicit file
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let settings = ::config::Config::builder()
        .add_source(defaults()?)
        .add_source(::config::File::from(path.as_ref()))
        .build()?;

    finish(settings)
}

fn finish(settings: ::config::Config) -> Result<Config> {
    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vitals.window_capacity, 5);
        assert_eq!(config.escalation.critical_above, 75);
        assert_eq!(config.escalation.warning_above, 50);
        assert_eq!(config.allocation.recovery_risk_below, 40);
    }

    #[test]
    fn zero_window_rejected() {
        let mut config = Config::default();
        config.vitals.window_capacity = 0;
        assert!(matches!(config.validate(), Err(VitalFlowError::Config(_))));
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let mut config = Config::default();
        config.escalation.warning_above = 80;
        assert!(config.validate().is_err());
    }

    #[test]
    fn sample_range_above_hundred_rejected() {
        let mut config = Config::default();
        config.vitals.critical_sample_range = [90, 120];
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[escalation]\ncritical_above = 80\n\n[allocation]\nrecovery_risk_below = 30"
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.escalation.critical_above, 80);
        assert_eq!(config.escalation.warning_above, 50);
        assert_eq!(config.allocation.recovery_risk_below, 30);
        assert_eq!(config.vitals.window_capacity, 5);
    }

    #[test]
    fn invalid_file_is_config_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[escalation]\ncritical_above = 40").unwrap();

        assert!(matches!(load_config_from(file.path()), Err(VitalFlowError::Config(_))));
    }
}
