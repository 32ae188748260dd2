//! Scheduler configuration.
//!
//! Loaded from TOML; every section and key is optional.
//!
//! ```
//! use u_shopfloor::config::SchedulerConfig;
//! use u_shopfloor::formulation::Formulation;
//! use std::time::Duration;
//!
//! let config = SchedulerConfig::from_toml_str(r#"
//!     [solver]
//!     time_limit_seconds = 30
//!
//!     [model]
//!     formulation = "continuous_quantity"
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit(), Duration::from_secs(30));
//! assert_eq!(config.model.formulation, Formulation::ContinuousQuantity);
//! assert!((config.extraction.threshold - 0.5).abs() < 1e-12);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::DEFAULT_THRESHOLD;
use crate::formulation::ModelOptions;
use crate::replan::ReplanSettings;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Engine limits.
    pub solver: SolverSection,
    /// Model construction options.
    pub model: ModelOptions,
    /// Schedule extraction.
    pub extraction: ExtractionSection,
    /// Defaults for order-based (replanned) instances.
    pub replan: ReplanSettings,
}

/// `[solver]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSection {
    /// Wall-clock limit per solve.
    pub time_limit_seconds: u64,
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            time_limit_seconds: 60,
        }
    }
}

/// `[extraction]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSection {
    /// Activity threshold for assignment variables.
    pub threshold: f64,
}

impl Default for ExtractionSection {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SchedulerConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, contains invalid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the solve time limit.
    pub fn with_time_limit_seconds(mut self, seconds: u64) -> Self {
        self.solver.time_limit_seconds = seconds;
        self
    }

    /// Sets model options.
    pub fn with_model(mut self, model: ModelOptions) -> Self {
        self.model = model;
        self
    }

    /// Solve time limit.
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.solver.time_limit_seconds)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solver.time_limit_seconds == 0 {
            return Err(ConfigError::Invalid(
                "solver.time_limit_seconds must be positive".into(),
            ));
        }
        let t = self.extraction.threshold;
        if !(t > 0.0 && t < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "extraction.threshold must be in (0, 1), got {t}"
            )));
        }
        let r = &self.replan;
        if !(r.machine_capacity_per_hour.is_finite() && r.machine_capacity_per_hour > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "replan.machine_capacity_per_hour must be positive, got {}",
                r.machine_capacity_per_hour
            )));
        }
        if !(r.cleaning_time.is_finite() && r.cleaning_time >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "replan.cleaning_time must be non-negative, got {}",
                r.cleaning_time
            )));
        }
        if !(r.changeover_cost.is_finite() && r.changeover_cost >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "replan.changeover_cost must be non-negative, got {}",
                r.changeover_cost
            )));
        }
        if r.shift_start_hour >= r.shift_end_hour {
            return Err(ConfigError::Invalid(format!(
                "replan shift {}..{} is empty",
                r.shift_start_hour, r.shift_end_hour
            )));
        }
        Ok(())
    }
}
