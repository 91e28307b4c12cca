//! Serializable auction configuration.
//!
//! Loaded from TOML; every field has a default, so an empty file is valid:
//!
//! ```toml
//! [solver]
//! backend = "merit_order"
//! max_nodes = 100000
//!
//! [pricing]
//! price_decimals = 2
//! setter_tolerance = 0.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use sra_core::{PriceDiscoverySolver, PricingConfig, SolverConfig};
use thiserror::Error;

/// Errors from reading or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Solver selection and pricing rules for a clearing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuctionConfig {
    pub solver: SolverConfig,
    pub pricing: PricingConfig,
}

impl AuctionConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solver.max_nodes == 0 {
            return Err(ConfigError::Invalid("solver.max_nodes must be positive".into()));
        }
        if !self.pricing.setter_tolerance.is_finite() || self.pricing.setter_tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "pricing.setter_tolerance must be a non-negative number".into(),
            ));
        }
        if self.pricing.price_decimals > 10 {
            return Err(ConfigError::Invalid(
                "pricing.price_decimals must be at most 10".into(),
            ));
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Build the price discovery engine this config describes.
    pub fn engine(&self) -> PriceDiscoverySolver {
        PriceDiscoverySolver::from_config(&self.solver, self.pricing.clone())
    }
}
