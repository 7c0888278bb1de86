// =============================================================================
// Engine Configuration — validated parameter set + named-config registry
// =============================================================================
//
// One `EngineConfig` is passed by value into each analysis call and treated
// as immutable for the lifetime of that call. Out-of-range values fail hard
// at engine construction; nothing is ever silently clamped.
//
// Which configuration is "active" is a caller-side decision: callers that
// juggle several parameter sets keep them in a `ConfigRegistry` keyed by
// name and pick one per call.
//
// All fields carry `#[serde(default)]` so that loading an older stored
// config never breaks when new fields are added.
// =============================================================================

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineError;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_name() -> String {
    "default".to_string()
}

fn default_base_window_size() -> usize {
    20
}

fn default_particle_count() -> usize {
    100
}

fn default_hurst_threshold() -> f64 {
    0.65
}

fn default_unit_weight() -> f64 {
    1.0
}

fn default_chaos_parameter() -> f64 {
    4.0
}

fn default_chaos_step() -> f64 {
    0.01
}

fn default_volatility_quantile() -> f64 {
    0.75
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Tunable parameters for the quantum analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Identifier used when the config lives in a [`ConfigRegistry`].
    #[serde(default = "default_name")]
    pub name: String,

    /// Base window size for the adaptive Hurst regression. Range [10, 50].
    #[serde(default = "default_base_window_size")]
    pub base_window_size: usize,

    /// Number of particles in the volatility filter. Range [50, 500].
    #[serde(default = "default_particle_count")]
    pub particle_count: usize,

    /// Base Hurst threshold modulated by the chaos map. Range [0.5, 0.8].
    #[serde(default = "default_hurst_threshold")]
    pub hurst_threshold: f64,

    /// Weight of the entropy term in the adaptive-window exponent.
    #[serde(default = "default_unit_weight")]
    pub volatility_entropy_weight: f64,

    /// Weight of the fractal-dimension term in the adaptive-window exponent.
    #[serde(default = "default_unit_weight")]
    pub fractal_dimension_weight: f64,

    /// Logistic map parameter `r`. Range (0, 4]; 4.0 is fully chaotic.
    #[serde(default = "default_chaos_parameter")]
    pub chaos_parameter: f64,

    /// Step size of the chaotic threshold modulation.
    #[serde(default = "default_chaos_step")]
    pub chaos_step: f64,

    /// Percentile of the particle-volatility history used by the aggregator's
    /// calm-market condition. Range [0.5, 0.95].
    #[serde(default = "default_volatility_quantile")]
    pub volatility_quantile: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            base_window_size: default_base_window_size(),
            particle_count: default_particle_count(),
            hurst_threshold: default_hurst_threshold(),
            volatility_entropy_weight: default_unit_weight(),
            fractal_dimension_weight: default_unit_weight(),
            chaos_parameter: default_chaos_parameter(),
            chaos_step: default_chaos_step(),
            volatility_quantile: default_volatility_quantile(),
        }
    }
}

impl EngineConfig {
    /// Validate every parameter against its declared range.
    ///
    /// Called once at engine construction; an `Err` here means the engine is
    /// never built. There is deliberately no clamping fallback.
    pub fn validate(&self) -> Result<(), EngineError> {
        check_range(
            "base_window_size",
            self.base_window_size as f64,
            10.0,
            50.0,
        )?;
        check_range("particle_count", self.particle_count as f64, 50.0, 500.0)?;
        check_range("hurst_threshold", self.hurst_threshold, 0.5, 0.8)?;
        check_positive("volatility_entropy_weight", self.volatility_entropy_weight)?;
        check_positive("fractal_dimension_weight", self.fractal_dimension_weight)?;
        if !self.chaos_parameter.is_finite()
            || self.chaos_parameter <= 0.0
            || self.chaos_parameter > 4.0
        {
            return Err(EngineError::ConfigOutOfRange {
                field: "chaos_parameter",
                value: self.chaos_parameter,
                min: 0.0,
                max: 4.0,
            });
        }
        check_positive("chaos_step", self.chaos_step)?;
        check_range("volatility_quantile", self.volatility_quantile, 0.5, 0.95)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value < min || value > max {
        return Err(EngineError::ConfigOutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::ConfigOutOfRange {
            field,
            value,
            min: f64::MIN_POSITIVE,
            max: f64::INFINITY,
        });
    }
    Ok(())
}

// =============================================================================
// ConfigRegistry
// =============================================================================

/// Thread-safe store of named configurations.
///
/// Designed to be shared across worker threads running independent per-symbol
/// analyses; the engine itself never touches it.
#[derive(Default)]
pub struct ConfigRegistry {
    configs: RwLock<HashMap<String, EngineConfig>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a configuration under its own name, validating first.
    pub fn insert(&self, config: EngineConfig) -> Result<(), EngineError> {
        config.validate()?;
        info!(name = %config.name, "engine config registered");
        self.configs.write().insert(config.name.clone(), config);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<EngineConfig> {
        self.configs.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<EngineConfig> {
        self.configs.write().remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.read().keys().cloned().collect();
        names.sort();
        names
    }
}
