#![forbid(unsafe_code)]

//! Tunable parameters as data.
//!
//! [`SatchelConfig`] gathers every knob of the gesture and cooldown layers
//! and can be loaded from TOML or JSON at startup (feature `config`).
//!
//! ```toml
//! [gesture]
//! drag_threshold_sq = 9.0
//!
//! [cooldown]
//! default_melee_interval_ms = 650
//!
//! [[actions]]
//! definition_id = 42
//! category = "consumable"
//! duration_ms = 1500
//! switch_policy = "interruptible"
//! ```
//!
//! `SatchelConfig::default()` matches the built-in constants.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use satchel_core::GestureConfig;
use satchel_core::gesture::DEFAULT_DRAG_THRESHOLD_SQ;
use satchel_core::registry::{DEFAULT_BUCKET_SIZE, MIN_BUCKET_SIZE};

use crate::action::{
    ActionCatalog, ActionCategory, ActionDefinition, BANDAGE_DURATION_MS,
    DEFAULT_CONSUME_INTERVAL_MS, DEFAULT_MELEE_INTERVAL_MS,
};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct SatchelConfig {
    pub gesture: GesturePolicy,
    pub registry: RegistryPolicy,
    pub cooldown: CooldownPolicy,
    /// Per-definition actions. A definition with no entry falls back to the
    /// `cooldown` defaults, chosen by the item's flags.
    pub actions: Vec<ActionDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct GesturePolicy {
    /// Squared pointer travel (px²) before a press becomes a drag.
    pub drag_threshold_sq: f32,
}

impl Default for GesturePolicy {
    fn default() -> Self {
        Self {
            drag_threshold_sq: DEFAULT_DRAG_THRESHOLD_SQ,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RegistryPolicy {
    /// Edge of one spatial-index bucket in px.
    pub bucket_size: f32,
}

impl Default for RegistryPolicy {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct CooldownPolicy {
    /// Attack interval for equipped items with no catalog entry.
    pub default_melee_interval_ms: u64,
    /// Interval for consumable items with no catalog entry.
    pub default_consume_interval_ms: u64,
    /// Visible duration of effect-driven windows with no catalog entry.
    pub bandage_duration_ms: u64,
    /// Let an authoritative start confirm an outstanding local prediction
    /// in place instead of restarting the window.
    pub claim_predictions: bool,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            default_melee_interval_ms: DEFAULT_MELEE_INTERVAL_MS,
            default_consume_interval_ms: DEFAULT_CONSUME_INTERVAL_MS,
            bandage_duration_ms: BANDAGE_DURATION_MS,
            claim_predictions: true,
        }
    }
}

impl SatchelConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Range-check every parameter. An empty list means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let t = self.gesture.drag_threshold_sq;
        if !t.is_finite() || t < 0.0 {
            errors.push(format!(
                "gesture.drag_threshold_sq must be finite and >= 0, got {t}"
            ));
        }
        let b = self.registry.bucket_size;
        if !b.is_finite() || b < MIN_BUCKET_SIZE {
            errors.push(format!(
                "registry.bucket_size must be finite and >= {MIN_BUCKET_SIZE}, got {b}"
            ));
        }
        if self.cooldown.default_melee_interval_ms == 0 {
            errors.push("cooldown.default_melee_interval_ms must be > 0".to_string());
        }
        if self.cooldown.default_consume_interval_ms == 0 {
            errors.push("cooldown.default_consume_interval_ms must be > 0".to_string());
        }
        if self.cooldown.bandage_duration_ms == 0 {
            errors.push("cooldown.bandage_duration_ms must be > 0".to_string());
        }

        let mut seen = ahash::AHashSet::new();
        for def in &self.actions {
            if def.duration_ms == 0 {
                errors.push(format!(
                    "actions[{}].duration_ms must be > 0",
                    def.definition_id
                ));
            }
            if !seen.insert(def.definition_id) {
                errors.push(format!(
                    "actions[{}] is defined more than once",
                    def.definition_id
                ));
            }
        }

        errors
    }

    /// Validate, returning the config or every problem found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    #[must_use]
    pub fn to_gesture_config(&self) -> GestureConfig {
        GestureConfig {
            drag_threshold_sq: self.gesture.drag_threshold_sq,
        }
    }

    /// Build the action catalog: the configured actions plus the fallback
    /// durations for definitions without an entry.
    #[must_use]
    pub fn to_catalog(&self) -> ActionCatalog {
        let mut catalog = ActionCatalog::new(self.cooldown.default_melee_interval_ms)
            .with_consume_interval(self.cooldown.default_consume_interval_ms)
            .with_effect_duration(self.cooldown.bandage_duration_ms);
        for def in &self.actions {
            catalog.insert(def.clone());
        }
        catalog
    }

    /// Append an action definition.
    #[must_use]
    pub fn with_action(mut self, definition_id: u64, category: ActionCategory, duration_ms: u64) -> Self {
        self.actions
            .push(ActionDefinition::new(definition_id, category, duration_ms));
        self
    }
}

/// Errors that can occur when loading a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Invalid(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Invalid(errors) => write!(f, "invalid configuration: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}
