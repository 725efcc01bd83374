#![forbid(unsafe_code)]

//! Time-gated action definitions.
//!
//! Each item definition that can trigger a cooldown maps to an
//! [`ActionDefinition`]: its category, the visible duration, and whether a
//! hotbar selection change interrupts the visual. The policy is an explicit
//! per-definition flag with a per-category default, never derived from item
//! names.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use ahash::AHashMap;

use satchel_core::ItemSnapshot;

/// Default melee attack interval when a weapon has no explicit one.
pub const DEFAULT_MELEE_INTERVAL_MS: u64 = 500;

/// Backend-enforced gap between two consumptions.
pub const DEFAULT_CONSUME_INTERVAL_MS: u64 = 1_000;

/// Visible duration of a bandage use. Longer than the backend's own
/// internal cooldown so the bar covers the whole heal.
pub const BANDAGE_DURATION_MS: u64 = 5_000;

/// Broad action family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum ActionCategory {
    MeleeSwing,
    RangedReload,
    Consumable,
    Bandage,
    Throwable,
}

impl ActionCategory {
    #[must_use]
    pub const fn default_policy(self) -> SwitchPolicy {
        match self {
            Self::MeleeSwing | Self::RangedReload | Self::Throwable => SwitchPolicy::Interruptible,
            Self::Consumable | Self::Bandage => SwitchPolicy::Sticky,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MeleeSwing => "melee_swing",
            Self::RangedReload => "ranged_reload",
            Self::Consumable => "consumable",
            Self::Bandage => "bandage",
            Self::Throwable => "throwable",
        }
    }
}

/// What a hotbar selection change does to an active cooldown visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum SwitchPolicy {
    /// Persists across slot switches (eating, bandaging).
    Sticky,
    /// Retired as soon as the selection moves away (swings, reloads).
    Interruptible,
}

/// One action-capable item definition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct ActionDefinition {
    pub definition_id: u64,
    pub category: ActionCategory,
    pub duration_ms: u64,
    /// Overrides the category default.
    #[cfg_attr(feature = "config", serde(default))]
    pub switch_policy: Option<SwitchPolicy>,
}

impl ActionDefinition {
    #[must_use]
    pub const fn new(definition_id: u64, category: ActionCategory, duration_ms: u64) -> Self {
        Self {
            definition_id,
            category,
            duration_ms,
            switch_policy: None,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: SwitchPolicy) -> Self {
        self.switch_policy = Some(policy);
        self
    }

    /// The effective switch policy.
    #[must_use]
    pub const fn policy(&self) -> SwitchPolicy {
        match self.switch_policy {
            Some(p) => p,
            None => self.category.default_policy(),
        }
    }
}

/// Lookup from item definition to action.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    by_definition: AHashMap<u64, ActionDefinition>,
    default_melee_interval_ms: u64,
    default_consume_interval_ms: u64,
    default_effect_duration_ms: u64,
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_MELEE_INTERVAL_MS)
    }
}

impl ActionCatalog {
    #[must_use]
    pub fn new(default_melee_interval_ms: u64) -> Self {
        Self {
            by_definition: AHashMap::new(),
            default_melee_interval_ms,
            default_consume_interval_ms: DEFAULT_CONSUME_INTERVAL_MS,
            default_effect_duration_ms: BANDAGE_DURATION_MS,
        }
    }

    /// Interval for consumables with no entry.
    #[must_use]
    pub const fn with_consume_interval(mut self, interval_ms: u64) -> Self {
        self.default_consume_interval_ms = interval_ms;
        self
    }

    /// Visible duration for effect-driven actions with no entry.
    #[must_use]
    pub const fn with_effect_duration(mut self, duration_ms: u64) -> Self {
        self.default_effect_duration_ms = duration_ms;
        self
    }

    /// Add or replace a definition.
    pub fn insert(&mut self, def: ActionDefinition) -> Option<ActionDefinition> {
        self.by_definition.insert(def.definition_id, def)
    }

    #[must_use]
    pub fn with(mut self, def: ActionDefinition) -> Self {
        self.insert(def);
        self
    }

    #[must_use]
    pub fn get(&self, definition_id: u64) -> Option<&ActionDefinition> {
        self.by_definition.get(&definition_id)
    }

    /// The action for an equipped item. Unknown definitions swing like a
    /// melee weapon with the default interval.
    #[must_use]
    pub fn for_equipped(&self, definition_id: u64) -> ActionDefinition {
        self.get(definition_id).cloned().unwrap_or(ActionDefinition::new(
            definition_id,
            ActionCategory::MeleeSwing,
            self.default_melee_interval_ms,
        ))
    }

    /// The action a local trigger of `item` performs. Without an entry the
    /// item's flags decide: consumables are eaten, everything else swings.
    #[must_use]
    pub fn for_item(&self, item: &ItemSnapshot) -> ActionDefinition {
        if let Some(def) = self.get(item.definition_id) {
            return def.clone();
        }
        if item.is_consumable() {
            ActionDefinition::new(
                item.definition_id,
                ActionCategory::Consumable,
                self.default_consume_interval_ms,
            )
        } else {
            self.for_equipped(item.definition_id)
        }
    }

    /// The action behind an effect caused by a consuming item. Unknown
    /// definitions are treated as bandages.
    #[must_use]
    pub fn for_effect(&self, definition_id: u64) -> ActionDefinition {
        self.get(definition_id).cloned().unwrap_or(ActionDefinition::new(
            definition_id,
            ActionCategory::Bandage,
            self.default_effect_duration_ms,
        ))
    }

    #[must_use]
    pub const fn default_melee_interval_ms(&self) -> u64 {
        self.default_melee_interval_ms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_definition.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_definition.is_empty()
    }
}

impl FromIterator<ActionDefinition> for ActionCatalog {
    fn from_iter<I: IntoIterator<Item = ActionDefinition>>(iter: I) -> Self {
        let mut catalog = Self::default();
        for def in iter {
            catalog.insert(def);
        }
        catalog
    }
}
