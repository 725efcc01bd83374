#![forbid(unsafe_code)]

//! Timed effects → authoritative cooldown starts.
//!
//! Effects such as a bandage burst carry no usable start time for the
//! client, so the client time at which an effect id is first observed
//! becomes its start. Those synthetic starts are strictly increasing, so a
//! second use of the same item within one millisecond is still a new
//! occurrence for the reconciler.
//!
//! The backend deletes an effect both when it runs out and when it is
//! interrupted (re-equip, clear, damage). Each ended effect is reported with
//! the item it was driving so the caller can retire that item's window.

use ahash::AHashMap;
use tracing::debug;

use satchel_core::InstanceId;

use crate::state::{ActiveEffect, PlayerId};

/// A newly observed item-driven effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectStart {
    pub effect_id: u64,
    pub item: InstanceId,
    pub item_def_id: u64,
    /// Client time of first observation.
    pub started_at_ms: u64,
}

/// A tracked effect that is no longer in the effect set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectEnd {
    pub effect_id: u64,
    pub item: InstanceId,
}

/// Result of diffing one effect-set push against what was seen before.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectChanges {
    pub started: Vec<EffectStart>,
    /// Effects that disappeared since the last push, in effect-id order.
    pub ended: Vec<EffectEnd>,
}

impl EffectChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.ended.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    item: InstanceId,
    first_seen_ms: u64,
}

/// Remembers which effects have been seen and when.
#[derive(Debug, Clone)]
pub struct EffectTracker {
    local_player: PlayerId,
    seen: AHashMap<u64, Tracked>,
    last_issued_ms: Option<u64>,
}

impl EffectTracker {
    #[must_use]
    pub fn new(local_player: PlayerId) -> Self {
        Self {
            local_player,
            seen: AHashMap::new(),
            last_issued_ms: None,
        }
    }

    /// Diff the current effect set against the previous one.
    ///
    /// Only effects initiated by the local player with a consuming item
    /// instance are tracked. Starts are returned in effect-id order.
    pub fn observe(&mut self, effects: &[ActiveEffect], now_ms: u64) -> EffectChanges {
        let mut changes = EffectChanges::default();

        let mut relevant: Vec<&ActiveEffect> = effects
            .iter()
            .filter(|e| e.owner == self.local_player && e.effect_type.drives_item_cooldown())
            .filter(|e| e.consuming_item_instance_id.is_some())
            .collect();
        relevant.sort_by_key(|e| e.id);

        for effect in &relevant {
            let Some(item) = effect.consuming_item_instance_id else {
                continue;
            };
            if self.seen.contains_key(&effect.id) {
                continue;
            }
            let started_at_ms = match self.last_issued_ms {
                Some(last) if now_ms <= last => last + 1,
                _ => now_ms,
            };
            self.last_issued_ms = Some(started_at_ms);
            self.seen.insert(
                effect.id,
                Tracked {
                    item,
                    first_seen_ms: started_at_ms,
                },
            );
            debug!(effect = effect.id, item, started_at_ms, "item effect observed");
            changes.started.push(EffectStart {
                effect_id: effect.id,
                item,
                item_def_id: effect.item_def_id,
                started_at_ms,
            });
        }

        let mut ended: Vec<EffectEnd> = self
            .seen
            .iter()
            .filter(|(id, _)| !relevant.iter().any(|e| e.id == **id))
            .map(|(&effect_id, t)| EffectEnd {
                effect_id,
                item: t.item,
            })
            .collect();
        ended.sort_unstable_by_key(|e| e.effect_id);
        for end in &ended {
            self.seen.remove(&end.effect_id);
            debug!(effect = end.effect_id, item = end.item, "item effect ended");
        }
        changes.ended = ended;
        changes
    }

    /// First-observation time of a tracked effect.
    #[must_use]
    pub fn first_seen_ms(&self, effect_id: u64) -> Option<u64> {
        self.seen.get(&effect_id).map(|t| t.first_seen_ms)
    }

    /// Forget everything (reconnect). The issue counter is kept so new
    /// starts stay strictly increasing.
    pub fn clear(&mut self) {
        self.seen.clear();
    }

    #[must_use]
    pub fn tracked_len(&self) -> usize {
        self.seen.len()
    }
}
