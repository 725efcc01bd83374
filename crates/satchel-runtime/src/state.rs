#![forbid(unsafe_code)]

//! Reactive cache of backend-owned state.
//!
//! The host's connection layer writes into [`BackendState`]; everything in
//! here is authoritative and read-only from the client's point of view.

use ahash::AHashMap;
use satchel_core::{InstanceId, ItemLookup, ItemSnapshot, SlotAddress};

use crate::reactive::Observable;

/// Backend identity of a player.
pub type PlayerId = u64;

/// The local player's active-equipment record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveEquipment {
    pub equipped_item_instance_id: Option<InstanceId>,
    pub equipped_item_def_id: Option<u64>,
    /// Authoritative start of the current swing/use, `0` when idle.
    pub swing_start_time_ms: u64,
}

impl ActiveEquipment {
    #[must_use]
    pub const fn equipped(instance_id: InstanceId, def_id: u64) -> Self {
        Self {
            equipped_item_instance_id: Some(instance_id),
            equipped_item_def_id: Some(def_id),
            swing_start_time_ms: 0,
        }
    }

    #[must_use]
    pub const fn with_swing(mut self, start_ms: u64) -> Self {
        self.swing_start_time_ms = start_ms;
        self
    }

    #[must_use]
    pub const fn is_swinging(&self) -> bool {
        self.swing_start_time_ms != 0
    }
}

/// Type tag of a timed effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EffectType {
    HealthRegen,
    Burn,
    Bleed,
    BandageBurst,
    RemoteBandageBurst,
    FoodPoisoning,
    WaterDrinking,
    Other(String),
}

impl EffectType {
    /// Whether this effect represents the use of a consuming item whose
    /// cooldown bar should follow the effect.
    #[must_use]
    pub const fn drives_item_cooldown(&self) -> bool {
        matches!(self, Self::BandageBurst | Self::RemoteBandageBurst)
    }
}

/// A timed effect currently applied by the backend.
///
/// The start time is not carried: it is inferred from first observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEffect {
    pub id: u64,
    pub effect_type: EffectType,
    /// Player who initiated the effect.
    pub owner: PlayerId,
    pub item_def_id: u64,
    pub consuming_item_instance_id: Option<InstanceId>,
}

/// Where one item instance currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLocation {
    pub item: ItemSnapshot,
    pub slot: SlotAddress,
}

/// The player's item-location table: instance → (snapshot, slot).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemLocationTable {
    by_id: AHashMap<InstanceId, ItemLocation>,
    by_slot: AHashMap<SlotAddress, InstanceId>,
}

impl ItemLocationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `item` in `slot`, replacing whatever was recorded for either.
    pub fn insert(&mut self, item: ItemSnapshot, slot: SlotAddress) {
        let id = item.instance_id;
        self.remove(id);
        if let Some(previous) = self.by_slot.insert(slot.clone(), id) {
            self.by_id.remove(&previous);
        }
        self.by_id.insert(id, ItemLocation { item, slot });
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<ItemLocation> {
        let location = self.by_id.remove(&id)?;
        self.by_slot.remove(&location.slot);
        Some(location)
    }

    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&ItemLocation> {
        self.by_id.get(&id)
    }

    /// The item occupying `slot`, if any.
    #[must_use]
    pub fn at_slot(&self, slot: &SlotAddress) -> Option<&ItemLocation> {
        self.by_slot.get(slot).and_then(|id| self.by_id.get(id))
    }

    pub fn occupied_slots(&self) -> impl Iterator<Item = &SlotAddress> {
        self.by_slot.keys()
    }

    pub fn ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.by_id.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl FromIterator<(ItemSnapshot, SlotAddress)> for ItemLocationTable {
    fn from_iter<I: IntoIterator<Item = (ItemSnapshot, SlotAddress)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (item, slot) in iter {
            table.insert(item, slot);
        }
        table
    }
}

impl ItemLookup for ItemLocationTable {
    fn item(&self, id: InstanceId) -> Option<ItemSnapshot> {
        self.by_id.get(&id).map(|l| l.item.clone())
    }

    fn contains(&self, id: InstanceId) -> bool {
        self.by_id.contains_key(&id)
    }
}

/// Reactive handles the connection layer writes into.
///
/// Clones share the same cells.
#[derive(Debug, Clone)]
pub struct BackendState {
    pub active_equipment: Observable<Option<ActiveEquipment>>,
    pub effects: Observable<Vec<ActiveEffect>>,
    pub items: Observable<ItemLocationTable>,
}

impl Default for BackendState {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            active_equipment: Observable::new(None),
            effects: Observable::new(Vec::new()),
            items: Observable::new(ItemLocationTable::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_moves_item_between_slots() {
        let mut table = ItemLocationTable::new();
        table.insert(ItemSnapshot::single(1, 10), SlotAddress::inventory(0));
        table.insert(ItemSnapshot::single(1, 10), SlotAddress::hotbar(2));

        assert!(table.at_slot(&SlotAddress::inventory(0)).is_none());
        assert_eq!(
            table.get(1).map(|l| &l.slot),
            Some(&SlotAddress::hotbar(2))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn insert_into_occupied_slot_evicts_previous_item() {
        let mut table = ItemLocationTable::new();
        table.insert(ItemSnapshot::single(1, 10), SlotAddress::inventory(0));
        table.insert(ItemSnapshot::single(2, 11), SlotAddress::inventory(0));

        assert!(!table.contains(1));
        assert_eq!(
            table.at_slot(&SlotAddress::inventory(0)).map(|l| l.item.instance_id),
            Some(2)
        );
    }

    #[test]
    fn lookup_trait_reflects_table() {
        let table: ItemLocationTable = [
            (ItemSnapshot::stack(5, 3, 12), SlotAddress::inventory(4)),
            (ItemSnapshot::single(6, 4), SlotAddress::hotbar(0)),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.item(5).map(|i| i.quantity), Some(12));
        assert!(table.item(99).is_none());
        assert_eq!(table.occupied_slots().count(), 2);
    }

    #[test]
    fn equipment_swing_flags() {
        let eq = ActiveEquipment::equipped(3, 30);
        assert!(!eq.is_swinging());
        assert!(eq.with_swing(1000).is_swinging());
        assert!(EffectType::BandageBurst.drives_item_cooldown());
        assert!(!EffectType::Burn.drives_item_cooldown());
    }
}
