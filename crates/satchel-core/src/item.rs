#![forbid(unsafe_code)]

//! Immutable item views taken at gesture time.

use bitflags::bitflags;

/// Backend-assigned item instance id.
pub type InstanceId = u64;

bitflags! {
    /// Derived item facts that decide what a local trigger may do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ItemFlags: u8 {
        /// Durability exhausted; still movable, not usable.
        const BROKEN     = 0b01;
        /// Can be consumed directly from a slot.
        const CONSUMABLE = 0b10;
    }
}

/// Snapshot of an item at the moment a gesture armed.
///
/// The tracker validates the eventual intent against this snapshot rather
/// than re-reading state that may have changed under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub instance_id: InstanceId,
    pub definition_id: u64,
    pub stackable: bool,
    pub quantity: u32,
    pub flags: ItemFlags,
}

impl ItemSnapshot {
    /// Snapshot of a single, non-stackable item.
    #[must_use]
    pub const fn single(instance_id: InstanceId, definition_id: u64) -> Self {
        Self {
            instance_id,
            definition_id,
            stackable: false,
            quantity: 1,
            flags: ItemFlags::empty(),
        }
    }

    /// Snapshot of a stackable item with the given quantity.
    #[must_use]
    pub const fn stack(instance_id: InstanceId, definition_id: u64, quantity: u32) -> Self {
        Self {
            instance_id,
            definition_id,
            stackable: true,
            quantity,
            flags: ItemFlags::empty(),
        }
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: ItemFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.flags.contains(ItemFlags::BROKEN)
    }

    #[must_use]
    pub const fn is_consumable(&self) -> bool {
        self.flags.contains(ItemFlags::CONSUMABLE)
    }

    /// A stack that can actually be divided.
    #[must_use]
    pub const fn is_splittable(&self) -> bool {
        self.stackable && self.quantity > 1
    }
}

/// Read access to the live item table.
///
/// Implemented by the runtime's reactive state cache; the core only needs
/// to ask whether an instance still exists and what it currently looks like.
pub trait ItemLookup {
    fn item(&self, instance_id: InstanceId) -> Option<ItemSnapshot>;

    fn contains(&self, instance_id: InstanceId) -> bool {
        self.item(instance_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splittable_requires_stackable_and_more_than_one() {
        assert!(ItemSnapshot::stack(1, 7, 2).is_splittable());
        assert!(!ItemSnapshot::stack(1, 7, 1).is_splittable());
        assert!(!ItemSnapshot::single(1, 7).is_splittable());
    }

    #[test]
    fn flags_are_carried() {
        let snap = ItemSnapshot::single(3, 9).with_flags(ItemFlags::BROKEN | ItemFlags::CONSUMABLE);
        assert!(snap.is_broken());
        assert!(snap.is_consumable());
        assert!(!ItemSnapshot::single(3, 9).is_consumable());
    }
}
