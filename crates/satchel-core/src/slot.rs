#![forbid(unsafe_code)]

//! Slot addressing across every container the client can render.
//!
//! A [`SlotAddress`] names one single-stack storage location: the container
//! kind, the index inside it, and (for world containers) the entity that owns
//! the container. Equality is structural over all three fields.
//!
//! # Index taxonomy
//!
//! Every container except [`ContainerType::Equipment`] is numerically
//! indexed with a fixed capacity taken from the backend's slot counts.
//! Equipment slots are addressed by name (`"head"`, `"chest"`, ...).
//!
//! # Invariants
//!
//! 1. A parsed address always satisfies its container's taxonomy: numeric
//!    containers carry `SlotIndex::Numeric(i)` with `i < capacity`, equipment
//!    carries `SlotIndex::Named` with a known slot name.
//! 2. World containers always carry a `parent_id`; player-bound containers
//!    never do.
//! 3. Addresses are not persisted. They are only meaningful while the slot
//!    they name is registered in the [`SlotRegistry`](crate::registry::SlotRegistry).

use std::fmt;
use std::str::FromStr;

/// Every container family the client renders slots for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerType {
    Inventory,
    Hotbar,
    Equipment,
    CampfireFuel,
    FurnaceFuel,
    Fumarole,
    LanternFuel,
    WoodenStorageBox,
    Stash,
    PlayerCorpse,
    RainCollector,
    HomesteadHearth,
    BrothPotIngredient,
    BrothPotWaterContainer,
    BrothPotOutput,
    Barbecue,
}

impl ContainerType {
    /// All container types, in declaration order.
    pub const ALL: [ContainerType; 16] = [
        Self::Inventory,
        Self::Hotbar,
        Self::Equipment,
        Self::CampfireFuel,
        Self::FurnaceFuel,
        Self::Fumarole,
        Self::LanternFuel,
        Self::WoodenStorageBox,
        Self::Stash,
        Self::PlayerCorpse,
        Self::RainCollector,
        Self::HomesteadHearth,
        Self::BrothPotIngredient,
        Self::BrothPotWaterContainer,
        Self::BrothPotOutput,
        Self::Barbecue,
    ];

    /// Stable wire tag, as used by the rendering layer's slot markers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Hotbar => "hotbar",
            Self::Equipment => "equipment",
            Self::CampfireFuel => "campfire_fuel",
            Self::FurnaceFuel => "furnace_fuel",
            Self::Fumarole => "fumarole",
            Self::LanternFuel => "lantern_fuel",
            Self::WoodenStorageBox => "wooden_storage_box",
            Self::Stash => "stash",
            Self::PlayerCorpse => "player_corpse",
            Self::RainCollector => "rain_collector",
            Self::HomesteadHearth => "homestead_hearth",
            Self::BrothPotIngredient => "broth_pot_ingredient",
            Self::BrothPotWaterContainer => "broth_pot_water_container",
            Self::BrothPotOutput => "broth_pot_output",
            Self::Barbecue => "barbecue",
        }
    }

    /// Whether slots in this container use numeric indices.
    #[must_use]
    pub const fn is_numeric_indexed(self) -> bool {
        !matches!(self, Self::Equipment)
    }

    /// Whether this container lives in the world (and so needs a parent id).
    #[must_use]
    pub const fn is_world_container(self) -> bool {
        !matches!(self, Self::Inventory | Self::Hotbar | Self::Equipment)
    }

    /// Number of numeric slots, or `None` for name-indexed containers.
    ///
    /// Containers that come in sizes (storage boxes, furnaces) report the
    /// largest variant; the backend rejects indices beyond the real size.
    #[must_use]
    pub const fn capacity(self) -> Option<u32> {
        match self {
            Self::Inventory => Some(24),
            Self::Hotbar => Some(6),
            Self::Equipment => None,
            Self::CampfireFuel => Some(5),
            Self::FurnaceFuel => Some(18),
            Self::Fumarole => Some(6),
            Self::LanternFuel => Some(1),
            Self::WoodenStorageBox => Some(48),
            Self::Stash => Some(6),
            Self::PlayerCorpse => Some(36),
            Self::RainCollector => Some(1),
            Self::HomesteadHearth => Some(20),
            Self::BrothPotIngredient => Some(3),
            Self::BrothPotWaterContainer => Some(1),
            Self::BrothPotOutput => Some(1),
            Self::Barbecue => Some(12),
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerType {
    type Err = SlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| SlotParseError::UnknownContainer(s.to_string()))
    }
}

/// Named equipment slots (worn armor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentSlot {
    Head,
    Chest,
    Legs,
    Feet,
    Hands,
    Back,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 6] = [
        Self::Head,
        Self::Chest,
        Self::Legs,
        Self::Feet,
        Self::Hands,
        Self::Back,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Chest => "chest",
            Self::Legs => "legs",
            Self::Feet => "feet",
            Self::Hands => "hands",
            Self::Back => "back",
        }
    }

    /// Case-insensitive lookup; the UI historically mixed `"Head"` and `"head"`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name))
    }
}

/// Index of a slot inside its container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotIndex {
    Numeric(u32),
    Named(String),
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(i) => write!(f, "{i}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Structural address of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotAddress {
    pub container: ContainerType,
    pub index: SlotIndex,
    pub parent_id: Option<u64>,
}

impl SlotAddress {
    /// Player inventory slot.
    #[must_use]
    pub const fn inventory(index: u32) -> Self {
        Self {
            container: ContainerType::Inventory,
            index: SlotIndex::Numeric(index),
            parent_id: None,
        }
    }

    /// Player hotbar slot.
    #[must_use]
    pub const fn hotbar(index: u32) -> Self {
        Self {
            container: ContainerType::Hotbar,
            index: SlotIndex::Numeric(index),
            parent_id: None,
        }
    }

    /// Worn equipment slot.
    #[must_use]
    pub fn equipment(slot: EquipmentSlot) -> Self {
        Self {
            container: ContainerType::Equipment,
            index: SlotIndex::Named(slot.as_str().to_string()),
            parent_id: None,
        }
    }

    /// Numeric slot in a world container owned by entity `parent_id`.
    #[must_use]
    pub const fn world(container: ContainerType, index: u32, parent_id: u64) -> Self {
        Self {
            container,
            index: SlotIndex::Numeric(index),
            parent_id: Some(parent_id),
        }
    }

    /// Build an address from the raw strings a slot marker carries,
    /// validating it against the container's index taxonomy.
    pub fn parse(
        container_tag: &str,
        raw_index: &str,
        parent_id: Option<u64>,
    ) -> Result<Self, SlotParseError> {
        let container: ContainerType = container_tag.parse()?;

        let index = if container.is_numeric_indexed() {
            let i: u32 = raw_index
                .trim()
                .parse()
                .map_err(|_| SlotParseError::NonNumericIndex {
                    container,
                    raw: raw_index.to_string(),
                })?;
            if let Some(capacity) = container.capacity()
                && i >= capacity
            {
                return Err(SlotParseError::IndexOutOfRange {
                    container,
                    index: i,
                    capacity,
                });
            }
            SlotIndex::Numeric(i)
        } else {
            let slot = EquipmentSlot::from_name(raw_index.trim())
                .ok_or_else(|| SlotParseError::UnknownSlotName(raw_index.to_string()))?;
            SlotIndex::Named(slot.as_str().to_string())
        };

        match (container.is_world_container(), parent_id) {
            (true, None) => return Err(SlotParseError::MissingParent(container)),
            (false, Some(_)) => return Err(SlotParseError::UnexpectedParent(container)),
            _ => {}
        }

        Ok(Self {
            container,
            index,
            parent_id,
        })
    }

    /// Numeric index, if this address has one.
    #[must_use]
    pub fn numeric_index(&self) -> Option<u32> {
        match self.index {
            SlotIndex::Numeric(i) => Some(i),
            SlotIndex::Named(_) => None,
        }
    }
}

impl fmt::Display for SlotAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.container, self.index)?;
        if let Some(parent) = self.parent_id {
            write!(f, "@{parent}")?;
        }
        Ok(())
    }
}

/// Why a raw slot marker failed to become a [`SlotAddress`].
///
/// The transfer path treats all of these as "no slot here"; they surface
/// only in debug logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotParseError {
    UnknownContainer(String),
    NonNumericIndex { container: ContainerType, raw: String },
    IndexOutOfRange {
        container: ContainerType,
        index: u32,
        capacity: u32,
    },
    UnknownSlotName(String),
    MissingParent(ContainerType),
    UnexpectedParent(ContainerType),
}

impl fmt::Display for SlotParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownContainer(tag) => write!(f, "unknown container tag '{tag}'"),
            Self::NonNumericIndex { container, raw } => {
                write!(f, "{container} expects a numeric index, got '{raw}'")
            }
            Self::IndexOutOfRange {
                container,
                index,
                capacity,
            } => write!(f, "{container} index {index} out of range (capacity {capacity})"),
            Self::UnknownSlotName(name) => write!(f, "unknown equipment slot '{name}'"),
            Self::MissingParent(container) => {
                write!(f, "{container} slot requires a parent entity id")
            }
            Self::UnexpectedParent(container) => {
                write!(f, "{container} slot cannot carry a parent entity id")
            }
        }
    }
}

impl std::error::Error for SlotParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_str() {
        for container in ContainerType::ALL {
            assert_eq!(container.as_str().parse::<ContainerType>(), Ok(container));
        }
    }

    #[test]
    fn only_equipment_is_name_indexed() {
        let named: Vec<_> = ContainerType::ALL
            .into_iter()
            .filter(|c| !c.is_numeric_indexed())
            .collect();
        assert_eq!(named, vec![ContainerType::Equipment]);
        assert_eq!(ContainerType::Equipment.capacity(), None);
    }

    #[test]
    fn parse_numeric_slot() {
        let addr = SlotAddress::parse("campfire_fuel", "2", Some(17)).unwrap();
        assert_eq!(addr, SlotAddress::world(ContainerType::CampfireFuel, 2, 17));
        assert_eq!(addr.to_string(), "campfire_fuel[2]@17");
    }

    #[test]
    fn parse_equipment_slot_is_case_insensitive() {
        let addr = SlotAddress::parse("equipment", "Head", None).unwrap();
        assert_eq!(addr, SlotAddress::equipment(EquipmentSlot::Head));
        assert_eq!(addr.numeric_index(), None);
    }

    #[test]
    fn parse_rejects_non_numeric_index() {
        let err = SlotAddress::parse("hotbar", "head", None).unwrap_err();
        assert!(matches!(err, SlotParseError::NonNumericIndex { .. }));
    }

    #[test]
    fn parse_rejects_out_of_range() {
        let err = SlotAddress::parse("hotbar", "6", None).unwrap_err();
        assert_eq!(
            err,
            SlotParseError::IndexOutOfRange {
                container: ContainerType::Hotbar,
                index: 6,
                capacity: 6,
            }
        );
    }

    #[test]
    fn parse_rejects_unknown_container_and_slot_name() {
        assert!(matches!(
            SlotAddress::parse("mailbox", "0", None),
            Err(SlotParseError::UnknownContainer(_))
        ));
        assert!(matches!(
            SlotAddress::parse("equipment", "tail", None),
            Err(SlotParseError::UnknownSlotName(_))
        ));
    }

    #[test]
    fn parse_enforces_parent_rules() {
        assert_eq!(
            SlotAddress::parse("stash", "0", None),
            Err(SlotParseError::MissingParent(ContainerType::Stash))
        );
        assert_eq!(
            SlotAddress::parse("inventory", "0", Some(4)),
            Err(SlotParseError::UnexpectedParent(ContainerType::Inventory))
        );
    }

    #[test]
    fn equality_is_structural_over_parent() {
        let a = SlotAddress::world(ContainerType::Stash, 1, 10);
        let b = SlotAddress::world(ContainerType::Stash, 1, 11);
        assert_ne!(a, b);
        assert_eq!(a, SlotAddress::world(ContainerType::Stash, 1, 10));
    }
}
