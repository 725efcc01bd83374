#![forbid(unsafe_code)]

//! Arm-time split decisions.
//!
//! The split quantity of a drag is decided once, when the press arms the
//! gesture, from the button and modifiers held at that moment:
//!
//! | press                          | split                         |
//! |--------------------------------|-------------------------------|
//! | primary                        | whole stack (`None`)          |
//! | primary + ctrl, or secondary   | `max(1, q / 2)`               |
//! | tertiary                       | `max(1, q / 2)`               |
//! | tertiary + shift               | `max(1, q / 3)`               |
//! | injected split-panel value `v` | `v`, clamped into `1..q`      |
//!
//! A split only applies to stackable items with `q > 1`. A computed value
//! that would move the whole stack collapses to `None`, since the backend
//! rejects splits of `quantity >= stack`.

use crate::event::{Modifiers, PointerButton};
use crate::item::ItemSnapshot;

/// Which split family a press selected, before applying it to a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitGesture {
    Whole,
    Half,
    Third,
}

impl SplitGesture {
    /// Classify a press.
    #[must_use]
    pub fn classify(button: PointerButton, modifiers: Modifiers) -> Self {
        match button {
            PointerButton::Primary if modifiers.contains(Modifiers::CTRL) => Self::Half,
            PointerButton::Primary => Self::Whole,
            PointerButton::Secondary => Self::Half,
            PointerButton::Tertiary if modifiers.contains(Modifiers::SHIFT) => Self::Third,
            PointerButton::Tertiary => Self::Half,
        }
    }

    /// Apply to a stack quantity. `None` means "move the whole stack".
    #[must_use]
    pub fn apply(self, quantity: u32) -> Option<u32> {
        let raw = match self {
            Self::Whole => return None,
            Self::Half => (quantity / 2).max(1),
            Self::Third => (quantity / 3).max(1),
        };
        (raw < quantity).then_some(raw)
    }
}

/// Compute the split quantity for a press on `item`.
///
/// `injected` is the value chosen in the split panel, if one is open; it
/// overrides the button/modifier rule entirely.
#[must_use]
pub fn split_quantity(
    item: &ItemSnapshot,
    button: PointerButton,
    modifiers: Modifiers,
    injected: Option<u32>,
) -> Option<u32> {
    if !item.is_splittable() {
        return None;
    }
    if let Some(value) = injected {
        return Some(value.clamp(1, item.quantity - 1));
    }
    SplitGesture::classify(button, modifiers).apply(item.quantity)
}
