#![forbid(unsafe_code)]

//! Canonical pointer input types.
//!
//! The rendering layer translates whatever its windowing toolkit delivers
//! into these types before handing them to the
//! [`GestureTracker`](crate::gesture::GestureTracker).
//!
//! # Design Notes
//!
//! - Positions are in logical pixels, origin at the top-left of the viewport.
//! - Buttons are named by role (primary/secondary/tertiary), not by side,
//!   so left-handed mappings stay correct.
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;

use crate::geometry::Point;

/// Pointer button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Usually the left mouse button.
    Primary,

    /// Usually the right mouse button.
    Secondary,

    /// Middle mouse button (scroll wheel click).
    Tertiary,
}

impl PointerButton {
    /// Map a DOM-style `MouseEvent.button` code (0, 1, 2) to a button.
    #[must_use]
    pub const fn from_dom_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Primary),
            1 => Some(Self::Tertiary),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

bitflags! {
    /// Modifier keys held during a pointer event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// The type of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// Button pressed down.
    Down(PointerButton),

    /// Pointer moved (with or without a button held).
    Move,

    /// Button released.
    Up(PointerButton),
}

/// A pointer event in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// The type of pointer event.
    pub kind: PointerEventKind,

    /// Pointer position in logical pixels.
    pub pos: Point,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Create a new pointer event without modifiers.
    #[must_use]
    pub const fn new(kind: PointerEventKind, pos: Point) -> Self {
        Self {
            kind,
            pos,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a pointer event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_codes_map_by_role() {
        assert_eq!(PointerButton::from_dom_code(0), Some(PointerButton::Primary));
        assert_eq!(PointerButton::from_dom_code(1), Some(PointerButton::Tertiary));
        assert_eq!(PointerButton::from_dom_code(2), Some(PointerButton::Secondary));
        assert_eq!(PointerButton::from_dom_code(3), None);
    }

    #[test]
    fn modifier_helpers() {
        let ev = PointerEvent::new(PointerEventKind::Move, Point::new(1.0, 2.0))
            .with_modifiers(Modifiers::CTRL | Modifiers::SHIFT);
        assert!(ev.ctrl());
        assert!(ev.shift());
        assert_eq!(Modifiers::default(), Modifiers::NONE);
    }
}
