#![forbid(unsafe_code)]

//! Core: slot addressing, pointer gestures, and transfer resolution.
//!
//! # Role in Satchel
//! `satchel-core` is the input layer. It owns the vocabulary every other
//! crate speaks (pointer events, slot addresses, item snapshots) and the
//! gesture half of the client: turning a press → move → release sequence on
//! one item into a single, unambiguous [`TransferIntent`].
//!
//! # Primary responsibilities
//! - **SlotRegistry**: screen point → [`SlotAddress`] lookup, fed by the
//!   rendering layer as containers open and close.
//! - **GestureTracker**: the explicit [`DragLifecycle`] state machine with
//!   click-vs-drag discrimination and arm-time split decisions.
//! - **TransferResolver**: release position → transfer, world drop, or a
//!   silent same-slot cancel.
//!
//! # How it fits in the system
//! The runtime (`satchel-runtime`) feeds pointer events into the tracker,
//! forwards resolved intents to the backend command surface, and owns the
//! cooldown half. Nothing in this crate knows about time-gated actions.
//!
//! [`TransferIntent`]: resolver::TransferIntent
//! [`SlotAddress`]: slot::SlotAddress
//! [`DragLifecycle`]: gesture::DragLifecycle

pub mod event;
pub mod geometry;
pub mod gesture;
pub mod item;
pub mod registry;
pub mod resolver;
pub mod slot;
pub mod split;
pub mod time;

pub use event::{Modifiers, PointerButton, PointerEvent, PointerEventKind};
pub use geometry::{Point, Rect};
pub use gesture::{
    ActiveDrag, ArmedDrag, ClickAction, DragCancelReason, DragLifecycle, DragOutcome,
    GestureConfig, GestureEvent, GestureTracker,
};
pub use item::{InstanceId, ItemFlags, ItemLookup, ItemSnapshot};
pub use registry::{RawSlotTag, SlotRegistry};
pub use resolver::{Resolution, TransferIntent, TransferResolver};
pub use slot::{ContainerType, EquipmentSlot, SlotAddress, SlotIndex, SlotParseError};
pub use split::{SplitGesture, split_quantity};
pub use time::{Clock, ManualClock, MonotonicClock};
