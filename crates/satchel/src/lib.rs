#![forbid(unsafe_code)]

//! Satchel public facade crate.
//!
//! Drag-and-drop inventory gestures and cooldown reconciliation for a
//! client talking to an authoritative game backend. This crate re-exports
//! the common types from `satchel-core` and `satchel-runtime`, provides the
//! unified [`Error`], and offers a prelude for day-to-day use.
//!
//! ```ignore
//! use satchel::prelude::*;
//!
//! let mut session = Session::new(&SatchelConfig::default(), my_surface, player_id);
//! session.registry_mut().register(&SlotAddress::hotbar(0), Rect::new(0.0, 0.0, 48.0, 48.0));
//! let _events = session.bus().subscribe(|event| draw(event));
//! ```

pub mod error;
#[cfg(feature = "logging")]
pub mod logging;

pub use error::{Error, Recovery, Result};

// --- Core re-exports -------------------------------------------------------

pub use satchel_core::{
    ClickAction, Clock, ContainerType, DragCancelReason, DragLifecycle, EquipmentSlot,
    GestureConfig, GestureEvent, GestureTracker, InstanceId, ItemFlags, ItemLookup, ItemSnapshot,
    ManualClock, Modifiers, MonotonicClock, Point, PointerButton, PointerEvent, PointerEventKind,
    RawSlotTag, Rect, SlotAddress, SlotParseError, SlotRegistry, TransferIntent,
};

// --- Runtime re-exports ----------------------------------------------------

pub use satchel_runtime::{
    ActionCatalog, ActionCategory, ActionDefinition, ActiveEffect, ActiveEquipment,
    AnimationScheduler, BackendState, BusEvent, Command, CommandError, CommandSurface,
    ConfigError, CooldownReconciler, CooldownWindow, EffectTracker, EffectType, EventBus,
    EventLog, ItemLocationTable, Notice, Observable, Observation, SatchelConfig, Session,
    StartSource, Subscription, SwitchPolicy, TriggerOutcome, WindowParams, WindowSource,
};
#[cfg(feature = "test-helpers")]
pub use satchel_runtime::RecordingSurface;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        BusEvent, Command, CommandError, CommandSurface, Error, ItemSnapshot, Modifiers, Point,
        PointerButton, PointerEvent, Recovery, Rect, Result, SatchelConfig, Session,
        SlotAddress, TransferIntent, TriggerOutcome,
    };

    pub use crate::{core, runtime};
}

pub use satchel_core as core;
pub use satchel_runtime as runtime;
