#![forbid(unsafe_code)]

//! Satchel Runtime
//!
//! The time half of the client and the wiring that ties it to the gesture
//! half in `satchel-core`.
//!
//! # Key Components
//!
//! - [`CooldownReconciler`] - predicted vs. authoritative action windows
//! - [`AnimationScheduler`] - one tick loop per active window
//! - [`EffectTracker`] - timed effects turned into authoritative starts
//! - [`EventBus`] - internal publish/subscribe for gesture and cooldown events
//! - [`Observable`] - reactive cells the backend connection writes into
//! - [`CommandDispatcher`] - outbound backend commands with failure notices
//! - [`Session`] - everything above driven from one event loop
//!
//! # Role in Satchel
//! `satchel-runtime` is the orchestrator. It consumes pointer events and
//! slot lookups from `satchel-core`, keeps cooldown visuals honest against
//! backend pushes, and sends resolved transfers to the backend.
//!
//! # How it fits in the system
//! The host renders slots into the [`SlotRegistry`](satchel_core::SlotRegistry),
//! forwards pointer events and frame ticks to the [`Session`], and subscribes
//! to the bus for anything it needs to draw or play.

pub mod action;
pub mod bus;
pub mod commands;
pub mod config;
pub mod cooldown;
pub mod effects;
pub mod reactive;
pub mod scheduler;
pub mod session;
pub mod state;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use action::{
    ActionCatalog, ActionCategory, ActionDefinition, BANDAGE_DURATION_MS,
    DEFAULT_CONSUME_INTERVAL_MS, DEFAULT_MELEE_INTERVAL_MS, SwitchPolicy,
};
pub use bus::{BusEvent, EventBus, EventLog, Notice};
pub use commands::{Command, CommandDispatcher, CommandError, CommandSurface};
pub use config::{ConfigError, CooldownPolicy, GesturePolicy, RegistryPolicy, SatchelConfig};
pub use cooldown::{
    CooldownReconciler, CooldownWindow, IgnoreReason, Observation, Sample, StartSource,
    WindowParams, WindowSource,
};
pub use effects::{EffectChanges, EffectEnd, EffectStart, EffectTracker};
pub use reactive::{Observable, Subscription};
pub use scheduler::{AnimationScheduler, FrameReport, ProgressSource, WindowId};
pub use session::{BackendUpdate, Session, TriggerOutcome};
pub use state::{
    ActiveEffect, ActiveEquipment, BackendState, EffectType, ItemLocation, ItemLocationTable,
    PlayerId,
};
#[cfg(any(test, feature = "test-helpers"))]
pub use testing::RecordingSurface;
