#![forbid(unsafe_code)]

//! Gesture tracking: press → move → release on one item, independent of
//! which container the item lives in.
//!
//! [`GestureTracker`] owns an explicit [`DragLifecycle`]:
//!
//! ```text
//! Idle ──press──▶ Armed ──move past threshold──▶ Dragging ──release──▶ Resolved
//!                   │                               │
//!                   └──release──▶ Idle (click)      └──item vanished──▶ Idle
//! ```
//!
//! # Invariants
//!
//! 1. A click and a drag never both emit for the same press → release.
//!    Releasing while `Armed` is a click and never evaluates drop targets.
//! 2. The split quantity is decided once, at arm time, from the press's
//!    button and modifiers (or an injected split-panel value).
//! 3. At most one [`GestureEvent::DragResolved`] per completed drag, and
//!    never for a same-slot release.
//! 4. Every `DragStarted` is followed by exactly one `DragResolved` or
//!    `DragCancelled`.
//!
//! # Failure Modes
//!
//! - A second press while a gesture is live is ignored.
//! - If the dragged item disappears (consumed, picked up by another actor),
//!   [`on_item_vanished`](GestureTracker::on_item_vanished) aborts to `Idle`
//!   without emitting a transfer.

use tracing::{debug, trace};

use crate::event::{Modifiers, PointerButton};
use crate::geometry::Point;
use crate::item::{InstanceId, ItemLookup, ItemSnapshot};
use crate::registry::SlotRegistry;
use crate::resolver::{Resolution, TransferIntent, TransferResolver};
use crate::slot::SlotAddress;
use crate::split::split_quantity;

/// Default squared pointer travel before a press becomes a drag.
pub const DEFAULT_DRAG_THRESHOLD_SQ: f32 = 4.0;

/// Thresholds for gesture recognition.
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// Squared distance (px²) the pointer must exceed to start a drag.
    pub drag_threshold_sq: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold_sq: DEFAULT_DRAG_THRESHOLD_SQ,
        }
    }
}

/// A press that has not yet moved far enough to be a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmedDrag {
    pub start_pos: Point,
    pub button: PointerButton,
    pub item: ItemSnapshot,
    pub source: SlotAddress,
    pub split_quantity: Option<u32>,
}

/// A drag in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub start_pos: Point,
    pub last_pos: Point,
    pub button: PointerButton,
    pub item: ItemSnapshot,
    pub source: SlotAddress,
    pub split_quantity: Option<u32>,
}

impl From<ArmedDrag> for ActiveDrag {
    fn from(armed: ArmedDrag) -> Self {
        Self {
            start_pos: armed.start_pos,
            last_pos: armed.start_pos,
            button: armed.button,
            item: armed.item,
            source: armed.source,
            split_quantity: armed.split_quantity,
        }
    }
}

/// Why a drag ended without a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragCancelReason {
    /// Released over the slot it started from.
    SameSlot,
    /// World drop from a slot known to hold nothing.
    SourceEmpty,
    /// The dragged item stopped existing mid-drag.
    ItemVanished,
    /// Cancelled by the host (focus loss, escape, container closed).
    Aborted,
}

/// Terminal state of a completed drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Transfer(TransferIntent),
    Cancelled(DragCancelReason),
}

/// The drag state machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragLifecycle {
    #[default]
    Idle,
    Armed(ArmedDrag),
    Dragging(ActiveDrag),
    Resolved(DragOutcome),
}

impl DragLifecycle {
    /// The item this gesture is about, while one is live.
    #[must_use]
    pub fn item(&self) -> Option<&ItemSnapshot> {
        match self {
            Self::Armed(a) => Some(&a.item),
            Self::Dragging(d) => Some(&d.item),
            Self::Idle | Self::Resolved(_) => None,
        }
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Armed(_) | Self::Dragging(_))
    }
}

/// What a plain click on an item asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// Primary click: use / equip / activate.
    Activate,
    /// Secondary click: open the item's context menu.
    ContextMenu,
}

impl ClickAction {
    #[must_use]
    pub const fn for_button(button: PointerButton) -> Option<Self> {
        match button {
            PointerButton::Primary => Some(Self::Activate),
            PointerButton::Secondary => Some(Self::ContextMenu),
            PointerButton::Tertiary => None,
        }
    }
}

/// Events produced by the tracker for the rendering and dispatch layers.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    /// The press crossed the drag threshold. The renderer should start a
    /// follower preview at `pos`.
    DragStarted {
        item: ItemSnapshot,
        source: SlotAddress,
        split_quantity: Option<u32>,
        pos: Point,
    },
    /// The follower preview should move.
    FollowerMoved { pos: Point },
    /// Press and release without crossing the threshold.
    Clicked {
        action: ClickAction,
        item: ItemSnapshot,
        source: SlotAddress,
    },
    /// A completed drag produced a transfer for the backend.
    DragResolved(TransferIntent),
    /// A started drag ended without a transfer.
    DragCancelled {
        source: SlotAddress,
        reason: DragCancelReason,
    },
}

/// Per-item gesture state machine.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    config: GestureConfig,
    lifecycle: DragLifecycle,
    split_override: Option<u32>,
    resolver: TransferResolver,
}

impl GestureTracker {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            lifecycle: DragLifecycle::Idle,
            split_override: None,
            resolver: TransferResolver::new(),
        }
    }

    /// Inject a split quantity chosen in the split panel. It overrides the
    /// button/modifier rule for the next press only.
    pub fn set_split_override(&mut self, quantity: Option<u32>) {
        self.split_override = quantity;
    }

    #[must_use]
    pub const fn split_override(&self) -> Option<u32> {
        self.split_override
    }

    /// Button pressed on `item` in `source`.
    ///
    /// Never signals a drag by itself: the gesture might still be a click.
    pub fn on_press(
        &mut self,
        pos: Point,
        button: PointerButton,
        modifiers: Modifiers,
        item: ItemSnapshot,
        source: SlotAddress,
    ) -> Vec<GestureEvent> {
        if self.lifecycle.is_live() {
            trace!(?button, "press ignored; gesture already live");
            return Vec::new();
        }

        let injected = self.split_override.take();
        let split = split_quantity(&item, button, modifiers, injected);
        debug!(
            item = item.instance_id,
            %source,
            ?button,
            split = ?split,
            "gesture armed"
        );
        self.lifecycle = DragLifecycle::Armed(ArmedDrag {
            start_pos: pos,
            button,
            item,
            source,
            split_quantity: split,
        });
        Vec::new()
    }

    /// Pointer moved.
    pub fn on_move(&mut self, pos: Point) -> Vec<GestureEvent> {
        let mut out = Vec::with_capacity(2);
        match &mut self.lifecycle {
            DragLifecycle::Armed(armed) => {
                if armed.start_pos.distance_sq(pos) <= self.config.drag_threshold_sq {
                    return out;
                }
                let mut active = ActiveDrag::from(armed.clone());
                active.last_pos = pos;
                debug!(item = active.item.instance_id, source = %active.source, "drag started");
                out.push(GestureEvent::DragStarted {
                    item: active.item.clone(),
                    source: active.source.clone(),
                    split_quantity: active.split_quantity,
                    pos,
                });
                out.push(GestureEvent::FollowerMoved { pos });
                self.lifecycle = DragLifecycle::Dragging(active);
            }
            DragLifecycle::Dragging(active) => {
                active.last_pos = pos;
                out.push(GestureEvent::FollowerMoved { pos });
            }
            DragLifecycle::Idle | DragLifecycle::Resolved(_) => {}
        }
        out
    }

    /// Button released.
    ///
    /// While `Armed` this is a click and `registry` is not consulted.
    pub fn on_release(&mut self, pos: Point, registry: &SlotRegistry) -> Vec<GestureEvent> {
        let mut out = Vec::with_capacity(1);
        match std::mem::take(&mut self.lifecycle) {
            DragLifecycle::Armed(armed) => {
                if let Some(action) = ClickAction::for_button(armed.button) {
                    debug!(item = armed.item.instance_id, ?action, "click");
                    out.push(GestureEvent::Clicked {
                        action,
                        item: armed.item,
                        source: armed.source,
                    });
                }
                self.lifecycle = DragLifecycle::Idle;
            }
            DragLifecycle::Dragging(mut active) => {
                active.last_pos = pos;
                let outcome = match self.resolver.resolve(&active, pos, registry) {
                    Resolution::Transfer(intent) => {
                        debug!(
                            item = intent.item.instance_id,
                            source = %intent.source,
                            target = ?intent.target.as_ref().map(ToString::to_string),
                            split = ?intent.split_quantity,
                            "drag resolved"
                        );
                        out.push(GestureEvent::DragResolved(intent.clone()));
                        DragOutcome::Transfer(intent)
                    }
                    Resolution::Cancelled(reason) => {
                        out.push(GestureEvent::DragCancelled {
                            source: active.source.clone(),
                            reason,
                        });
                        DragOutcome::Cancelled(reason)
                    }
                };
                self.lifecycle = DragLifecycle::Resolved(outcome);
            }
            other => {
                self.lifecycle = other;
            }
        }
        out
    }

    /// The item with `instance_id` no longer exists.
    pub fn on_item_vanished(&mut self, instance_id: InstanceId) -> Vec<GestureEvent> {
        if self.lifecycle.item().map(|i| i.instance_id) != Some(instance_id) {
            return Vec::new();
        }
        debug!(item = instance_id, "tracked item vanished; gesture aborted");
        self.abort(DragCancelReason::ItemVanished)
    }

    /// Abort the live gesture if its item is missing from `items`.
    pub fn revalidate(&mut self, items: &impl ItemLookup) -> Vec<GestureEvent> {
        let Some(id) = self.lifecycle.item().map(|i| i.instance_id) else {
            return Vec::new();
        };
        if items.contains(id) {
            return Vec::new();
        }
        self.on_item_vanished(id)
    }

    /// Host-initiated cancel (focus loss, escape, container closed).
    pub fn cancel(&mut self) -> Vec<GestureEvent> {
        self.abort(DragCancelReason::Aborted)
    }

    /// Return to `Idle` without emitting anything.
    pub fn reset(&mut self) {
        self.lifecycle = DragLifecycle::Idle;
        self.split_override = None;
    }

    #[must_use]
    pub fn lifecycle(&self) -> &DragLifecycle {
        &self.lifecycle
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.lifecycle, DragLifecycle::Dragging(_))
    }

    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    fn abort(&mut self, reason: DragCancelReason) -> Vec<GestureEvent> {
        // Armed gestures never announced themselves, so they end silently.
        match std::mem::take(&mut self.lifecycle) {
            DragLifecycle::Dragging(active) => vec![GestureEvent::DragCancelled {
                source: active.source,
                reason,
            }],
            DragLifecycle::Resolved(outcome) => {
                self.lifecycle = DragLifecycle::Resolved(outcome);
                Vec::new()
            }
            DragLifecycle::Armed(_) | DragLifecycle::Idle => Vec::new(),
        }
    }
}
