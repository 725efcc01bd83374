#![forbid(unsafe_code)]

//! Internal event bus.
//!
//! Gesture outcomes, cooldown lifecycle, and user-facing notices are
//! published here as [`BusEvent`]s. Consumers (rendering, audio, tests)
//! subscribe instead of being threaded through every layer as callbacks.
//!
//! # Invariants
//!
//! 1. Events are delivered to every live subscriber in publish order, even
//!    when a subscriber publishes from inside its callback: nested events
//!    are queued and delivered after the current one.
//! 2. Subscribers are notified in registration order.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use satchel_core::{
    ClickAction, DragCancelReason, GestureEvent, InstanceId, ItemSnapshot, Point, SlotAddress,
    TransferIntent,
};

use crate::cooldown::WindowSource;
use crate::reactive::Subscription;

/// Everything the runtime announces.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    DragStarted {
        item: ItemSnapshot,
        source: SlotAddress,
        split_quantity: Option<u32>,
    },
    /// The drag follower should move.
    DragMoved {
        pos: Point,
    },
    DragResolved(TransferIntent),
    DragCancelled {
        source: SlotAddress,
        reason: DragCancelReason,
    },
    Clicked {
        action: ClickAction,
        item: ItemSnapshot,
        source: SlotAddress,
    },
    CooldownStarted {
        item: InstanceId,
        duration_ms: u64,
        source: WindowSource,
    },
    CooldownTicked {
        item: InstanceId,
        progress: f32,
    },
    CooldownCompleted {
        item: InstanceId,
    },
    /// The window ended early (superseded, interrupted, or item gone).
    CooldownCancelled {
        item: InstanceId,
    },
    /// Transient, non-blocking message for the player.
    Notice(Notice),
}

impl From<GestureEvent> for BusEvent {
    fn from(event: GestureEvent) -> Self {
        match event {
            GestureEvent::DragStarted {
                item,
                source,
                split_quantity,
                ..
            } => Self::DragStarted {
                item,
                source,
                split_quantity,
            },
            GestureEvent::FollowerMoved { pos } => Self::DragMoved { pos },
            GestureEvent::Clicked {
                action,
                item,
                source,
            } => Self::Clicked {
                action,
                item,
                source,
            },
            GestureEvent::DragResolved(intent) => Self::DragResolved(intent),
            GestureEvent::DragCancelled { source, reason } => {
                Self::DragCancelled { source, reason }
            }
        }
    }
}

/// A user-facing transient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    /// Backend command that triggered it, if any.
    pub command: Option<&'static str>,
}

impl Notice {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            command: None,
        }
    }

    #[must_use]
    pub fn for_command(command: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            command: Some(command),
        }
    }
}

type Handler = Rc<dyn Fn(&BusEvent)>;

#[derive(Default)]
struct BusInner {
    subscribers: RefCell<Vec<Weak<dyn Fn(&BusEvent)>>>,
    queue: RefCell<VecDeque<BusEvent>>,
    dispatching: Cell<bool>,
    published: Cell<u64>,
}

/// Single-threaded publish/subscribe hub. Clones share subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .field("published", &self.inner.published.get())
            .finish()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event. Dropping the guard unsubscribes.
    pub fn subscribe(&self, handler: impl Fn(&BusEvent) + 'static) -> Subscription {
        let strong: Handler = Rc::new(handler);
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::downgrade(&strong));
        Subscription::holding(strong)
    }

    pub fn publish(&self, event: BusEvent) {
        self.inner.queue.borrow_mut().push_back(event);
        if self.inner.dispatching.replace(true) {
            return;
        }
        loop {
            let Some(event) = self.inner.queue.borrow_mut().pop_front() else {
                break;
            };
            self.inner.published.set(self.inner.published.get() + 1);
            let handlers: Vec<Handler> = {
                let mut subs = self.inner.subscribers.borrow_mut();
                subs.retain(|w| w.strong_count() > 0);
                subs.iter().filter_map(Weak::upgrade).collect()
            };
            for handler in &handlers {
                handler(&event);
            }
        }
        self.inner.dispatching.set(false);
    }

    /// Total events delivered so far.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.inner.published.get()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

/// Collects every event published on a bus; handy for assertions and for
/// hosts that poll instead of subscribing.
#[derive(Debug)]
pub struct EventLog {
    events: Rc<RefCell<Vec<BusEvent>>>,
    _sub: Subscription,
}

impl EventLog {
    #[must_use]
    pub fn attach(bus: &EventBus) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let sub = bus.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        Self { events, _sub: sub }
    }

    /// Take everything recorded so far.
    pub fn drain(&self) -> Vec<BusEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<BusEvent> {
        self.events.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}
