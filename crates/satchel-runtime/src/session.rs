#![forbid(unsafe_code)]

//! One client session: every component wired to a single event loop.
//!
//! The host owns a [`Session`] and calls into it from its callbacks:
//! pointer events go to [`Session::handle_pointer`], each display frame
//! calls [`Session::frame`], and after the connection layer writes new
//! values into [`Session::backend`] the host calls [`Session::pump`].
//!
//! Backend pushes are not applied inside the observable callbacks. They are
//! queued as [`BackendUpdate`]s and applied by `pump` in delivery order, so
//! a notification can never re-enter the session while it is mid-update.
//!
//! # Resync
//!
//! A new session, and a session after [`Session::reconnect`], is in
//! baseline mode: the first authoritative start per item only records a
//! baseline instead of playing an old swing. Baseline mode ends per input:
//! for equipment after the first `pump` that applied an equipment push, for
//! effects after the first that applied an effects push. Item-table pushes
//! do not end it. A connection layer that knows when its initial snapshot
//! is complete calls [`Session::snapshot_applied`] to end it for every
//! input, including ones whose snapshot was empty and so never pushed.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, info, trace};

use satchel_core::{
    Clock, ContainerType, GestureEvent, GestureTracker, InstanceId, ItemLookup, Modifiers,
    MonotonicClock, Point, PointerButton, PointerEvent, PointerEventKind, SlotAddress,
    SlotRegistry, TransferIntent,
};

use crate::action::{ActionCatalog, ActionCategory};
use crate::bus::{BusEvent, EventBus};
use crate::commands::{Command, CommandDispatcher, CommandError, CommandSurface};
use crate::config::SatchelConfig;
use crate::cooldown::{
    CooldownReconciler, CooldownWindow, Observation, StartSource, WindowParams,
};
use crate::effects::EffectTracker;
use crate::reactive::Subscription;
use crate::scheduler::{AnimationScheduler, FrameReport};
use crate::state::{ActiveEffect, ActiveEquipment, BackendState, ItemLocationTable, PlayerId};

/// One queued backend push.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendUpdate {
    Equipment(Option<ActiveEquipment>),
    Effects(Vec<ActiveEffect>),
    Items(ItemLocationTable),
}

impl BackendUpdate {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Equipment(_) => "equipment",
            Self::Effects(_) => "effects",
            Self::Items(_) => "items",
        }
    }

    /// The cooldown input this push carries, if any.
    const fn start_source(&self) -> Option<StartSource> {
        match self {
            Self::Equipment(_) => Some(StartSource::Equipment),
            Self::Effects(_) => Some(StartSource::Effect),
            Self::Items(_) => None,
        }
    }
}

/// What [`Session::trigger_action`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Predicted locally and sent to the backend.
    Sent,
    /// The item's window is still running; nothing was sent.
    OnCooldown { remaining_ms: u64 },
    /// The item is not in the location table.
    UnknownItem,
    /// The item is broken; nothing was sent.
    Broken,
}

type Inbox = Rc<RefCell<VecDeque<BackendUpdate>>>;

/// Gesture, cooldown and command wiring for one player.
pub struct Session<S, C = MonotonicClock> {
    state: BackendState,
    inbox: Inbox,
    _subscriptions: Vec<Subscription>,
    registry: SlotRegistry,
    tracker: GestureTracker,
    reconciler: CooldownReconciler,
    effects: EffectTracker,
    scheduler: AnimationScheduler,
    dispatcher: CommandDispatcher<S>,
    bus: EventBus,
    catalog: ActionCatalog,
    clock: C,
    items: ItemLocationTable,
    selected_slot: Option<u32>,
}

impl<S, C> std::fmt::Debug for Session<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("queued", &self.inbox.borrow().len())
            .field("slots", &self.registry.len())
            .field("items", &self.items.len())
            .field("lifecycle", self.tracker.lifecycle())
            .field("running", &self.scheduler.len())
            .field("selected_slot", &self.selected_slot)
            .finish_non_exhaustive()
    }
}

impl<S: CommandSurface> Session<S> {
    /// Session on the monotonic client clock.
    #[must_use]
    pub fn new(config: &SatchelConfig, surface: S, local_player: PlayerId) -> Self {
        Self::with_clock(config, surface, local_player, MonotonicClock::new())
    }
}

impl<S: CommandSurface, C: Clock> Session<S, C> {
    #[must_use]
    pub fn with_clock(config: &SatchelConfig, surface: S, local_player: PlayerId, clock: C) -> Self {
        let state = BackendState::new();
        let inbox: Inbox = Rc::default();

        let subscriptions = vec![
            {
                let q = Rc::clone(&inbox);
                state.items.subscribe(move |table| {
                    q.borrow_mut().push_back(BackendUpdate::Items(table.clone()));
                })
            },
            {
                let q = Rc::clone(&inbox);
                state.active_equipment.subscribe(move |eq| {
                    q.borrow_mut().push_back(BackendUpdate::Equipment(eq.clone()));
                })
            },
            {
                let q = Rc::clone(&inbox);
                state.effects.subscribe(move |effects| {
                    q.borrow_mut().push_back(BackendUpdate::Effects(effects.clone()));
                })
            },
        ];

        let bus = EventBus::new();
        let mut reconciler =
            CooldownReconciler::new().with_claim_predictions(config.cooldown.claim_predictions);
        reconciler.begin_resync();

        Self {
            state,
            inbox,
            _subscriptions: subscriptions,
            registry: SlotRegistry::with_bucket_size(config.registry.bucket_size),
            tracker: GestureTracker::new(config.to_gesture_config()),
            reconciler,
            effects: EffectTracker::new(local_player),
            scheduler: AnimationScheduler::new(),
            dispatcher: CommandDispatcher::new(surface, bus.clone()),
            bus,
            catalog: config.to_catalog(),
            clock,
            items: ItemLocationTable::new(),
            selected_slot: None,
        }
    }

    // --- backend state ---

    /// Apply every queued backend push in delivery order. Returns how many
    /// were applied.
    pub fn pump(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut applied = 0;
        let mut synced: Vec<StartSource> = Vec::new();
        loop {
            let Some(update) = self.inbox.borrow_mut().pop_front() else {
                break;
            };
            trace!(kind = update.kind(), "backend update applied");
            if let Some(source) = update.start_source()
                && !synced.contains(&source)
            {
                synced.push(source);
            }
            self.apply(update, now);
            applied += 1;
        }
        for source in synced {
            self.reconciler.end_resync(source);
        }
        applied
    }

    /// The connection layer finished applying its initial snapshot. Applies
    /// anything queued, then ends baseline mode for every input.
    pub fn snapshot_applied(&mut self) -> usize {
        let applied = self.pump();
        for source in StartSource::ALL {
            self.reconciler.end_resync(source);
        }
        applied
    }

    fn apply(&mut self, update: BackendUpdate, now_ms: u64) {
        match update {
            BackendUpdate::Items(table) => self.apply_items(table),
            BackendUpdate::Equipment(equipment) => self.apply_equipment(equipment, now_ms),
            BackendUpdate::Effects(effects) => self.apply_effects(&effects, now_ms),
        }
    }

    fn apply_items(&mut self, table: ItemLocationTable) {
        let gone = self.reconciler.retain_items(|id| table.contains(id));
        self.cancel_visuals(gone);

        let events = self.tracker.revalidate(&table);
        self.publish_gesture(events);

        self.registry.sync_occupancy(table.occupied_slots());
        self.items = table;
    }

    fn apply_equipment(&mut self, equipment: Option<ActiveEquipment>, now_ms: u64) {
        let Some(ActiveEquipment {
            equipped_item_instance_id: Some(item),
            equipped_item_def_id: Some(def_id),
            swing_start_time_ms,
        }) = equipment
        else {
            return;
        };
        let def = self.catalog.for_equipped(def_id);
        let params = WindowParams::from_action(&def, self.hotbar_index(item));
        let outcome =
            self.reconciler
                .observe_authoritative_start(item, swing_start_time_ms, params, now_ms);
        if outcome == Observation::Restarted {
            info!(item, swing_start_time_ms, "new swing confirmed");
            self.start_confirmed_visual(item);
        }
    }

    fn apply_effects(&mut self, effects: &[ActiveEffect], now_ms: u64) {
        let changes = self.effects.observe(effects, now_ms);

        // Ends first: a re-application in the same push must survive.
        for end in changes.ended {
            if self.reconciler.cancel(end.item) {
                info!(item = end.item, effect = end.effect_id, "item effect removed; cooldown retired");
                self.cancel_visuals(vec![end.item]);
            }
        }

        for start in changes.started {
            let def = self.catalog.for_effect(start.item_def_id);
            let params = WindowParams::from_action(&def, self.hotbar_index(start.item));
            let outcome = self.reconciler.observe_start(
                start.item,
                StartSource::Effect,
                start.started_at_ms,
                params,
                now_ms,
            );
            if outcome == Observation::Restarted {
                info!(item = start.item, effect = start.effect_id, "item effect started");
                self.start_confirmed_visual(start.item);
            }
        }
    }

    /// The connection dropped and came back. Running windows are retired,
    /// any live gesture is aborted, and the reconciler re-baselines.
    pub fn reconnect(&mut self) {
        info!("backend reconnected; cooldowns resyncing");
        let retired = self.reconciler.begin_resync();
        self.cancel_visuals(retired);
        let events = self.tracker.cancel();
        self.publish_gesture(events);
    }

    // --- pointer input ---

    /// Press over the slot at `pos`. Returns `false` when there is no item
    /// under the pointer or a gesture is already live.
    pub fn pointer_down(&mut self, pos: Point, button: PointerButton, modifiers: Modifiers) -> bool {
        if self.tracker.lifecycle().is_live() {
            return false;
        }
        let Some(source) = self.registry.resolve_at(pos) else {
            trace!(?pos, "press outside any slot");
            return false;
        };
        let Some(item) = self.items.at_slot(&source).map(|l| l.item.clone()) else {
            trace!(%source, "press on empty slot");
            return false;
        };
        let events = self.tracker.on_press(pos, button, modifiers, item, source);
        self.publish_gesture(events);
        self.tracker.lifecycle().is_live()
    }

    pub fn pointer_move(&mut self, pos: Point) {
        let events = self.tracker.on_move(pos);
        self.publish_gesture(events);
    }

    /// Release at `pos`. A resolved drag is published and sent to the
    /// backend; a click is only published.
    pub fn pointer_up(&mut self, pos: Point) -> Option<TransferIntent> {
        let events = self.tracker.on_release(pos, &self.registry);
        let intent = events.iter().find_map(|e| match e {
            GestureEvent::DragResolved(intent) => Some(intent.clone()),
            _ => None,
        });
        self.publish_gesture(events);
        if let Some(intent) = &intent {
            // Failures are announced on the bus by the dispatcher.
            let _ = self.dispatcher.dispatch(Command::from(intent));
        }
        intent
    }

    /// Route a raw pointer event.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> Option<TransferIntent> {
        match event.kind {
            PointerEventKind::Down(button) => {
                self.pointer_down(event.pos, button, event.modifiers);
                None
            }
            PointerEventKind::Move => {
                self.pointer_move(event.pos);
                None
            }
            PointerEventKind::Up(_) => self.pointer_up(event.pos),
        }
    }

    /// Quantity chosen in the split panel for the next press.
    pub fn set_split_override(&mut self, quantity: Option<u32>) {
        self.tracker.set_split_override(quantity);
    }

    /// Host-side cancel of the live gesture (escape, focus loss).
    pub fn cancel_gesture(&mut self) {
        let events = self.tracker.cancel();
        self.publish_gesture(events);
    }

    // --- actions ---

    /// Local input used `item`: predict its window, start the visual, and
    /// send the matching command. A failed send keeps the prediction.
    ///
    /// Items without a catalog entry are consumed when flagged consumable
    /// and swung otherwise. Broken items are refused.
    pub fn trigger_action(&mut self, item: InstanceId) -> Result<TriggerOutcome, CommandError> {
        let now = self.clock.now_ms();
        let Some(snapshot) = self.items.get(item).map(|l| l.item.clone()) else {
            return Ok(TriggerOutcome::UnknownItem);
        };
        if snapshot.is_broken() {
            debug!(item, "action refused; item is broken");
            return Ok(TriggerOutcome::Broken);
        }
        if let Some(window) = self.reconciler.window(item)
            && !window.is_elapsed(now)
        {
            let remaining_ms = window.remaining_ms(now);
            debug!(item, remaining_ms, "action refused; still cooling down");
            return Ok(TriggerOutcome::OnCooldown { remaining_ms });
        }

        let def = self.catalog.for_item(&snapshot);
        let params = WindowParams::from_action(&def, self.hotbar_index(item));
        let window = self.reconciler.predict_local_start(item, params, now);
        self.start_visual(&window);

        let command = match def.category {
            ActionCategory::Consumable => Command::ConsumeItem { item },
            ActionCategory::MeleeSwing
            | ActionCategory::RangedReload
            | ActionCategory::Bandage
            | ActionCategory::Throwable => Command::UseEquippedItem,
        };
        self.dispatcher.dispatch(command)?;
        Ok(TriggerOutcome::Sent)
    }

    /// The hotbar selection moved. Interruptible windows outside the new
    /// slot are cancelled and the backend is told what is now active.
    pub fn select_hotbar_slot(&mut self, slot: Option<u32>) -> Result<(), CommandError> {
        if self.selected_slot == slot {
            return Ok(());
        }
        debug!(from = ?self.selected_slot, to = ?slot, "hotbar selection changed");
        self.selected_slot = slot;

        let retired = self.reconciler.on_selection_changed(slot);
        self.cancel_visuals(retired);

        let command = slot
            .and_then(|i| self.items.at_slot(&SlotAddress::hotbar(i)))
            .map_or(Command::ClearActiveItem, |l| Command::SetActiveItem {
                item: l.item.instance_id,
            });
        self.dispatcher.dispatch(command)
    }

    // --- frames ---

    /// Drive every running cooldown visual at `now_ms`.
    pub fn frame(&mut self, now_ms: u64) -> FrameReport {
        self.scheduler.frame(now_ms, &mut self.reconciler)
    }

    /// [`frame`](Self::frame) at the session clock's current time.
    pub fn tick(&mut self) -> FrameReport {
        let now = self.clock.now_ms();
        self.frame(now)
    }

    fn start_confirmed_visual(&mut self, item: InstanceId) {
        if let Some(window) = self.reconciler.window(item).cloned() {
            self.start_visual(&window);
        }
    }

    fn start_visual(&mut self, window: &CooldownWindow) {
        let item = window.owner();
        self.bus.publish(BusEvent::CooldownStarted {
            item,
            duration_ms: window.duration_ms(),
            source: window.source(),
        });
        let ticks = self.bus.clone();
        let done = self.bus.clone();
        self.scheduler.start(
            item,
            move |progress| ticks.publish(BusEvent::CooldownTicked { item, progress }),
            move || done.publish(BusEvent::CooldownCompleted { item }),
        );
    }

    fn cancel_visuals(&mut self, items: Vec<InstanceId>) {
        for item in items {
            self.scheduler.stop(item);
            self.bus.publish(BusEvent::CooldownCancelled { item });
        }
    }

    fn publish_gesture(&self, events: Vec<GestureEvent>) {
        for event in events {
            self.bus.publish(event.into());
        }
    }

    fn hotbar_index(&self, item: InstanceId) -> Option<u32> {
        self.items
            .get(item)
            .filter(|l| l.slot.container == ContainerType::Hotbar)
            .and_then(|l| l.slot.numeric_index())
    }

    // --- accessors ---

    /// Reactive cells the connection layer writes into.
    #[must_use]
    pub fn backend(&self) -> &BackendState {
        &self.state
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    #[must_use]
    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    /// Mutable registry for the rendering layer (register, unregister,
    /// translate as containers open, close and scroll).
    pub fn registry_mut(&mut self) -> &mut SlotRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn tracker(&self) -> &GestureTracker {
        &self.tracker
    }

    #[must_use]
    pub fn reconciler(&self) -> &CooldownReconciler {
        &self.reconciler
    }

    #[must_use]
    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// The last applied item-location table.
    #[must_use]
    pub fn items(&self) -> &ItemLocationTable {
        &self.items
    }

    #[must_use]
    pub const fn selected_slot(&self) -> Option<u32> {
        self.selected_slot
    }

    #[must_use]
    pub fn dispatcher(&self) -> &CommandDispatcher<S> {
        &self.dispatcher
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Progress of `item`'s window at the session clock's current time.
    #[must_use]
    pub fn progress(&self, item: InstanceId) -> Option<f32> {
        self.reconciler.progress(item, self.clock.now_ms())
    }

    /// Backend pushes waiting for the next [`pump`](Self::pump).
    #[must_use]
    pub fn queued(&self) -> usize {
        self.inbox.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{DEFAULT_CONSUME_INTERVAL_MS, SwitchPolicy};
    use crate::bus::EventLog;
    use crate::cooldown::WindowSource;
    use crate::testing::RecordingSurface;
    use satchel_core::{ItemFlags, ItemSnapshot, ManualClock, Rect};

    fn session() -> (Session<RecordingSurface, ManualClock>, RecordingSurface, ManualClock) {
        let surface = RecordingSurface::new();
        let clock = ManualClock::starting_at(10_000);
        let session = Session::with_clock(
            &SatchelConfig::default(),
            surface.clone(),
            1,
            clock.clone(),
        );
        (session, surface, clock)
    }

    #[test]
    fn backend_pushes_are_queued_until_pump() {
        let (mut s, _, _) = session();
        s.backend().items.set(
            [(ItemSnapshot::single(5, 50), SlotAddress::hotbar(0))]
                .into_iter()
                .collect(),
        );
        assert_eq!(s.queued(), 1);
        assert!(s.items().is_empty());

        assert_eq!(s.pump(), 1);
        assert_eq!(s.items().len(), 1);
        // The item table carries no cooldown input.
        assert!(s.reconciler().is_resyncing_source(StartSource::Equipment));
        assert!(s.reconciler().is_resyncing_source(StartSource::Effect));
    }

    #[test]
    fn snapshot_applied_ends_every_baseline() {
        let (mut s, _, _) = session();
        s.backend()
            .active_equipment
            .set(Some(ActiveEquipment::equipped(5, 50)));
        assert_eq!(s.snapshot_applied(), 1);
        assert!(!s.reconciler().is_resyncing());
    }

    #[test]
    fn first_swing_after_start_is_a_baseline() {
        let (mut s, _, _) = session();
        let log = EventLog::attach(s.bus());
        s.backend()
            .active_equipment
            .set(Some(ActiveEquipment::equipped(5, 50).with_swing(900)));
        s.pump();
        assert!(s.progress(5).is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn pressing_an_empty_slot_does_nothing() {
        let (mut s, _, _) = session();
        s.registry_mut()
            .register(&SlotAddress::inventory(0), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!s.pointer_down(Point::new(5.0, 5.0), PointerButton::Primary, Modifiers::NONE));
        assert!(!s.pointer_down(Point::new(50.0, 5.0), PointerButton::Primary, Modifiers::NONE));
    }

    #[test]
    fn trigger_predicts_and_sends_use() {
        let (mut s, surface, clock) = session();
        let log = EventLog::attach(s.bus());
        s.backend().items.set(
            [(ItemSnapshot::single(5, 50), SlotAddress::hotbar(0))]
                .into_iter()
                .collect(),
        );
        s.pump();

        assert_eq!(s.trigger_action(5), Ok(TriggerOutcome::Sent));
        assert_eq!(surface.sent(), vec![Command::UseEquippedItem]);
        assert_eq!(
            log.drain(),
            vec![BusEvent::CooldownStarted {
                item: 5,
                duration_ms: 500,
                source: WindowSource::Predicted,
            }]
        );

        clock.advance(100);
        assert_eq!(
            s.trigger_action(5),
            Ok(TriggerOutcome::OnCooldown { remaining_ms: 400 })
        );
        assert_eq!(s.trigger_action(99), Ok(TriggerOutcome::UnknownItem));
    }

    #[test]
    fn unlisted_consumable_is_eaten_not_swung() {
        let (mut s, surface, _) = session();
        s.backend().items.set(
            [(
                ItemSnapshot::stack(6, 60, 3).with_flags(ItemFlags::CONSUMABLE),
                SlotAddress::hotbar(1),
            )]
            .into_iter()
            .collect(),
        );
        s.pump();

        assert_eq!(s.trigger_action(6), Ok(TriggerOutcome::Sent));
        assert_eq!(surface.sent(), vec![Command::ConsumeItem { item: 6 }]);
        let window = s.reconciler().window(6).unwrap();
        assert_eq!(window.policy(), SwitchPolicy::Sticky);
        assert_eq!(window.duration_ms(), DEFAULT_CONSUME_INTERVAL_MS);
    }

    #[test]
    fn broken_item_is_refused() {
        let (mut s, surface, _) = session();
        s.backend().items.set(
            [(
                ItemSnapshot::single(5, 50).with_flags(ItemFlags::BROKEN),
                SlotAddress::hotbar(0),
            )]
            .into_iter()
            .collect(),
        );
        s.pump();

        assert_eq!(s.trigger_action(5), Ok(TriggerOutcome::Broken));
        assert!(surface.sent().is_empty());
        assert!(s.reconciler().window(5).is_none());
    }
}
