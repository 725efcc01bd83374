#![forbid(unsafe_code)]

//! Cooldown reconciliation: local prediction merged with authoritative
//! timestamps.
//!
//! Every action-capable item instance gets one record holding the last
//! authoritative start seen for it and, while a cooldown is running, an
//! active [`CooldownWindow`].
//!
//! # Algorithm
//!
//! `observe_start(item, source, start_ms)` compares `start_ms` with the last
//! confirmed value for *that item and source*:
//!
//! | server value            | outcome                                     |
//! |-------------------------|---------------------------------------------|
//! | `0`                     | ignored: "not swinging"                     |
//! | `< last`                | ignored: out-of-order delivery              |
//! | `== last`               | duplicate: window untouched                 |
//! | `> last`, prediction up | **claim**: keep the prediction's anchor     |
//! | `> last`, otherwise     | **restart**: new window anchored at `now`   |
//!
//! Windows are always anchored on the *client* clock; server timestamps are
//! only compared with each other. Equipment swings are server epoch
//! milliseconds while effect starts are client first-observation times, so
//! each [`StartSource`] keeps its own last value and its own resync state.
//!
//! # Invariants
//!
//! 1. At most one active window per item instance.
//! 2. [`sample`](CooldownReconciler::sample) never returns a value lower
//!    than the previous sample for the same window, and returns exactly
//!    `1.0` once, on the call that retires the window.
//! 3. Re-delivering the last confirmed value never changes progress.
//! 4. Records are removed when their item instance disappears.
//!
//! # Failure Modes
//!
//! - **Reconnect replay**: after [`begin_resync`](CooldownReconciler::begin_resync)
//!   the first value per instance and source is recorded as a baseline only,
//!   so a swing that finished while disconnected is not replayed. Baseline
//!   mode ends per source with [`end_resync`](CooldownReconciler::end_resync).
//! - **Zero duration**: progress is immediately `1.0`.

use ahash::{AHashMap, AHashSet};
use tracing::{debug, debug_span, info, trace};

use satchel_core::InstanceId;

use crate::action::{ActionDefinition, SwitchPolicy};

/// Which start time currently governs a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSource {
    Predicted,
    Confirmed,
}

/// Which backend clock an authoritative start was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartSource {
    /// `swing_start_time_ms` of the active-equipment record (server ms).
    Equipment,
    /// First observation of a timed effect (client ms).
    Effect,
}

impl StartSource {
    pub const ALL: [Self; 2] = [Self::Equipment, Self::Effect];

    const fn index(self) -> usize {
        match self {
            Self::Equipment => 0,
            Self::Effect => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equipment => "equipment",
            Self::Effect => "effect",
        }
    }
}

/// Per-occurrence parameters for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    pub duration_ms: u64,
    pub policy: SwitchPolicy,
    /// Hotbar slot the action was triggered from.
    pub slot_index: Option<u32>,
}

impl WindowParams {
    #[must_use]
    pub const fn new(duration_ms: u64, policy: SwitchPolicy) -> Self {
        Self {
            duration_ms,
            policy,
            slot_index: None,
        }
    }

    #[must_use]
    pub const fn from_action(def: &ActionDefinition, slot_index: Option<u32>) -> Self {
        Self {
            duration_ms: def.duration_ms,
            policy: def.policy(),
            slot_index,
        }
    }

    #[must_use]
    pub const fn in_slot(mut self, slot_index: u32) -> Self {
        self.slot_index = Some(slot_index);
        self
    }
}

/// One running cooldown.
#[derive(Debug, Clone, PartialEq)]
pub struct CooldownWindow {
    owner: InstanceId,
    duration_ms: u64,
    predicted_start_ms: Option<u64>,
    confirmed_start_ms: Option<u64>,
    server_start_ms: Option<u64>,
    slot_index: Option<u32>,
    policy: SwitchPolicy,
    high_water: f32,
}

impl CooldownWindow {
    fn predicted(owner: InstanceId, params: WindowParams, now_ms: u64) -> Self {
        Self {
            owner,
            duration_ms: params.duration_ms,
            predicted_start_ms: Some(now_ms),
            confirmed_start_ms: None,
            server_start_ms: None,
            slot_index: params.slot_index,
            policy: params.policy,
            high_water: 0.0,
        }
    }

    fn confirmed(owner: InstanceId, params: WindowParams, server_ms: u64, now_ms: u64) -> Self {
        Self {
            owner,
            duration_ms: params.duration_ms,
            predicted_start_ms: None,
            confirmed_start_ms: Some(now_ms),
            server_start_ms: Some(server_ms),
            slot_index: params.slot_index,
            policy: params.policy,
            high_water: 0.0,
        }
    }

    #[must_use]
    pub const fn owner(&self) -> InstanceId {
        self.owner
    }

    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Client time of the local trigger, if this window was predicted.
    #[must_use]
    pub const fn predicted_start_ms(&self) -> Option<u64> {
        self.predicted_start_ms
    }

    /// Client anchor of the confirmed occurrence.
    #[must_use]
    pub const fn confirmed_start_ms(&self) -> Option<u64> {
        self.confirmed_start_ms
    }

    /// The authoritative timestamp that confirmed this window.
    #[must_use]
    pub const fn server_start_ms(&self) -> Option<u64> {
        self.server_start_ms
    }

    #[must_use]
    pub const fn slot_index(&self) -> Option<u32> {
        self.slot_index
    }

    #[must_use]
    pub const fn policy(&self) -> SwitchPolicy {
        self.policy
    }

    #[must_use]
    pub const fn source(&self) -> WindowSource {
        if self.confirmed_start_ms.is_some() {
            WindowSource::Confirmed
        } else {
            WindowSource::Predicted
        }
    }

    /// Client time progress is measured from. Confirmed wins once observed.
    #[must_use]
    pub fn effective_start_ms(&self) -> u64 {
        self.confirmed_start_ms
            .or(self.predicted_start_ms)
            .unwrap_or_default()
    }

    /// `clamp((now - start) / duration, 0, 1)`.
    #[must_use]
    pub fn progress(&self, now_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.effective_start_ms());
        ((elapsed as f64 / self.duration_ms as f64) as f32).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.effective_start_ms());
        self.duration_ms.saturating_sub(elapsed)
    }

    #[must_use]
    pub fn is_elapsed(&self, now_ms: u64) -> bool {
        self.progress(now_ms) >= 1.0
    }
}

/// Why an authoritative value was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// `0`: the backend reports no swing in progress.
    NotActive,
    /// Older than the last confirmed value.
    Stale,
}

/// What [`CooldownReconciler::observe_authoritative_start`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Ignored(IgnoreReason),
    /// Recorded as the post-reconnect baseline; no window.
    Baseline,
    /// Same occurrence re-delivered.
    Duplicate,
    /// Confirmed an outstanding local prediction.
    Claimed,
    /// A new occurrence; the window (re)started at `now`.
    Restarted,
}

impl Observation {
    /// Whether a window started as a result.
    #[must_use]
    pub const fn started_window(self) -> bool {
        matches!(self, Self::Restarted)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignored(IgnoreReason::NotActive) => "ignored_not_active",
            Self::Ignored(IgnoreReason::Stale) => "ignored_stale",
            Self::Baseline => "baseline",
            Self::Duplicate => "duplicate",
            Self::Claimed => "claimed",
            Self::Restarted => "restarted",
        }
    }
}

/// One progress sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub progress: f32,
    /// This sample retired the window.
    pub completed: bool,
}

#[derive(Debug, Clone, Default)]
enum WindowPhase {
    #[default]
    Idle,
    Active(CooldownWindow),
}

#[derive(Debug, Clone, Default)]
struct CooldownEntry {
    /// Last confirmed start, indexed by [`StartSource`].
    last_confirmed_ms: [Option<u64>; 2],
    phase: WindowPhase,
}

impl CooldownEntry {
    fn window(&self) -> Option<&CooldownWindow> {
        match &self.phase {
            WindowPhase::Active(w) => Some(w),
            WindowPhase::Idle => None,
        }
    }

    fn window_mut(&mut self) -> Option<&mut CooldownWindow> {
        match &mut self.phase {
            WindowPhase::Active(w) => Some(w),
            WindowPhase::Idle => None,
        }
    }

    fn retire(&mut self) -> bool {
        matches!(
            std::mem::take(&mut self.phase),
            WindowPhase::Active(_)
        )
    }
}

/// Per-instance cooldown windows, owned by the event loop.
#[derive(Debug, Clone)]
pub struct CooldownReconciler {
    entries: AHashMap<InstanceId, CooldownEntry>,
    /// Per source, `Some` while resynchronising; holds instances already
    /// baselined.
    resync: [Option<AHashSet<InstanceId>>; 2],
    claim_predictions: bool,
}

impl Default for CooldownReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl CooldownReconciler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
            resync: [None, None],
            claim_predictions: true,
        }
    }

    /// Whether a confirmation may claim an outstanding prediction. When
    /// off, every new occurrence restarts the window at `now`.
    #[must_use]
    pub fn with_claim_predictions(mut self, claim: bool) -> Self {
        self.claim_predictions = claim;
        self
    }

    /// Local input just triggered an action on `item`.
    ///
    /// Creates or overwrites the window with a prediction anchored at `now_ms`.
    pub fn predict_local_start(
        &mut self,
        item: InstanceId,
        params: WindowParams,
        now_ms: u64,
    ) -> CooldownWindow {
        debug!(item, duration_ms = params.duration_ms, now_ms, "cooldown predicted");
        let window = CooldownWindow::predicted(item, params, now_ms);
        self.entries.entry(item).or_default().phase = WindowPhase::Active(window.clone());
        window
    }

    /// The backend reported `server_start_ms` as the swing start of the
    /// equipped `item`. Shorthand for [`StartSource::Equipment`].
    pub fn observe_authoritative_start(
        &mut self,
        item: InstanceId,
        server_start_ms: u64,
        params: WindowParams,
        now_ms: u64,
    ) -> Observation {
        self.observe_start(item, StartSource::Equipment, server_start_ms, params, now_ms)
    }

    /// An authoritative start for `item` read from `source`.
    pub fn observe_start(
        &mut self,
        item: InstanceId,
        source: StartSource,
        server_start_ms: u64,
        params: WindowParams,
        now_ms: u64,
    ) -> Observation {
        let span = debug_span!(
            "satchel.cooldown.observe",
            item,
            source = source.as_str(),
            server_start_ms,
            outcome = tracing::field::Empty
        );
        let _guard = span.enter();
        let outcome = self.observe_inner(item, source, server_start_ms, params, now_ms);
        span.record("outcome", outcome.as_str());
        outcome
    }

    fn observe_inner(
        &mut self,
        item: InstanceId,
        source: StartSource,
        server_start_ms: u64,
        params: WindowParams,
        now_ms: u64,
    ) -> Observation {
        if server_start_ms == 0 {
            return Observation::Ignored(IgnoreReason::NotActive);
        }

        let entry = self.entries.entry(item).or_default();
        let last = &mut entry.last_confirmed_ms[source.index()];

        if let Some(baselined) = &mut self.resync[source.index()]
            && baselined.insert(item)
        {
            *last = Some(last.unwrap_or(0).max(server_start_ms));
            debug!(item, server_start_ms, "baseline recorded after resync");
            return Observation::Baseline;
        }

        match *last {
            Some(last) if server_start_ms < last => {
                trace!(item, server_start_ms, last, "stale authoritative start ignored");
                return Observation::Ignored(IgnoreReason::Stale);
            }
            Some(last) if server_start_ms == last => {
                trace!(item, server_start_ms, "duplicate authoritative start");
                return Observation::Duplicate;
            }
            _ => {}
        }
        *last = Some(server_start_ms);

        if self.claim_predictions
            && let Some(window) = entry.window_mut()
            && window.source() == WindowSource::Predicted
            && !window.is_elapsed(now_ms)
        {
            window.confirmed_start_ms = window.predicted_start_ms;
            window.server_start_ms = Some(server_start_ms);
            window.duration_ms = params.duration_ms;
            window.policy = params.policy;
            if params.slot_index.is_some() {
                window.slot_index = params.slot_index;
            }
            info!(item, server_start_ms, "authoritative start claimed local prediction");
            return Observation::Claimed;
        }

        entry.phase = WindowPhase::Active(CooldownWindow::confirmed(
            item,
            params,
            server_start_ms,
            now_ms,
        ));
        info!(
            item,
            server_start_ms,
            duration_ms = params.duration_ms,
            "new authoritative occurrence; window restarted"
        );
        Observation::Restarted
    }

    /// Pure progress of `item`'s active window.
    #[must_use]
    pub fn progress(&self, item: InstanceId, now_ms: u64) -> Option<f32> {
        self.window(item).map(|w| w.progress(now_ms))
    }

    /// Monotonic sample; retires the window when it reaches `1.0`.
    pub fn sample(&mut self, item: InstanceId, now_ms: u64) -> Option<Sample> {
        let entry = self.entries.get_mut(&item)?;
        let window = entry.window_mut()?;
        let progress = window.progress(now_ms).max(window.high_water);
        window.high_water = progress;
        if progress >= 1.0 {
            entry.retire();
            debug!(item, now_ms, "cooldown retired");
            return Some(Sample {
                progress: 1.0,
                completed: true,
            });
        }
        trace!(item, progress, "cooldown sampled");
        Some(Sample {
            progress,
            completed: false,
        })
    }

    #[must_use]
    pub fn window(&self, item: InstanceId) -> Option<&CooldownWindow> {
        self.entries.get(&item).and_then(CooldownEntry::window)
    }

    /// Whether `item` has a window that has not yet elapsed.
    #[must_use]
    pub fn is_active(&self, item: InstanceId, now_ms: u64) -> bool {
        self.window(item).is_some_and(|w| !w.is_elapsed(now_ms))
    }

    /// Last confirmed equipment swing start for `item`.
    #[must_use]
    pub fn last_confirmed_start_ms(&self, item: InstanceId) -> Option<u64> {
        self.last_start_ms(item, StartSource::Equipment)
    }

    #[must_use]
    pub fn last_start_ms(&self, item: InstanceId, source: StartSource) -> Option<u64> {
        self.entries
            .get(&item)
            .and_then(|e| e.last_confirmed_ms[source.index()])
    }

    /// The hotbar selection moved to `selected`. Interruptible windows from
    /// any other slot are retired; sticky ones are untouched.
    ///
    /// Returns the retired instances in ascending order.
    pub fn on_selection_changed(&mut self, selected: Option<u32>) -> Vec<InstanceId> {
        let mut retired: Vec<InstanceId> = self
            .entries
            .iter_mut()
            .filter(|(_, e)| {
                e.window().is_some_and(|w| {
                    w.policy == SwitchPolicy::Interruptible && w.slot_index != selected
                })
            })
            .map(|(id, e)| {
                e.retire();
                *id
            })
            .collect();
        retired.sort_unstable();
        if !retired.is_empty() {
            debug!(?selected, retired = ?retired, "selection change interrupted cooldowns");
        }
        retired
    }

    /// Retire `item`'s window early, keeping its confirmed history.
    pub fn cancel(&mut self, item: InstanceId) -> bool {
        self.entries.get_mut(&item).is_some_and(CooldownEntry::retire)
    }

    /// Drop everything known about `item`. Returns whether a window was
    /// active.
    pub fn forget_item(&mut self, item: InstanceId) -> bool {
        let Some(mut entry) = self.entries.remove(&item) else {
            return false;
        };
        for baselined in self.resync.iter_mut().flatten() {
            baselined.remove(&item);
        }
        let was_active = entry.retire();
        if was_active {
            debug!(item, "cooldown dropped with its item");
        }
        was_active
    }

    /// Keep only instances for which `keep` holds. Returns the removed
    /// instances that had an active window, in ascending order.
    pub fn retain_items(&mut self, mut keep: impl FnMut(InstanceId) -> bool) -> Vec<InstanceId> {
        let doomed: Vec<InstanceId> = self.entries.keys().copied().filter(|id| !keep(*id)).collect();
        let mut cancelled: Vec<InstanceId> = doomed
            .into_iter()
            .filter(|id| self.forget_item(*id))
            .collect();
        cancelled.sort_unstable();
        cancelled
    }

    /// Enter baseline mode after a reconnect: every active window is
    /// retired and, for every source, the next value per instance only
    /// records a baseline.
    ///
    /// Returns the retired instances in ascending order.
    pub fn begin_resync(&mut self) -> Vec<InstanceId> {
        let mut retired: Vec<InstanceId> = self
            .entries
            .iter_mut()
            .filter_map(|(id, e)| e.retire().then_some(*id))
            .collect();
        retired.sort_unstable();
        self.resync = [Some(AHashSet::new()), Some(AHashSet::new())];
        debug!(retired = retired.len(), "cooldown resync started");
        retired
    }

    /// Leave baseline mode for `source`, once its first post-connect
    /// snapshot has been applied.
    pub fn end_resync(&mut self, source: StartSource) {
        if self.resync[source.index()].take().is_some() {
            debug!(source = source.as_str(), "cooldown resync finished");
        }
    }

    /// Whether any source is still baselining.
    #[must_use]
    pub fn is_resyncing(&self) -> bool {
        self.resync.iter().any(Option::is_some)
    }

    #[must_use]
    pub fn is_resyncing_source(&self, source: StartSource) -> bool {
        self.resync[source.index()].is_some()
    }

    /// Instances with an active window, ascending.
    #[must_use]
    pub fn active_items(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self
            .entries
            .iter()
            .filter_map(|(id, e)| e.window().map(|_| *id))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of tracked instances, active or not.
    #[must_use]
    pub fn tracked_len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWORD: InstanceId = 7;
    const FOOD: InstanceId = 8;

    fn melee() -> WindowParams {
        WindowParams::new(500, SwitchPolicy::Interruptible).in_slot(0)
    }

    fn food() -> WindowParams {
        WindowParams::new(2000, SwitchPolicy::Sticky).in_slot(1)
    }

    // --- Authoritative ordering ---

    #[test]
    fn duplicate_timestamp_leaves_progress_unchanged() {
        let mut rec = CooldownReconciler::new();
        assert_eq!(
            rec.observe_authoritative_start(SWORD, 1000, melee(), 10_000),
            Observation::Restarted
        );
        let before = rec.progress(SWORD, 10_050);
        assert_eq!(
            rec.observe_authoritative_start(SWORD, 1000, melee(), 10_050),
            Observation::Duplicate
        );
        assert_eq!(rec.progress(SWORD, 10_050), before);
        assert_eq!(before, Some(0.1));
    }

    #[test]
    fn newer_timestamp_restarts_window() {
        let mut rec = CooldownReconciler::new();
        rec.observe_authoritative_start(SWORD, 1000, melee(), 10_000);
        let before = rec.progress(SWORD, 10_300).unwrap();

        rec.observe_authoritative_start(SWORD, 1500, melee(), 10_300);
        let after = rec.progress(SWORD, 10_300).unwrap();
        assert!(after < before);
        assert_eq!(after, 0.0);
    }

    #[test]
    fn zero_and_stale_timestamps_are_ignored() {
        let mut rec = CooldownReconciler::new();
        assert_eq!(
            rec.observe_authoritative_start(SWORD, 0, melee(), 5),
            Observation::Ignored(IgnoreReason::NotActive)
        );
        rec.observe_authoritative_start(SWORD, 2000, melee(), 10);
        assert_eq!(
            rec.observe_authoritative_start(SWORD, 1500, melee(), 20),
            Observation::Ignored(IgnoreReason::Stale)
        );
        assert_eq!(rec.last_confirmed_start_ms(SWORD), Some(2000));
        assert_eq!(rec.window(SWORD).unwrap().server_start_ms(), Some(2000));
    }

    #[test]
    fn comparison_is_keyed_per_instance() {
        let mut rec = CooldownReconciler::new();
        rec.observe_authoritative_start(SWORD, 5000, melee(), 0);
        assert_eq!(
            rec.observe_authoritative_start(FOOD, 1000, food(), 0),
            Observation::Restarted
        );
        assert_eq!(rec.active_items(), vec![SWORD, FOOD]);
    }

    // --- Prediction ---

    #[test]
    fn confirmation_claims_outstanding_prediction() {
        let mut rec = CooldownReconciler::new();
        rec.predict_local_start(SWORD, melee(), 1000);
        let before = rec.progress(SWORD, 1120).unwrap();

        assert_eq!(
            rec.observe_authoritative_start(SWORD, 88_000, melee(), 1120),
            Observation::Claimed
        );
        let window = rec.window(SWORD).unwrap();
        assert_eq!(window.source(), WindowSource::Confirmed);
        assert_eq!(window.effective_start_ms(), 1000);
        assert_eq!(rec.progress(SWORD, 1120).unwrap(), before);
    }

    #[test]
    fn confirmation_after_prediction_elapsed_restarts() {
        let mut rec = CooldownReconciler::new();
        rec.predict_local_start(SWORD, melee(), 1000);
        assert_eq!(
            rec.observe_authoritative_start(SWORD, 88_000, melee(), 1600),
            Observation::Restarted
        );
        assert_eq!(rec.window(SWORD).unwrap().effective_start_ms(), 1600);
    }

    #[test]
    fn claiming_can_be_disabled() {
        let mut rec = CooldownReconciler::new().with_claim_predictions(false);
        rec.predict_local_start(SWORD, melee(), 1000);
        assert_eq!(
            rec.observe_authoritative_start(SWORD, 88_000, melee(), 1100),
            Observation::Restarted
        );
        assert_eq!(rec.window(SWORD).unwrap().effective_start_ms(), 1100);
    }

    #[test]
    fn prediction_stands_without_confirmation() {
        let mut rec = CooldownReconciler::new();
        rec.predict_local_start(FOOD, food(), 0);
        assert_eq!(rec.progress(FOOD, 1000), Some(0.5));
        assert_eq!(rec.window(FOOD).unwrap().source(), WindowSource::Predicted);
    }

    // --- Sampling and retirement ---

    #[test]
    fn sample_reaches_one_exactly_once_then_retires() {
        let mut rec = CooldownReconciler::new();
        rec.predict_local_start(SWORD, melee(), 0);

        let mut last = 0.0;
        for now in (0..=450).step_by(50) {
            let s = rec.sample(SWORD, now).unwrap();
            assert!(s.progress >= last);
            assert!(!s.completed);
            last = s.progress;
        }
        let done = rec.sample(SWORD, 520).unwrap();
        assert_eq!(done, Sample { progress: 1.0, completed: true });
        assert!(rec.sample(SWORD, 530).is_none());
        assert!(rec.window(SWORD).is_none());
    }

    #[test]
    fn sample_holds_high_water_if_clock_steps_back() {
        let mut rec = CooldownReconciler::new();
        rec.predict_local_start(SWORD, melee(), 100);
        let a = rec.sample(SWORD, 300).unwrap().progress;
        let b = rec.sample(SWORD, 200).unwrap().progress;
        assert_eq!(a, b);
    }

    #[test]
    fn retired_duplicate_does_not_revive() {
        let mut rec = CooldownReconciler::new();
        rec.observe_authoritative_start(SWORD, 1000, melee(), 0);
        rec.sample(SWORD, 600);
        assert!(rec.window(SWORD).is_none());
        assert_eq!(
            rec.observe_authoritative_start(SWORD, 1000, melee(), 700),
            Observation::Duplicate
        );
        assert!(rec.window(SWORD).is_none());
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut rec = CooldownReconciler::new();
        rec.predict_local_start(SWORD, WindowParams::new(0, SwitchPolicy::Sticky), 10);
        assert!(rec.sample(SWORD, 10).unwrap().completed);
    }

    // --- Selection and cleanup ---

    #[test]
    fn selection_change_interrupts_only_interruptible() {
        let mut rec = CooldownReconciler::new();
        rec.predict_local_start(SWORD, melee(), 0);
        rec.predict_local_start(FOOD, food(), 0);
        let food_before = rec.progress(FOOD, 100);

        let retired = rec.on_selection_changed(Some(3));
        assert_eq!(retired, vec![SWORD]);
        assert!(rec.window(SWORD).is_none());
        assert_eq!(rec.progress(FOOD, 100), food_before);
    }

    #[test]
    fn reselecting_same_slot_keeps_interruptible() {
        let mut rec = CooldownReconciler::new();
        rec.predict_local_start(SWORD, melee(), 0);
        assert!(rec.on_selection_changed(Some(0)).is_empty());
        assert!(rec.window(SWORD).is_some());
    }

    #[test]
    fn vanished_items_are_forgotten() {
        let mut rec = CooldownReconciler::new();
        rec.observe_authoritative_start(SWORD, 10, melee(), 0);
        rec.observe_authoritative_start(FOOD, 10, food(), 0);
        rec.sample(FOOD, 5000);

        let cancelled = rec.retain_items(|id| id == 999);
        assert_eq!(cancelled, vec![SWORD]);
        assert_eq!(rec.tracked_len(), 0);
    }

    // --- Resync ---

    #[test]
    fn resync_baselines_first_value_without_replay() {
        let mut rec = CooldownReconciler::new();
        rec.predict_local_start(SWORD, melee(), 0);
        assert_eq!(rec.begin_resync(), vec![SWORD]);

        assert_eq!(
            rec.observe_authoritative_start(SWORD, 4000, melee(), 100),
            Observation::Baseline
        );
        assert!(rec.window(SWORD).is_none());
        rec.end_resync(StartSource::Equipment);
        rec.end_resync(StartSource::Effect);
        assert!(!rec.is_resyncing());

        assert_eq!(
            rec.observe_authoritative_start(SWORD, 4000, melee(), 200),
            Observation::Duplicate
        );
        assert_eq!(
            rec.observe_authoritative_start(SWORD, 4600, melee(), 300),
            Observation::Restarted
        );
    }

    #[test]
    fn resync_ends_per_source() {
        let mut rec = CooldownReconciler::new();
        rec.begin_resync();
        rec.end_resync(StartSource::Effect);
        assert!(rec.is_resyncing());
        assert!(rec.is_resyncing_source(StartSource::Equipment));

        assert_eq!(
            rec.observe_start(SWORD, StartSource::Effect, 50, food(), 50),
            Observation::Restarted
        );
        assert_eq!(
            rec.observe_authoritative_start(SWORD, 1_700_000_000_000, melee(), 60),
            Observation::Baseline
        );
    }

    // --- Sources ---

    #[test]
    fn sources_compare_independently() {
        let mut rec = CooldownReconciler::new();
        rec.observe_authoritative_start(FOOD, 1_700_000_000_000, melee(), 0);
        rec.sample(FOOD, 1_000);

        // A client-clock effect start is far below the server epoch value.
        assert_eq!(
            rec.observe_start(FOOD, StartSource::Effect, 2_000, food(), 2_000),
            Observation::Restarted
        );
        assert_eq!(rec.last_start_ms(FOOD, StartSource::Effect), Some(2_000));
        assert_eq!(rec.last_confirmed_start_ms(FOOD), Some(1_700_000_000_000));
        assert_eq!(
            rec.observe_start(FOOD, StartSource::Effect, 2_000, food(), 2_100),
            Observation::Duplicate
        );
    }
}
