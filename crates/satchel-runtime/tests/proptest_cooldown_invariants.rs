//! Property-based invariant tests for cooldown reconciliation.
//!
//! 1. Sampled progress never decreases and ends at exactly 1.0, once
//! 2. Re-delivering the last confirmed start never changes progress
//! 3. A strictly newer start resets progress below its previous value
//! 4. Older starts are ignored whatever order they arrive in
//! 5. Selection changes never touch sticky windows
//! 6. Synthetic effect starts are strictly increasing

use proptest::prelude::*;
use satchel_runtime::{
    ActiveEffect, CooldownReconciler, EffectTracker, EffectType, IgnoreReason, Observation,
    SwitchPolicy, WindowParams,
};

const ITEM: u64 = 11;

fn params(duration_ms: u64) -> WindowParams {
    WindowParams::new(duration_ms, SwitchPolicy::Interruptible).in_slot(0)
}

/// Increasing client times starting at `base`.
fn times_strategy(base: u64) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..200, 1..40).prop_map(move |steps| {
        steps
            .into_iter()
            .scan(base, |t, step| {
                *t += step;
                Some(*t)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn sampled_progress_is_monotone_and_completes_once(
        duration in 1u64..2_000,
        server_start in 1u64..1_000_000,
        times in times_strategy(5_000),
        claim in any::<bool>(),
    ) {
        let mut rec = CooldownReconciler::new().with_claim_predictions(claim);
        rec.predict_local_start(ITEM, params(duration), 5_000);
        rec.observe_authoritative_start(ITEM, server_start, params(duration), 5_000);

        let mut last = 0.0f32;
        let mut completions = 0;
        for now in times.iter().copied().chain([5_000 + duration]) {
            let Some(sample) = rec.sample(ITEM, now) else { break };
            prop_assert!(sample.progress >= last, "{} < {}", sample.progress, last);
            prop_assert!((0.0..=1.0).contains(&sample.progress));
            if sample.completed {
                prop_assert_eq!(sample.progress, 1.0);
                completions += 1;
            }
            last = sample.progress;
        }
        prop_assert_eq!(completions, 1);
        prop_assert!(rec.sample(ITEM, u64::MAX).is_none());
    }

    #[test]
    fn duplicate_start_is_idempotent(
        server_start in 1u64..1_000_000,
        gap in 0u64..1_000,
        repeats in 1usize..5,
    ) {
        let mut rec = CooldownReconciler::new();
        rec.observe_authoritative_start(ITEM, server_start, params(1_000), 1_000);
        let now = 1_000 + gap;
        let before = rec.progress(ITEM, now);
        for _ in 0..repeats {
            prop_assert_eq!(
                rec.observe_authoritative_start(ITEM, server_start, params(1_000), now),
                Observation::Duplicate
            );
            prop_assert_eq!(rec.progress(ITEM, now), before);
        }
    }

    #[test]
    fn newer_start_restarts_below_previous_progress(
        t1 in 1u64..1_000_000,
        delta in 1u64..10_000,
        gap in 1u64..999,
    ) {
        let mut rec = CooldownReconciler::new();
        rec.observe_authoritative_start(ITEM, t1, params(1_000), 0);
        let before = rec.progress(ITEM, gap).unwrap();

        let outcome = rec.observe_authoritative_start(ITEM, t1 + delta, params(1_000), gap);
        prop_assert_eq!(outcome, Observation::Restarted);
        let after = rec.progress(ITEM, gap).unwrap();
        prop_assert!(after < before);
        prop_assert_eq!(after, 0.0);
    }

    #[test]
    fn older_starts_are_ignored_in_any_order(
        starts in prop::collection::vec(1u64..10_000, 1..20),
    ) {
        let mut rec = CooldownReconciler::new();
        let mut highest = 0;
        for (i, start) in starts.iter().copied().enumerate() {
            let outcome = rec.observe_authoritative_start(ITEM, start, params(500), i as u64);
            match start.cmp(&highest) {
                std::cmp::Ordering::Less => {
                    prop_assert_eq!(outcome, Observation::Ignored(IgnoreReason::Stale));
                }
                std::cmp::Ordering::Equal => prop_assert_eq!(outcome, Observation::Duplicate),
                std::cmp::Ordering::Greater => prop_assert_eq!(outcome, Observation::Restarted),
            }
            highest = highest.max(start);
            prop_assert_eq!(rec.last_confirmed_start_ms(ITEM), Some(highest));
        }
    }

    #[test]
    fn selection_changes_leave_sticky_windows_alone(
        selections in prop::collection::vec(prop::option::of(0u32..6), 1..10),
        elapsed in 0u64..900,
    ) {
        let mut rec = CooldownReconciler::new();
        rec.predict_local_start(
            ITEM,
            WindowParams::new(1_000, SwitchPolicy::Sticky).in_slot(2),
            0,
        );
        let before = rec.progress(ITEM, elapsed);
        for selected in selections {
            prop_assert!(rec.on_selection_changed(selected).is_empty());
            prop_assert_eq!(rec.progress(ITEM, elapsed), before);
        }
    }

    #[test]
    fn effect_starts_are_strictly_increasing(
        batches in prop::collection::vec((1usize..4, 0u64..3), 1..12),
    ) {
        let mut tracker = EffectTracker::new(1);
        let mut next_id = 1;
        let mut now = 100;
        let mut live: Vec<ActiveEffect> = Vec::new();
        let mut issued: Vec<u64> = Vec::new();

        for (count, step) in batches {
            now += step;
            for _ in 0..count {
                live.push(ActiveEffect {
                    id: next_id,
                    effect_type: EffectType::BandageBurst,
                    owner: 1,
                    item_def_id: 7,
                    consuming_item_instance_id: Some(next_id * 10),
                });
                next_id += 1;
            }
            let changes = tracker.observe(&live, now);
            prop_assert_eq!(changes.started.len(), count);
            issued.extend(changes.started.iter().map(|s| s.started_at_ms));
            // Let the oldest effect expire so later pushes also exercise `ended`.
            if live.len() > 3 {
                live.remove(0);
            }
        }

        prop_assert!(issued.windows(2).all(|w| w[0] < w[1]), "{issued:?}");
    }
}
