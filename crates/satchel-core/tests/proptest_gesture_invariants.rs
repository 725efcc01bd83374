//! Property-based invariant tests for the gesture layer.
//!
//! 1. A press → release never yields both a click and a transfer
//! 2. Every `DragStarted` is closed by exactly one resolution or cancel
//! 3. A same-slot release never yields a transfer
//! 4. Split quantities are always in `1..q` when present
//! 5. Registry lookups never panic and honour last-registration-wins

use proptest::prelude::*;
use satchel_core::{
    GestureEvent, GestureTracker, ItemSnapshot, Modifiers, Point, PointerButton, Rect,
    SlotAddress, SlotRegistry, split_quantity,
};

// ── Strategies ──────────────────────────────────────────────────────────

fn button_strategy() -> impl Strategy<Value = PointerButton> {
    prop_oneof![
        Just(PointerButton::Primary),
        Just(PointerButton::Secondary),
        Just(PointerButton::Tertiary),
    ]
}

fn modifiers_strategy() -> impl Strategy<Value = Modifiers> {
    (0u8..16).prop_map(Modifiers::from_bits_truncate)
}

fn point_strategy() -> impl Strategy<Value = Point> {
    (-50.0f32..400.0, -50.0f32..200.0).prop_map(|(x, y)| Point::new(x, y))
}

/// Two rows of 40×40 inventory slots with 10px gutters.
fn grid_registry() -> SlotRegistry {
    let mut reg = SlotRegistry::new();
    for i in 0..12u32 {
        let col = (i % 6) as f32;
        let row = (i / 6) as f32;
        reg.register(
            &SlotAddress::inventory(i),
            Rect::new(col * 50.0, row * 50.0, 40.0, 40.0),
        );
    }
    reg
}

fn run_gesture(
    button: PointerButton,
    modifiers: Modifiers,
    quantity: u32,
    path: &[Point],
    release: Point,
) -> Vec<GestureEvent> {
    let reg = grid_registry();
    let mut gt = GestureTracker::default();
    let mut events = gt.on_press(
        Point::new(20.0, 20.0),
        button,
        modifiers,
        ItemSnapshot::stack(1, 1, quantity),
        SlotAddress::inventory(0),
    );
    for p in path {
        events.extend(gt.on_move(*p));
    }
    events.extend(gt.on_release(release, &reg));
    events
}

// ═══════════════════════════════════════════════════════════════════════
// 1–3. Gesture exclusivity
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn click_and_transfer_are_exclusive(
        button in button_strategy(),
        modifiers in modifiers_strategy(),
        quantity in 1u32..100,
        path in prop::collection::vec(point_strategy(), 0..12),
        release in point_strategy(),
    ) {
        let events = run_gesture(button, modifiers, quantity, &path, release);
        let clicks = events.iter().filter(|e| matches!(e, GestureEvent::Clicked { .. })).count();
        let started = events.iter().filter(|e| matches!(e, GestureEvent::DragStarted { .. })).count();
        let closed = events
            .iter()
            .filter(|e| matches!(e, GestureEvent::DragResolved(_) | GestureEvent::DragCancelled { .. }))
            .count();

        prop_assert!(clicks <= 1);
        prop_assert!(started <= 1);
        prop_assert!(!(clicks == 1 && started == 1), "click and drag both fired: {events:?}");
        prop_assert_eq!(started, closed);
    }

    #[test]
    fn same_slot_release_never_transfers(
        button in button_strategy(),
        modifiers in modifiers_strategy(),
        quantity in 1u32..100,
        far in point_strategy(),
        release in (0.0f32..40.0, 0.0f32..40.0).prop_map(|(x, y)| Point::new(x, y)),
    ) {
        let events = run_gesture(button, modifiers, quantity, &[far], release);
        prop_assert!(!events.iter().any(|e| matches!(e, GestureEvent::DragResolved(_))));
    }

    #[test]
    fn resolved_transfer_targets_slot_under_release(
        quantity in 2u32..100,
        target in 1u32..12,
    ) {
        let col = (target % 6) as f32;
        let row = (target / 6) as f32;
        let release = Point::new(col * 50.0 + 20.0, row * 50.0 + 20.0);
        let events = run_gesture(
            PointerButton::Secondary,
            Modifiers::NONE,
            quantity,
            &[Point::new(200.0, 200.0)],
            release,
        );
        let resolved: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GestureEvent::DragResolved(intent) => Some(intent),
                _ => None,
            })
            .collect();
        prop_assert_eq!(resolved.len(), 1);
        prop_assert_eq!(resolved[0].target.clone(), Some(SlotAddress::inventory(target)));
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4. Split bounds
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn split_is_strictly_partial(
        button in button_strategy(),
        modifiers in modifiers_strategy(),
        quantity in 0u32..10_000,
        injected in prop::option::of(any::<u32>()),
    ) {
        let item = ItemSnapshot::stack(1, 1, quantity);
        if let Some(split) = split_quantity(&item, button, modifiers, injected) {
            prop_assert!(split >= 1);
            prop_assert!(split < quantity);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5. Registry
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn later_registration_wins_on_overlap(
        x in 0.0f32..500.0,
        y in 0.0f32..500.0,
        w in 1.0f32..200.0,
        h in 1.0f32..200.0,
        bucket in 8.0f32..256.0,
    ) {
        let mut reg = SlotRegistry::with_bucket_size(bucket);
        reg.register(&SlotAddress::inventory(0), Rect::new(x, y, w, h));
        reg.register(&SlotAddress::hotbar(0), Rect::new(x, y, w, h));
        let hit = reg.resolve_at(Point::new(x + w / 2.0, y + h / 2.0));
        prop_assert_eq!(hit, Some(SlotAddress::hotbar(0)));
    }

    #[test]
    fn lookups_match_linear_scan(
        rects in prop::collection::vec(
            (0.0f32..300.0, 0.0f32..300.0, 1.0f32..80.0, 1.0f32..80.0),
            1..24,
        ),
        points in prop::collection::vec((-10.0f32..400.0, -10.0f32..400.0), 1..32),
    ) {
        let mut reg = SlotRegistry::new();
        let mut linear = Vec::new();
        for (i, (x, y, w, h)) in rects.iter().enumerate() {
            let addr = SlotAddress::inventory(i as u32);
            let rect = Rect::new(*x, *y, *w, *h);
            reg.register(&addr, rect);
            linear.push((addr, rect));
        }
        for (px, py) in points {
            let p = Point::new(px, py);
            let expected = linear.iter().rev().find(|(_, r)| r.contains(p)).map(|(a, _)| a.clone());
            prop_assert_eq!(reg.resolve_at(p), expected);
        }
    }
}
