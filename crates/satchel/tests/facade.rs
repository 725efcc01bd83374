#![forbid(unsafe_code)]

//! Host-level usage through the facade and prelude.

use std::cell::RefCell;
use std::rc::Rc;

use satchel::prelude::*;
use satchel::{ActiveEquipment, ManualClock, RecordingSurface};

fn host_session() -> (Session<RecordingSurface, ManualClock>, RecordingSurface) {
    let surface = RecordingSurface::new();
    let mut session = Session::with_clock(
        &SatchelConfig::default(),
        surface.clone(),
        1,
        ManualClock::starting_at(1),
    );
    session
        .registry_mut()
        .register(&SlotAddress::hotbar(0), Rect::new(0.0, 0.0, 48.0, 48.0));
    session
        .registry_mut()
        .register(&SlotAddress::hotbar(1), Rect::new(52.0, 0.0, 48.0, 48.0));
    session.backend().items.set(
        [(ItemSnapshot::single(3, 30), SlotAddress::hotbar(0))]
            .into_iter()
            .collect(),
    );
    session
        .backend()
        .active_equipment
        .set(Some(ActiveEquipment::equipped(3, 30)));
    session.pump();
    (session, surface)
}

#[test]
fn host_drags_item_across_hotbar() {
    let (mut session, surface) = host_session();
    let drawn = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&drawn);
    let _sub = session
        .bus()
        .subscribe(move |event| sink.borrow_mut().push(event.clone()));

    let events = [
        PointerEvent::new(
            satchel::PointerEventKind::Down(PointerButton::Primary),
            Point::new(10.0, 10.0),
        ),
        PointerEvent::new(satchel::PointerEventKind::Move, Point::new(60.0, 10.0)),
        PointerEvent::new(
            satchel::PointerEventKind::Up(PointerButton::Primary),
            Point::new(60.0, 10.0),
        ),
    ];
    let intents: Vec<TransferIntent> = events
        .iter()
        .filter_map(|e| session.handle_pointer(e))
        .collect();

    assert_eq!(intents.len(), 1);
    assert_eq!(
        surface.sent(),
        vec![Command::MoveItem {
            item: 3,
            target: SlotAddress::hotbar(1),
        }]
    );
    assert!(
        drawn
            .borrow()
            .iter()
            .any(|e| matches!(e, BusEvent::DragResolved(_)))
    );
}

#[test]
fn command_failure_maps_to_notice_recovery() {
    let (mut session, surface) = host_session();
    surface.set_connected(false);

    let result: Result<TriggerOutcome> = session.trigger_action(3).map_err(Error::from);
    let err = result.unwrap_err();
    assert_eq!(err.recovery(), Recovery::ShowNotice);
    assert!(matches!(err, Error::Command(CommandError::Disconnected)));
}

#[test]
fn invalid_slot_tag_is_ignored() {
    let err: Error = satchel::RawSlotTag::new("hotbar", "x", None)
        .parse()
        .unwrap_err()
        .into();
    assert_eq!(err.recovery(), Recovery::Ignore);
}
