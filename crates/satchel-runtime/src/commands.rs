#![forbid(unsafe_code)]

//! Outbound backend commands.
//!
//! Commands are fire-and-forget. [`CommandDispatcher`] wraps every send in
//! a `satchel.command` span, and on failure logs a warning and publishes a
//! [`Notice`] on the bus. Failures are never retried and local optimistic
//! state is not rolled back; the next authoritative update corrects it.

use std::fmt;

use tracing::{debug, debug_span, warn};
use web_time::Instant;

use satchel_core::{InstanceId, SlotAddress, TransferIntent};

use crate::bus::{BusEvent, EventBus, Notice};

/// A request to the authoritative backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveItem {
        item: InstanceId,
        target: SlotAddress,
    },
    SplitStack {
        item: InstanceId,
        quantity: u32,
        target: SlotAddress,
    },
    /// Drop to the world. `None` drops the whole stack.
    DropItem {
        item: InstanceId,
        quantity: Option<u32>,
    },
    ConsumeItem {
        item: InstanceId,
    },
    SetActiveItem {
        item: InstanceId,
    },
    ClearActiveItem,
    /// Swing, fire, or throw whatever is equipped.
    UseEquippedItem,
}

impl Command {
    /// Backend command name, used for logging and notices.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MoveItem { .. } => "move_item",
            Self::SplitStack { .. } => "split_stack",
            Self::DropItem { .. } => "drop_item",
            Self::ConsumeItem { .. } => "consume_item",
            Self::SetActiveItem { .. } => "set_active_item",
            Self::ClearActiveItem => "clear_active_item",
            Self::UseEquippedItem => "use_equipped_item",
        }
    }

    /// The item this command is about, if any.
    #[must_use]
    pub const fn item(&self) -> Option<InstanceId> {
        match self {
            Self::MoveItem { item, .. }
            | Self::SplitStack { item, .. }
            | Self::DropItem { item, .. }
            | Self::ConsumeItem { item }
            | Self::SetActiveItem { item } => Some(*item),
            Self::ClearActiveItem | Self::UseEquippedItem => None,
        }
    }
}

impl From<&TransferIntent> for Command {
    fn from(intent: &TransferIntent) -> Self {
        let item = intent.item.instance_id;
        match (&intent.target, intent.split_quantity) {
            (None, quantity) => Self::DropItem { item, quantity },
            (Some(target), Some(quantity)) => Self::SplitStack {
                item,
                quantity,
                target: target.clone(),
            },
            (Some(target), None) => Self::MoveItem {
                item,
                target: target.clone(),
            },
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveItem { item, target } => write!(f, "move_item({item} -> {target})"),
            Self::SplitStack {
                item,
                quantity,
                target,
            } => write!(f, "split_stack({item} x{quantity} -> {target})"),
            Self::DropItem {
                item,
                quantity: Some(q),
            } => write!(f, "drop_item({item} x{q})"),
            Self::DropItem {
                item,
                quantity: None,
            } => write!(f, "drop_item({item})"),
            Self::ConsumeItem { item } => write!(f, "consume_item({item})"),
            Self::SetActiveItem { item } => write!(f, "set_active_item({item})"),
            Self::ClearActiveItem => f.write_str("clear_active_item"),
            Self::UseEquippedItem => f.write_str("use_equipped_item"),
        }
    }
}

/// Why a command did not reach or was refused by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The backend refused it (slot occupied, item gone, permission).
    Rejected {
        command: &'static str,
        reason: String,
    },
    /// No connection.
    Disconnected,
    /// The surface does not implement this command.
    Unsupported(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { command, reason } => write!(f, "{command} rejected: {reason}"),
            Self::Disconnected => f.write_str("not connected to the server"),
            Self::Unsupported(command) => write!(f, "{command} is not supported"),
        }
    }
}

impl std::error::Error for CommandError {}

/// The host's outbound connection.
pub trait CommandSurface {
    fn send(&mut self, command: &Command) -> Result<(), CommandError>;
}

impl<S: CommandSurface + ?Sized> CommandSurface for Box<S> {
    fn send(&mut self, command: &Command) -> Result<(), CommandError> {
        (**self).send(command)
    }
}

/// Sends commands with tracing and failure notices.
#[derive(Debug)]
pub struct CommandDispatcher<S> {
    surface: S,
    bus: EventBus,
    sent: u64,
    failed: u64,
}

impl<S: CommandSurface> CommandDispatcher<S> {
    #[must_use]
    pub fn new(surface: S, bus: EventBus) -> Self {
        Self {
            surface,
            bus,
            sent: 0,
            failed: 0,
        }
    }

    /// Send once. Failures are logged and announced, then returned.
    pub fn dispatch(&mut self, command: Command) -> Result<(), CommandError> {
        let name = command.name();
        let start = Instant::now();
        let span = debug_span!(
            "satchel.command",
            command = name,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
        );
        let _guard = span.enter();

        let result = self.surface.send(&command);
        span.record("duration_us", start.elapsed().as_micros() as u64);
        self.sent += 1;

        match &result {
            Ok(()) => {
                span.record("result", "ok");
                debug!(%command, "command sent");
            }
            Err(err) => {
                span.record("result", "error");
                self.failed += 1;
                warn!(%command, error = %err, "backend command failed");
                self.bus
                    .publish(BusEvent::Notice(Notice::for_command(name, err.to_string())));
            }
        }
        result
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Commands attempted so far.
    #[must_use]
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    #[must_use]
    pub const fn failed(&self) -> u64 {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventLog;
    use satchel_core::ItemSnapshot;

    struct Refusing;

    impl CommandSurface for Refusing {
        fn send(&mut self, command: &Command) -> Result<(), CommandError> {
            Err(CommandError::Rejected {
                command: command.name(),
                reason: "slot occupied".into(),
            })
        }
    }

    struct Accepting(Vec<Command>);

    impl CommandSurface for Accepting {
        fn send(&mut self, command: &Command) -> Result<(), CommandError> {
            self.0.push(command.clone());
            Ok(())
        }
    }

    fn intent(target: Option<SlotAddress>, split: Option<u32>) -> TransferIntent {
        TransferIntent {
            item: ItemSnapshot::stack(9, 1, 10),
            source: SlotAddress::inventory(0),
            target,
            split_quantity: split,
        }
    }

    #[test]
    fn intent_maps_to_command() {
        assert_eq!(
            Command::from(&intent(Some(SlotAddress::hotbar(1)), None)),
            Command::MoveItem {
                item: 9,
                target: SlotAddress::hotbar(1)
            }
        );
        assert_eq!(
            Command::from(&intent(Some(SlotAddress::hotbar(1)), Some(5))).name(),
            "split_stack"
        );
        assert_eq!(
            Command::from(&intent(None, Some(3))),
            Command::DropItem {
                item: 9,
                quantity: Some(3)
            }
        );
    }

    #[test]
    fn failure_publishes_notice_without_retry() {
        let bus = EventBus::new();
        let log = EventLog::attach(&bus);
        let mut dispatcher = CommandDispatcher::new(Refusing, bus);

        let result = dispatcher.dispatch(Command::ConsumeItem { item: 3 });
        assert!(result.is_err());
        assert_eq!(dispatcher.sent(), 1);
        assert_eq!(dispatcher.failed(), 1);
        assert_eq!(
            log.drain(),
            vec![BusEvent::Notice(Notice::for_command(
                "consume_item",
                "consume_item rejected: slot occupied"
            ))]
        );
    }

    #[test]
    fn success_is_silent_on_bus() {
        let bus = EventBus::new();
        let log = EventLog::attach(&bus);
        let mut dispatcher = CommandDispatcher::new(Accepting(Vec::new()), bus);

        dispatcher
            .dispatch(Command::SetActiveItem { item: 4 })
            .unwrap();
        assert!(log.is_empty());
        assert_eq!(dispatcher.surface().0, vec![Command::SetActiveItem { item: 4 }]);
    }

    #[test]
    fn display_is_readable() {
        let cmd = Command::SplitStack {
            item: 1,
            quantity: 2,
            target: SlotAddress::inventory(3),
        };
        assert_eq!(cmd.to_string(), "split_stack(1 x2 -> inventory[3])");
        assert_eq!(CommandError::Disconnected.to_string(), "not connected to the server");
    }
}
