#![forbid(unsafe_code)]

//! Deterministic helpers for tests (feature `test-helpers`).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::commands::{Command, CommandError, CommandSurface};

#[derive(Debug, Default)]
struct Recorded {
    sent: Vec<Command>,
    failures: VecDeque<CommandError>,
    disconnected: bool,
}

/// Command surface that records every command it accepts.
///
/// Clones share the same record, so a test can keep one handle while the
/// session owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    inner: Rc<RefCell<Recorded>>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted commands, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<Command> {
        self.inner.borrow().sent.clone()
    }

    pub fn take_sent(&self) -> Vec<Command> {
        std::mem::take(&mut self.inner.borrow_mut().sent)
    }

    /// Fail the next send with `err`. Queued failures are used in order.
    pub fn fail_next(&self, err: CommandError) {
        self.inner.borrow_mut().failures.push_back(err);
    }

    /// While disconnected every send fails with [`CommandError::Disconnected`].
    pub fn set_connected(&self, connected: bool) {
        self.inner.borrow_mut().disconnected = !connected;
    }
}

impl CommandSurface for RecordingSurface {
    fn send(&mut self, command: &Command) -> Result<(), CommandError> {
        let mut inner = self.inner.borrow_mut();
        if inner.disconnected {
            return Err(CommandError::Disconnected);
        }
        if let Some(err) = inner.failures.pop_front() {
            return Err(err);
        }
        inner.sent.push(command.clone());
        Ok(())
    }
}
