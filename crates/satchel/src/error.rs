#![forbid(unsafe_code)]

//! Unified error and recovery model.
//!
//! Nothing in Satchel is fatal to the client. Every error maps to a
//! [`Recovery`] the host applies to keep the UI alive; the next
//! authoritative backend update corrects whatever state was left behind.

use std::fmt;

use satchel_core::SlotParseError;
use satchel_runtime::{CommandError, ConfigError};

/// Top-level error type for Satchel hosts.
#[derive(Debug)]
pub enum Error {
    /// A slot marker carried an invalid container tag or index.
    Slot(SlotParseError),
    /// A backend command was refused or could not be sent.
    Command(CommandError),
    /// Configuration could not be loaded or failed validation.
    Config(ConfigError),
}

/// Standard result type for Satchel APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// What the host should do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Show a transient, non-blocking message.
    ShowNotice,
    /// Drop it; the gesture resolves as "no slot".
    Ignore,
    /// Fall back to `SatchelConfig::default()`.
    UseDefaults,
}

impl Error {
    #[must_use]
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::Slot(_) => Recovery::Ignore,
            Self::Command(_) => Recovery::ShowNotice,
            Self::Config(_) => Recovery::UseDefaults,
        }
    }

    /// Label for logs.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Slot(_) => "slot",
            Self::Command(_) => "command",
            Self::Config(_) => "config",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot(err) => write!(f, "slot: {err}"),
            Self::Command(err) => write!(f, "command: {err}"),
            Self::Config(err) => write!(f, "config: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Slot(err) => Some(err),
            Self::Command(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<SlotParseError> for Error {
    fn from(err: SlotParseError) -> Self {
        Self::Slot(err)
    }
}

impl From<CommandError> for Error {
    fn from(err: CommandError) -> Self {
        Self::Command(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
