#![forbid(unsafe_code)]

//! Global tracing subscriber setup (feature `logging`).
//!
//! `filter` uses `EnvFilter` directive syntax, e.g.
//! `"satchel_runtime=debug,satchel_core=info"`. When `RUST_LOG` is set it
//! takes precedence.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

fn env_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter))
}

/// Human-readable output to stderr.
pub fn init(filter: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
}

/// One JSON object per line, with span context, for log shipping.
pub fn init_json(filter: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(filter))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
}
