//! Filterbot Library
//!
//! Chat command that runs whitelisted stream filters over user text:
//! `!filter string.rot13 hello` replies `string.rot13: uryyb`.
//!
//! # Features
//!
//! - **Whitelist**: comma-separated glob patterns, matched per dot-segment count
//! - **Filters**: `string.*`, `convert.*`, `convert.iconv.*`, `dechunk`, `zlib.*`, `bzip2.*`, `consumed`
//! - **Hot reload**: config file changes swap the allowed set atomically
//!
//! The matching rules live in the `filterbot-core` crate; this crate adds the
//! filter registry, the chat dispatcher, configuration and the CLI.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod plugin;
pub mod reload;
pub mod transform;
pub mod whitelist;

pub use error::{Error, Result};
pub use filterbot_core::{AllowedFilterSet, DEFAULT_WHITELIST, FilterRequest, FilterResult};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// `RUST_LOG` overrides `level` when set. Logs go to stderr so replies on
/// stdout stay clean.
///
/// # Errors
///
/// Returns `Error::Internal` if a global subscriber is already installed.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        Some("json") => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    installed.map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))
}
