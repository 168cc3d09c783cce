// Copyright (C) 2025 Port Labs
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tracing subscriber initialization for the Lambda binaries.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: "info")
//! - `PORT_LOG_FORMAT`: "text" (default) or "json" for one JSON object per line

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Output layout of the log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Read `PORT_LOG_FORMAT`. Unknown values fall back to text.
    pub fn from_env() -> Self {
        match std::env::var("PORT_LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Sets up:
/// - An EnvFilter that respects `RUST_LOG` (default: info)
/// - A fmt layer writing to stderr without ANSI colours (CloudWatch friendly)
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_subscriber() {
    init_subscriber_with(LogFormat::from_env());
}

/// Initialize the global tracing subscriber with an explicit format.
pub fn init_subscriber_with(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already initialized: {}", e);
    }
}
