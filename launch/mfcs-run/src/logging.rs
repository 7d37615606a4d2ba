// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Logging for `mfcs-run`.
//!
//! Logs go to stderr so stdout stays machine readable. The filter is read from
//! `MFCS_LOG` (default `info`), e.g. `MFCS_LOG=mfcs_parsers=trace`.
//! `MFCS_LOGGING_JSONL=1` switches to one JSON object per line and
//! `MFCS_LOG_USE_LOCAL_TZ=1` stamps events in local time instead of UTC.

use std::sync::Once;

use mfcs_parsers::config::env_is_truthy;
use mfcs_parsers::config::environment_names::logging as env_logging;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::{FormatTime, LocalTime, UtcTime};
use tracing_subscriber::prelude::*;

/// Once instance to ensure the logger is only initialized once
static INIT: Once = Once::new();

/// Initialize the logger. Later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if let Err(e) = setup_logging() {
            eprintln!("Failed to initialize logging: {e}");
        }
    });
}

fn setup_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let timer = TimeFormatter::new();

    if env_is_truthy(env_logging::MFCS_LOGGING_JSONL) {
        let l = fmt::layer()
            .json()
            .with_current_span(false)
            .with_timer(timer)
            .with_writer(std::io::stderr)
            .with_filter(filters());
        tracing_subscriber::registry().with(l).try_init()?;
    } else {
        let l = fmt::layer()
            .compact()
            .with_timer(timer)
            .with_writer(std::io::stderr)
            .with_filter(filters());
        tracing_subscriber::registry().with(l).try_init()?;
    }

    Ok(())
}

fn filters() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(env_logging::MFCS_LOG)
        .from_env_lossy()
}

struct TimeFormatter {
    use_local_tz: bool,
}

impl TimeFormatter {
    fn new() -> Self {
        Self {
            use_local_tz: env_is_truthy(env_logging::MFCS_LOG_USE_LOCAL_TZ),
        }
    }
}

impl FormatTime for TimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        if self.use_local_tz {
            LocalTime::rfc_3339().format_time(w)
        } else {
            UtcTime::rfc_3339().format_time(w)
        }
    }
}
