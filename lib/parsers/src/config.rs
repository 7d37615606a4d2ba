// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

pub mod environment_names;

/// What the streaming parser does with a block whose end marker arrived but
/// whose body could not be extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedBlockPolicy {
    /// Emit the block verbatim, markers included, as content.
    #[default]
    Literal,
    /// Discard the block.
    Drop,
}

impl fmt::Display for MalformedBlockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedBlockPolicy::Literal => write!(f, "literal"),
            MalformedBlockPolicy::Drop => write!(f, "drop"),
        }
    }
}

impl FromStr for MalformedBlockPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "literal" => Ok(MalformedBlockPolicy::Literal),
            "drop" => Ok(MalformedBlockPolicy::Drop),
            other => anyhow::bail!(
                "invalid malformed block policy '{other}', expected 'literal' or 'drop'"
            ),
        }
    }
}

/// Streaming parser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Emit the remaining plain text when the stream ends, and release an
    /// unterminated block as literal content under [`MalformedBlockPolicy::Literal`].
    /// Set with environment variable MFCS_STREAM_FLUSH_ON_FINISH.
    pub flush_on_finish: bool,

    /// Set with environment variable MFCS_STREAM_MALFORMED_BLOCK_POLICY.
    pub malformed_block_policy: MalformedBlockPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            flush_on_finish: true,
            malformed_block_policy: MalformedBlockPolicy::Literal,
        }
    }
}

impl StreamConfig {
    /// Drops malformed blocks and discards whatever is buffered at stream end.
    pub fn lossy() -> Self {
        StreamConfig {
            flush_on_finish: false,
            malformed_block_policy: MalformedBlockPolicy::Drop,
        }
    }

    /// Defaults, then the TOML file named by `MFCS_CONFIG_PATH` (if any), then
    /// `MFCS_STREAM_*` environment variables.
    pub fn figment() -> Figment {
        use environment_names::stream::PREFIX;

        let mut figment = Figment::new().merge(Serialized::defaults(StreamConfig::default()));
        if let Ok(path) = std::env::var(environment_names::MFCS_CONFIG_PATH) {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(PREFIX).filter_map(|k| {
            let full_key = format!("{PREFIX}{}", k.as_str());
            // filters out empty environment variables
            match std::env::var(&full_key) {
                Ok(v) if !v.trim().is_empty() => Some(k.into()),
                _ => None,
            }
        }))
    }

    pub fn from_settings() -> Result<StreamConfig> {
        let config: StreamConfig = Self::figment().extract()?;
        tracing::debug!(?config, "loaded stream configuration");
        Ok(config)
    }
}

/// Check if a string is truthy.
///
/// Used for boolean environment switches such as `MFCS_LOGGING_JSONL`.
pub fn is_truthy(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "1" | "true" | "on" | "yes")
}

/// Check if an environment variable is truthy. Unset means false.
pub fn env_is_truthy(env: &str) -> bool {
    match std::env::var(env) {
        Ok(val) => is_truthy(val.as_str()),
        Err(_) => false,
    }
}
