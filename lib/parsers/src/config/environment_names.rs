// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Environment variable names read by the parsers and the `mfcs-run` binary.

/// Optional TOML file layered between the defaults and the environment
pub const MFCS_CONFIG_PATH: &str = "MFCS_CONFIG_PATH";

/// Logging and tracing environment variables
pub mod logging {
    /// Log filter directives (e.g., "debug", "mfcs_parsers=trace")
    pub const MFCS_LOG: &str = "MFCS_LOG";

    /// Enable JSONL logging format
    pub const MFCS_LOGGING_JSONL: &str = "MFCS_LOGGING_JSONL";

    /// Use local timezone for logging timestamps (default is UTC)
    pub const MFCS_LOG_USE_LOCAL_TZ: &str = "MFCS_LOG_USE_LOCAL_TZ";
}

/// Streaming parser environment variables
pub mod stream {
    /// Prefix shared by every [`crate::config::StreamConfig`] field
    pub const PREFIX: &str = "MFCS_STREAM_";

    /// Release buffered text when the stream ends
    pub const MFCS_STREAM_FLUSH_ON_FINISH: &str = "MFCS_STREAM_FLUSH_ON_FINISH";

    /// What to do with a block that fails extraction: "literal" or "drop"
    pub const MFCS_STREAM_MALFORMED_BLOCK_POLICY: &str = "MFCS_STREAM_MALFORMED_BLOCK_POLICY";
}
