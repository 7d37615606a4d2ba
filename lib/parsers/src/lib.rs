// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Extraction of MFCS tool and memory calls embedded in LLM output.
//!
//! [`mfcs::BatchParser`] handles a complete response; [`streaming::StreamParser`]
//! handles incrementally arriving fragments and emits [`ParseEvent`]s in source
//! order.

pub mod config;
pub mod diagnostics;
pub mod mfcs;
pub mod protocols;
pub mod response;
pub mod streaming;

pub use config::{MalformedBlockPolicy, StreamConfig};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticsSink, TracingSink};
pub use mfcs::{BatchParser, ExtractError, extract, parse_output, try_extract};
pub use response::{Call, CallKind, MemoryCall, ParseEvent, ToolCall};
pub use streaming::{Fragment, StreamParser, parse_fragments, parse_stream};
