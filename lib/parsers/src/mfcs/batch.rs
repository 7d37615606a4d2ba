// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use crate::diagnostics::{Diagnostic, DiagnosticsSink, TracingSink};
use crate::response::{CallKind, MemoryCall, ToolCall};

use super::extractor::{CallParts, try_extract};

/// Parses a complete model response in one pass.
#[derive(Debug, Clone)]
pub struct BatchParser {
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Default for BatchParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchParser {
    pub fn new() -> Self {
        Self {
            diagnostics: Arc::new(TracingSink),
        }
    }

    pub fn with_diagnostics(diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self { diagnostics }
    }

    /// Split `output` into plain content, tool calls and memory calls.
    ///
    /// Tool blocks are resolved first, then memory blocks in what remains.
    /// Blocks that fail extraction, and blocks with no end marker, stay in the
    /// content verbatim, markers included. The returned content is trimmed.
    pub fn parse(&self, output: &str) -> (String, Vec<ToolCall>, Vec<MemoryCall>) {
        let (content, tool_parts) = self.resolve_blocks(output, CallKind::Tool);
        let (content, memory_parts) = self.resolve_blocks(&content, CallKind::Memory);

        let tool_calls = tool_parts
            .into_iter()
            .map(CallParts::into_tool_call)
            .collect::<Vec<_>>();
        let memory_calls = memory_parts
            .into_iter()
            .map(CallParts::into_memory_call)
            .collect::<Vec<_>>();

        tracing::debug!(
            tool_calls = tool_calls.len(),
            memory_calls = memory_calls.len(),
            "parsed complete output"
        );

        (content.trim().to_string(), tool_calls, memory_calls)
    }

    /// Remove every well-formed `kind` block from `text`, returning the residual
    /// text and the extracted parts in order of appearance.
    fn resolve_blocks(&self, text: &str, kind: CallKind) -> (String, Vec<CallParts>) {
        let start_marker = kind.start_marker();
        let end_marker = kind.end_marker();

        let mut content = String::with_capacity(text.len());
        let mut parts = Vec::new();

        // Each region runs from one start marker to the next.
        let mut regions = text.split(start_marker);
        if let Some(head) = regions.next() {
            content.push_str(head);
        }

        for region in regions {
            let Some((body, rest)) = region.split_once(end_marker) else {
                self.diagnostics.record(Diagnostic::UnterminatedBlock {
                    kind,
                    collected_bytes: region.len(),
                });
                content.push_str(start_marker);
                content.push_str(region);
                continue;
            };

            match try_extract(body, kind.id_field()) {
                Ok(extracted) => parts.push(extracted),
                Err(error) => {
                    self.diagnostics
                        .record(Diagnostic::MalformedBlock { kind, error });
                    content.push_str(start_marker);
                    content.push_str(body);
                    content.push_str(end_marker);
                }
            }
            content.push_str(rest);
        }

        (content, parts)
    }
}

/// Parse a complete response with the default diagnostics sink.
pub fn parse_output(output: &str) -> (String, Vec<ToolCall>, Vec<MemoryCall>) {
    BatchParser::new().parse(output)
}
