// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Calls and events produced by the MFCS parsers.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const TOOL_START_MARKER: &str = "<mfcs_tool>";
pub const TOOL_END_MARKER: &str = "</mfcs_tool>";
pub const MEMORY_START_MARKER: &str = "<mfcs_memory>";
pub const MEMORY_END_MARKER: &str = "</mfcs_memory>";

/// The two block kinds a model can emit. Each kind owns its markers and the
/// identifier field its body must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Tool,
    Memory,
}

impl CallKind {
    /// Every kind, in the order start markers are registered with matchers.
    pub const ALL: [CallKind; 2] = [CallKind::Tool, CallKind::Memory];

    pub fn start_marker(self) -> &'static str {
        match self {
            CallKind::Tool => TOOL_START_MARKER,
            CallKind::Memory => MEMORY_START_MARKER,
        }
    }

    pub fn end_marker(self) -> &'static str {
        match self {
            CallKind::Tool => TOOL_END_MARKER,
            CallKind::Memory => MEMORY_END_MARKER,
        }
    }

    pub fn id_field(self) -> IdField {
        match self {
            CallKind::Tool => IdField::CallId,
            CallKind::Memory => IdField::MemoryId,
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Tool => write!(f, "tool"),
            CallKind::Memory => write!(f, "memory"),
        }
    }
}

/// Identifier field carried by a block body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdField {
    /// `<call_id>`, used by tool calls
    CallId,
    /// `<memory_id>`, used by memory calls
    MemoryId,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub instructions: String,
    pub call_id: String,
    pub name: String,
    /// Decoded `<parameters>` body, always a JSON object.
    pub arguments: serde_json::Value,
    /// The `<parameters>` body exactly as the model wrote it (trimmed).
    pub raw_arguments: String,
}

/// A durable-memory operation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryCall {
    pub instructions: String,
    pub memory_id: String,
    pub name: String,
    /// Decoded `<parameters>` body, always a JSON object.
    pub arguments: serde_json::Value,
    /// The `<parameters>` body exactly as the model wrote it (trimmed).
    pub raw_arguments: String,
}

/// Either kind of extracted call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Call {
    Tool(ToolCall),
    Memory(MemoryCall),
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::Tool(_) => CallKind::Tool,
            Call::Memory(_) => CallKind::Memory,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Call::Tool(call) => &call.name,
            Call::Memory(call) => &call.name,
        }
    }

    pub fn arguments(&self) -> &serde_json::Value {
        match self {
            Call::Tool(call) => &call.arguments,
            Call::Memory(call) => &call.arguments,
        }
    }
}

impl From<ToolCall> for Call {
    fn from(call: ToolCall) -> Self {
        Call::Tool(call)
    }
}

impl From<MemoryCall> for Call {
    fn from(call: MemoryCall) -> Self {
        Call::Memory(call)
    }
}

/// One unit of parser output, in the order its source text appeared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ParseEvent {
    /// Plain narrative text. Never contains a completed block.
    Content(String),
    ToolCall(ToolCall),
    MemoryCall(MemoryCall),
}

impl ParseEvent {
    /// Split into the `(content, call)` pair streaming consumers work with.
    /// Call events carry empty content.
    pub fn into_parts(self) -> (String, Option<Call>) {
        match self {
            ParseEvent::Content(text) => (text, None),
            ParseEvent::ToolCall(call) => (String::new(), Some(Call::Tool(call))),
            ParseEvent::MemoryCall(call) => (String::new(), Some(Call::Memory(call))),
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            ParseEvent::Content(text) => Some(text),
            ParseEvent::ToolCall(_) | ParseEvent::MemoryCall(_) => None,
        }
    }

    pub fn is_call(&self) -> bool {
        !matches!(self, ParseEvent::Content(_))
    }
}

impl From<Call> for ParseEvent {
    fn from(call: Call) -> Self {
        match call {
            Call::Tool(call) => ParseEvent::ToolCall(call),
            Call::Memory(call) => ParseEvent::MemoryCall(call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tool_call() -> ToolCall {
        ToolCall {
            instructions: "look up".to_string(),
            call_id: "c1".to_string(),
            name: "search".to_string(),
            arguments: json!({"q": "weather"}),
            raw_arguments: r#"{"q":"weather"}"#.to_string(),
        }
    }

    #[test]
    fn test_call_kind_vocabulary() {
        assert_eq!(CallKind::Tool.start_marker(), "<mfcs_tool>");
        assert_eq!(CallKind::Tool.end_marker(), "</mfcs_tool>");
        assert_eq!(CallKind::Memory.start_marker(), "<mfcs_memory>");
        assert_eq!(CallKind::Memory.end_marker(), "</mfcs_memory>");
        assert_eq!(CallKind::Tool.id_field(), IdField::CallId);
        assert_eq!(CallKind::Memory.id_field(), IdField::MemoryId);
    }

    #[test]
    fn test_into_parts() {
        let (content, call) = ParseEvent::Content("Hello.".to_string()).into_parts();
        assert_eq!(content, "Hello.");
        assert!(call.is_none());

        let (content, call) = ParseEvent::ToolCall(sample_tool_call()).into_parts();
        assert!(content.is_empty());
        let call = call.unwrap();
        assert_eq!(call.kind(), CallKind::Tool);
        assert_eq!(call.name(), "search");
        assert_eq!(call.arguments()["q"], "weather");
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = ParseEvent::ToolCall(sample_tool_call());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "tool_call");
        assert_eq!(value["data"]["call_id"], "c1");
        assert_eq!(value["data"]["raw_arguments"], r#"{"q":"weather"}"#);

        let content = serde_json::to_value(ParseEvent::Content("hi".to_string())).unwrap();
        assert_eq!(content, json!({"type": "content", "data": "hi"}));
    }
}
