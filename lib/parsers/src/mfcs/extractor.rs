// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Field extraction for the body of an MFCS block.
//!
//! A block body is a flat sequence of fields:
//!
//! ```text
//! <instructions>free text, may span lines</instructions>
//! <call_id>c1</call_id>
//! <name>search</name>
//! <parameters>{"q": "weather"}</parameters>
//! ```
//!
//! Fields may appear in any order. Each body is opaque: once a field opens,
//! everything up to its own closing marker belongs to it, so marker-like text
//! inside `<instructions>` is neither a nested field nor a duplicate.

use std::fmt;

use thiserror::Error;

use crate::response::{Call, CallKind, IdField, MemoryCall, ToolCall};

/// Fields recognized inside a block body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Instructions,
    Id(IdField),
    Name,
    Parameters,
}

impl Field {
    pub fn tag_name(self) -> &'static str {
        match self {
            Field::Instructions => "instructions",
            Field::Id(IdField::CallId) => "call_id",
            Field::Id(IdField::MemoryId) => "memory_id",
            Field::Name => "name",
            Field::Parameters => "parameters",
        }
    }

    pub fn open_marker(self) -> &'static str {
        match self {
            Field::Instructions => "<instructions>",
            Field::Id(IdField::CallId) => "<call_id>",
            Field::Id(IdField::MemoryId) => "<memory_id>",
            Field::Name => "<name>",
            Field::Parameters => "<parameters>",
        }
    }

    pub fn close_marker(self) -> &'static str {
        match self {
            Field::Instructions => "</instructions>",
            Field::Id(IdField::CallId) => "</call_id>",
            Field::Id(IdField::MemoryId) => "</memory_id>",
            Field::Name => "</name>",
            Field::Parameters => "</parameters>",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// Why a block body could not be turned into a call. Offsets are byte
/// positions within the body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("missing <{0}> field")]
    MissingField(Field),

    #[error("<{field}> opened at byte {offset} is never closed")]
    UnterminatedField { field: Field, offset: usize },

    #[error("duplicate <{field}> field at byte {offset}")]
    DuplicateField { field: Field, offset: usize },

    #[error("invalid parameters JSON at line {line}, column {column}: {message}")]
    InvalidParameters {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("parameters must be a JSON object, found {found}")]
    ParametersNotObject { found: &'static str },
}

/// The four components of a well-formed block body.
#[derive(Debug, Clone, PartialEq)]
pub struct CallParts {
    pub instructions: String,
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
    pub raw_arguments: String,
}

impl CallParts {
    pub fn into_tool_call(self) -> ToolCall {
        ToolCall {
            instructions: self.instructions,
            call_id: self.id,
            name: self.name,
            arguments: self.arguments,
            raw_arguments: self.raw_arguments,
        }
    }

    pub fn into_memory_call(self) -> MemoryCall {
        MemoryCall {
            instructions: self.instructions,
            memory_id: self.id,
            name: self.name,
            arguments: self.arguments,
            raw_arguments: self.raw_arguments,
        }
    }

    pub fn into_call(self, kind: CallKind) -> Call {
        match kind {
            CallKind::Tool => Call::Tool(self.into_tool_call()),
            CallKind::Memory => Call::Memory(self.into_memory_call()),
        }
    }
}

/// A field occurrence found by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldToken<'a> {
    field: Field,
    /// Byte offset of the opening marker.
    offset: usize,
    body: &'a str,
}

/// Splits a block body into field tokens. Text outside fields is skipped;
/// the lexer stops after the first unterminated field.
struct FieldLexer<'a> {
    text: &'a str,
    cursor: usize,
    vocabulary: [Field; 4],
}

impl<'a> FieldLexer<'a> {
    fn new(text: &'a str, id_field: IdField) -> Self {
        Self {
            text,
            cursor: 0,
            vocabulary: [
                Field::Instructions,
                Field::Id(id_field),
                Field::Name,
                Field::Parameters,
            ],
        }
    }

    /// Earliest opening marker at or after the cursor.
    fn next_open(&self) -> Option<(usize, Field)> {
        let rest = &self.text[self.cursor..];
        self.vocabulary
            .iter()
            .filter_map(|&field| {
                rest.find(field.open_marker())
                    .map(|pos| (self.cursor + pos, field))
            })
            .min_by_key(|(pos, _)| *pos)
    }
}

impl<'a> Iterator for FieldLexer<'a> {
    type Item = Result<FieldToken<'a>, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (offset, field) = self.next_open()?;
        let body_start = offset + field.open_marker().len();

        match self.text[body_start..].find(field.close_marker()) {
            Some(len) => {
                let body_end = body_start + len;
                self.cursor = body_end + field.close_marker().len();
                Some(Ok(FieldToken {
                    field,
                    offset,
                    body: &self.text[body_start..body_end],
                }))
            }
            None => {
                self.cursor = self.text.len();
                Some(Err(ExtractError::UnterminatedField { field, offset }))
            }
        }
    }
}

#[derive(Default)]
struct FieldSet<'a> {
    instructions: Option<&'a str>,
    id: Option<&'a str>,
    name: Option<&'a str>,
    parameters: Option<&'a str>,
}

impl<'a> FieldSet<'a> {
    fn slot(&mut self, field: Field) -> &mut Option<&'a str> {
        match field {
            Field::Instructions => &mut self.instructions,
            Field::Id(_) => &mut self.id,
            Field::Name => &mut self.name,
            Field::Parameters => &mut self.parameters,
        }
    }
}

/// Extract the components of a block body, reporting why extraction failed.
///
/// `id_field` selects which identifier the body must carry: `<call_id>` for
/// tool calls, `<memory_id>` for memory calls.
pub fn try_extract(text: &str, id_field: IdField) -> Result<CallParts, ExtractError> {
    let mut fields = FieldSet::default();

    for token in FieldLexer::new(text, id_field) {
        let token = token?;
        let slot = fields.slot(token.field);
        if slot.is_some() {
            return Err(ExtractError::DuplicateField {
                field: token.field,
                offset: token.offset,
            });
        }
        *slot = Some(token.body);
    }

    let instructions = fields
        .instructions
        .ok_or(ExtractError::MissingField(Field::Instructions))?;
    let id = fields
        .id
        .ok_or(ExtractError::MissingField(Field::Id(id_field)))?;
    let name = fields
        .name
        .ok_or(ExtractError::MissingField(Field::Name))?;
    let parameters = fields
        .parameters
        .ok_or(ExtractError::MissingField(Field::Parameters))?;

    let raw_arguments = parameters.trim();
    let arguments = decode_parameters(raw_arguments)?;

    Ok(CallParts {
        instructions: instructions.trim().to_string(),
        id: id.trim().to_string(),
        name: name.trim().to_string(),
        arguments,
        raw_arguments: raw_arguments.to_string(),
    })
}

/// Extract the components of a block body. Any missing field or undecodable
/// parameters yields `None`; use [`try_extract`] to learn why.
pub fn extract(text: &str, id_field: IdField) -> Option<CallParts> {
    try_extract(text, id_field).ok()
}

fn decode_parameters(raw: &str) -> Result<serde_json::Value, ExtractError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ExtractError::InvalidParameters {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })?;

    if !value.is_object() {
        return Err(ExtractError::ParametersNotObject {
            found: json_type_name(&value),
        });
    }
    Ok(value)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const WELL_FORMED: &str = r#"<instructions>look up</instructions><call_id>c1</call_id><name>search</name><parameters>{"q":"weather"}</parameters>"#;

    #[test]
    fn test_extract_well_formed_body() {
        let parts = try_extract(WELL_FORMED, IdField::CallId).unwrap();
        assert_eq!(parts.instructions, "look up");
        assert_eq!(parts.id, "c1");
        assert_eq!(parts.name, "search");
        assert_eq!(parts.arguments, json!({"q": "weather"}));
        assert_eq!(parts.raw_arguments, r#"{"q":"weather"}"#);
    }

    #[test]
    fn test_extract_fields_in_any_order_with_whitespace() {
        let body = r#"
<parameters>
  {"path": "/tmp", "recursive": true}
</parameters>
<name> list_dir </name>
<memory_id>
m-7
</memory_id>
<instructions>
List the directory.
Then summarize it.
</instructions>
"#;
        let parts = try_extract(body, IdField::MemoryId).unwrap();
        assert_eq!(parts.name, "list_dir");
        assert_eq!(parts.id, "m-7");
        assert_eq!(parts.instructions, "List the directory.\nThen summarize it.");
        assert_eq!(parts.arguments["recursive"], true);
        assert_eq!(parts.raw_arguments, r#"{"path": "/tmp", "recursive": true}"#);
    }

    #[test]
    fn test_instructions_body_is_opaque() {
        let body = r#"<instructions>Never emit <name>x</name> here</instructions><call_id>1</call_id><name>real</name><parameters>{}</parameters>"#;
        let parts = try_extract(body, IdField::CallId).unwrap();
        assert_eq!(parts.name, "real");
        assert_eq!(parts.instructions, "Never emit <name>x</name> here");
    }

    #[test]
    fn test_raw_arguments_preserve_formatting() {
        let body = "<instructions>i</instructions><call_id>1</call_id><name>n</name>\
                    <parameters>{ \"b\": 1.50,  \"a\": [1, 2] }</parameters>";
        let parts = try_extract(body, IdField::CallId).unwrap();
        assert_eq!(parts.raw_arguments, "{ \"b\": 1.50,  \"a\": [1, 2] }");
        // Key order follows the source.
        let keys: Vec<_> = parts.arguments.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[rstest]
    #[case::missing_instructions(
        r#"<call_id>1</call_id><name>n</name><parameters>{}</parameters>"#,
        ExtractError::MissingField(Field::Instructions)
    )]
    #[case::missing_id(
        r#"<instructions>i</instructions><name>n</name><parameters>{}</parameters>"#,
        ExtractError::MissingField(Field::Id(IdField::CallId))
    )]
    #[case::wrong_id_kind(
        r#"<instructions>i</instructions><memory_id>1</memory_id><name>n</name><parameters>{}</parameters>"#,
        ExtractError::MissingField(Field::Id(IdField::CallId))
    )]
    #[case::missing_name(
        r#"<instructions>i</instructions><call_id>1</call_id><parameters>{}</parameters>"#,
        ExtractError::MissingField(Field::Name)
    )]
    #[case::missing_parameters(
        r#"<instructions>i</instructions><call_id>1</call_id><name>n</name>"#,
        ExtractError::MissingField(Field::Parameters)
    )]
    #[case::unterminated_name(
        r#"<instructions>i</instructions><call_id>1</call_id><name>n<parameters>{}</parameters>"#,
        ExtractError::UnterminatedField { field: Field::Name, offset: 50 }
    )]
    #[case::duplicate_name(
        r#"<instructions>i</instructions><call_id>1</call_id><name>a</name><name>b</name><parameters>{}</parameters>"#,
        ExtractError::DuplicateField { field: Field::Name, offset: 64 }
    )]
    #[case::array_parameters(
        r#"<instructions>i</instructions><call_id>1</call_id><name>n</name><parameters>[1, 2]</parameters>"#,
        ExtractError::ParametersNotObject { found: "array" }
    )]
    fn test_extract_errors(#[case] body: &str, #[case] expected: ExtractError) {
        assert_eq!(try_extract(body, IdField::CallId), Err(expected));
        assert!(extract(body, IdField::CallId).is_none());
    }

    #[test]
    fn test_invalid_json_reports_location() {
        let body = "<instructions>x</instructions><call_id>1</call_id><name>n</name>\
                    <parameters>{bad json}</parameters>";
        match try_extract(body, IdField::CallId) {
            Err(ExtractError::InvalidParameters { line, column, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(column, 2);
            }
            other => panic!("expected invalid parameters, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_is_idempotent() {
        let first = extract(WELL_FORMED, IdField::CallId);
        let second = extract(WELL_FORMED, IdField::CallId);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_into_call_variants() {
        let parts = try_extract(WELL_FORMED, IdField::CallId).unwrap();
        match parts.clone().into_call(CallKind::Tool) {
            Call::Tool(call) => assert_eq!(call.call_id, "c1"),
            Call::Memory(_) => panic!("expected a tool call"),
        }
        match parts.into_call(CallKind::Memory) {
            Call::Memory(call) => assert_eq!(call.memory_id, "c1"),
            Call::Tool(_) => panic!("expected a memory call"),
        }
    }
}
