// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

/*

Recorded chat completion streams under tests/data/streams are replayed through
the streaming parser, chunk by chunk, and the emitted events are compared with
the `expected_output` stored next to them. The same text is also run through
the batch parser, which must agree on calls and, modulo whitespace, on content.

To add a recording, drop a JSON file with `input_stream` (raw chunks) and
`expected_output.events` (serialized ParseEvents) into tests/data/streams and
list it in RECORDINGS.

*/

use std::sync::Arc;

use futures::{StreamExt, stream};
use mfcs_parsers::protocols::ChatCompletionChunk;
use mfcs_parsers::{
    CollectingSink, Fragment, ParseEvent, StreamParser, parse_fragments, parse_output,
    parse_stream,
};

const DATA_ROOT_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/streams/");

const RECORDINGS: &[&str] = &["weather_and_memory.json"];

struct TestData {
    expected_events: Vec<ParseEvent>,
    stream_chunks: Vec<ChatCompletionChunk>,
}

fn load_test_data(name: &str) -> TestData {
    let data = std::fs::read_to_string(format!("{DATA_ROOT_PATH}{name}")).unwrap();
    let parsed_json: serde_json::Value = serde_json::from_str(&data).unwrap();

    let expected_events = serde_json::from_value(parsed_json["expected_output"]["events"].clone())
        .expect("expected_output.events should hold serialized ParseEvents");
    let stream_chunks = serde_json::from_value(parsed_json["input_stream"].clone())
        .expect("input_stream should hold chat completion chunks");

    TestData {
        expected_events,
        stream_chunks,
    }
}

fn full_text(chunks: &[ChatCompletionChunk]) -> String {
    chunks.iter().filter_map(|chunk| chunk.text()).collect()
}

fn without_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn test_recorded_streams_blocking() {
    for name in RECORDINGS {
        let test_data = load_test_data(name);
        let sink = Arc::new(CollectingSink::new());
        let parser = StreamParser::builder()
            .diagnostics(sink.clone())
            .build()
            .unwrap();

        let events: Vec<_> = parser.into_events(&test_data.stream_chunks).collect();

        assert_eq!(events, test_data.expected_events, "recording {name}");
        assert!(sink.is_empty(), "recording {name} should be well-formed");
    }
}

#[tokio::test]
async fn test_recorded_streams_async() {
    for name in RECORDINGS {
        let test_data = load_test_data(name);
        let events: Vec<_> = parse_stream(stream::iter(test_data.stream_chunks))
            .unwrap()
            .collect()
            .await;

        assert_eq!(events, test_data.expected_events, "recording {name}");
    }
}

#[test]
fn test_recorded_streams_match_batch() {
    for name in RECORDINGS {
        let test_data = load_test_data(name);
        let text = full_text(&test_data.stream_chunks);
        let (content, tool_calls, memory_calls) = parse_output(&text);

        let mut streamed_content = String::new();
        let mut streamed_tools = Vec::new();
        let mut streamed_memories = Vec::new();
        for event in parse_fragments([text.as_str()]).unwrap() {
            match event {
                ParseEvent::Content(text) => streamed_content.push_str(&text),
                ParseEvent::ToolCall(call) => streamed_tools.push(call),
                ParseEvent::MemoryCall(call) => streamed_memories.push(call),
            }
        }

        assert_eq!(streamed_tools, tool_calls, "recording {name}");
        assert_eq!(streamed_memories, memory_calls, "recording {name}");
        assert_eq!(
            without_whitespace(&streamed_content),
            without_whitespace(&content),
            "recording {name}"
        );
    }
}

#[test]
fn test_recorded_streams_one_character_at_a_time() {
    for name in RECORDINGS {
        let test_data = load_test_data(name);
        let text = full_text(&test_data.stream_chunks);
        let characters: Vec<String> = text.chars().map(String::from).collect();

        let calls: Vec<_> = parse_fragments(&characters)
            .unwrap()
            .filter(ParseEvent::is_call)
            .collect();
        let expected_calls: Vec<_> = test_data
            .expected_events
            .iter()
            .filter(|event| event.is_call())
            .cloned()
            .collect();

        assert_eq!(calls, expected_calls, "recording {name}");
    }
}
