// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::io::{Read as _, Write};

use anyhow::Context as _;
use futures::StreamExt;
use mfcs_parsers::protocols::ChatCompletionChunk;
use mfcs_parsers::{Fragment, StreamParser, parse_output};

mod flags;
pub use flags::Flags;
pub mod logging;
mod opt;
pub use opt::{InputFormat, Mode};

pub async fn run(flags: Flags) -> anyhow::Result<()> {
    let input = read_input(&flags)?;
    let chunks = match flags.input_format {
        InputFormat::Text => split_fragments(&input, flags.fragment_size.get()),
        InputFormat::Chunks => parse_chunk_lines(&input)?
            .into_iter()
            .map(|chunk| chunk.text().unwrap_or_default().to_string())
            .collect(),
    };

    let mut out = std::io::stdout().lock();
    match flags.mode {
        Mode::Batch => {
            let text = chunks.concat();
            let (content, tool_calls, memory_calls) = parse_output(&text);
            let document = serde_json::json!({
                "content": content,
                "tool_calls": tool_calls,
                "memory_calls": memory_calls,
            });
            serde_json::to_writer_pretty(&mut out, &document)?;
            writeln!(out)?;
        }
        Mode::Stream => {
            let parser = StreamParser::builder()
                .config(flags.stream_config()?)
                .build()?;
            tracing::debug!(fragments = chunks.len(), config = ?parser.config(), "streaming");

            let events = parser.apply(futures::stream::iter(chunks));
            futures::pin_mut!(events);
            while let Some(event) = events.next().await {
                serde_json::to_writer(&mut out, &event)?;
                writeln!(out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn read_input(flags: &Flags) -> anyhow::Result<String> {
    match &flags.input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Split `text` into fragments of at most `size` characters.
pub fn split_fragments(text: &str, size: usize) -> Vec<String> {
    let characters: Vec<char> = text.chars().collect();
    characters
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Parse JSON-lines or SSE encoded chat completion chunks.
pub fn parse_chunk_lines(input: &str) -> anyhow::Result<Vec<ChatCompletionChunk>> {
    let mut chunks = Vec::new();
    for (number, line) in input.lines().enumerate() {
        let line = line.trim();
        let line = line.strip_prefix("data:").map(str::trim).unwrap_or(line);
        if line.is_empty() || line == "[DONE]" {
            continue;
        }
        let chunk = serde_json::from_str(line)
            .with_context(|| format!("Invalid chat completion chunk on line {}", number + 1))?;
        chunks.push(chunk);
    }
    Ok(chunks)
}
