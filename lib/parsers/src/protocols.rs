// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! OpenAI-compatible streaming chat completion chunks.
//!
//! Only the fields needed to recover generated text are modelled; unknown
//! fields are ignored on deserialization.

use serde::{Deserialize, Serialize};

use crate::streaming::Fragment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// One `chat.completion.chunk` object from a streaming response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    /// A single-choice chunk carrying `content`, mostly useful for tests and
    /// replaying recorded text.
    pub fn from_content(id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatCompletionChunk {
            id: id.into(),
            model: String::new(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: Some(content.into()),
                },
                finish_reason: None,
            }],
        }
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.choices.first().and_then(|choice| choice.finish_reason)
    }
}

impl Fragment for ChunkDelta {
    fn text(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

impl Fragment for ChunkChoice {
    fn text(&self) -> Option<&str> {
        self.delta.text()
    }
}

/// The payload of a chunk is the first choice's delta content.
impl Fragment for ChatCompletionChunk {
    fn text(&self) -> Option<&str> {
        self.choices.first().and_then(Fragment::text)
    }
}
