// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Parse the whole response at once and print a single JSON document
    #[default]
    Batch,

    /// Replay the response as fragments and print one JSON event per line
    Stream,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "batch" => Ok(Mode::Batch),
            "stream" | "streaming" => Ok(Mode::Stream),
            e => Err(anyhow::anyhow!("Invalid mode '{e}', expected 'batch' or 'stream'")),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Mode::Batch => "batch",
            Mode::Stream => "stream",
        };
        write!(f, "{s}")
    }
}

/// How the input file is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputFormat {
    /// The raw model response
    #[default]
    Text,

    /// Chat completion chunks, one JSON object per line. SSE `data: ` prefixes
    /// and the `[DONE]` sentinel are accepted.
    Chunks,
}

impl FromStr for InputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "text" => Ok(InputFormat::Text),
            "chunks" | "sse" => Ok(InputFormat::Chunks),
            e => Err(anyhow::anyhow!("Invalid input format '{e}', expected 'text' or 'chunks'")),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            InputFormat::Text => "text",
            InputFormat::Chunks => "chunks",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("batch", Mode::Batch)]
    #[case("stream", Mode::Stream)]
    #[case("streaming", Mode::Stream)]
    fn test_parse_mode(#[case] input: &str, #[case] expected: Mode) {
        assert_eq!(input.parse::<Mode>().unwrap(), expected);
    }

    #[test]
    fn test_invalid_options() {
        assert!("both".parse::<Mode>().is_err());
        assert!("xml".parse::<InputFormat>().is_err());
        assert_eq!("sse".parse::<InputFormat>().unwrap(), InputFormat::Chunks);
    }
}
