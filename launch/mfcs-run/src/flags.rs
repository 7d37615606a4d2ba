// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;
use mfcs_parsers::{MalformedBlockPolicy, StreamConfig};

use crate::opt::{InputFormat, Mode};

#[derive(Parser, Debug, Clone)]
#[command(name = "mfcs-run", version, about = "Extract MFCS tool and memory calls from model output")]
pub struct Flags {
    /// File holding the model response. Reads stdin when omitted or "-".
    pub input: Option<PathBuf>,

    /// batch | stream
    #[arg(long, default_value = "batch", env = "MFCS_RUN_MODE")]
    pub mode: Mode,

    /// text | chunks
    #[arg(long, default_value = "text")]
    pub input_format: InputFormat,

    /// Characters per fragment when streaming plain text.
    #[arg(long, default_value = "8")]
    pub fragment_size: NonZeroUsize,

    /// Discard buffered text when the stream ends instead of emitting it.
    #[arg(long)]
    pub no_flush_on_finish: bool,

    /// literal | drop. Defaults to MFCS_STREAM_MALFORMED_BLOCK_POLICY, then literal.
    #[arg(long)]
    pub malformed: Option<MalformedBlockPolicy>,
}

impl Flags {
    /// Stream configuration from the environment, overridden by the command line.
    pub fn stream_config(&self) -> anyhow::Result<StreamConfig> {
        let mut config = StreamConfig::from_settings()?;
        if self.no_flush_on_finish {
            config.flush_on_finish = false;
        }
        if let Some(policy) = self.malformed {
            config.malformed_block_policy = policy;
        }
        Ok(config)
    }
}
