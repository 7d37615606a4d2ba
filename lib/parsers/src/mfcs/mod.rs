// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

mod batch;
mod extractor;

pub use batch::{BatchParser, parse_output};
pub use extractor::{CallParts, ExtractError, Field, extract, try_extract};
