// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Diagnostics reported by the parsers.
//!
//! Malformed and unterminated blocks never fail a parse. They are reported to a
//! [`DiagnosticsSink`] handed to the parser, so callers decide whether they end
//! up in logs, metrics or a test assertion.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::mfcs::ExtractError;
use crate::response::CallKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A block had both markers but its body could not be extracted.
    MalformedBlock { kind: CallKind, error: ExtractError },
    /// A block was opened but its end marker never arrived.
    UnterminatedBlock { kind: CallKind, collected_bytes: usize },
}

impl Diagnostic {
    pub fn kind(&self) -> CallKind {
        match self {
            Diagnostic::MalformedBlock { kind, .. } => *kind,
            Diagnostic::UnterminatedBlock { kind, .. } => *kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedBlock { kind, error } => {
                write!(f, "malformed {kind} block: {error}")
            }
            Diagnostic::UnterminatedBlock {
                kind,
                collected_bytes,
            } => write!(
                f,
                "unterminated {kind} block ({collected_bytes} bytes collected, missing {})",
                kind.end_marker()
            ),
        }
    }
}

pub trait DiagnosticsSink: Send + Sync + fmt::Debug {
    fn record(&self, diagnostic: Diagnostic);
}

/// Default sink: forwards every diagnostic to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, diagnostic: Diagnostic) {
        tracing::warn!(kind = %diagnostic.kind(), "{diagnostic}");
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the recorded diagnostics.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.records.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn is_empty(&self) -> bool {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn record(&self, diagnostic: Diagnostic) {
        tracing::debug!(kind = %diagnostic.kind(), "collected diagnostic: {diagnostic}");
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}
