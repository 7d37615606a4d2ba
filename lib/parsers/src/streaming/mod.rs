// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Incremental extraction of MFCS blocks from streamed model output.
//!
//! [`StreamParser`] consumes fragments one at a time and emits [`ParseEvent`]s
//! as soon as they are fully known. Plain text is released at sentence
//! boundaries, blocks are collected until their end marker arrives, and a
//! start marker split across fragments is held back until it can be
//! recognized.

mod fragment;
mod matcher;
mod sentence;

use std::collections::VecDeque;
use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};

pub use fragment::Fragment;
pub use matcher::{MarkerMatcher, MatchResult};
pub use sentence::{SENTENCE_TERMINATORS, flush_sentences, flush_sentences_from};

use crate::config::{MalformedBlockPolicy, StreamConfig};
use crate::diagnostics::{Diagnostic, DiagnosticsSink, TracingSink};
use crate::mfcs::try_extract;
use crate::response::{CallKind, ParseEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamMode {
    #[default]
    Plain,
    Collecting(CallKind),
}

/// Buffers of a single stream. Only the buffer selected by `mode` ever holds
/// text; text already emitted never returns to any of them.
#[derive(Debug, Default, Clone)]
pub struct StreamState {
    mode: StreamMode,
    plain_buffer: String,
    tool_buffer: String,
    memory_buffer: String,
    /// Offset into the active buffer before which no marker can start.
    scan_from: usize,
}

impl StreamState {
    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    pub fn plain_buffer(&self) -> &str {
        &self.plain_buffer
    }

    pub fn block_buffer(&self, kind: CallKind) -> &str {
        match kind {
            CallKind::Tool => &self.tool_buffer,
            CallKind::Memory => &self.memory_buffer,
        }
    }

    fn block_buffer_mut(&mut self, kind: CallKind) -> &mut String {
        match kind {
            CallKind::Tool => &mut self.tool_buffer,
            CallKind::Memory => &mut self.memory_buffer,
        }
    }

    fn active_buffer_mut(&mut self) -> &mut String {
        match self.mode {
            StreamMode::Plain => &mut self.plain_buffer,
            StreamMode::Collecting(kind) => self.block_buffer_mut(kind),
        }
    }
}

/// Streaming state machine for one response.
#[derive(Debug)]
pub struct StreamParser {
    config: StreamConfig,
    diagnostics: Arc<dyn DiagnosticsSink>,
    start_matcher: MarkerMatcher,
    state: StreamState,
}

impl StreamParser {
    pub fn builder() -> StreamParserBuilder {
        StreamParserBuilder::new()
    }

    /// Parser with the default configuration and the tracing diagnostics sink.
    pub fn new() -> anyhow::Result<Self> {
        Self::builder().build()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Feed one fragment, returning the events it completes, in source order.
    pub fn process(&mut self, fragment: &str) -> Vec<ParseEvent> {
        let mut events = Vec::new();
        if fragment.is_empty() {
            return events;
        }

        tracing::trace!(mode = ?self.state.mode, bytes = fragment.len(), "processing fragment");
        self.state.active_buffer_mut().push_str(fragment);

        loop {
            let progressed = match self.state.mode {
                StreamMode::Collecting(kind) => self.close_block(kind, &mut events),
                StreamMode::Plain => self.open_block(&mut events),
            };
            if !progressed {
                break;
            }
        }

        events
    }

    /// End the stream. Returns whatever the configuration releases from the
    /// buffers and leaves the parser ready for a new stream.
    pub fn finish(&mut self) -> Vec<ParseEvent> {
        let state = std::mem::take(&mut self.state);
        let mut events = Vec::new();

        match state.mode {
            StreamMode::Collecting(kind) => {
                let collected = match kind {
                    CallKind::Tool => state.tool_buffer,
                    CallKind::Memory => state.memory_buffer,
                };
                let release = self.config.flush_on_finish
                    && self.config.malformed_block_policy == MalformedBlockPolicy::Literal;
                for segment in collected.split(kind.start_marker()) {
                    self.release_unterminated(kind, segment, release, &mut events);
                }
            }
            StreamMode::Plain => {
                if self.config.flush_on_finish {
                    push_content(&mut events, &state.plain_buffer);
                } else if !state.plain_buffer.trim().is_empty() {
                    tracing::debug!(
                        bytes = state.plain_buffer.len(),
                        "discarding buffered text at end of stream"
                    );
                }
            }
        }

        events
    }

    /// Consume `fragments` and yield the events they produce, finishing the
    /// stream when the input ends.
    pub fn apply<S>(mut self, fragments: S) -> impl Stream<Item = ParseEvent> + Send
    where
        S: Stream + Send + 'static,
        S::Item: Fragment + Send,
    {
        stream! {
            futures::pin_mut!(fragments);

            while let Some(fragment) = fragments.next().await {
                let events = match fragment.text() {
                    Some(text) => self.process(text),
                    None => continue,
                };
                for event in events {
                    yield event;
                }
            }

            for event in self.finish() {
                yield event;
            }
        }
    }

    /// Blocking counterpart of [`StreamParser::apply`].
    pub fn into_events<I>(self, fragments: I) -> ParseEvents<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Fragment,
    {
        ParseEvents {
            parser: self,
            fragments: fragments.into_iter(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Collecting mode: close the block once its end marker is buffered.
    fn close_block(&mut self, kind: CallKind, events: &mut Vec<ParseEvent>) -> bool {
        let end_marker = kind.end_marker();
        let scan_from = self.state.scan_from;
        let buffer = self.state.block_buffer_mut(kind);
        let Some(end) = buffer[scan_from..].find(end_marker).map(|at| scan_from + at) else {
            let resume = resume_point(buffer, end_marker.len());
            self.state.scan_from = resume;
            return false;
        };

        let rest = buffer.split_off(end + end_marker.len());
        buffer.truncate(end);
        let collected = std::mem::take(buffer);

        // Text before a repeated start marker belongs to blocks that never closed.
        let start_marker = kind.start_marker();
        let (abandoned, body) = match collected.rfind(start_marker) {
            Some(at) => (Some(&collected[..at]), &collected[at + start_marker.len()..]),
            None => (None, collected.as_str()),
        };
        let release = self.config.malformed_block_policy == MalformedBlockPolicy::Literal;
        for segment in abandoned.into_iter().flat_map(|text| text.split(start_marker)) {
            self.release_unterminated(kind, segment, release, events);
        }

        match try_extract(body, kind.id_field()) {
            Ok(parts) => {
                tracing::debug!(%kind, name = %parts.name, id = %parts.id, "extracted call");
                events.push(parts.into_call(kind).into());
            }
            Err(error) => {
                self.diagnostics
                    .record(Diagnostic::MalformedBlock { kind, error });
                if release {
                    push_content(events, &format!("{start_marker}{body}{end_marker}"));
                }
            }
        }

        self.state.mode = StreamMode::Plain;
        self.state.scan_from = 0;
        self.state.plain_buffer.push_str(&rest);
        true
    }

    /// Plain mode: switch to collecting at the leftmost start marker, or
    /// release complete sentences that cannot belong to a marker.
    fn open_block(&mut self, events: &mut Vec<ParseEvent>) -> bool {
        let scan_from = self.state.scan_from;
        match self.start_matcher.find(&self.state.plain_buffer[scan_from..]) {
            MatchResult::Complete {
                pattern,
                start,
                end,
            } => {
                let kind = CallKind::ALL[pattern];
                let rest = self.state.plain_buffer.split_off(scan_from + end);
                self.state.plain_buffer.truncate(scan_from + start);
                push_content(events, &std::mem::take(&mut self.state.plain_buffer));

                tracing::debug!(%kind, "start marker found, collecting block");
                self.state.mode = StreamMode::Collecting(kind);
                self.state.scan_from = 0;
                self.state.block_buffer_mut(kind).push_str(&rest);
                true
            }
            MatchResult::Partial { start } => {
                self.flush_plain(scan_from + start, events);
                false
            }
            MatchResult::None => {
                self.flush_plain(self.state.plain_buffer.len(), events);
                false
            }
        }
    }

    /// Release complete sentences from `plain_buffer[..limit]`.
    fn flush_plain(&mut self, limit: usize, events: &mut Vec<ParseEvent>) {
        let (flushed, remainder) =
            flush_sentences_from(&self.state.plain_buffer[..limit], self.state.scan_from);
        if !flushed.is_empty() {
            let flushed = flushed.to_string();
            let consumed = limit - remainder.len();

            push_content(events, &flushed);
            self.state.plain_buffer.drain(..consumed);
        }
        self.state.scan_from =
            resume_point(&self.state.plain_buffer, self.start_matcher.max_pattern_len());
    }

    /// Record a block that never saw its end marker. `release` emits it as
    /// content, start marker included.
    fn release_unterminated(
        &self,
        kind: CallKind,
        collected: &str,
        release: bool,
        events: &mut Vec<ParseEvent>,
    ) {
        self.diagnostics.record(Diagnostic::UnterminatedBlock {
            kind,
            collected_bytes: collected.len(),
        });
        if release {
            push_content(events, &format!("{}{collected}", kind.start_marker()));
        }
    }
}

/// Earliest char boundary at which a marker of `marker_len` bytes could still
/// complete once more text is appended to `buffer`.
fn resume_point(buffer: &str, marker_len: usize) -> usize {
    let mut point = buffer.len().saturating_sub(marker_len.saturating_sub(1));
    while !buffer.is_char_boundary(point) {
        point -= 1;
    }
    point
}

fn push_content(events: &mut Vec<ParseEvent>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        events.push(ParseEvent::Content(text.to_string()));
    }
}

/// Builder for configuring a StreamParser
#[derive(Debug)]
pub struct StreamParserBuilder {
    config: StreamConfig,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl StreamParserBuilder {
    pub fn new() -> Self {
        Self {
            config: StreamConfig::default(),
            diagnostics: Arc::new(TracingSink),
        }
    }

    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn malformed_block_policy(mut self, policy: MalformedBlockPolicy) -> Self {
        self.config.malformed_block_policy = policy;
        self
    }

    pub fn flush_on_finish(mut self, flush: bool) -> Self {
        self.config.flush_on_finish = flush;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn build(self) -> anyhow::Result<StreamParser> {
        // Pattern indices follow CallKind::ALL.
        let start_matcher =
            MarkerMatcher::new(CallKind::ALL.iter().map(|kind| kind.start_marker()).collect())?;

        Ok(StreamParser {
            config: self.config,
            diagnostics: self.diagnostics,
            start_matcher,
            state: StreamState::default(),
        })
    }
}

impl Default for StreamParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy iterator of events over an iterator of fragments.
#[derive(Debug)]
pub struct ParseEvents<I> {
    parser: StreamParser,
    fragments: I,
    pending: VecDeque<ParseEvent>,
    finished: bool,
}

impl<I> Iterator for ParseEvents<I>
where
    I: Iterator,
    I::Item: Fragment,
{
    type Item = ParseEvent;

    fn next(&mut self) -> Option<ParseEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.finished {
                return None;
            }
            match self.fragments.next() {
                Some(fragment) => {
                    if let Some(text) = fragment.text() {
                        self.pending.extend(self.parser.process(text));
                    }
                }
                None => {
                    self.finished = true;
                    self.pending.extend(self.parser.finish());
                }
            }
        }
    }
}

/// Parse an async stream of fragments with the default configuration.
pub fn parse_stream<S>(fragments: S) -> anyhow::Result<impl Stream<Item = ParseEvent> + Send>
where
    S: Stream + Send + 'static,
    S::Item: Fragment + Send,
{
    Ok(StreamParser::new()?.apply(fragments))
}

/// Parse an iterator of fragments with the default configuration.
pub fn parse_fragments<I>(fragments: I) -> anyhow::Result<ParseEvents<I::IntoIter>>
where
    I: IntoIterator,
    I::Item: Fragment,
{
    Ok(StreamParser::new()?.into_events(fragments))
}
