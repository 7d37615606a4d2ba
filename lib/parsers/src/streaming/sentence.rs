// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

/// Characters that end a sentence, ASCII and full-width.
pub const SENTENCE_TERMINATORS: [char; 6] = ['.', '?', '!', '。', '？', '！'];

/// Split `buffer` after its last sentence terminator.
///
/// Returns `(flushed, remainder)`. `flushed` is everything up to and including
/// the right-most terminator, trimmed; `remainder` is the untouched rest. A
/// terminator at the very start of the buffer does not count, and without one
/// nothing is flushed.
pub fn flush_sentences(buffer: &str) -> (&str, &str) {
    flush_sentences_from(buffer, 0)
}

/// [`flush_sentences`] for a buffer whose first `from` bytes are already known
/// to hold no terminator. Only `buffer[from..]` is searched; `from` must be a
/// char boundary.
pub fn flush_sentences_from(buffer: &str, from: usize) -> (&str, &str) {
    match buffer[from..]
        .char_indices()
        .rev()
        .find(|(_, ch)| SENTENCE_TERMINATORS.contains(ch))
        .map(|(idx, ch)| (from + idx, ch))
    {
        Some((idx, ch)) if idx > 0 => {
            let end = idx + ch.len_utf8();
            (buffer[..end].trim(), &buffer[end..])
        }
        _ => ("", buffer),
    }
}
