// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Multi-pattern marker detection with partial suffix matching.
//!
//! Streaming text can end in the middle of a marker (`"see <mfcs_to"`). The
//! matcher reports complete markers and also the position of a trailing
//! partial one, so callers know which prefix is safe to release.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// Result of scanning a buffer. Positions are byte offsets into that buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Leftmost complete marker.
    Complete {
        /// Index of the matched pattern, in registration order.
        pattern: usize,
        start: usize,
        end: usize,
    },
    /// The buffer ends with a proper prefix of some marker starting at `start`.
    Partial { start: usize },
    /// No complete or partial marker.
    None,
}

#[derive(Debug, Clone)]
pub struct MarkerMatcher {
    patterns: Vec<&'static str>,
    complete_matcher: AhoCorasick,
    max_pattern_len: usize,
}

impl MarkerMatcher {
    pub fn new(patterns: Vec<&'static str>) -> anyhow::Result<Self> {
        if patterns.is_empty() || patterns.iter().any(|p| p.is_empty()) {
            anyhow::bail!("MarkerMatcher requires at least one non-empty pattern");
        }

        let complete_matcher = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostFirst)
            .build(&patterns)?;
        let max_pattern_len = patterns.iter().map(|p| p.len()).max().unwrap_or(0);

        Ok(Self {
            patterns,
            complete_matcher,
            max_pattern_len,
        })
    }

    pub fn patterns(&self) -> &[&'static str] {
        &self.patterns
    }

    pub fn max_pattern_len(&self) -> usize {
        self.max_pattern_len
    }

    pub fn find(&self, text: &str) -> MatchResult {
        if let Some(mat) = self.complete_matcher.find(text) {
            return MatchResult::Complete {
                pattern: mat.pattern().as_usize(),
                start: mat.start(),
                end: mat.end(),
            };
        }

        match self.find_partial_suffix(text) {
            Some(start) => MatchResult::Partial { start },
            None => MatchResult::None,
        }
    }

    /// Earliest char boundary whose suffix is a proper prefix of a pattern.
    /// Only the last `max_pattern_len - 1` bytes can hold one.
    fn find_partial_suffix(&self, text: &str) -> Option<usize> {
        let mut window = text.len().saturating_sub(self.max_pattern_len.saturating_sub(1));
        while !text.is_char_boundary(window) {
            window -= 1;
        }
        text[window..]
            .char_indices()
            .map(|(i, _)| window + i)
            .find(|&i| {
                let suffix = &text[i..];
                self.patterns
                    .iter()
                    .any(|p| p.len() > suffix.len() && p.starts_with(suffix))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mfcs_matcher() -> MarkerMatcher {
        MarkerMatcher::new(vec!["<mfcs_tool>", "<mfcs_memory>"]).unwrap()
    }

    #[test]
    fn test_complete_match() {
        let matcher = mfcs_matcher();
        assert_eq!(
            matcher.find("text before <mfcs_tool> after"),
            MatchResult::Complete {
                pattern: 0,
                start: 12,
                end: 23
            }
        );
    }

    #[test]
    fn test_leftmost_marker_wins() {
        let matcher = mfcs_matcher();
        let text = "a <mfcs_memory> b <mfcs_tool>";
        match matcher.find(text) {
            MatchResult::Complete { pattern, start, .. } => {
                assert_eq!(matcher.patterns()[pattern], "<mfcs_memory>");
                assert_eq!(start, 2);
            }
            other => panic!("Expected complete match, got: {other:?}"),
        }
    }

    #[test]
    fn test_partial_match_suffix() {
        let matcher = mfcs_matcher();
        assert_eq!(
            matcher.find("see <mfcs_to"),
            MatchResult::Partial { start: 4 }
        );
        // Shared prefix of both markers.
        assert_eq!(matcher.find("x <mfcs_"), MatchResult::Partial { start: 2 });
        assert_eq!(matcher.find("<"), MatchResult::Partial { start: 0 });
    }

    #[test]
    fn test_no_false_positive() {
        let matcher = mfcs_matcher();
        assert_eq!(matcher.find("n < 5"), MatchResult::None);
        assert_eq!(matcher.find("<mfcs_toolbox"), MatchResult::None);
        assert_eq!(matcher.find(""), MatchResult::None);
    }

    #[test]
    fn test_earliest_valid_partial_match() {
        let matcher = mfcs_matcher();
        // "<m" early in the text is not a prefix once followed by other text.
        assert_eq!(
            matcher.find("<m and then <mfcs_mem"),
            MatchResult::Partial { start: 12 }
        );
    }

    #[test]
    fn test_unicode_content() {
        let matcher = mfcs_matcher();
        let text = "中文字符 and <mfcs";
        assert_eq!(
            matcher.find(text),
            MatchResult::Partial {
                start: text.find('<').unwrap()
            }
        );
        assert_eq!(matcher.find("全角＜mfcs_tool＞"), MatchResult::None);
    }

    #[test]
    fn test_empty_patterns() {
        assert!(MarkerMatcher::new(vec![]).is_err());
        assert!(MarkerMatcher::new(vec![""]).is_err());
    }
}
