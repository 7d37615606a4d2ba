// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

/// A unit of streamed model output carrying zero or more characters of text.
///
/// Fragments whose [`Fragment::text`] is `None` (role-only deltas, usage
/// chunks, keep-alives) are skipped by the streaming parser.
pub trait Fragment {
    fn text(&self) -> Option<&str>;
}

impl Fragment for str {
    fn text(&self) -> Option<&str> {
        Some(self)
    }
}

impl Fragment for String {
    fn text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<T: Fragment + ?Sized> Fragment for &T {
    fn text(&self) -> Option<&str> {
        (**self).text()
    }
}

impl<T: Fragment + ?Sized> Fragment for Box<T> {
    fn text(&self) -> Option<&str> {
        (**self).text()
    }
}

impl<T: Fragment> Fragment for Option<T> {
    fn text(&self) -> Option<&str> {
        self.as_ref().and_then(Fragment::text)
    }
}
