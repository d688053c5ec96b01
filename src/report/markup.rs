// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Formatting commands for the report content buffer.
//!
//! Selections are character ranges, as reported by the text editor.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Bold,
    Italic,
    List,
}

impl Format {
    fn tags(self) -> (&'static str, &'static str) {
        match self {
            Format::Bold => ("<strong>", "</strong>"),
            Format::Italic => ("<em>", "</em>"),
            Format::List => ("<ul><li>", "</li></ul>"),
        }
    }
}

/// Wrap the selected characters of `text` in the tags of `format`.
///
/// Without a selection the empty tag pair is appended. Returns the character
/// range of the wrapped text inside the new tags.
pub fn apply(text: &mut String, selection: Option<Range<usize>>, format: Format) -> Range<usize> {
    let length = text.chars().count();
    let (start, end) = match selection {
        Some(range) => {
            let a = range.start.min(length);
            let b = range.end.min(length);
            (a.min(b), a.max(b))
        }
        None => (length, length),
    };
    let (open, close) = format.tags();

    text.insert_str(byte_offset(text, end), close);
    text.insert_str(byte_offset(text, start), open);

    let shift = open.chars().count();
    start + shift..end + shift
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}
