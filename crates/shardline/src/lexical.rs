//! Token-safe scanning of raw SQL text.
//!
//! The rewriter and the list-parameter expansion edit the original text
//! rather than re-printing the AST. This module splits the text into
//! code, string literals and comments so edits never land inside a
//! literal or a plain comment.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    /// SQL outside literals and comments. Quoted identifiers count as code.
    Code,
    /// A `'...'` string literal.
    Literal,
    /// A `--` or `/* */` comment.
    Comment,
    /// An optimizer hint, `/*+ ... */`.
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub kind: SegmentKind,
    pub range: Range<usize>,
}

/// Splits `sql` into consecutive segments covering the whole text.
/// Unterminated literals and comments run to the end of the text.
pub(crate) fn segments(sql: &str) -> Vec<Segment> {
    let bytes = sql.as_bytes();
    let mut out: Vec<Segment> = Vec::new();
    let mut push = |kind: SegmentKind, range: Range<usize>| {
        if range.is_empty() {
            return;
        }
        match out.last_mut() {
            Some(last) if last.kind == kind && kind == SegmentKind::Code => {
                last.range.end = range.end;
            }
            _ => out.push(Segment { kind, range }),
        }
    };

    let mut pos = 0;
    let mut code_start = 0;
    while pos < bytes.len() {
        let (kind, end) = match bytes[pos] {
            b'\'' => (SegmentKind::Literal, literal_end(bytes, pos)),
            b'-' if bytes.get(pos + 1) == Some(&b'-') => (
                SegmentKind::Comment,
                bytes[pos..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |offset| pos + offset),
            ),
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                let kind = if bytes.get(pos + 2) == Some(&b'+') {
                    SegmentKind::Hint
                } else {
                    SegmentKind::Comment
                };
                let end = sql[pos + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |offset| pos + 2 + offset + 2);
                (kind, end)
            }
            _ => {
                pos += 1;
                continue;
            }
        };
        push(SegmentKind::Code, code_start..pos);
        push(kind, pos..end);
        pos = end;
        code_start = end;
    }
    push(SegmentKind::Code, code_start..bytes.len());
    out
}

/// End (exclusive) of the literal opening at `start`. Handles doubled
/// quotes and backslash escapes.
fn literal_end(bytes: &[u8], start: usize) -> usize {
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'\'' if bytes.get(pos + 1) == Some(&b'\'') => pos += 2,
            b'\'' => return pos + 1,
            _ => pos += 1,
        }
    }
    bytes.len()
}

pub(crate) const fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || !c.is_ascii()
}

/// Replaces whole identifier words, case-insensitively, in code and hint
/// segments. Each word is looked up once, so a substituted name is never
/// matched again. A word after a `.` is a column of some qualifier and is
/// left alone unless it is itself followed by `.`.
pub(crate) fn replace_words(sql: &str, replacements: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(sql.len() + replacements.len() * 4);
    for segment in segments(sql) {
        let text = &sql[segment.range.clone()];
        match segment.kind {
            SegmentKind::Code | SegmentKind::Hint => replace_in(text, replacements, &mut out),
            SegmentKind::Literal | SegmentKind::Comment => out.push_str(text),
        }
    }
    out
}

fn replace_in(text: &str, replacements: &[(&str, &str)], out: &mut String) {
    let mut word_start: Option<usize> = None;
    let flush = |start: usize, end: usize, out: &mut String| {
        let word = &text[start..end];
        let after_dot = text[..start].ends_with('.');
        let before_dot = text[end..].starts_with('.');
        let replacement = if after_dot && !before_dot {
            None
        } else {
            replacements
                .iter()
                .find(|(from, _)| from.eq_ignore_ascii_case(word))
        };
        out.push_str(replacement.map_or(word, |(_, to)| *to));
    };
    for (i, c) in text.char_indices() {
        if is_identifier_char(c) {
            word_start.get_or_insert(i);
            continue;
        }
        if let Some(start) = word_start.take() {
            flush(start, i, out);
        }
        out.push(c);
    }
    if let Some(start) = word_start {
        flush(start, text.len(), out);
    }
}
