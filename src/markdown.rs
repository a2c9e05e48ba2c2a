// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Section-aware editing of markdown notes
//!
//! A section starts at its heading line and runs until the next heading of
//! the same or a higher level (or the end of the document). Headings inside
//! code blocks are not headings; pulldown-cmark takes care of that.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::ops::Range;

/// A heading found in a document
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    /// Byte offset of the start of the heading's first line
    pub line_start: usize,
}

/// Level used for non-heading section markers: any heading ends them
const PLAIN_MARKER_LEVEL: usize = 7;

/// Level and rendered text of a section marker.
///
/// The marker goes through the same parser as the documents it is looked up
/// in, so emphasis, entities and closing `#`s render the same on both sides.
/// A marker that is not a heading gives `(None, trimmed text)`.
pub fn parse_heading(marker: &str) -> (Option<usize>, String) {
    let trimmed = marker.trim();
    match headings(trimmed).into_iter().next() {
        Some(heading) if heading.line_start == 0 => (Some(heading.level), heading.text),
        _ => (None, trimmed.to_string()),
    }
}

/// All headings in `content`, in document order
pub fn headings(content: &str) -> Vec<Heading> {
    let mut found = Vec::new();
    let mut current: Option<Heading> = None;

    for (event, range) in Parser::new(content).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some(Heading {
                    level: level as usize,
                    text: String::new(),
                    line_start: line_start(content, range.start),
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut heading) = current.take() {
                    heading.text = heading.text.trim().to_string();
                    found.push(heading);
                }
            }
            _ => {}
        }
    }
    found
}

/// Byte range of the section introduced by `marker`, heading line included
pub fn find_section(content: &str, marker: &str) -> Option<Range<usize>> {
    let (level, text) = parse_heading(marker);
    let all = headings(content);

    let (start, level) = match level {
        Some(level) => {
            let heading = all.iter().find(|h| h.level == level && h.text == text)?;
            (heading.line_start, level)
        }
        None => {
            // Plain-text marker: an exact line that is not itself a heading
            let start = line_offsets(content)
                .find(|(_, line)| line.trim() == text)
                .map(|(offset, _)| offset)?;
            (start, PLAIN_MARKER_LEVEL)
        }
    };

    let after_marker = line_end(content, start);
    let end = all
        .iter()
        .find(|h| h.line_start >= after_marker && h.level <= level)
        .map(|h| h.line_start)
        .unwrap_or(content.len());

    Some(start..end)
}

/// Whether the section introduced by `marker` contains `needle`
pub fn section_contains(content: &str, marker: &str, needle: &str) -> bool {
    find_section(content, marker)
        .map(|range| content[range].contains(needle))
        .unwrap_or(false)
}

/// Whether `needle` occurs anywhere outside the section introduced by `marker`
pub fn contains_outside_section(content: &str, marker: &str, needle: &str) -> bool {
    match find_section(content, marker) {
        Some(range) => content[..range.start].contains(needle) || content[range.end..].contains(needle),
        None => content.contains(needle),
    }
}

/// Append `line` as the last line of the section introduced by `marker`.
/// A missing section is created at the end of the document.
pub fn append_to_section(content: &str, marker: &str, line: &str) -> String {
    match find_section(content, marker) {
        Some(range) => insert_after_last_text(content, range, line),
        None => {
            let newline = newline_style(content);
            let mut out = content.to_string();
            if !out.trim().is_empty() {
                ensure_trailing_newline(&mut out, newline);
                if !out.ends_with(&newline.repeat(2)) {
                    out.push_str(newline);
                }
            } else {
                out.clear();
            }
            out.push_str(marker.trim());
            out.push_str(newline);
            out.push_str(line);
            out.push_str(newline);
            out
        }
    }
}

/// Add `line` at the end of the body that precedes the section introduced by
/// `marker` (or at the end of the document when there is no such section).
pub fn append_before_section(content: &str, marker: &str, line: &str) -> String {
    match find_section(content, marker) {
        Some(range) if content[..range.start].trim().is_empty() => {
            let newline = newline_style(content);
            let mut out = String::with_capacity(content.len() + line.len() + 4);
            out.push_str(line);
            out.push_str(newline);
            out.push_str(newline);
            out.push_str(&content[range.start..]);
            out
        }
        Some(range) => insert_after_last_text(content, 0..range.start, line),
        None => {
            let newline = newline_style(content);
            let mut out = content.to_string();
            if out.trim().is_empty() {
                out.clear();
            } else {
                ensure_trailing_newline(&mut out, newline);
            }
            out.push_str(line);
            out.push_str(newline);
            out
        }
    }
}

/// Insert `line` right after the last non-blank line inside `region`,
/// past that line's terminator
fn insert_after_last_text(content: &str, region: Range<usize>, line: &str) -> String {
    let newline = newline_style(content);
    let mut insert_at = region.start;
    for (offset, raw) in line_offsets(&content[region.clone()]) {
        if !raw.trim().is_empty() {
            insert_at = region.start + offset + raw.len();
        }
    }

    let mut out = String::with_capacity(content.len() + line.len() + 2);
    out.push_str(&content[..insert_at]);
    ensure_trailing_newline(&mut out, newline);
    out.push_str(line);
    out.push_str(newline);
    out.push_str(&content[insert_at..]);
    out
}

/// `(offset, line)` pairs; each line keeps its terminator
fn line_offsets(content: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    content.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        (start, raw)
    })
}

/// `\r\n` when the document already uses it, `\n` otherwise
fn newline_style(content: &str) -> &'static str {
    if content.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

fn line_start(content: &str, pos: usize) -> usize {
    content[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_end(content: &str, pos: usize) -> usize {
    content[pos..].find('\n').map(|i| pos + i + 1).unwrap_or(content.len())
}

fn ensure_trailing_newline(text: &mut String, newline: &str) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push_str(newline);
    }
}
