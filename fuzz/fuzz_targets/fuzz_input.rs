// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use file_sorter::markdown;

#[derive(Arbitrary, Debug)]
struct Input {
    content: String,
    marker: String,
    line: String,
}

fuzz_target!(|input: Input| {
    let _ = markdown::headings(&input.content);
    let _ = markdown::find_section(&input.content, &input.marker);

    let with_entry = markdown::append_to_section(&input.content, &input.marker, &input.line);
    let _ = markdown::section_contains(&with_entry, &input.marker, &input.line);

    let with_link = markdown::append_before_section(&input.content, &input.marker, &input.line);
    let _ = markdown::contains_outside_section(&with_link, &input.marker, &input.line);
});
