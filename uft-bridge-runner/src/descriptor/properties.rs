// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::helpers::ENGINE_LINE_TERMINATOR;
use indexmap::IndexMap;
use std::borrow::Cow;

/// The property mapping written to a run descriptor, in insertion order.
pub type PropertyMap = IndexMap<String, String>;

const RESERVED: &[char] = &['\\', '=', ':', '"', '\r', '\n'];

/// Escapes a property value so that it survives the `key=value` line format.
///
/// Backslashes, key/value separators (`=` and `:`), double quotes and line terminators are
/// backslash-escaped. [`unescape_property_value`] is the exact inverse.
pub fn escape_property_value(value: &str) -> Cow<'_, str> {
    if !value.contains(RESERVED) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '=' => out.push_str("\\="),
            ':' => out.push_str("\\:"),
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Reverses [`escape_property_value`].
///
/// Unknown escape sequences resolve to the escaped character, and a trailing lone backslash is
/// kept as is.
pub fn unescape_property_value(value: &str) -> Cow<'_, str> {
    if !value.contains('\\') {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

/// Serializes `properties` as `key=value` lines joined by the engine line terminator.
///
/// Keys are written as is; values are escaped.
pub fn serialize_properties(properties: &PropertyMap) -> String {
    let mut out = String::new();
    for (index, (key, value)) in properties.iter().enumerate() {
        if index > 0 {
            out.push_str(ENGINE_LINE_TERMINATOR);
        }
        out.push_str(key);
        out.push('=');
        out.push_str(&escape_property_value(value));
    }
    out
}

/// Parses `key=value` lines produced by [`serialize_properties`].
///
/// Blank lines, and lines without a separator, are skipped. If a key repeats, the last value
/// wins.
pub fn parse_properties(text: &str) -> PropertyMap {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_owned(), unescape_property_value(value).into_owned()))
        .collect()
}
