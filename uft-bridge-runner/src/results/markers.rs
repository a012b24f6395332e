// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Marks the start of a test description in captured output.
pub const DESCRIPTION_START: &str = "__octane_description_start__";

/// Marks the end of a test description in captured output.
pub const DESCRIPTION_END: &str = "__octane_description_end__";

/// Marks the start of an external URL in captured output.
pub const EXTERNAL_URL_START: &str = "__octane_external_url_start__";

/// Marks the end of an external URL in captured output.
pub const EXTERNAL_URL_END: &str = "__octane_external_url_end__";

/// Returns the trimmed text between the first `start` marker in `text` and the `end` marker
/// following it.
///
/// Returns an empty string if either marker is missing. A start marker at the very beginning of
/// `text` is not recognized.
pub fn extract_marker<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let value_start = match text.find(start) {
        Some(index) if index > 0 => index + start.len(),
        _ => return "",
    };
    match text[value_start..].find(end) {
        Some(len) => text[value_start..value_start + len].trim(),
        None => "",
    }
}

/// Returns the description embedded in captured output, or an empty string.
pub fn extract_description(stdout: &str) -> &str {
    extract_marker(stdout, DESCRIPTION_START, DESCRIPTION_END)
}

/// Returns the external URL embedded in captured output, or an empty string.
pub fn extract_external_url(stdout: &str) -> &str {
    extract_marker(stdout, EXTERNAL_URL_START, EXTERNAL_URL_END)
}
