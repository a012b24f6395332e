// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8Path;
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, Event},
};
use std::io;

static TESTS_TAG: &str = "Tests";
static TEST_TAG: &str = "Test";

/// One entry in the auxiliary test list document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TestListEntry<'a> {
    /// The run identifier of the test.
    pub run_id: &'a str,

    /// The name of the test.
    pub name: &'a str,

    /// The on-disk path of the pre-built test.
    pub path: &'a Utf8Path,
}

/// Serializes the test list document for `entries` into `writer`.
///
/// The document has a `Tests` root with one empty `Test` element per entry, carrying `runid`,
/// `name` and `path` attributes.
pub fn serialize_test_list(
    entries: &[TestListEntry<'_>],
    writer: impl io::Write,
) -> quick_xml::Result<()> {
    let mut writer = Writer::new_with_indent(writer, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(TESTS_TAG)))?;

    for entry in entries {
        let TestListEntry { run_id, name, path } = entry;
        let mut tag = BytesStart::new(TEST_TAG);
        tag.push_attribute(("runid", *run_id));
        tag.push_attribute(("name", *name));
        tag.push_attribute(("path", path.as_str()));
        writer.write_event(Event::Empty(tag))?;
    }

    writer.write_event(Event::End(BytesEnd::new(TESTS_TAG)))?;

    // Add a trailing newline.
    writer.write_indent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn attributes_are_escaped() {
        let entries = [
            TestListEntry {
                run_id: "1001",
                name: "Login",
                path: Utf8Path::new("C:/tests/Login"),
            },
            TestListEntry {
                run_id: "1002",
                name: "Search & \"Filter\"",
                path: Utf8Path::new("C:/tests/<Search>"),
            },
        ];

        let mut buf = Vec::new();
        serialize_test_list(&entries, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            indoc! {r#"
                <?xml version="1.0" encoding="UTF-8"?>
                <Tests>
                  <Test runid="1001" name="Login" path="C:/tests/Login"/>
                  <Test runid="1002" name="Search &amp; &quot;Filter&quot;" path="C:/tests/&lt;Search&gt;"/>
                </Tests>
            "#}
        );
    }

    #[test]
    fn empty_list_has_root() {
        let mut buf = Vec::new();
        serialize_test_list(&[], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("<Tests>"), "root element present: {text}");
        assert!(text.contains("</Tests>"), "root element closed: {text}");
    }
}
