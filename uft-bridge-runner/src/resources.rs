// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of the resources a test depends on.
//!
//! Each test folder holds a descriptor document listing the function libraries and recovery
//! scenarios the engine must load before the test runs. [`ResourceResolver`] reads that document
//! into a [`ResourceSet`].

use crate::{config::TestLayout, errors::DescriptorParseError, helpers::DisplayErrorChain};
use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::{Reader, events::Event};
use std::io;
use tracing::{debug, error};

static FUNC_LIB_TAG: &[u8] = b"FuncLib";
static RECOVERY_SCENARIOS_TAG: &[u8] = b"RecoveryScenarios";

/// The resources discovered for one test path.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResourceSet {
    /// Function libraries, in document order, joined with the test path.
    pub function_libraries: Vec<Utf8PathBuf>,

    /// Recovery scenarios, in document order.
    pub recovery_scenarios: Vec<RecoveryScenario>,
}

impl ResourceSet {
    /// Returns true if no resources were found.
    pub fn is_empty(&self) -> bool {
        self.function_libraries.is_empty() && self.recovery_scenarios.is_empty()
    }
}

/// A recovery scenario referenced by a test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecoveryScenario {
    /// The scenario file, joined with the test path.
    pub path: Utf8PathBuf,

    /// The name of the scenario within the file.
    pub name: String,
}

/// One `*`-delimited candidate from a recovery scenario list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScenarioEntry<'a> {
    /// A candidate with at least a path and a name.
    Valid {
        /// The scenario file, relative to the test folder.
        sub_path: &'a str,

        /// The name of the scenario.
        name: &'a str,
    },

    /// A candidate with fewer than two `|`-delimited fields.
    Malformed(&'a str),
}

/// Parses the text of a `RecoveryScenarios` element.
///
/// The text is a list of entries separated by `*`; each entry is a list of fields separated by
/// `|`, of which the first is a path and the second a name. Any further fields are ignored.
pub fn parse_recovery_scenarios(text: &str) -> impl Iterator<Item = ScenarioEntry<'_>> {
    text.split('*').map(|candidate| {
        let candidate = candidate.trim();
        let mut fields = candidate.split('|');
        match (fields.next(), fields.next()) {
            (Some(sub_path), Some(name)) => ScenarioEntry::Valid { sub_path, name },
            _ => ScenarioEntry::Malformed(candidate),
        }
    })
}

/// Reads test descriptor documents into [`ResourceSet`]s.
#[derive(Clone, Copy, Debug)]
pub struct ResourceResolver<'a> {
    layout: &'a TestLayout,
}

impl<'a> ResourceResolver<'a> {
    /// Creates a new resolver for tests laid out according to `layout`.
    pub fn new(layout: &'a TestLayout) -> Self {
        Self { layout }
    }

    /// Resolves the resources of the test at `test_path`.
    ///
    /// This never fails: if the descriptor document can't be read or parsed, the error is logged
    /// and an empty resource set is returned, so that one malformed descriptor doesn't stop other
    /// tests from being compiled.
    pub fn resolve(&self, test_path: &Utf8Path) -> ResourceSet {
        match self.try_resolve(test_path) {
            Ok(resources) => resources,
            Err(err) => {
                error!(
                    test_path = %test_path,
                    "ignoring resources for test: {}",
                    DisplayErrorChain(&err),
                );
                ResourceSet::default()
            }
        }
    }

    /// Resolves the resources of the test at `test_path`, returning any error encountered.
    pub fn try_resolve(&self, test_path: &Utf8Path) -> Result<ResourceSet, DescriptorParseError> {
        let path = self.layout.descriptor_path(test_path);
        let contents = std::fs::read_to_string(&path).map_err(|error| {
            if error.kind() == io::ErrorKind::NotFound {
                DescriptorParseError::NoDocument { path: path.clone() }
            } else {
                DescriptorParseError::Read {
                    path: path.clone(),
                    error,
                }
            }
        })?;

        let document = DescriptorDocument::parse(&contents)
            .map_err(|error| DescriptorParseError::Xml {
                path: path.clone(),
                error,
            })?
            .ok_or_else(|| DescriptorParseError::NoDocument { path: path.clone() })?;

        let function_libraries = document
            .func_libs
            .iter()
            .map(|lib| test_path.join(lib))
            .collect();

        let recovery_scenarios = document
            .recovery_scenarios
            .as_deref()
            .map(|text| {
                parse_recovery_scenarios(text)
                    .filter_map(|entry| match entry {
                        ScenarioEntry::Valid { sub_path, name } => Some(RecoveryScenario {
                            path: test_path.join(sub_path),
                            name: name.to_owned(),
                        }),
                        ScenarioEntry::Malformed(candidate) => {
                            debug!(
                                test_path = %test_path,
                                "skipping malformed recovery scenario entry {candidate:?}",
                            );
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ResourceSet {
            function_libraries,
            recovery_scenarios,
        })
    }
}

/// The parts of a descriptor document relevant to resource resolution.
#[derive(Debug, Default)]
struct DescriptorDocument {
    func_libs: Vec<String>,
    // Only the first RecoveryScenarios element counts.
    recovery_scenarios: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CollectingElement {
    FuncLib,
    RecoveryScenarios,
}

impl CollectingElement {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        if tag == FUNC_LIB_TAG {
            Some(Self::FuncLib)
        } else if tag == RECOVERY_SCENARIOS_TAG {
            Some(Self::RecoveryScenarios)
        } else {
            None
        }
    }
}

impl DescriptorDocument {
    /// Parses a document. Returns `None` if the input has no root element.
    fn parse(contents: &str) -> Result<Option<Self>, quick_xml::Error> {
        let mut reader = Reader::from_str(contents);
        reader.trim_text(true);

        let mut document = Self::default();
        let mut saw_root = false;
        let mut collecting: Option<(CollectingElement, String)> = None;

        loop {
            match reader.read_event()? {
                Event::Start(tag) => {
                    saw_root = true;
                    if collecting.is_none() {
                        collecting = CollectingElement::from_tag(tag.local_name().as_ref())
                            .map(|element| (element, String::new()));
                    }
                }
                Event::Empty(_) => {
                    // An empty FuncLib or RecoveryScenarios element carries no reference.
                    saw_root = true;
                }
                Event::Text(text) => {
                    if let Some((_, buf)) = &mut collecting {
                        buf.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some((_, buf)) = &mut collecting {
                        buf.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::End(tag) => {
                    let ended = CollectingElement::from_tag(tag.local_name().as_ref());
                    if let Some((element, text)) =
                        collecting.take_if(|(element, _)| Some(*element) == ended)
                    {
                        document.finish_element(element, text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(saw_root.then_some(document))
    }

    fn finish_element(&mut self, element: CollectingElement, text: String) {
        match element {
            CollectingElement::FuncLib => {
                if !text.is_empty() {
                    self.func_libs.push(text);
                }
            }
            CollectingElement::RecoveryScenarios => {
                if self.recovery_scenarios.is_none() {
                    self.recovery_scenarios = Some(text);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::CapturedEvents;
    use camino_tempfile::{Utf8TempDir, tempdir};
    use camino_tempfile_ext::prelude::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;
    use tracing::Level;

    fn test_with_descriptor(dir: &Utf8TempDir, name: &str, descriptor: &str) -> Utf8PathBuf {
        let test_dir = dir.child(name);
        test_dir.child("Test.xml").write_str(descriptor).unwrap();
        test_dir.as_path().to_owned()
    }

    #[test_case(
        "Recovery.qrs|OnError|1|1*",
        &[
            ScenarioEntry::Valid { sub_path: "Recovery.qrs", name: "OnError" },
            ScenarioEntry::Malformed(""),
        ]
        ; "single entry with trailing separator"
    )]
    #[test_case(
        "a.qrs|First*b.qrs|Second",
        &[
            ScenarioEntry::Valid { sub_path: "a.qrs", name: "First" },
            ScenarioEntry::Valid { sub_path: "b.qrs", name: "Second" },
        ]
        ; "two entries"
    )]
    #[test_case(
        "no-separator*c.qrs|Third",
        &[
            ScenarioEntry::Malformed("no-separator"),
            ScenarioEntry::Valid { sub_path: "c.qrs", name: "Third" },
        ]
        ; "entry without pipe is malformed"
    )]
    #[test_case(
        "d.qrs|",
        &[ScenarioEntry::Valid { sub_path: "d.qrs", name: "" }]
        ; "empty name still has two fields"
    )]
    #[test_case("", &[ScenarioEntry::Malformed("")] ; "empty text")]
    fn recovery_scenario_grammar(text: &str, expected: &[ScenarioEntry<'_>]) {
        assert_eq!(parse_recovery_scenarios(text).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn resolves_libraries_and_scenarios_in_order() {
        let dir = tempdir().unwrap();
        let test_path = test_with_descriptor(
            &dir,
            "GUITest1",
            indoc! {r#"
                <?xml version="1.0" encoding="utf-8"?>
                <Test>
                    <Resources>
                        <FuncLib>..\Libraries\Common.qfl</FuncLib>
                        <FuncLib>Local.vbs</FuncLib>
                        <FuncLib/>
                    </Resources>
                    <RecoveryScenarios>Recovery\Default.qrs|PopupHandler|1|1*broken*Other.qrs|Crash|1|1*</RecoveryScenarios>
                    <RecoveryScenarios>Ignored.qrs|Second|1|1*</RecoveryScenarios>
                </Test>
            "#},
        );

        let layout = TestLayout::default();
        let resources = ResourceResolver::new(&layout).resolve(&test_path);
        assert_eq!(
            resources,
            ResourceSet {
                function_libraries: vec![
                    test_path.join(r"..\Libraries\Common.qfl"),
                    test_path.join("Local.vbs"),
                ],
                recovery_scenarios: vec![
                    RecoveryScenario {
                        path: test_path.join(r"Recovery\Default.qrs"),
                        name: "PopupHandler".to_owned(),
                    },
                    RecoveryScenario {
                        path: test_path.join("Other.qrs"),
                        name: "Crash".to_owned(),
                    },
                ],
            }
        );
    }

    #[test]
    fn escaped_text_is_unescaped() {
        let dir = tempdir().unwrap();
        let test_path = test_with_descriptor(
            &dir,
            "Escaped",
            "<Test><FuncLib>Q&amp;A.qfl</FuncLib><FuncLib><![CDATA[R&D.qfl]]></FuncLib></Test>",
        );

        let layout = TestLayout::default();
        let resources = ResourceResolver::new(&layout).resolve(&test_path);
        assert_eq!(
            resources.function_libraries,
            vec![test_path.join("Q&A.qfl"), test_path.join("R&D.qfl")]
        );
    }

    #[test]
    fn descriptor_without_resources_is_empty() {
        let dir = tempdir().unwrap();
        let test_path = test_with_descriptor(&dir, "Plain", "<Test><Name>Plain</Name></Test>");

        let layout = TestLayout::default();
        assert!(ResourceResolver::new(&layout).resolve(&test_path).is_empty());
    }

    #[test]
    fn malformed_descriptor_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let test_path =
            test_with_descriptor(&dir, "Broken", "<Test><FuncLib>lib.qfl</Resources></Test>");

        let layout = TestLayout::default();
        let resolver = ResourceResolver::new(&layout);
        assert!(matches!(
            resolver.try_resolve(&test_path),
            Err(DescriptorParseError::Xml { .. })
        ));

        let (events, _guard) = CapturedEvents::install();
        assert_eq!(resolver.resolve(&test_path), ResourceSet::default());
        let errors = events.messages_at(Level::ERROR);
        assert_eq!(errors.len(), 1, "one error logged: {errors:?}");
        assert!(errors[0].contains(test_path.as_str()), "error: {}", errors[0]);
    }

    #[test_case("" ; "empty file")]
    #[test_case("<?xml version=\"1.0\"?>\n<!-- nothing here -->" ; "declaration only")]
    fn document_without_root_is_no_document(contents: &str) {
        let dir = tempdir().unwrap();
        let test_path = test_with_descriptor(&dir, "Empty", contents);

        let layout = TestLayout::default();
        assert!(matches!(
            ResourceResolver::new(&layout).try_resolve(&test_path),
            Err(DescriptorParseError::NoDocument { .. })
        ));
    }

    #[test]
    fn missing_descriptor_is_no_document() {
        let dir = tempdir().unwrap();
        let layout = TestLayout::default();
        let resolver = ResourceResolver::new(&layout);
        let test_path = dir.path().join("Missing");

        assert!(matches!(
            resolver.try_resolve(&test_path),
            Err(DescriptorParseError::NoDocument { .. })
        ));
        assert!(resolver.resolve(&test_path).is_empty());
    }
}
