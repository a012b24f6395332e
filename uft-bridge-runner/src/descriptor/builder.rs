// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{PropertyMap, TestListEntry, serialize_properties, serialize_test_list};
use crate::{
    config::{InvocationMode, RunSettings, TestLayout},
    definition::TestDefinition,
    errors::DescriptorBuildError,
    helpers::plural,
    script::ScriptCompiler,
};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::NamedUtf8TempFile;
use std::io::Write;
use tracing::{debug, warn};

/// The compiled output of one pipeline invocation, as written to disk.
#[derive(Clone, Debug)]
pub struct RunDescriptor {
    properties: PropertyMap,
    path: Utf8PathBuf,
    results_path: Utf8PathBuf,
    test_list_path: Option<Utf8PathBuf>,
}

impl RunDescriptor {
    /// Returns the properties written to the descriptor file.
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Returns the path the descriptor file was written to.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the path the engine is told to write its results to.
    pub fn results_path(&self) -> &Utf8Path {
        &self.results_path
    }

    /// Returns the path of the auxiliary test list document, if one was written.
    pub fn test_list_path(&self) -> Option<&Utf8Path> {
        self.test_list_path.as_deref()
    }
}

/// Assembles and writes [`RunDescriptor`]s.
#[derive(Clone, Copy, Debug)]
pub struct DescriptorFileBuilder<'a> {
    settings: &'a RunSettings,
    compiler: ScriptCompiler<'a>,
}

impl<'a> DescriptorFileBuilder<'a> {
    /// Creates a new builder for a run with the given settings.
    pub fn new(settings: &'a RunSettings, layout: &'a TestLayout) -> Self {
        Self {
            settings,
            compiler: ScriptCompiler::new(layout),
        }
    }

    /// Builds the run descriptor for `definitions` and writes it to the results directory.
    ///
    /// Returns `Ok(None)` without touching the filesystem if `definitions` is empty. Otherwise,
    /// everything is compiled before the results directory is checked for write access, and
    /// nothing is written if either step fails.
    pub fn build(
        &self,
        definitions: &[TestDefinition],
    ) -> Result<Option<RunDescriptor>, DescriptorBuildError> {
        if definitions.is_empty() {
            debug!("no test definitions, skipping run descriptor");
            return Ok(None);
        }

        let settings = self.settings;
        let path = settings.descriptor_path();
        let results_path = settings.results_path();

        let test_list = match settings.mode {
            InvocationMode::Script => None,
            InvocationMode::TestList => {
                let test_list_path = settings.test_list_path();
                let contents = test_list_contents(definitions, &test_list_path)?;
                Some((test_list_path, contents))
            }
        };

        let mut properties = PropertyMap::new();
        properties.insert("runType".to_owned(), settings.run_type.clone());
        properties.insert("resultsFilename".to_owned(), results_path.to_string());
        properties.insert("parentFolder".to_owned(), settings.results_dir.to_string());
        properties.insert("repoFolder".to_owned(), settings.repo_folder.to_string());
        if let Some(lab) = &settings.digital_lab {
            properties.insert("mobileHostAddress".to_owned(), lab.host_address.clone());
            properties.insert("mobileExecToken".to_owned(), lab.exec_token.clone());
        }
        if let Some((test_list_path, _)) = &test_list {
            properties.insert("testsListFile".to_owned(), test_list_path.to_string());
        }

        // Each group is keyed by its index, so groups could be built in any order.
        for (index, definition) in definitions.iter().enumerate() {
            properties.extend(self.definition_properties(index + 1, definition)?);
        }

        ensure_writable(&settings.results_dir)?;

        if let Some((test_list_path, contents)) = &test_list {
            write_new_file(test_list_path, contents)?;
        }
        if let Err(error) = write_new_file(&path, serialize_properties(&properties).as_bytes()) {
            // The descriptor is the only reference to the test list.
            if let Some((test_list_path, _)) = &test_list {
                remove_orphan(test_list_path);
            }
            return Err(error);
        }

        debug!(
            descriptor = %path,
            "wrote run descriptor for {} {} ({} mode)",
            definitions.len(),
            plural::tests_str(definitions.len()),
            settings.mode,
        );

        Ok(Some(RunDescriptor {
            properties,
            path,
            results_path,
            test_list_path: test_list.map(|(test_list_path, _)| test_list_path),
        }))
    }

    fn definition_properties(
        &self,
        index: usize,
        definition: &TestDefinition,
    ) -> Result<Vec<(String, String)>, DescriptorBuildError> {
        let mut group = Vec::with_capacity(6);
        group.push((format!("test{index}"), definition.name.clone()));
        group.push((format!("package{index}"), format!("_{index}")));
        if self.settings.mode == InvocationMode::Script {
            let script = self.compiler.compile(&definition.units).map_err(|error| {
                DescriptorBuildError::Compile {
                    test_name: definition.name.clone(),
                    error,
                }
            })?;
            group.push((format!("script{index}"), script));
        }
        group.push((format!("unitIds{index}"), definition.unit_ids.join(";")));
        group.push((
            format!("underlyingTests{index}"),
            definition.underlying_tests.join(";"),
        ));
        group.push((
            format!("datableParams{index}"),
            definition.datable_params.clone(),
        ));
        Ok(group)
    }
}

fn test_list_contents(
    definitions: &[TestDefinition],
    test_list_path: &Utf8Path,
) -> Result<Vec<u8>, DescriptorBuildError> {
    let entries = definitions
        .iter()
        .map(|definition| {
            let path = definition.test_path().ok_or_else(|| {
                DescriptorBuildError::EmptyTestDefinition {
                    test_name: definition.name.clone(),
                }
            })?;
            Ok(TestListEntry {
                run_id: &definition.run_id,
                name: &definition.name,
                path,
            })
        })
        .collect::<Result<Vec<_>, DescriptorBuildError>>()?;

    let mut contents = Vec::new();
    serialize_test_list(&entries, &mut contents).map_err(|error| {
        DescriptorBuildError::TestListSerialize {
            path: test_list_path.to_owned(),
            error,
        }
    })?;
    Ok(contents)
}

/// Creates `dir` if necessary, then checks that files can be created in it.
fn ensure_writable(dir: &Utf8Path) -> Result<(), DescriptorBuildError> {
    let not_writable = |error| DescriptorBuildError::DirectoryNotWritable {
        dir: dir.to_owned(),
        error,
    };
    std::fs::create_dir_all(dir).map_err(not_writable)?;
    // The probe file is removed on drop.
    NamedUtf8TempFile::new_in(dir).map_err(not_writable)?;
    Ok(())
}

fn write_new_file(path: &Utf8Path, contents: &[u8]) -> Result<(), DescriptorBuildError> {
    AtomicFile::new(path, OverwriteBehavior::DisallowOverwrite)
        .write(|file| file.write_all(contents))
        .map_err(|error| DescriptorBuildError::Write {
            path: path.to_owned(),
            error,
        })
}

fn remove_orphan(path: &Utf8Path) {
    if let Err(error) = std::fs::remove_file(path) {
        warn!("failed to remove {path} after descriptor write failed: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{DigitalLabParams, RunStamp},
        definition::TestUnit,
        descriptor::parse_properties,
        errors::ScriptCompileError,
    };
    use camino_tempfile::{Utf8TempDir, tempdir};
    use camino_tempfile_ext::prelude::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn settings(dir: &Utf8TempDir, mode: InvocationMode) -> RunSettings {
        RunSettings {
            run_type: "FileSystem".to_owned(),
            mode,
            results_dir: dir.path().join("results"),
            repo_folder: dir.path().to_owned(),
            digital_lab: None,
            stamp: RunStamp::from_time(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()),
        }
    }

    fn make_test(dir: &Utf8TempDir, name: &str) -> Utf8PathBuf {
        let child = dir.child("tests").child(name);
        child
            .child("Test.xml")
            .write_str("<Test><FuncLib>lib.qfl</FuncLib></Test>")
            .unwrap();
        child.as_path().to_owned()
    }

    fn definition(name: &str, test_path: &Utf8Path, run_id: &str) -> TestDefinition {
        TestDefinition {
            name: name.to_owned(),
            units: vec![TestUnit::new(test_path, format!("{name}-u1"), "Run")],
            underlying_tests: vec!["ut:1".to_owned(), "ut:2".to_owned()],
            unit_ids: vec!["10".to_owned(), "11".to_owned()],
            datable_params: "iter=1\nrow=2".to_owned(),
            run_id: run_id.to_owned(),
        }
    }

    #[test]
    fn zero_definitions_write_nothing() {
        let dir = tempdir().unwrap();
        let settings = settings(&dir, InvocationMode::Script);
        let layout = TestLayout::default();

        let descriptor = DescriptorFileBuilder::new(&settings, &layout)
            .build(&[])
            .unwrap();
        assert!(descriptor.is_none());
        assert!(!settings.results_dir.exists(), "results dir not created");
    }

    #[test]
    fn script_mode_writes_indexed_groups() {
        let dir = tempdir().unwrap();
        let settings = settings(&dir, InvocationMode::Script);
        let layout = TestLayout::default();
        let login = make_test(&dir, "Login");
        let search = make_test(&dir, "Search");

        let descriptor = DescriptorFileBuilder::new(&settings, &layout)
            .build(&[
                definition("Login", &login, "1001"),
                definition("Search", &search, "1002"),
            ])
            .unwrap()
            .expect("definitions provided");

        assert_eq!(descriptor.path(), settings.descriptor_path());
        assert!(descriptor.test_list_path().is_none());

        let properties = descriptor.properties();
        let keys: Vec<_> = properties.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "runType",
                "resultsFilename",
                "parentFolder",
                "repoFolder",
                "test1",
                "package1",
                "script1",
                "unitIds1",
                "underlyingTests1",
                "datableParams1",
                "test2",
                "package2",
                "script2",
                "unitIds2",
                "underlyingTests2",
                "datableParams2",
            ]
        );
        assert_eq!(properties["package2"], "_2");
        assert_eq!(properties["unitIds1"], "10;11");
        assert_eq!(properties["underlyingTests1"], "ut:1;ut:2");
        assert_eq!(
            properties["script2"],
            format!("RestartFunctionLibraries\r\nLoadFunctionLibrary \"{search}/lib.qfl\"\r\nRun")
        );
        assert_eq!(
            properties["resultsFilename"],
            settings.results_path().as_str()
        );

        // The written file reproduces the mapping exactly.
        let written = std::fs::read_to_string(descriptor.path()).unwrap();
        assert!(!written.contains("ut:1"), "reserved characters are escaped");
        assert_eq!(&parse_properties(&written), properties);
    }

    #[test]
    fn test_list_mode_writes_list_document() {
        let dir = tempdir().unwrap();
        let settings = settings(&dir, InvocationMode::TestList);
        let layout = TestLayout::default();
        // Test list mode doesn't compile scripts, so the folder needn't exist.
        let binary_test = dir.path().join("prebuilt").join("Checkout");

        let descriptor = DescriptorFileBuilder::new(&settings, &layout)
            .build(&[definition("Checkout", &binary_test, "2001")])
            .unwrap()
            .expect("definitions provided");

        let test_list_path = descriptor.test_list_path().expect("test list written");
        assert_eq!(test_list_path, settings.test_list_path());
        assert_eq!(
            descriptor.properties()["testsListFile"],
            test_list_path.as_str()
        );
        assert!(!descriptor.properties().contains_key("script1"));

        let list = std::fs::read_to_string(test_list_path).unwrap();
        assert!(
            list.contains(&format!(
                r#"<Test runid="2001" name="Checkout" path="{binary_test}"/>"#
            )),
            "list contains entry: {list}"
        );
    }

    #[test]
    fn test_list_mode_rejects_definition_without_units() {
        let dir = tempdir().unwrap();
        let settings = settings(&dir, InvocationMode::TestList);
        let layout = TestLayout::default();

        let error = DescriptorFileBuilder::new(&settings, &layout)
            .build(&[TestDefinition::new("Hollow")])
            .unwrap_err();
        assert!(matches!(
            error,
            DescriptorBuildError::EmptyTestDefinition { test_name } if test_name == "Hollow"
        ));
        assert!(!settings.results_dir.exists(), "nothing written");
    }

    #[test]
    fn digital_lab_keys_are_written() {
        let dir = tempdir().unwrap();
        let mut settings = settings(&dir, InvocationMode::Script);
        settings.digital_lab = Some(DigitalLabParams {
            host_address: "https://lab.example.com:8443".to_owned(),
            exec_token: "token=abc".to_owned(),
        });
        let layout = TestLayout::default();
        let login = make_test(&dir, "Login");

        let descriptor = DescriptorFileBuilder::new(&settings, &layout)
            .build(&[definition("Login", &login, "1")])
            .unwrap()
            .expect("definitions provided");

        let written = parse_properties(&std::fs::read_to_string(descriptor.path()).unwrap());
        assert_eq!(written["mobileHostAddress"], "https://lab.example.com:8443");
        assert_eq!(written["mobileExecToken"], "token=abc");
    }

    #[test]
    fn compile_failure_writes_nothing() {
        let dir = tempdir().unwrap();
        let settings = settings(&dir, InvocationMode::Script);
        let layout = TestLayout::default();
        let missing = dir.path().join("tests").join("Missing");

        let error = DescriptorFileBuilder::new(&settings, &layout)
            .build(&[definition("Missing", &missing, "1")])
            .unwrap_err();
        assert!(matches!(
            error,
            DescriptorBuildError::Compile {
                error: ScriptCompileError::NotATestFolder { .. },
                ..
            }
        ));
        assert!(!settings.results_dir.exists(), "nothing written");
    }

    #[test]
    fn unwritable_directory_is_reported() {
        let dir = tempdir().unwrap();
        let mut settings = settings(&dir, InvocationMode::Script);
        // A directory can't be created under a regular file, whoever runs this.
        let blocker = dir.child("results.txt");
        blocker.write_str("not a directory").unwrap();
        settings.results_dir = blocker.as_path().join("results");
        let layout = TestLayout::default();
        let login = make_test(&dir, "Login");

        let error = DescriptorFileBuilder::new(&settings, &layout)
            .build(&[definition("Login", &login, "1")])
            .unwrap_err();
        assert!(matches!(
            &error,
            DescriptorBuildError::DirectoryNotWritable { dir, .. } if *dir == settings.results_dir
        ));
        assert!(!settings.descriptor_path().exists(), "no descriptor written");
    }

    #[test]
    fn failed_descriptor_write_removes_test_list() {
        let dir = tempdir().unwrap();
        let settings = settings(&dir, InvocationMode::TestList);
        let layout = TestLayout::default();
        std::fs::create_dir(&settings.results_dir).unwrap();
        std::fs::write(settings.descriptor_path(), "runType=Stale").unwrap();

        let error = DescriptorFileBuilder::new(&settings, &layout)
            .build(&[definition("Checkout", &dir.path().join("Checkout"), "1")])
            .unwrap_err();
        assert!(matches!(error, DescriptorBuildError::Write { .. }));
        assert!(
            !settings.test_list_path().exists(),
            "test list removed with the failed descriptor"
        );
        assert_eq!(
            std::fs::read_to_string(settings.descriptor_path()).unwrap(),
            "runType=Stale"
        );
    }

    #[test]
    fn existing_descriptor_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let settings = settings(&dir, InvocationMode::Script);
        let layout = TestLayout::default();
        let login = make_test(&dir, "Login");
        let builder = DescriptorFileBuilder::new(&settings, &layout);

        builder.build(&[definition("Login", &login, "1")]).unwrap();
        let error = builder
            .build(&[definition("Login", &login, "1")])
            .unwrap_err();
        assert!(matches!(error, DescriptorBuildError::Write { .. }));
    }
}
