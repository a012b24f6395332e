// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::{collections::BTreeSet, fmt};

/// Overall configuration for uft-bridge.
///
/// This is the root data structure for configuration. It is built from the default config
/// embedded in this crate, with an optional repository config layered on top.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    workspace_root: Utf8PathBuf,
    inner: BridgeConfigDeserialize,
}

impl BridgeConfig {
    /// The default location of the config within the workspace: `.config/uft-bridge.toml`.
    pub const CONFIG_PATH: &'static str = ".config/uft-bridge.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the config from the given file, or if not specified from `.config/uft-bridge.toml`
    /// in the workspace root.
    ///
    /// If the file isn't specified and the workspace doesn't have `.config/uft-bridge.toml`, uses
    /// the default config options.
    ///
    /// `unknown_callback` is called with the set of keys that were present in the file but not
    /// understood.
    pub fn from_sources(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        mut unknown_callback: impl FnMut(&Utf8Path, &BTreeSet<String>),
    ) -> Result<Self, ConfigParseError> {
        let workspace_root = workspace_root.into();

        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workspace_root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (inner, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file.clone(), kind))?;

        if !unknown.is_empty() {
            unknown_callback(&config_file, &unknown);
        }

        Ok(Self {
            workspace_root,
            inner,
        })
    }

    /// Returns the default configuration, rooted at the given workspace.
    pub fn default_config(workspace_root: impl Into<Utf8PathBuf>) -> Self {
        let config = Self::make_default_config()
            .build()
            .expect("default config is always valid");

        let mut unknown = BTreeSet::new();
        let deserialized: BridgeConfigDeserialize =
            serde_ignored::deserialize(config, |path: serde_ignored::Path| {
                unknown.insert(path.to_string());
            })
            .expect("default config is always valid");

        // Make sure there aren't any unknown keys in the default config, since it is
        // embedded/shipped with this crate.
        if !unknown.is_empty() {
            panic!(
                "found unknown keys in default config: {}",
                itertools::join(&unknown, ", ")
            );
        }

        Self {
            workspace_root: workspace_root.into(),
            inner: deserialized,
        }
    }

    /// Returns the workspace root this config is rooted at.
    pub fn workspace_root(&self) -> &Utf8Path {
        &self.workspace_root
    }

    /// Returns the engine configuration.
    pub fn engine(&self) -> &EngineConfig {
        &self.inner.engine
    }

    /// Returns the run configuration.
    pub fn run(&self) -> &RunConfig {
        &self.inner.run
    }

    /// Returns the on-disk layout of tests.
    pub fn layout(&self) -> &TestLayout {
        &self.inner.layout
    }

    /// Returns the digital lab configuration.
    pub fn digital_lab(&self) -> &DigitalLabConfig {
        &self.inner.digital_lab
    }

    /// Returns the absolute directory where run descriptors and results are written.
    pub fn results_dir(&self) -> Utf8PathBuf {
        // Joining an absolute path replaces the base, which is the behavior we want.
        self.workspace_root.join(&self.inner.run.results_dir)
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(BridgeConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: BridgeConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // Both serde_path_to_error and the config crate report the key. Drop the key
                // from the config error for consistency.
                let path = error.path().clone();
                let config_error = error.into_inner();
                let error = match config_error {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BridgeConfigDeserialize {
    engine: EngineConfig,
    run: RunConfig,
    layout: TestLayout,
    digital_lab: DigitalLabConfig,
}

/// Where and how the engine binary is found.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    relative_path: Utf8PathBuf,
    location: EngineLocation,
}

impl EngineConfig {
    /// Creates a new engine configuration.
    pub fn new(relative_path: impl Into<Utf8PathBuf>, location: EngineLocation) -> Self {
        Self {
            relative_path: relative_path.into(),
            location,
        }
    }

    /// Returns the path to the engine binary, relative to the location root.
    pub fn relative_path(&self) -> &Utf8Path {
        &self.relative_path
    }

    /// Returns where the engine binary is looked up.
    pub fn location(&self) -> EngineLocation {
        self.location
    }
}

/// The root against which [`EngineConfig::relative_path`] is resolved.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineLocation {
    /// Relative to the workspace root.
    WorkingDir,

    /// Inside the checked-out CI action, composed from the CI environment.
    CiAction,
}

impl fmt::Display for EngineLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkingDir => write!(f, "working-dir"),
            Self::CiAction => write!(f, "ci-action"),
        }
    }
}

/// Run-level settings written to the run descriptor.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunConfig {
    run_type: String,
    mode: InvocationMode,
    results_dir: Utf8PathBuf,
}

impl RunConfig {
    /// Returns the run type forwarded to the engine.
    pub fn run_type(&self) -> &str {
        &self.run_type
    }

    /// Returns how tests are handed to the engine.
    pub fn mode(&self) -> InvocationMode {
        self.mode
    }
}

/// How tests are handed to the engine.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationMode {
    /// Each test's units are compiled into an inline script.
    Script,

    /// Pre-built tests are enumerated by path in an auxiliary test list document.
    TestList,
}

impl fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script => write!(f, "script"),
            Self::TestList => write!(f, "test-list"),
        }
    }
}

/// The on-disk layout of a test folder.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestLayout {
    descriptor_file: String,
    script_extension: String,
}

impl TestLayout {
    /// Creates a new layout.
    pub fn new(descriptor_file: impl Into<String>, script_extension: impl Into<String>) -> Self {
        Self {
            descriptor_file: descriptor_file.into(),
            script_extension: script_extension.into(),
        }
    }

    /// Returns the name of the XML descriptor co-located with each test.
    pub fn descriptor_file(&self) -> &str {
        &self.descriptor_file
    }

    /// Returns the path to the descriptor document of the test at `test_path`.
    pub fn descriptor_path(&self, test_path: &Utf8Path) -> Utf8PathBuf {
        test_path.join(&self.descriptor_file)
    }

    /// Returns the name of the same-named script file for the test at `test_path`, if the path
    /// has a final component.
    pub fn script_file_name(&self, test_path: &Utf8Path) -> Option<String> {
        test_path
            .file_name()
            .map(|name| format!("{name}.{}", self.script_extension))
    }

    /// Returns true if `test_path` is a folder recognizable as a test.
    ///
    /// A folder is a test if it contains either the descriptor document or a script file named
    /// after the folder.
    pub fn is_test_folder(&self, test_path: &Utf8Path) -> bool {
        if self.descriptor_path(test_path).is_file() {
            return true;
        }
        self.script_file_name(test_path)
            .is_some_and(|name| test_path.join(name).is_file())
    }
}

impl Default for TestLayout {
    fn default() -> Self {
        Self::new("Test.xml", "vbs")
    }
}

/// Digital lab settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DigitalLabConfig {
    enabled: bool,
}

impl DigitalLabConfig {
    /// Returns true if the digital lab is enabled for runs.
    pub fn enabled(&self) -> bool {
        self.enabled
    }
}
