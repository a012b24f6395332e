// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by uft-bridge.

use camino::Utf8PathBuf;
use config::ConfigError;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse uft-bridge config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// A required value was missing from, or malformed in, the process environment.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum EnvironmentError {
    /// The variable is not set, or is set to an empty string.
    #[error("required environment variable `{name}` is not set")]
    Missing {
        /// The name of the variable.
        name: &'static str,
    },

    /// The variable is set but isn't valid UTF-8.
    #[error("environment variable `{name}` is not valid UTF-8")]
    NotUnicode {
        /// The name of the variable.
        name: &'static str,
    },
}

impl EnvironmentError {
    /// Returns the name of the environment variable this error is about.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Missing { name } | Self::NotUnicode { name } => name,
        }
    }
}

/// An error that occurred while reading a per-test descriptor document.
///
/// The resolver never surfaces this to callers: a malformed descriptor degrades to an empty
/// resource set.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DescriptorParseError {
    /// The document could not be read from disk.
    #[error("error reading descriptor document `{path}`")]
    Read {
        /// The path to the document.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The document is not well-formed XML.
    #[error("error parsing descriptor document `{path}`")]
    Xml {
        /// The path to the document.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },

    /// The document had no root element.
    #[error("no document parsed from `{path}`")]
    NoDocument {
        /// The path to the document.
        path: Utf8PathBuf,
    },
}

/// An error that occurred while compiling the units of a test into a script.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ScriptCompileError {
    /// A unit's test path is not a folder recognizable as a test.
    #[error(
        "unit `{unit_id}` belongs to `{test_path}`, which is not a test folder \
         (neither `{descriptor_file}` nor `{script_file}` found)"
    )]
    NotATestFolder {
        /// The identifier of the unit.
        unit_id: String,

        /// The test path the unit claimed to belong to.
        test_path: Utf8PathBuf,

        /// The descriptor file name that was looked for.
        descriptor_file: String,

        /// The script file name that was looked for.
        script_file: String,
    },
}

/// An error that occurred while building and writing a run descriptor.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DescriptorBuildError {
    /// The target directory is missing or can't be written to.
    #[error("results directory `{dir}` is not writable")]
    DirectoryNotWritable {
        /// The directory that was checked.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// Compiling the script for a test failed.
    #[error("error compiling script for test `{test_name}`")]
    Compile {
        /// The name of the test being compiled.
        test_name: String,

        /// The underlying error.
        #[source]
        error: ScriptCompileError,
    },

    /// A test definition had no units, so no on-disk path could be resolved for it.
    #[error("test `{test_name}` has no units, so its path can't be resolved")]
    EmptyTestDefinition {
        /// The name of the test.
        test_name: String,
    },

    /// Serializing the test list document failed.
    #[error("error serializing test list document `{path}`")]
    TestListSerialize {
        /// The path the document was going to be written to.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },

    /// Writing a file failed.
    #[error("error writing `{path}`")]
    Write {
        /// The path that was being written.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: atomicwrites::Error<std::io::Error>,
    },
}

/// An error that occurred while locating the engine binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineLocateError {
    /// A value needed to compose the engine path was missing from the environment.
    #[error("error composing engine path from the environment")]
    Environment(#[from] EnvironmentError),

    /// The engine binary doesn't exist.
    #[error("engine binary `{path}` not found")]
    NotFound {
        /// The path that was checked.
        path: Utf8PathBuf,
    },

    /// The engine path exists but isn't a file.
    #[error("engine path `{path}` is not a file")]
    NotAFile {
        /// The path that was checked.
        path: Utf8PathBuf,
    },

    /// The engine binary exists but isn't executable.
    #[error("engine binary `{path}` is not executable")]
    NotExecutable {
        /// The path that was checked.
        path: Utf8PathBuf,
    },

    /// Reading metadata for the engine binary failed.
    #[error("error reading metadata for engine binary `{path}`")]
    Metadata {
        /// The path that was checked.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
}

/// An error that occurred while running the engine process.
///
/// A process that starts and exits, whatever its exit code, is not an error: it produces an
/// [`EngineOutcome`](crate::engine::EngineOutcome).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineSpawnError {
    /// The process could not be started.
    #[error("failed to start engine `{program}`")]
    Spawn {
        /// The program that was run.
        program: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// Waiting for the process to exit failed.
    #[error("error waiting for engine `{program}` to exit")]
    Wait {
        /// The program that was run.
        program: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
}

/// An error that occurred while reading the engine's results file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultsParseError {
    /// The results file could not be read.
    #[error("error reading results file `{path}`")]
    Read {
        /// The path to the results file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The results file is not well-formed XML.
    #[error("error parsing results file `{path}`")]
    Xml {
        /// The path to the results file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },
}

/// An error that occurred while loading step data for a run identifier.
///
/// The correlator never surfaces this to callers: the affected case gets empty step data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StepDataLoadError {
    /// The step data file could not be read.
    #[error("error reading step data file `{path}`")]
    Read {
        /// The path to the file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The step data file could not be deserialized.
    #[error("error deserializing step data file `{path}`")]
    Json {
        /// The path to the file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },
}

/// An error that aborted a pipeline run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// No test definitions were provided, so there is nothing to run.
    #[error("no test definitions were provided")]
    NoTestDefinitions,

    /// A required environment value was missing.
    #[error("error reading the run environment")]
    Environment(#[from] EnvironmentError),

    /// Building the run descriptor failed.
    #[error("error building run descriptor")]
    DescriptorBuild(#[from] DescriptorBuildError),

    /// The engine binary could not be located.
    #[error("error locating engine binary")]
    EngineLocate(#[from] EngineLocateError),

    /// The engine process failed to start or to be waited on.
    #[error("error running engine")]
    EngineSpawn(#[from] EngineSpawnError),

    /// The engine's results file could not be parsed.
    #[error("error reading engine results")]
    Results(#[from] ResultsParseError),
}
