// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{BridgeConfig, CiEnvironment, DigitalLabParams, InvocationMode};
use crate::errors::EnvironmentError;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use std::fmt;

/// Everything a single pipeline invocation needs to know about its surroundings.
///
/// A `RunContext` is built once per invocation and passed explicitly to each stage, so several
/// invocations can run in the same process without sharing state.
#[derive(Clone, Debug)]
pub struct RunContext {
    config: BridgeConfig,
    env: CiEnvironment,
    started_at: DateTime<Utc>,
}

impl RunContext {
    /// Creates a new context, stamped with the current time.
    pub fn new(config: BridgeConfig, env: CiEnvironment) -> Self {
        Self::with_start_time(config, env, Utc::now())
    }

    /// Creates a new context with an explicit start time.
    pub fn with_start_time(
        config: BridgeConfig,
        env: CiEnvironment,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            config,
            env,
            started_at,
        }
    }

    /// Returns the workspace root, against which relative paths are resolved.
    pub fn workspace_root(&self) -> &Utf8Path {
        self.config.workspace_root()
    }

    /// Returns the configuration for this run.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the environment snapshot for this run.
    pub fn env(&self) -> &CiEnvironment {
        &self.env
    }

    /// Returns when this run started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the stamp used to give this run's files distinct names.
    pub fn run_stamp(&self) -> RunStamp {
        RunStamp::from_time(self.started_at)
    }

    /// Resolves the run-level settings written to the run descriptor.
    ///
    /// Fails if the digital lab is enabled but its connection parameters are missing from the
    /// environment.
    pub fn run_settings(&self) -> Result<RunSettings, EnvironmentError> {
        let digital_lab = if self.config.digital_lab().enabled() {
            Some(self.env.digital_lab()?)
        } else {
            None
        };

        Ok(RunSettings {
            run_type: self.config.run().run_type().to_owned(),
            mode: self.config.run().mode(),
            results_dir: self.config.results_dir(),
            repo_folder: self.workspace_root().to_owned(),
            digital_lab,
            stamp: self.run_stamp(),
        })
    }
}

/// Run-level settings that apply to every test in a run descriptor.
#[derive(Clone, Debug)]
pub struct RunSettings {
    /// The run type forwarded to the engine.
    pub run_type: String,

    /// How tests are handed to the engine.
    pub mode: InvocationMode,

    /// The directory the descriptor, test list and results files are written to.
    pub results_dir: Utf8PathBuf,

    /// The root of the repository holding the tests.
    pub repo_folder: Utf8PathBuf,

    /// Digital lab connection parameters, if the digital lab is enabled.
    pub digital_lab: Option<DigitalLabParams>,

    /// The stamp used to name this run's files.
    pub stamp: RunStamp,
}

impl RunSettings {
    /// Returns the path of the run descriptor file.
    pub fn descriptor_path(&self) -> Utf8PathBuf {
        self.results_dir.join(format!("props{}.txt", self.stamp))
    }

    /// Returns the path the engine writes its results to.
    pub fn results_path(&self) -> Utf8PathBuf {
        self.results_dir.join(format!("Results{}.xml", self.stamp))
    }

    /// Returns the path of the auxiliary test list document.
    pub fn test_list_path(&self) -> Utf8PathBuf {
        self.results_dir.join(format!("testsList{}.xml", self.stamp))
    }
}

/// A timestamp-derived suffix that keeps the file names of different runs apart.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunStamp(String);

impl RunStamp {
    /// Creates a stamp from a point in time, with millisecond resolution.
    pub fn from_time(time: DateTime<Utc>) -> Self {
        Self(time.format("%Y%m%d%H%M%S%3f").to_string())
    }

    /// Returns the stamp as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap()
            + chrono::Duration::milliseconds(535)
    }

    #[test]
    fn run_stamp_has_millisecond_resolution() {
        assert_eq!(RunStamp::from_time(start_time()).as_str(), "20260314150926535");
    }

    #[test]
    fn run_settings_file_names() {
        let cx = RunContext::with_start_time(
            BridgeConfig::default_config("/workspace"),
            CiEnvironment::default(),
            start_time(),
        );
        let settings = cx.run_settings().expect("digital lab is disabled by default");

        assert_eq!(settings.run_type, "FileSystem");
        assert_eq!(settings.repo_folder, Utf8PathBuf::from("/workspace"));
        assert!(settings.digital_lab.is_none());
        assert_eq!(
            settings.descriptor_path(),
            Utf8PathBuf::from("/workspace/uft-bridge-results/props20260314150926535.txt")
        );
        assert_eq!(
            settings.results_path(),
            Utf8PathBuf::from("/workspace/uft-bridge-results/Results20260314150926535.xml")
        );
        assert_eq!(
            settings.test_list_path(),
            Utf8PathBuf::from("/workspace/uft-bridge-results/testsList20260314150926535.xml")
        );
    }

    #[test]
    fn enabled_digital_lab_requires_environment() {
        let workspace_dir = camino_tempfile::tempdir().unwrap();
        let config_file = workspace_dir.path().join("lab.toml");
        std::fs::write(&config_file, "[digital-lab]\nenabled = true\n").unwrap();
        let config =
            BridgeConfig::from_sources(workspace_dir.path(), Some(config_file.as_path()), |_, _| {})
                .unwrap();

        let cx = RunContext::with_start_time(
            config.clone(),
            CiEnvironment::from_vars([("DIGITAL_LAB_HOST", "lab.example.com")]),
            start_time(),
        );
        assert_eq!(
            cx.run_settings().unwrap_err(),
            EnvironmentError::Missing {
                name: CiEnvironment::DIGITAL_LAB_EXEC_TOKEN
            }
        );

        let cx = RunContext::with_start_time(
            config,
            CiEnvironment::from_vars([
                ("DIGITAL_LAB_HOST", "lab.example.com"),
                ("DIGITAL_LAB_EXEC_TOKEN", "token"),
            ]),
            start_time(),
        );
        let lab = cx.run_settings().unwrap().digital_lab.expect("lab enabled");
        assert_eq!(lab.host_address, "lab.example.com");
        assert_eq!(lab.exec_token, "token");
    }
}
