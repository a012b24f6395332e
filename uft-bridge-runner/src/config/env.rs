// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment-driven inputs, read once per invocation.

use crate::errors::EnvironmentError;
use camino::Utf8PathBuf;
use std::{collections::BTreeMap, env::VarError};

/// A snapshot of the environment variables uft-bridge reads.
///
/// The snapshot is taken once, so a run never observes the environment changing halfway through.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CiEnvironment {
    vars: BTreeMap<&'static str, String>,
}

impl CiEnvironment {
    /// The root of the CI runner's workspace, under which actions are checked out.
    pub const WORKSPACE_ROOT: &'static str = "RUNNER_WORKSPACE";

    /// The `owner/name` identity of the action providing the engine.
    pub const ACTION_REPOSITORY: &'static str = "GITHUB_ACTION_REPOSITORY";

    /// The version reference of the action providing the engine.
    pub const ACTION_REF: &'static str = "GITHUB_ACTION_REF";

    /// The address of the digital lab host.
    pub const DIGITAL_LAB_HOST: &'static str = "DIGITAL_LAB_HOST";

    /// The execution token used to connect to the digital lab.
    pub const DIGITAL_LAB_EXEC_TOKEN: &'static str = "DIGITAL_LAB_EXEC_TOKEN";

    /// All the variables read from the environment.
    pub const KNOWN_VARS: [&'static str; 5] = [
        Self::WORKSPACE_ROOT,
        Self::ACTION_REPOSITORY,
        Self::ACTION_REF,
        Self::DIGITAL_LAB_HOST,
        Self::DIGITAL_LAB_EXEC_TOKEN,
    ];

    /// Takes a snapshot of the current process environment.
    ///
    /// Returns an error if a known variable is set but isn't valid UTF-8. Missing variables are
    /// only an error once something requires them.
    pub fn from_env() -> Result<Self, EnvironmentError> {
        let mut vars = BTreeMap::new();
        for name in Self::KNOWN_VARS {
            match std::env::var(name) {
                Ok(value) => {
                    vars.insert(name, value);
                }
                Err(VarError::NotPresent) => {}
                Err(VarError::NotUnicode(_)) => {
                    return Err(EnvironmentError::NotUnicode { name });
                }
            }
        }
        Ok(Self { vars })
    }

    /// Builds a snapshot from explicit values. Names outside [`Self::KNOWN_VARS`] are ignored.
    pub fn from_vars<'a>(vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let vars = vars
            .into_iter()
            .filter_map(|(name, value)| {
                Self::KNOWN_VARS
                    .iter()
                    .find(|known| **known == name)
                    .map(|known| (*known, value.to_owned()))
            })
            .collect();
        Self { vars }
    }

    /// Returns the value of a variable, treating empty values as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Returns the value of a required variable.
    pub fn require(&self, name: &'static str) -> Result<&str, EnvironmentError> {
        self.get(name).ok_or(EnvironmentError::Missing { name })
    }

    /// Returns the location of the checked-out CI action.
    ///
    /// All three of the workspace root, the action repository and the action reference are
    /// required.
    pub fn action_location(&self) -> Result<ActionLocation, EnvironmentError> {
        Ok(ActionLocation {
            workspace_root: self.require(Self::WORKSPACE_ROOT)?.into(),
            repository: self.require(Self::ACTION_REPOSITORY)?.to_owned(),
            reference: self.require(Self::ACTION_REF)?.to_owned(),
        })
    }

    /// Returns the digital lab connection parameters.
    pub fn digital_lab(&self) -> Result<DigitalLabParams, EnvironmentError> {
        Ok(DigitalLabParams {
            host_address: self.require(Self::DIGITAL_LAB_HOST)?.to_owned(),
            exec_token: self.require(Self::DIGITAL_LAB_EXEC_TOKEN)?.to_owned(),
        })
    }
}

/// Where a CI action has been checked out.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionLocation {
    /// The root of the runner workspace.
    pub workspace_root: Utf8PathBuf,

    /// The `owner/name` identity of the action.
    pub repository: String,

    /// The version reference of the action.
    pub reference: String,
}

impl ActionLocation {
    /// Returns the directory the action is checked out to.
    pub fn action_dir(&self) -> Utf8PathBuf {
        let mut dir = self.workspace_root.join("_actions");
        dir.push(&self.repository);
        dir.push(&self.reference);
        dir
    }
}

/// Connection parameters for the digital lab.
#[derive(Clone, Eq, PartialEq)]
pub struct DigitalLabParams {
    /// The address of the digital lab host.
    pub host_address: String,

    /// The execution token.
    pub exec_token: String,
}

// The token is a credential: keep it out of logs.
impl std::fmt::Debug for DigitalLabParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalLabParams")
            .field("host_address", &self.host_address)
            .field("exec_token", &"<redacted>")
            .finish()
    }
}
