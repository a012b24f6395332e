// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::StepDataLoadError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::BTreeMap;
use uft_bridge_metadata::RunStep;

/// Maps run identifiers to the files their step data can be loaded from.
pub type RunResultsFiles = BTreeMap<String, Utf8PathBuf>;

/// Loads step-level run data from a side-channel file.
pub trait StepDataLoader {
    /// Loads the steps recorded in the file at `path`.
    fn load(&self, path: &Utf8Path) -> Result<Vec<RunStep>, StepDataLoadError>;
}

/// Loads step data from JSON files of the form `{ "steps": [ ... ] }`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonStepDataLoader;

#[derive(Debug, Deserialize)]
struct StepDataFile {
    #[serde(default)]
    steps: Vec<RunStep>,
}

impl StepDataLoader for JsonStepDataLoader {
    fn load(&self, path: &Utf8Path) -> Result<Vec<RunStep>, StepDataLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|error| StepDataLoadError::Read {
            path: path.to_owned(),
            error,
        })?;
        let file: StepDataFile =
            serde_json::from_str(&contents).map_err(|error| StepDataLoadError::Json {
                path: path.to_owned(),
                error,
            })?;
        Ok(file.steps)
    }
}
