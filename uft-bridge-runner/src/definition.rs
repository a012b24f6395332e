// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test definitions submitted for a run.

use camino::{Utf8Path, Utf8PathBuf};

/// One atomic script fragment belonging to a parent test.
///
/// Units for the same parent test are expected to be contiguous in a [`TestDefinition`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestUnit {
    /// The folder of the test this unit belongs to.
    pub test_path: Utf8PathBuf,

    /// The identifier of this unit.
    pub unit_id: String,

    /// The literal script fragment for this unit.
    pub script: String,
}

impl TestUnit {
    /// Creates a new unit.
    pub fn new(
        test_path: impl Into<Utf8PathBuf>,
        unit_id: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            test_path: test_path.into(),
            unit_id: unit_id.into(),
            script: script.into(),
        }
    }
}

/// One logical test submitted for a run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TestDefinition {
    /// The name of the test.
    pub name: String,

    /// The units making up the test, in order.
    pub units: Vec<TestUnit>,

    /// Identifiers of the underlying tests this definition was built from.
    pub underlying_tests: Vec<String>,

    /// Unit identifiers referenced by this definition.
    pub unit_ids: Vec<String>,

    /// Encoded iteration data, passed through to the engine as is.
    pub datable_params: String,

    /// The run identifier correlating this test with its step data.
    pub run_id: String,
}

impl TestDefinition {
    /// Creates a new definition with the given name and no units.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the on-disk path of this test: the test path of its first unit.
    pub fn test_path(&self) -> Option<&Utf8Path> {
        self.units.first().map(|unit| unit.test_path.as_path())
    }
}
