// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The status of a single test case after correlation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestStatus {
    /// The test case passed.
    Passed,

    /// The test case was skipped by the engine.
    Skipped,

    /// The test case reported an error stack trace or error details.
    Failed,
}

impl TestStatus {
    /// Returns the string representation of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error information attached to a failed [`NormalizedResult`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    /// The full stack trace reported by the engine, or empty.
    pub stack_trace: String,

    /// A short label for the kind of error, derived from the stack trace or the error details.
    ///
    /// Empty if neither could be classified.
    pub error_type: String,

    /// The error details reported by the engine, or empty.
    pub error_message: String,
}

/// One step of run data, loaded from the side-channel file for a run identifier.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStep {
    /// The name of the step.
    pub name: String,

    /// The status reported for the step, as free-form text.
    pub status: String,

    /// An optional message attached to the step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The duration of the step in milliseconds, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// The normalized outcome of one test case.
///
/// Module, package and class attribution is not tracked by the pipeline: those fields are always
/// empty, and kept so that consumers can rely on a fixed shape.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    /// The module name. Currently always empty.
    pub module_name: String,

    /// The package name. Currently always empty.
    pub package_name: String,

    /// The class name. Currently always empty.
    pub class_name: String,

    /// The name of the test case.
    pub test_name: String,

    /// The status of the test case.
    pub status: TestStatus,

    /// How long the test case took, in milliseconds.
    pub duration_ms: u64,

    /// When the CI build that produced this result started.
    pub build_started_at: DateTime<Utc>,

    /// Error information, present iff `status` is [`TestStatus::Failed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,

    /// An external URL scraped from the captured standard output, or empty.
    pub external_url: String,

    /// A description scraped from the captured standard output, or empty.
    pub description: String,

    /// Step-level data loaded for this test case's run identifier.
    pub run_steps: Vec<RunStep>,

    /// The run identifier linking this case to its step data. Empty if the engine reported none.
    pub run_id: String,

    /// External assets attached to this result. Currently always empty.
    pub external_assets: Vec<String>,
}
