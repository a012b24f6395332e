// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use uft_bridge_metadata::EngineExitCode;

/// The classified completion status of one engine invocation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EngineOutcomeKind {
    /// Every test passed.
    Passed,

    /// At least one test failed.
    Failed,

    /// Some tests failed and others passed.
    PartialFailed,

    /// The run was aborted before completing.
    Aborted,

    /// The run completed, but results are unstable.
    Unstable,

    /// The engine couldn't connect to the target environment.
    EnvironmentNotConnected,

    /// The engine exited with a code outside the documented set.
    Unknown,
}

impl EngineOutcomeKind {
    /// Returns a short, human-readable name for this outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::PartialFailed => "partially failed",
            Self::Aborted => "aborted",
            Self::Unstable => "unstable",
            Self::EnvironmentNotConnected => "environment not connected",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EngineOutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of one engine invocation: the classified outcome plus the raw exit code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EngineOutcome {
    /// The classified outcome.
    pub kind: EngineOutcomeKind,

    /// The raw exit code, or `None` if the process didn't exit with one (for example, if it was
    /// terminated by a signal).
    pub code: Option<i32>,
}

impl EngineOutcome {
    /// Classifies a raw exit code.
    ///
    /// A missing code is treated as an abort. Codes outside the documented set map to
    /// [`EngineOutcomeKind::Unknown`].
    pub fn from_code(code: Option<i32>) -> Self {
        let kind = match code {
            None => EngineOutcomeKind::Aborted,
            Some(EngineExitCode::PASSED) => EngineOutcomeKind::Passed,
            Some(EngineExitCode::FAILED) => EngineOutcomeKind::Failed,
            Some(EngineExitCode::PARTIAL_FAILED) => EngineOutcomeKind::PartialFailed,
            Some(EngineExitCode::ABORTED) => EngineOutcomeKind::Aborted,
            Some(EngineExitCode::UNSTABLE) => EngineOutcomeKind::Unstable,
            Some(EngineExitCode::ENVIRONMENT_NOT_CONNECTED) => {
                EngineOutcomeKind::EnvironmentNotConnected
            }
            Some(_) => EngineOutcomeKind::Unknown,
        };
        Self { kind, code }
    }

    /// Returns true if the engine reported that every test passed.
    pub fn is_success(&self) -> bool {
        self.kind == EngineOutcomeKind::Passed
    }
}

impl fmt::Display for EngineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (exit code {code})", self.kind),
            None => write!(f, "{} (no exit code)", self.kind),
        }
    }
}
