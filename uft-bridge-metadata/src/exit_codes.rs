// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented completion codes for the external test engine.
///
/// The engine reports the aggregate state of a run through its process exit code. Any code not
/// listed here is treated as unknown by consumers.
pub enum EngineExitCode {}

impl EngineExitCode {
    /// Every test in the run passed.
    pub const PASSED: i32 = 0;

    /// At least one test failed.
    pub const FAILED: i32 = -1;

    /// Some tests failed while others passed.
    pub const PARTIAL_FAILED: i32 = -2;

    /// The run was aborted before completion.
    pub const ABORTED: i32 = -3;

    /// The run completed, but with warnings.
    pub const UNSTABLE: i32 = -4;

    /// The engine could not connect to the target environment.
    pub const ENVIRONMENT_NOT_CONNECTED: i32 = -5;
}
