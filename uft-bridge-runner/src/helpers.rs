// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for uft-bridge-runner.

use std::{error::Error, fmt};

/// The line terminator the engine expects, both in scripts and in the run descriptor.
pub const ENGINE_LINE_TERMINATOR: &str = "\r\n";

/// Utilities for pluralizing various words based on count or plurality.
pub(crate) mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub(crate) fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "unit" if `count` is 1, otherwise "units".
    pub(crate) fn units_str(count: usize) -> &'static str {
        if count == 1 { "unit" } else { "units" }
    }
}

/// Displays an error along with all of its sources, separated by `: `.
pub(crate) struct DisplayErrorChain<E>(pub(crate) E);

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(error) = source {
            write!(f, ": {error}")?;
            source = error.source();
        }
        Ok(())
    }
}
