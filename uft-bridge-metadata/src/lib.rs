// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to the results produced by uft-bridge.
//!
//! The types here are what downstream reporting consumes: one
//! [`NormalizedResult`] per engine test case, plus the documented completion
//! codes of the external engine in [`EngineExitCode`].

mod exit_codes;
mod results;

pub use exit_codes::*;
pub use results::*;
