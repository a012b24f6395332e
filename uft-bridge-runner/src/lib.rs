// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for uft-bridge: the translation layer between structured test definitions
//! and a legacy external test engine.
//!
//! A run flows strictly forward through the [`pipeline`]:
//!
//! * [`resources`] discovers the function libraries and recovery scenarios of each test.
//! * [`script`] compiles each test's units into an engine script.
//! * [`descriptor`] assembles and writes the run descriptor the engine reads.
//! * [`engine`] locates and runs the engine, and classifies its exit code.
//! * [`results`] reads the engine's results and correlates them into normalized results.
//!
//! Nothing is shared between runs: every stage takes an explicit [`config::RunContext`].

pub mod config;
pub mod definition;
pub mod descriptor;
pub mod engine;
pub mod errors;
mod helpers;
pub mod pipeline;
pub mod resources;
pub mod results;
pub mod script;
#[cfg(test)]
mod test_helpers;

pub use helpers::ENGINE_LINE_TERMINATOR;
