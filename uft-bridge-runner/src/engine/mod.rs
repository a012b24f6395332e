// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locating, running and classifying the external engine.
//!
//! The engine is located through [`resolve_engine_binary`], run once per pipeline invocation by
//! [`EngineInvoker`], and its exit code is classified into an [`EngineOutcome`].

mod invoke;
mod locate;
mod outcome;

pub use invoke::*;
pub use locate::*;
pub use outcome::*;
