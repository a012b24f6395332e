// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for uft-bridge.
//!
//! Configuration comes from three places, resolved once per invocation:
//!
//! * [`BridgeConfig`]: the embedded default config, with `.config/uft-bridge.toml` layered on top.
//! * [`CiEnvironment`]: a snapshot of the environment variables set by the CI system.
//! * [`RunContext`]: both of the above plus the run's start time, passed explicitly to every
//!   stage of the pipeline.

mod config_impl;
mod context;
mod env;

pub use config_impl::*;
pub use context::*;
pub use env::*;
