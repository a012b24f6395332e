// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading engine results and correlating them into normalized results.
//!
//! The engine writes one JUnit-shaped results file per run, read by [`read_case_results`]. Each
//! case is then turned into a
//! [`NormalizedResult`](uft_bridge_metadata::NormalizedResult) by a [`ResultCorrelator`], which
//! scrapes embedded markers out of captured output and attaches step data loaded through a
//! [`StepDataLoader`].

mod correlate;
mod junit;
mod markers;
mod step_data;

pub use correlate::*;
pub use junit::*;
pub use markers::*;
pub use step_data::*;
