// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run descriptors: the flat configuration files the engine reads.
//!
//! A run descriptor is a `key=value` properties file describing every test in a run. In
//! [`InvocationMode::TestList`](crate::config::InvocationMode::TestList), an auxiliary XML test
//! list naming pre-built tests by path is written alongside it.

mod builder;
mod properties;
mod test_list;

pub use builder::*;
pub use properties::*;
pub use test_list::*;
