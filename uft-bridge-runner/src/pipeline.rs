// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The compile, invoke and correlate pipeline.
//!
//! [`Pipeline::run`] drives a single engine invocation end to end:
//!
//! 1. Run-level settings are resolved, and the engine binary is located. Both can fail on missing
//!    environment values, which is reported before anything is written.
//! 2. The run descriptor is compiled and written by a
//!    [`DescriptorFileBuilder`](crate::descriptor::DescriptorFileBuilder).
//! 3. The engine is run once against the descriptor.
//! 4. The engine's results file, if any, is read and correlated into normalized results.

use crate::{
    config::RunContext,
    definition::TestDefinition,
    descriptor::{DescriptorFileBuilder, RunDescriptor},
    engine::{EngineInvoker, EngineOutcome},
    errors::PipelineError,
    helpers::plural,
    results::{ResultCorrelator, RunResultsFiles, read_case_results},
};
use tracing::{info, warn};
use uft_bridge_metadata::NormalizedResult;

/// Everything a pipeline run produced.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    /// The run descriptor the engine was invoked with.
    pub descriptor: RunDescriptor,

    /// The classified outcome of the engine invocation.
    pub outcome: EngineOutcome,

    /// One normalized result per distinct test name reported by the engine.
    pub results: Vec<NormalizedResult>,
}

/// Runs test definitions through the external engine.
#[derive(Clone, Copy, Debug)]
pub struct Pipeline<'cx> {
    cx: &'cx RunContext,
}

impl<'cx> Pipeline<'cx> {
    /// Creates a new pipeline for the given run context.
    pub fn new(cx: &'cx RunContext) -> Self {
        Self { cx }
    }

    /// Compiles `definitions`, runs the engine once, and correlates its results.
    ///
    /// `run_results_files` maps run identifiers to their step data files.
    ///
    /// An engine exit with any code is not an error: it is reported through
    /// [`PipelineReport::outcome`]. If the engine didn't write a results file, the report has no
    /// results.
    pub async fn run(
        &self,
        definitions: &[TestDefinition],
        run_results_files: &RunResultsFiles,
    ) -> Result<PipelineReport, PipelineError> {
        let settings = self.cx.run_settings()?;
        let invoker = EngineInvoker::locate(self.cx)?;

        let descriptor = DescriptorFileBuilder::new(&settings, self.cx.config().layout())
            .build(definitions)?
            .ok_or(PipelineError::NoTestDefinitions)?;

        info!(
            "running {} {} through {}",
            definitions.len(),
            plural::tests_str(definitions.len()),
            invoker.program(),
        );
        let outcome = invoker.invoke(descriptor.path()).await?;

        let results_path = descriptor.results_path();
        let results = if results_path.exists() {
            let cases = read_case_results(results_path)?;
            let mut correlator = ResultCorrelator::new(self.cx.started_at(), run_results_files);
            correlator.correlate_all(&cases);
            correlator.into_results()
        } else {
            warn!("engine exited ({outcome}) without writing results to {results_path}");
            Vec::new()
        };

        Ok(PipelineReport {
            descriptor,
            outcome,
            results,
        })
    }
}
