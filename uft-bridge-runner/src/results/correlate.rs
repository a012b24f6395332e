// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    CaseResult, JsonStepDataLoader, RunResultsFiles, StepDataLoader, extract_description,
    extract_external_url,
};
use crate::helpers::DisplayErrorChain;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, map::Entry};
use tracing::{debug, warn};
use uft_bridge_metadata::{ErrorRecord, NormalizedResult, RunStep, TestStatus};

/// Marks the first stack frame in an error stack trace.
const FRAME_MARKER: &str = " at ";

/// Turns raw engine case results into [`NormalizedResult`]s.
///
/// Results are keyed by test name: correlating a case with the same name as an earlier one
/// replaces the earlier result, while keeping its position.
#[derive(Debug)]
pub struct ResultCorrelator<'a, L = JsonStepDataLoader> {
    build_started_at: DateTime<Utc>,
    run_results_files: &'a RunResultsFiles,
    loader: L,
    results: IndexMap<String, NormalizedResult>,
}

impl<'a> ResultCorrelator<'a> {
    /// Creates a correlator that loads step data as JSON.
    pub fn new(build_started_at: DateTime<Utc>, run_results_files: &'a RunResultsFiles) -> Self {
        Self::with_loader(build_started_at, run_results_files, JsonStepDataLoader)
    }
}

impl<'a, L: StepDataLoader> ResultCorrelator<'a, L> {
    /// Creates a correlator with a custom step data loader.
    pub fn with_loader(
        build_started_at: DateTime<Utc>,
        run_results_files: &'a RunResultsFiles,
        loader: L,
    ) -> Self {
        Self {
            build_started_at,
            run_results_files,
            loader,
            results: IndexMap::new(),
        }
    }

    /// Normalizes `case` and records the result under its test name.
    pub fn correlate(&mut self, case: &CaseResult) -> &NormalizedResult {
        let result = self.normalize(case);
        match self.results.entry(case.test_name.clone()) {
            Entry::Occupied(mut entry) => {
                debug!(
                    test_name = %case.test_name,
                    "replacing earlier result with the same test name",
                );
                entry.insert(result);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(result),
        }
    }

    /// Correlates every case in `cases`, in order.
    pub fn correlate_all<'c>(&mut self, cases: impl IntoIterator<Item = &'c CaseResult>) {
        for case in cases {
            self.correlate(case);
        }
    }

    /// Returns the results recorded so far, in first-seen order of their test names.
    pub fn all(&self) -> impl ExactSizeIterator<Item = &NormalizedResult> + '_ {
        self.results.values()
    }

    /// Consumes the correlator, returning its results in first-seen order of their test names.
    pub fn into_results(self) -> Vec<NormalizedResult> {
        self.results.into_values().collect()
    }

    /// Normalizes a single case without recording it.
    pub fn normalize(&self, case: &CaseResult) -> NormalizedResult {
        let stack_trace = case.error_stack_trace.as_deref();
        let details = case.error_details.as_deref().filter(|details| !details.is_empty());

        let status = if case.skipped {
            TestStatus::Skipped
        } else if stack_trace.is_some() || details.is_some() {
            TestStatus::Failed
        } else {
            TestStatus::Passed
        };

        let error = (status == TestStatus::Failed).then(|| ErrorRecord {
            stack_trace: stack_trace.unwrap_or_default().to_owned(),
            error_type: error_type(stack_trace, details).to_owned(),
            error_message: details.unwrap_or_default().to_owned(),
        });

        NormalizedResult {
            module_name: String::new(),
            package_name: String::new(),
            class_name: String::new(),
            test_name: case.test_name.clone(),
            status,
            duration_ms: u64::try_from(case.duration.as_millis()).unwrap_or(u64::MAX),
            build_started_at: self.build_started_at,
            error,
            external_url: extract_external_url(&case.stdout).to_owned(),
            description: extract_description(&case.stdout).to_owned(),
            run_steps: self.run_steps(case),
            run_id: case.run_id.clone().unwrap_or_default(),
            external_assets: Vec::new(),
        }
    }

    fn run_steps(&self, case: &CaseResult) -> Vec<RunStep> {
        let Some(run_id) = case.run_id.as_deref().filter(|run_id| !run_id.is_empty()) else {
            debug!(test_name = %case.test_name, "no run identifier, skipping step data");
            return Vec::new();
        };
        let Some(path) = self.run_results_files.get(run_id) else {
            warn!(
                test_name = %case.test_name,
                "no run results file for run id {run_id}, continuing without step data",
            );
            return Vec::new();
        };
        match self.loader.load(path) {
            Ok(steps) => steps,
            Err(error) => {
                warn!(
                    test_name = %case.test_name,
                    "continuing without step data: {}",
                    DisplayErrorChain(&error),
                );
                Vec::new()
            }
        }
    }
}

/// Derives a short error label from a failure's stack trace and details.
///
/// Prefers the part of the stack trace before the first frame marker (`" at "`), then the part of
/// the details before the first `:`. Returns an empty string if neither applies.
pub fn error_type<'a>(stack_trace: Option<&'a str>, details: Option<&'a str>) -> &'a str {
    if let Some((label, _)) = stack_trace.and_then(|stack| stack.split_once(FRAME_MARKER)) {
        return label;
    }
    if let Some((label, _)) = details.and_then(|details| details.split_once(':')) {
        return label;
    }
    ""
}
