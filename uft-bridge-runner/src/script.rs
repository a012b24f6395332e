// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compiling test units into engine scripts.
//!
//! The engine shares its execution state across a run, so the function libraries and recovery
//! scenarios of a test are loaded once per contiguous block of units from that test, not once per
//! unit.

use crate::{
    config::TestLayout,
    definition::TestUnit,
    errors::ScriptCompileError,
    helpers::{ENGINE_LINE_TERMINATOR, plural},
    resources::{RecoveryScenario, ResourceResolver, ResourceSet},
};
use camino::Utf8Path;
use itertools::Itertools;
use swrite::{SWrite, swrite};
use tracing::debug;

/// Directive that unloads all function libraries from the engine.
pub const RESET_DIRECTIVE: &str = "RestartFunctionLibraries";

/// Directive that loads a function library.
pub const LOAD_LIBRARY_DIRECTIVE: &str = "LoadFunctionLibrary";

/// Directive that loads one or more recovery scenarios.
pub const LOAD_RECOVERY_DIRECTIVE: &str = "LoadRecoveryScenario";

/// Compiles sequences of [`TestUnit`]s into script text.
#[derive(Clone, Copy, Debug)]
pub struct ScriptCompiler<'a> {
    layout: &'a TestLayout,
    resolver: ResourceResolver<'a>,
}

impl<'a> ScriptCompiler<'a> {
    /// Creates a new compiler for tests laid out according to `layout`.
    pub fn new(layout: &'a TestLayout) -> Self {
        Self {
            layout,
            resolver: ResourceResolver::new(layout),
        }
    }

    /// Compiles `units` into a single script.
    ///
    /// Resource directives are emitted before the first unit, and again before every unit whose
    /// test path differs from that of the unit preceding it. Every unit's own fragment is always
    /// emitted.
    ///
    /// Fails if a unit's test path is not a test folder.
    pub fn compile(&self, units: &[TestUnit]) -> Result<String, ScriptCompileError> {
        let state = units.iter().try_fold(
            CompileState::default(),
            |mut state, unit| -> Result<_, ScriptCompileError> {
                if state.previous_path != Some(unit.test_path.as_path()) {
                    self.check_test_folder(unit)?;
                    let resources = self.resolver.resolve(&unit.test_path);
                    state.fragments.extend(resource_directives(&resources));
                    state.previous_path = Some(&unit.test_path);
                    state.resolutions += 1;
                }
                state.fragments.push(unit.script.clone());
                Ok(state)
            },
        )?;

        debug!(
            "compiled {} {} with {} resource {}",
            units.len(),
            plural::units_str(units.len()),
            state.resolutions,
            if state.resolutions == 1 {
                "resolution"
            } else {
                "resolutions"
            },
        );

        Ok(state.fragments.join(ENGINE_LINE_TERMINATOR))
    }

    fn check_test_folder(&self, unit: &TestUnit) -> Result<(), ScriptCompileError> {
        if self.layout.is_test_folder(&unit.test_path) {
            return Ok(());
        }
        Err(ScriptCompileError::NotATestFolder {
            unit_id: unit.unit_id.clone(),
            test_path: unit.test_path.clone(),
            descriptor_file: self.layout.descriptor_file().to_owned(),
            script_file: self
                .layout
                .script_file_name(&unit.test_path)
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default)]
struct CompileState<'u> {
    previous_path: Option<&'u Utf8Path>,
    fragments: Vec<String>,
    resolutions: usize,
}

/// Returns the directives that load `resources` into the engine.
///
/// Produces at most two fragments: the library block, then the recovery scenario directive. An
/// empty resource set produces no fragments.
pub fn resource_directives(resources: &ResourceSet) -> Vec<String> {
    let mut fragments = Vec::with_capacity(2);
    if !resources.function_libraries.is_empty() {
        let block = std::iter::once(RESET_DIRECTIVE.to_owned())
            .chain(resources.function_libraries.iter().map(|library| {
                format!(
                    "{LOAD_LIBRARY_DIRECTIVE} \"{}\"",
                    escape_script_literal(library.as_str())
                )
            }))
            .join(ENGINE_LINE_TERMINATOR);
        fragments.push(block);
    }
    if !resources.recovery_scenarios.is_empty() {
        fragments.push(recovery_directive(&resources.recovery_scenarios));
    }
    fragments
}

fn recovery_directive(scenarios: &[RecoveryScenario]) -> String {
    let mut out = String::from(LOAD_RECOVERY_DIRECTIVE);
    for (index, scenario) in scenarios.iter().enumerate() {
        let separator = if index == 0 { " " } else { ", " };
        // The name is written unescaped.
        swrite!(
            out,
            "{separator}\"{}|{}|1|1*\"",
            escape_script_literal(scenario.path.as_str()),
            scenario.name,
        );
    }
    out
}

/// Escapes `s` for use inside a double-quoted script string literal.
pub fn escape_script_literal(s: &str) -> String {
    s.replace('"', "\"\"")
}
