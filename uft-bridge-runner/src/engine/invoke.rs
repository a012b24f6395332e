// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{EngineOutcome, resolve_engine_binary};
use crate::{
    config::RunContext,
    errors::{EngineLocateError, EngineSpawnError},
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fmt, process::Stdio};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
};
use tracing::{error, info, warn};

/// The tracing target engine output is forwarded to.
pub const ENGINE_LOG_TARGET: &str = "uft_bridge::engine";

/// Runs the external engine against a run descriptor.
#[derive(Clone, Debug)]
pub struct EngineInvoker {
    program: Utf8PathBuf,
}

impl EngineInvoker {
    /// Creates an invoker for an engine binary that is known to exist.
    pub fn new(program: impl Into<Utf8PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locates and verifies the engine binary for the given run.
    pub fn locate(cx: &RunContext) -> Result<Self, EngineLocateError> {
        let program = resolve_engine_binary(cx.config().engine(), cx.workspace_root(), cx.env())?;
        Ok(Self { program })
    }

    /// Returns the path to the engine binary.
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }

    /// Runs the engine with `descriptor_path` as its only argument and waits for it to exit.
    ///
    /// Standard input is closed. Standard output and standard error are forwarded line by line
    /// to the [`ENGINE_LOG_TARGET`] tracing target, at info and error level respectively.
    ///
    /// Any exit, whatever its code, produces an [`EngineOutcome`]. An error is returned only if
    /// the process couldn't be started or waited on. There is no timeout: this waits for as long
    /// as the engine runs.
    pub async fn invoke(
        &self,
        descriptor_path: &Utf8Path,
    ) -> Result<EngineOutcome, EngineSpawnError> {
        let mut command = Command::new(self.program.as_std_path());
        command
            .arg(descriptor_path.as_std_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        info!(target: ENGINE_LOG_TARGET, "running {} {}", self.program, descriptor_path);

        let mut child = command.spawn().map_err(|error| EngineSpawnError::Spawn {
            program: self.program.clone(),
            error,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (status, (), ()) = tokio::join!(
            child.wait(),
            forward_lines(stdout, OutputStream::Stdout),
            forward_lines(stderr, OutputStream::Stderr),
        );
        let status = status.map_err(|error| EngineSpawnError::Wait {
            program: self.program.clone(),
            error,
        })?;

        let outcome = EngineOutcome::from_code(status.code());
        info!(target: ENGINE_LOG_TARGET, "engine finished: {outcome}");
        Ok(outcome)
    }
}

#[derive(Clone, Copy, Debug)]
enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    fn log(self, line: &str) {
        match self {
            Self::Stdout => info!(target: ENGINE_LOG_TARGET, "{line}"),
            Self::Stderr => error!(target: ENGINE_LOG_TARGET, "{line}"),
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Logs each line read from `reader` until it reaches EOF.
///
/// Lines are split on `\n` with any trailing `\r` removed, and decoded lossily, so non-UTF-8
/// output never stops the stream from being drained.
async fn forward_lines(reader: Option<impl AsyncRead + Unpin>, stream: OutputStream) {
    let Some(reader) = reader else { return };
    let mut segments = BufReader::new(reader).split(b'\n');
    loop {
        match segments.next_segment().await {
            Ok(Some(segment)) => {
                let line = String::from_utf8_lossy(&segment);
                stream.log(line.strip_suffix('\r').unwrap_or(&line));
            }
            Ok(None) => break,
            Err(error) => {
                warn!(target: ENGINE_LOG_TARGET, "error reading engine {stream}: {error}");
                break;
            }
        }
    }
}
