// Copyright (c) The uft-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ResultsParseError;
use camino::Utf8Path;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::time::Duration;
use tracing::warn;

static TESTCASE_TAG: &[u8] = b"testcase";
static SKIPPED_TAG: &[u8] = b"skipped";
static FAILURE_TAG: &[u8] = b"failure";
static ERROR_TAG: &[u8] = b"error";
static SYSTEM_OUT_TAG: &[u8] = b"system-out";

/// One test case as reported by the engine.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CaseResult {
    /// The name of the test case.
    pub test_name: String,

    /// How long the test case took.
    pub duration: Duration,

    /// True if the engine marked the test case as skipped.
    pub skipped: bool,

    /// The stack trace of a failure or error, if any.
    pub error_stack_trace: Option<String>,

    /// The message of a failure or error, if any.
    pub error_details: Option<String>,

    /// Captured standard output.
    pub stdout: String,

    /// The run identifier of the test case, if the engine reported one.
    pub run_id: Option<String>,
}

/// Reads the engine's JUnit-shaped results file at `path`.
pub fn read_case_results(path: &Utf8Path) -> Result<Vec<CaseResult>, ResultsParseError> {
    let contents = std::fs::read_to_string(path).map_err(|error| ResultsParseError::Read {
        path: path.to_owned(),
        error,
    })?;
    parse_case_results(&contents).map_err(|error| ResultsParseError::Xml {
        path: path.to_owned(),
        error,
    })
}

/// Parses JUnit-shaped XML into one [`CaseResult`] per `testcase` element, in document order.
///
/// * `name` and `runid` attributes become the test name and run identifier.
/// * The `time` attribute, in seconds, becomes the duration. An unparseable time is logged and
///   treated as zero.
/// * A `skipped` child marks the case as skipped.
/// * For the first `failure` or `error` child, its `message` attribute becomes the error details
///   and its text the stack trace.
/// * The text of `system-out` becomes the captured standard output.
pub fn parse_case_results(contents: &str) -> Result<Vec<CaseResult>, quick_xml::Error> {
    let mut reader = Reader::from_str(contents);
    let mut cases = Vec::new();
    let mut current: Option<CaseResult> = None;
    let mut collecting: Option<(Collector, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(tag) => {
                let name = tag.local_name();
                if name.as_ref() == TESTCASE_TAG {
                    current = Some(start_case(&tag)?);
                } else if let Some(case) = &mut current {
                    if let Some(collector) = start_child(case, &tag)? {
                        collecting = Some((collector, String::new()));
                    }
                }
            }
            Event::Empty(tag) => {
                let name = tag.local_name();
                if name.as_ref() == TESTCASE_TAG {
                    cases.push(start_case(&tag)?);
                } else if let Some(case) = &mut current {
                    start_child(case, &tag)?;
                }
            }
            Event::Text(text) => {
                if let Some((_, buf)) = &mut collecting {
                    buf.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some((_, buf)) = &mut collecting {
                    buf.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(tag) => {
                let name = tag.local_name();
                if name.as_ref() == TESTCASE_TAG {
                    collecting = None;
                    if let Some(case) = current.take() {
                        cases.push(case);
                    }
                } else if let Some((collector, text)) =
                    collecting.take_if(|(collector, _)| collector.tag() == name.as_ref())
                {
                    if let Some(case) = &mut current {
                        collector.finish(case, text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(cases)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Collector {
    StackTrace { tag: &'static [u8] },
    Stdout,
}

impl Collector {
    fn tag(self) -> &'static [u8] {
        match self {
            Self::StackTrace { tag } => tag,
            Self::Stdout => SYSTEM_OUT_TAG,
        }
    }

    fn finish(self, case: &mut CaseResult, text: String) {
        match self {
            Self::StackTrace { .. } => {
                if !text.trim().is_empty() {
                    case.error_stack_trace = Some(text);
                }
            }
            Self::Stdout => case.stdout.push_str(&text),
        }
    }
}

fn start_case(tag: &BytesStart<'_>) -> Result<CaseResult, quick_xml::Error> {
    let mut case = CaseResult::default();
    for attr in tag.attributes() {
        let attr = attr?;
        match attr.key.local_name().as_ref() {
            b"name" => case.test_name = attr.unescape_value()?.into_owned(),
            b"runid" => case.run_id = Some(attr.unescape_value()?.into_owned()),
            b"time" => case.duration = parse_time(&attr.unescape_value()?),
            _ => {}
        }
    }
    Ok(case)
}

/// Applies a child element of a test case, returning what its text should be collected into.
fn start_child(
    case: &mut CaseResult,
    tag: &BytesStart<'_>,
) -> Result<Option<Collector>, quick_xml::Error> {
    let name = tag.local_name();
    let name = name.as_ref();
    if name == SKIPPED_TAG {
        case.skipped = true;
        Ok(None)
    } else if name == FAILURE_TAG || name == ERROR_TAG {
        // Only the first failure or error is recorded.
        if case.error_details.is_some() || case.error_stack_trace.is_some() {
            return Ok(None);
        }
        for attr in tag.attributes() {
            let attr = attr?;
            if attr.key.local_name().as_ref() == b"message" {
                let message = attr.unescape_value()?;
                // An empty message counts as no message.
                if !message.is_empty() {
                    case.error_details = Some(message.into_owned());
                }
            }
        }
        let tag = if name == FAILURE_TAG {
            FAILURE_TAG
        } else {
            ERROR_TAG
        };
        Ok(Some(Collector::StackTrace { tag }))
    } else if name == SYSTEM_OUT_TAG {
        Ok(Some(Collector::Stdout))
    } else {
        Ok(None)
    }
}

fn parse_time(time: &str) -> Duration {
    match time.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Duration::from_secs_f64(secs),
        _ => {
            warn!("ignoring unparseable test case time {time:?}");
            Duration::ZERO
        }
    }
}
