//! Suite execution: load fixture specs, run them, compare, summarize.
//!
//! A fixture passes only when its guest completes (no crash) and the
//! captured trace matches the expected trace byte for byte, exit code
//! included. Crashes are reported distinctly from divergences so harness
//! misuse is never mistaken for a behavior change.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::guests;
use crate::sandbox::driver::{run_guest, Fault, GuestFn, RunOptions, RunOutcome, RunReport};
use crate::sandbox::fixture::{FixtureSpec, SpecError};
use crate::sandbox::trace::{compare, TraceSpec, Verdict};

/// Outcome of one fixture run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FixtureVerdict {
    /// Guest completed; the comparator's verdict on the captured trace.
    Trace(Verdict),
    /// Guest or harness usage crashed the run; no trace comparison applies.
    Crashed { fault: Fault },
}

impl FixtureVerdict {
    #[inline(always)]
    pub fn passed(&self) -> bool {
        matches!(self, FixtureVerdict::Trace(Verdict::Match))
    }
}

impl fmt::Display for FixtureVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureVerdict::Trace(Verdict::Match) => write!(f, "ok"),
            FixtureVerdict::Trace(verdict) => write!(f, "{verdict}"),
            FixtureVerdict::Crashed { fault } => write!(f, "crashed: {fault}"),
        }
    }
}

/// One named fixture's verdict within a suite.
#[derive(Debug)]
pub struct FixtureResult {
    pub name: String,
    pub verdict: FixtureVerdict,
}

/// Aggregate over a whole suite run.
#[derive(Debug, Default)]
pub struct SuiteReport {
    pub results: Vec<FixtureResult>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.verdict.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

fn resolve_guest(name: &str) -> Result<GuestFn, SpecError> {
    guests::find(name)
        .map(|entry| entry.run)
        .ok_or_else(|| SpecError::UnknownGuest {
            name: name.to_string(),
        })
}

/// Run one fixture and compare against its expected trace.
///
/// Requires a recorded expected trace; running an unrecorded fixture is a
/// configuration error, not a failure.
pub fn run_fixture(
    spec: &FixtureSpec,
    opts: &RunOptions,
) -> Result<(FixtureVerdict, RunReport), SpecError> {
    let entry = resolve_guest(&spec.guest)?;
    let expected = spec.expected.as_ref().ok_or_else(|| SpecError::MissingExpected {
        name: spec.guest.clone(),
    })?;
    let report = run_guest(entry, spec, opts)?;
    let verdict = match &report.outcome {
        RunOutcome::Completed { .. } => {
            let verdict = compare(&report.trace, expected).map_err(|err| SpecError::BadBytes {
                context: format!("fixture {:?} expected trace", spec.guest),
                err,
            })?;
            FixtureVerdict::Trace(verdict)
        }
        RunOutcome::Crashed { fault } => FixtureVerdict::Crashed {
            fault: fault.clone(),
        },
    };
    Ok((verdict, report))
}

/// Run one fixture and, if it completes, replace its expected trace with
/// the captured one. Crashed runs leave the spec untouched.
pub fn record_fixture(
    spec: &mut FixtureSpec,
    opts: &RunOptions,
) -> Result<RunReport, SpecError> {
    let entry = resolve_guest(&spec.guest)?;
    let report = run_guest(entry, spec, opts)?;
    if let RunOutcome::Completed { exit_code } = report.outcome {
        spec.expected = Some(TraceSpec {
            chunks: report.trace.chunk_specs(),
            exit_code,
        });
    }
    Ok(report)
}

/// Resolve the fixture files a suite invocation covers.
///
/// With explicit names, each maps to `<dir>/<name>.json` in the given
/// order. Without, every `*.json` in the directory runs in lexicographic
/// file-name order.
pub fn suite_paths(dir: &Path, names: &[String]) -> Result<Vec<PathBuf>, SpecError> {
    if !names.is_empty() {
        return Ok(names
            .iter()
            .map(|name| dir.join(format!("{name}.json")))
            .collect());
    }
    let entries = fs::read_dir(dir).map_err(|err| SpecError::Io {
        path: dir.to_path_buf(),
        err,
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| SpecError::Io {
            path: dir.to_path_buf(),
            err,
        })?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Display name of a fixture file: its stem.
pub fn fixture_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("<fixture>")
        .to_string()
}

/// Run a whole suite. Any load or configuration error aborts the suite;
/// divergences and crashes are collected per fixture instead.
pub fn run_suite(
    dir: &Path,
    names: &[String],
    opts: &RunOptions,
) -> Result<SuiteReport, SpecError> {
    let mut report = SuiteReport::default();
    for path in suite_paths(dir, names)? {
        let spec = FixtureSpec::load(&path)?;
        let (verdict, _) = run_fixture(&spec, opts)?;
        report.results.push(FixtureResult {
            name: fixture_name(&path),
            verdict,
        });
    }
    Ok(report)
}
