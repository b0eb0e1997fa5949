//! Fixture specs: the declared inputs and expected trace for one guest run.
//!
//! A fixture spec is a versioned JSON document binding a registered guest to
//! its declared arguments, environment, stdin bytes, clock policy, and
//! filesystem seed, plus the expected trace the comparator checks against.
//! The filesystem seed is an ordered node list; that order is what fixes
//! directory enumeration order for the run.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sandbox::driver::RunOptions;
use crate::sandbox::sys::Sys;
use crate::sandbox::trace::{BytesSpec, TraceSpec};
use crate::vos::clock::{ClockSpec, VirtualClock};
use crate::vos::env::EnvTable;
use crate::vos::errno::Errno;
use crate::vos::fs::VirtualFs;
use crate::vos::stream::InputStream;

/// Current fixture schema version.
pub const FIXTURE_SCHEMA_VERSION: u32 = 1;

/// Top-level fixture spec.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixtureSpec {
    /// Schema version for forward-compatible evolution.
    pub schema_version: u32,
    /// Registered guest program name.
    pub guest: String,
    /// Declared argument vector (no implicit program name).
    #[serde(default)]
    pub args: Vec<String>,
    /// Declared environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Virtual standard input, chunks concatenated. Default: empty source.
    #[serde(default)]
    pub stdin: Vec<BytesSpec>,
    /// Clock advancement policy. Default: fixed at zero.
    #[serde(default)]
    pub clock: ClockSpec,
    /// Filesystem seed applied in order before the run.
    #[serde(default)]
    pub fs: FsSpec,
    /// Expected trace; absent until recorded.
    #[serde(default)]
    pub expected: Option<TraceSpec>,
}

/// Declarative filesystem layout for a scope.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FsSpec {
    #[serde(default)]
    pub nodes: Vec<FsNodeSpec>,
}

/// Filesystem node specification. Nodes apply through the same create paths
/// guests use, so parents must precede children.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum FsNodeSpec {
    Dir {
        path: String,
    },
    File {
        path: String,
        #[serde(default)]
        contents: Vec<BytesSpec>,
    },
}

/// Why a fixture spec could not be loaded or turned into a runnable scope.
/// Host-side configuration problems, never guest outcomes.
#[derive(Debug)]
pub enum SpecError {
    Io { path: PathBuf, err: io::Error },
    Parse { path: PathBuf, err: serde_json::Error },
    SchemaVersion { path: PathBuf, found: u32 },
    UnknownGuest { name: String },
    MissingExpected { name: String },
    BadBytes { context: String, err: String },
    BadClock { nanos: u32 },
    BadSeed { path: String, err: Errno },
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::Io { path, err } => write!(f, "{}: {err}", path.display()),
            SpecError::Parse { path, err } => write!(f, "{}: {err}", path.display()),
            SpecError::SchemaVersion { path, found } => write!(
                f,
                "{}: unsupported schema version {found} (expected {FIXTURE_SCHEMA_VERSION})",
                path.display()
            ),
            SpecError::UnknownGuest { name } => write!(f, "unknown guest program {name:?}"),
            SpecError::MissingExpected { name } => {
                write!(f, "fixture {name:?} has no expected trace (record it first)")
            }
            SpecError::BadBytes { context, err } => write!(f, "{context}: {err}"),
            SpecError::BadClock { nanos } => write!(
                f,
                "clock spec rejected: start nanoseconds {nanos} (must stay below one second)"
            ),
            SpecError::BadSeed { path, err } => {
                write!(f, "filesystem seed rejected at {path:?}: {err}")
            }
        }
    }
}

impl std::error::Error for SpecError {}

impl FixtureSpec {
    /// Minimal in-code spec: empty resources, no expected trace.
    pub fn inline(guest: &str) -> Self {
        Self {
            schema_version: FIXTURE_SCHEMA_VERSION,
            guest: guest.to_string(),
            args: Vec::new(),
            env: BTreeMap::new(),
            stdin: Vec::new(),
            clock: ClockSpec::default(),
            fs: FsSpec::default(),
            expected: None,
        }
    }

    /// Load and validate a spec file.
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let bytes = fs::read(path).map_err(|err| SpecError::Io {
            path: path.to_path_buf(),
            err,
        })?;
        let spec: FixtureSpec =
            serde_json::from_slice(&bytes).map_err(|err| SpecError::Parse {
                path: path.to_path_buf(),
                err,
            })?;
        if spec.schema_version != FIXTURE_SCHEMA_VERSION {
            return Err(SpecError::SchemaVersion {
                path: path.to_path_buf(),
                found: spec.schema_version,
            });
        }
        Ok(spec)
    }

    /// Write the spec back as pretty JSON (record mode).
    pub fn save(&self, path: &Path) -> Result<(), SpecError> {
        let mut text = serde_json::to_string_pretty(self).map_err(|err| SpecError::Parse {
            path: path.to_path_buf(),
            err,
        })?;
        text.push('\n');
        fs::write(path, text).map_err(|err| SpecError::Io {
            path: path.to_path_buf(),
            err,
        })
    }

    /// Decode the declared stdin chunks into one byte source.
    pub fn stdin_bytes(&self) -> Result<Vec<u8>, SpecError> {
        let mut out = Vec::new();
        for chunk in &self.stdin {
            out.extend_from_slice(&chunk.decode().map_err(|err| SpecError::BadBytes {
                context: format!("fixture {:?} stdin", self.guest),
                err,
            })?);
        }
        Ok(out)
    }

    /// Build the isolated scope this spec declares.
    pub(crate) fn build_sys(&self, opts: &RunOptions) -> Result<Sys, SpecError> {
        self.clock
            .validate()
            .map_err(|nanos| SpecError::BadClock { nanos })?;
        let clock = VirtualClock::from_spec(&self.clock);
        let env = EnvTable::from_pairs(
            self.env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        let fs = seed_fs(&self.fs)?;
        let stdin = InputStream::new(self.stdin_bytes()?);
        Ok(Sys::new(
            clock,
            env,
            fs,
            stdin,
            self.args.clone(),
            opts.debug,
            opts.call_ring_cap,
        ))
    }
}

/// Apply a filesystem seed in declaration order.
///
/// Seeds go through the same create paths guests use; a seed that violates
/// a filesystem invariant (missing parent, duplicate path) is a spec error,
/// never a crashed run.
pub fn seed_fs(spec: &FsSpec) -> Result<VirtualFs, SpecError> {
    let mut fs = VirtualFs::new();
    for node in &spec.nodes {
        match node {
            FsNodeSpec::Dir { path } => {
                fs.add_dir(path).map_err(|err| SpecError::BadSeed {
                    path: path.clone(),
                    err,
                })?;
            }
            FsNodeSpec::File { path, contents } => {
                let mut data = Vec::new();
                for chunk in contents {
                    data.extend_from_slice(&chunk.decode().map_err(|err| {
                        SpecError::BadBytes {
                            context: format!("file seed {path:?}"),
                            err,
                        }
                    })?);
                }
                fs.add_file(path, data).map_err(|err| SpecError::BadSeed {
                    path: path.clone(),
                    err,
                })?;
            }
        }
    }
    Ok(fs)
}
