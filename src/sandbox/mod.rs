//! Harness layer: fixture schemas, the interception surface, the run
//! driver, and trace comparison.
//!
//! The split mirrors the run pipeline. `fixture` turns a JSON spec into an
//! isolated scope, `sys` is the only surface a guest may touch, `driver`
//! owns the run lifecycle (entry, exit interception, cleanup callbacks,
//! crash containment), `trace` captures and compares observable output,
//! and `suite` batches fixtures for the CLI.

pub mod driver;
pub mod fixture;
pub mod suite;
pub mod sys;
pub mod trace;

pub use driver::{run_guest, Fault, GuestFn, RunOptions, RunOutcome, RunReport};
pub use fixture::{
    seed_fs, FixtureSpec, FsNodeSpec, FsSpec, SpecError, FIXTURE_SCHEMA_VERSION,
};
pub use suite::{
    fixture_name, record_fixture, run_fixture, run_suite, suite_paths, FixtureResult,
    FixtureVerdict, SuiteReport,
};
pub use sys::{ExitCallback, Sys};
pub use trace::{
    compare, BytesSpec, CallRecord, CallRing, Divergence, SysOp, Trace, TraceEvent, TraceSpec,
    Verdict,
};
