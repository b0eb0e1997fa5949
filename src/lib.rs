//! Deterministic syscall-virtualization sandbox for fixture guest programs.
//!
//! ## Scope
//! This crate runs small guest programs against fully virtual OS resources
//! (clock, environment, filesystem, stdin) so that two runs of the same
//! fixture, on any host, produce byte-identical captured traces. Captured
//! traces are compared against recorded expectations to detect behavioral
//! drift.
//!
//! ## Key invariants
//! - A run never touches host state: no wall clock, no process environment,
//!   no real filesystem or stdin reaches a guest.
//! - Each run owns a fresh resource scope; nothing is shared or pooled
//!   across runs.
//! - Exit callbacks run exactly once, in reverse registration order, after
//!   guest logic completes, and their output lands in the same trace.
//! - Guest-observable errors (missing path, wrong node type, non-empty
//!   directory) flow back as stable errno values; only harness misuse
//!   (double close, unknown handle, exit during cleanup) crashes a run.
//! - Trace comparison is byte-exact and ordered, exit code included, and
//!   insensitive to how output was chunked into writes.
//!
//! ## Run flow (single fixture)
//! 1) Load the fixture spec and seed a fresh scope from it.
//! 2) Run the guest entry point; every OS-facing call routes through
//!    [`Sys`] into the virtual resources and is recorded.
//! 3) Intercept voluntary exit, then drain exit callbacks newest-first.
//! 4) Seal the trace and compare against the expected trace.
//!
//! ## Notable entry points
//! - [`run_fixture`] / [`run_suite`]: fixture execution with comparison.
//! - [`run_guest`]: one guest run against a spec, no comparison.
//! - [`Sys`]: the only surface guest code may touch.
//! - [`VirtualFs`] / [`VirtualClock`] / [`EnvTable`]: the virtual resources.
//! - [`FixtureSpec`] / [`TraceSpec`]: the on-disk schemas.

pub mod guests;
pub mod sandbox;
pub mod vos;

pub use sandbox::driver::{run_guest, Fault, GuestFn, RunOptions, RunOutcome, RunReport};
pub use sandbox::fixture::{
    seed_fs, FixtureSpec, FsNodeSpec, FsSpec, SpecError, FIXTURE_SCHEMA_VERSION,
};
pub use sandbox::suite::{
    fixture_name, record_fixture, run_fixture, run_suite, suite_paths, FixtureResult,
    FixtureVerdict, SuiteReport,
};
pub use sandbox::sys::Sys;
pub use sandbox::trace::{
    compare, BytesSpec, CallRecord, CallRing, Divergence, SysOp, Trace, TraceEvent, TraceSpec,
    Verdict,
};
pub use vos::clock::{ClockSpec, Timespec, VirtualClock};
pub use vos::env::EnvTable;
pub use vos::errno::Errno;
pub use vos::fs::{normalize, DirFd, FileFd, HandleError, VirtualFs, DEFAULT_DIR_MODE};
pub use vos::stream::InputStream;
