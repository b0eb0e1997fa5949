//! Virtual operating-system resources owned by one guest execution scope.
//!
//! Purpose:
//! - Replace every ambient OS dependency (clock, environment, filesystem,
//!   standard input) with per-scope in-memory state.
//! - Resolve all operations synchronously and deterministically; nothing in
//!   this module touches the host OS.
//!
//! Invariants:
//! - `VirtualClock` readings are non-decreasing and advance only by policy.
//! - `VirtualFs` enumeration order is child insertion order, fixed forever.
//! - Guest-observable failures are `Errno` return values; handle misuse is
//!   a `HandleError` for the interception layer to escalate.

pub mod clock;
pub mod env;
pub mod errno;
pub mod fs;
pub mod stream;

pub use clock::{ClockSpec, Timespec, VirtualClock};
pub use env::EnvTable;
pub use errno::Errno;
pub use fs::{normalize, DirFd, FileFd, HandleError, VirtualFs, DEFAULT_DIR_MODE, ROOT};
pub use stream::InputStream;
