//! Execution driver: runs one guest to completion inside one scope.
//!
//! Lifecycle per run: `Created` (scope built from the fixture spec, surface
//! bound) -> `Running` (guest entry executes, every OS-facing effect routed
//! through the scope) -> `Completed` with the guest's exit code, or
//! `Crashed` with a fault that is never conflated with an exit code.
//!
//! Voluntary termination is a normal return from the entry function or an
//! `Sys::exit` unwind; either way the registered exit callbacks run in
//! reverse registration order exactly once, with their own effects captured
//! like the guest's. Scope faults and stray guest panics unwind into the
//! driver and crash the run without running callbacks.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Once;

use serde::{Deserialize, Serialize};

use crate::sandbox::fixture::{FixtureSpec, SpecError};
use crate::sandbox::sys::Sys;
use crate::sandbox::trace::{CallRecord, Trace};
use crate::vos::fs::HandleError;

/// Guest entry point: receives the scope's intercepted surface, returns an
/// exit code.
pub type GuestFn = fn(&mut Sys) -> i32;

/// Harness-side options for one run.
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Echo every intercepted call to harness stderr.
    pub debug: bool,
    /// Capacity of the forensic call ring.
    pub call_ring_cap: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            debug: false,
            call_ring_cap: 256,
        }
    }
}

/// Terminal state of one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The guest terminated voluntarily and all exit callbacks ran.
    Completed { exit_code: i32 },
    /// The harness could not execute the guest to completion.
    Crashed { fault: Fault },
}

/// Why a run crashed. Distinct from any guest-reported exit code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fault {
    /// A descriptor that was never issued, or is foreign to the operation.
    UnknownHandle { fd: u32 },
    /// A descriptor used or closed again after being closed.
    ClosedHandle { fd: u32 },
    /// An exit callback re-entered the termination path.
    ExitDuringCleanup,
    /// A panic escaped guest or callback logic.
    GuestPanic { message: String },
}

impl From<HandleError> for Fault {
    fn from(err: HandleError) -> Self {
        match err {
            HandleError::Unknown { fd } => Fault::UnknownHandle { fd },
            HandleError::Closed { fd } => Fault::ClosedHandle { fd },
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fault::UnknownHandle { fd } => write!(f, "unknown handle {fd}"),
            Fault::ClosedHandle { fd } => write!(f, "handle {fd} used after close"),
            Fault::ExitDuringCleanup => write!(f, "exit called from an exit callback"),
            Fault::GuestPanic { message } => write!(f, "guest panic: {message}"),
        }
    }
}

/// Unwinding payload for `Sys::exit`.
pub(crate) struct ExitSignal(pub(crate) i32);

/// Unwinding payload for scope faults.
pub(crate) struct FaultSignal(pub(crate) Fault);

/// Everything captured from one run.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Sealed with the exit code only when the run completed.
    pub trace: Trace,
    pub stderr: Vec<u8>,
    /// Chronological dump of the forensic call ring.
    pub calls: Vec<CallRecord>,
}

/// Run one guest to completion inside a fresh scope.
///
/// `Err` means the fixture spec could not produce a runnable scope; it is a
/// host-side configuration problem, never a guest outcome.
pub fn run_guest(
    entry: GuestFn,
    spec: &FixtureSpec,
    opts: &RunOptions,
) -> Result<RunReport, SpecError> {
    install_panic_filter();
    let mut sys = spec.build_sys(opts)?;

    let exit_code = match catch_unwind(AssertUnwindSafe(|| entry(&mut sys))) {
        Ok(code) => code,
        Err(payload) => match unwrap_signal(payload) {
            Signal::Exit(code) => code,
            Signal::Fault(fault) => return Ok(crash_report(sys, fault)),
            Signal::Panic(message) => {
                return Ok(crash_report(sys, Fault::GuestPanic { message }))
            }
        },
    };

    // Voluntary termination: drain callbacks newest-first. Popping from the
    // end lets a callback registered during cleanup run too.
    sys.begin_cleanup();
    while let Some(callback) = sys.pop_exit_callback() {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(&mut sys))) {
            let fault = match unwrap_signal(payload) {
                Signal::Exit(_) | Signal::Fault(Fault::ExitDuringCleanup) => {
                    Fault::ExitDuringCleanup
                }
                Signal::Fault(fault) => fault,
                Signal::Panic(message) => Fault::GuestPanic { message },
            };
            return Ok(crash_report(sys, fault));
        }
    }

    sys.seal(exit_code);
    let (trace, stderr, calls) = sys.into_report_parts();
    Ok(RunReport {
        outcome: RunOutcome::Completed { exit_code },
        trace,
        stderr,
        calls,
    })
}

fn crash_report(sys: Sys, fault: Fault) -> RunReport {
    let (trace, stderr, calls) = sys.into_report_parts();
    RunReport {
        outcome: RunOutcome::Crashed { fault },
        trace,
        stderr,
        calls,
    }
}

enum Signal {
    Exit(i32),
    Fault(Fault),
    Panic(String),
}

/// Classify an unwind payload from guest or callback execution.
fn unwrap_signal(payload: Box<dyn Any + Send>) -> Signal {
    match payload.downcast::<ExitSignal>() {
        Ok(sig) => Signal::Exit(sig.0),
        Err(payload) => match payload.downcast::<FaultSignal>() {
            Ok(sig) => Signal::Fault(sig.0),
            Err(payload) => Signal::Panic(panic_message(payload)),
        },
    }
}

/// Format stray panic payloads into a stable message.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic payload".to_string()
    }
}

/// Keep intentional unwinds (exit, fault) out of the default panic output.
/// Other panics still reach the previously installed hook.
fn install_panic_filter() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let prev = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if info.payload().downcast_ref::<ExitSignal>().is_some()
                || info.payload().downcast_ref::<FaultSignal>().is_some()
            {
                return;
            }
            prev(info);
        }));
    });
}
