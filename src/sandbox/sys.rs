//! Interception layer: the OS-facing surface guests call.
//!
//! `Sys` owns one scope's virtual resources and presents one method per
//! OS-facing operation category. Dispatch is the only thing that happens
//! here: guest-observable errors flow back as `Errno` return values exactly
//! as a real OS would report them, and every call is appended to a bounded
//! forensic ring (echoed to harness stderr under `--debug`).
//!
//! Handle misuse (foreign descriptor, use after close, double close) is not
//! part of the guest-observable contract: it aborts the run by unwinding a
//! typed fault payload to the execution driver. `Sys::exit` unwinds the same
//! way with the declared exit code so explicit termination never returns
//! into guest logic.

use std::panic::panic_any;

use crate::sandbox::driver::{ExitSignal, Fault, FaultSignal};
use crate::sandbox::trace::{CallRecord, CallRing, SysOp, Trace};
use crate::vos::clock::{Timespec, VirtualClock};
use crate::vos::env::EnvTable;
use crate::vos::errno::Errno;
use crate::vos::fs::{DirFd, FileFd, HandleError, VirtualFs};
use crate::vos::stream::InputStream;

/// Exit callback registered by a guest.
pub type ExitCallback = Box<dyn FnOnce(&mut Sys)>;

/// One guest execution scope: virtual resources, capture buffers, and the
/// exit-callback list. Created per run, never shared.
pub struct Sys {
    clock: VirtualClock,
    env: EnvTable,
    fs: VirtualFs,
    stdin: InputStream,
    args: Vec<String>,
    trace: Trace,
    stderr: Vec<u8>,
    exit_callbacks: Vec<ExitCallback>,
    calls: CallRing,
    debug: bool,
    in_cleanup: bool,
}

impl Sys {
    pub(crate) fn new(
        clock: VirtualClock,
        env: EnvTable,
        fs: VirtualFs,
        stdin: InputStream,
        args: Vec<String>,
        debug: bool,
        call_ring_cap: usize,
    ) -> Self {
        Self {
            clock,
            env,
            fs,
            stdin,
            args,
            trace: Trace::new(),
            stderr: Vec::new(),
            exit_callbacks: Vec::new(),
            calls: CallRing::new(call_ring_cap),
            debug,
            in_cleanup: false,
        }
    }

    /// Read the virtual clock.
    pub fn clock_read(&mut self) -> Timespec {
        let ts = self.clock.read();
        let total = ts
            .secs
            .saturating_mul(1_000_000_000)
            .saturating_add(ts.nanos as u64);
        self.record(SysOp::ClockRead, String::new(), total.min(i64::MAX as u64) as i64);
        ts
    }

    /// Look up a virtual environment variable.
    pub fn env_get(&mut self, name: &str) -> Option<String> {
        let value = self.env.lookup(name).map(str::to_string);
        let ret = if value.is_some() { 1 } else { 0 };
        self.record(SysOp::EnvGet, format!("{name:?}"), ret);
        value
    }

    /// The guest's declared arguments.
    pub fn args(&mut self) -> Vec<String> {
        let args = self.args.clone();
        self.record(SysOp::ArgsGet, String::new(), args.len() as i64);
        args
    }

    /// Open a directory for enumeration.
    pub fn open_dir(&mut self, path: &str) -> Result<DirFd, Errno> {
        let res = self.fs.open_dir(path);
        self.record(SysOp::OpenDir, format!("{path:?}"), fd_ret(res.map(|fd| fd.0)));
        res
    }

    /// Next entry name from an open directory, `None` when exhausted.
    pub fn read_dir(&mut self, fd: DirFd) -> Option<String> {
        match self.fs.read_dir(fd) {
            Ok(entry) => {
                let ret = if entry.is_some() { 1 } else { 0 };
                self.record(SysOp::ReadDir, fd.0.to_string(), ret);
                entry
            }
            Err(err) => self.handle_fault(SysOp::ReadDir, err),
        }
    }

    /// Close a directory handle.
    pub fn close_dir(&mut self, fd: DirFd) {
        match self.fs.close_dir(fd) {
            Ok(()) => self.record(SysOp::CloseDir, fd.0.to_string(), 0),
            Err(err) => self.handle_fault(SysOp::CloseDir, err),
        }
    }

    /// Create a directory.
    pub fn create_dir(&mut self, path: &str, mode: u32) -> Result<(), Errno> {
        let res = self.fs.create_dir(path, mode);
        self.record(
            SysOp::CreateDir,
            format!("{path:?}, 0o{mode:o}"),
            ok_ret(res),
        );
        res
    }

    /// Remove an empty directory.
    pub fn remove_dir(&mut self, path: &str) -> Result<(), Errno> {
        let res = self.fs.remove_dir(path);
        self.record(SysOp::RemoveDir, format!("{path:?}"), ok_ret(res));
        res
    }

    /// Open a file for sequential reads.
    pub fn open_file(&mut self, path: &str) -> Result<FileFd, Errno> {
        let res = self.fs.open_file(path);
        self.record(SysOp::OpenFile, format!("{path:?}"), fd_ret(res.map(|fd| fd.0)));
        res
    }

    /// Next byte from an open file, `None` at end of file.
    pub fn read_byte(&mut self, fd: FileFd) -> Option<u8> {
        match self.fs.read_byte(fd) {
            Ok(byte) => {
                let ret = byte.map(|b| b as i64).unwrap_or(-1);
                self.record(SysOp::ReadByte, fd.0.to_string(), ret);
                byte
            }
            Err(err) => self.handle_fault(SysOp::ReadByte, err),
        }
    }

    /// Next line from an open file, `None` at end of file.
    pub fn read_line(&mut self, fd: FileFd) -> Option<Vec<u8>> {
        match self.fs.read_line(fd) {
            Ok(line) => {
                let ret = line.as_ref().map(|l| l.len() as i64).unwrap_or(-1);
                self.record(SysOp::ReadLine, fd.0.to_string(), ret);
                line
            }
            Err(err) => self.handle_fault(SysOp::ReadLine, err),
        }
    }

    /// Close a file handle.
    pub fn close_file(&mut self, fd: FileFd) {
        match self.fs.close_file(fd) {
            Ok(()) => self.record(SysOp::CloseFile, fd.0.to_string(), 0),
            Err(err) => self.handle_fault(SysOp::CloseFile, err),
        }
    }

    /// Next byte from virtual standard input.
    pub fn stdin_read_byte(&mut self) -> Option<u8> {
        let byte = self.stdin.read_byte();
        let ret = byte.map(|b| b as i64).unwrap_or(-1);
        self.record(SysOp::StdinReadByte, String::new(), ret);
        byte
    }

    /// Next line from virtual standard input, terminator included.
    pub fn stdin_read_line(&mut self) -> Option<Vec<u8>> {
        let line = self.stdin.read_line();
        let ret = line.as_ref().map(|l| l.len() as i64).unwrap_or(-1);
        self.record(SysOp::StdinReadLine, String::new(), ret);
        line
    }

    /// Write bytes to captured stdout.
    pub fn write_stdout(&mut self, bytes: &[u8]) {
        self.trace.push_stdout(bytes);
        self.record(SysOp::StdoutWrite, String::new(), bytes.len() as i64);
    }

    /// Write bytes to captured stderr (never part of trace comparison).
    pub fn write_stderr(&mut self, bytes: &[u8]) {
        self.stderr.extend_from_slice(bytes);
        self.record(SysOp::StderrWrite, String::new(), bytes.len() as i64);
    }

    /// Formatted write to captured stdout.
    pub fn print(&mut self, text: &str) {
        self.write_stdout(text.as_bytes());
    }

    /// Formatted write to captured stderr.
    pub fn eprint(&mut self, text: &str) {
        self.write_stderr(text.as_bytes());
    }

    /// Register an exit callback. Callbacks run in reverse registration
    /// order exactly once after the guest's main logic completes; a callback
    /// registered during cleanup also runs.
    pub fn at_exit<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut Sys) + 'static,
    {
        self.exit_callbacks.push(Box::new(callback));
        let count = self.exit_callbacks.len() as i64;
        self.record(SysOp::AtExit, String::new(), count);
    }

    /// Terminate the guest with the given exit code. Never returns; exit
    /// callbacks still run exactly once. Re-entering the termination path
    /// from inside an exit callback is a scope fault.
    pub fn exit(&mut self, code: i32) -> ! {
        self.record(SysOp::Exit, String::new(), code as i64);
        if self.in_cleanup {
            panic_any(FaultSignal(Fault::ExitDuringCleanup));
        }
        panic_any(ExitSignal(code));
    }

    fn handle_fault(&mut self, op: SysOp, err: HandleError) -> ! {
        let fd = match err {
            HandleError::Unknown { fd } | HandleError::Closed { fd } => fd,
        };
        self.record(op, fd.to_string(), -(Errno::Badf.code() as i64));
        panic_any(FaultSignal(Fault::from(err)));
    }

    fn record(&mut self, op: SysOp, arg: String, ret: i64) {
        let record = CallRecord { op, arg, ret };
        if self.debug {
            eprintln!("[sys] {record}");
        }
        self.calls.push(record);
    }

    pub(crate) fn pop_exit_callback(&mut self) -> Option<ExitCallback> {
        self.exit_callbacks.pop()
    }

    pub(crate) fn begin_cleanup(&mut self) {
        self.in_cleanup = true;
    }

    pub(crate) fn seal(&mut self, exit_code: i32) {
        self.trace.seal(exit_code);
    }

    pub(crate) fn into_report_parts(self) -> (Trace, Vec<u8>, Vec<CallRecord>) {
        (self.trace, self.stderr, self.calls.dump())
    }
}

fn ok_ret(res: Result<(), Errno>) -> i64 {
    match res {
        Ok(()) => 0,
        Err(err) => -(err.code() as i64),
    }
}

fn fd_ret(res: Result<u32, Errno>) -> i64 {
    match res {
        Ok(fd) => fd as i64,
        Err(err) => -(err.code() as i64),
    }
}
