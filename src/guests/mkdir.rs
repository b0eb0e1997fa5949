//! Directory creation and removal with exit-callback cleanup.
//!
//! Both guests register their cleanup before doing any work, the way a C
//! program calls `atexit` first thing in `main`. Every step prints the
//! C-style status pair so the trace pins both the success path and the
//! error code on failure.

use crate::sandbox::sys::Sys;
use crate::vos::errno::Errno;
use crate::vos::fs::DEFAULT_DIR_MODE;

/// Status pair in the C convention: `(0, 0)` on success, `(-1, errno)` on
/// failure.
fn status(result: Result<(), Errno>) -> (i32, u16) {
    match result {
        Ok(()) => (0, 0),
        Err(err) => (-1, err.code()),
    }
}

/// Create `/tmp`, with exit cleanup that removes it again. The creation
/// line lands in the trace before the removal line.
pub fn mkdir_main(sys: &mut Sys) -> i32 {
    sys.at_exit(|sys| {
        let (ok, err) = status(sys.remove_dir("/tmp"));
        sys.print(&format!("{ok} {err}\n"));
    });
    let (ok, err) = status(sys.create_dir("/tmp", DEFAULT_DIR_MODE));
    sys.print(&format!("{ok} {err}\n"));
    0
}

/// Nested variant: create `/tmp` then `/tmp/sub`, with one cleanup that
/// removes the child before the parent. Steps are labeled `a` through `d`
/// so the trace pins the ordering.
pub fn mkdir_nested_main(sys: &mut Sys) -> i32 {
    sys.at_exit(|sys| {
        let (ok, err) = status(sys.remove_dir("/tmp/sub"));
        sys.print(&format!("c {ok} {err}\n"));
        let (ok, err) = status(sys.remove_dir("/tmp"));
        sys.print(&format!("d {ok} {err}\n"));
    });
    let (ok, err) = status(sys.create_dir("/tmp", DEFAULT_DIR_MODE));
    sys.print(&format!("a {ok} {err}\n"));
    let (ok, err) = status(sys.create_dir("/tmp/sub", DEFAULT_DIR_MODE));
    sys.print(&format!("b {ok} {err}\n"));
    0
}
