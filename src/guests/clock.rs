//! Monotonic clock probe.

use crate::sandbox::sys::Sys;

/// Take one clock reading and print it as `<secs> <nanos>`.
pub fn clock_main(sys: &mut Sys) -> i32 {
    let ts = sys.clock_read();
    sys.print(&format!("{} {}\n", ts.secs, ts.nanos));
    0
}
