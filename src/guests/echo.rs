//! Line-buffered stdin passthrough.

use crate::sandbox::sys::Sys;

/// Copy stdin to stdout line by line until the source drains. An empty
/// source produces no output and still exits 0.
pub fn echo_main(sys: &mut Sys) -> i32 {
    while let Some(line) = sys.stdin_read_line() {
        sys.write_stdout(&line);
    }
    0
}

/// Variant that consumes only the first line, leaving the rest unread.
pub fn echo_head_main(sys: &mut Sys) -> i32 {
    if let Some(line) = sys.stdin_read_line() {
        sys.write_stdout(&line);
    }
    0
}
