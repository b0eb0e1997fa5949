//! Sequential file read.

use crate::sandbox::sys::Sys;

/// Print `test.txt` byte by byte, `fgetc` style. A missing file is exit
/// code 1 with no output.
pub fn read_main(sys: &mut Sys) -> i32 {
    let Ok(fd) = sys.open_file("test.txt") else {
        return 1;
    };
    while let Some(byte) = sys.read_byte(fd) {
        sys.write_stdout(&[byte]);
    }
    sys.close_file(fd);
    0
}
