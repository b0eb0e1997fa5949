//! Directory enumeration, with and without error-path logging.

use crate::sandbox::sys::Sys;

/// List `/subdir` one entry per line. A missing directory is silently
/// ignored.
pub fn dir_main(sys: &mut Sys) -> i32 {
    if let Ok(fd) = sys.open_dir("/subdir") {
        while let Some(name) = sys.read_dir(fd) {
            sys.print(&format!("{name}\n"));
        }
        sys.close_dir(fd);
    }
    0
}

/// Variant that logs the error code when the open fails instead of
/// swallowing it.
pub fn dir_logged_main(sys: &mut Sys) -> i32 {
    match sys.open_dir("/subdir") {
        Ok(fd) => {
            while let Some(name) = sys.read_dir(fd) {
                sys.print(&format!("{name}\n"));
            }
            sys.close_dir(fd);
        }
        Err(err) => sys.print(&format!("oops! {}\n", err.code())),
    }
    0
}
