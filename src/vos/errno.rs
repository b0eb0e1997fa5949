//! Stable guest-visible error codes.
//!
//! Guests branch on these numbers the way native programs branch on `errno`,
//! so the values are part of the observable contract: they use the
//! conventional small stable numbering and never change between runs or
//! hosts. Errors are plain return values, never ambient last-error state.

use serde::{Deserialize, Serialize};

/// Error code subset covered by the virtualized surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum Errno {
    /// Bad file descriptor.
    Badf = 8,
    /// Path already exists.
    Exist = 20,
    /// Invalid argument (for example removing the root directory).
    Inval = 28,
    /// I/O error.
    Io = 29,
    /// Path is a directory where a file was required.
    Isdir = 31,
    /// No such file or directory.
    Noent = 44,
    /// Operation not virtualized.
    Nosys = 52,
    /// Path component is not a directory.
    Notdir = 54,
    /// Directory still has children.
    Notempty = 55,
}

impl Errno {
    /// Numeric code as observed by guests.
    #[inline(always)]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Conventional constant name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Errno::Badf => "EBADF",
            Errno::Exist => "EEXIST",
            Errno::Inval => "EINVAL",
            Errno::Io => "EIO",
            Errno::Isdir => "EISDIR",
            Errno::Noent => "ENOENT",
            Errno::Nosys => "ENOSYS",
            Errno::Notdir => "ENOTDIR",
            Errno::Notempty => "ENOTEMPTY",
        }
    }
}

impl std::fmt::Display for Errno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
