//! Built-in guest programs.
//!
//! Each guest models one minimal program exercising a single category of
//! OS-facing behavior (clock probe, directory listing, line echo, create
//! and remove with exit cleanup, sequential file read). Paired variants
//! encode intentional behavioral deltas: error-path logging, partial
//! stream consumption, nested create/remove ordering.
//!
//! Guests only ever touch the world through [`Sys`]; nothing here may call
//! into `std::env`, `std::fs`, `std::io`, or the host clock.
//!
//! [`Sys`]: crate::sandbox::sys::Sys

pub mod clock;
pub mod dir;
pub mod echo;
pub mod hello;
pub mod mkdir;
pub mod read;

use crate::sandbox::driver::GuestFn;

/// A registered guest: stable name, one-line description, entry point.
pub struct GuestEntry {
    pub name: &'static str,
    pub about: &'static str,
    pub run: GuestFn,
}

/// All runnable guests, sorted by name.
pub const REGISTRY: &[GuestEntry] = &[
    GuestEntry {
        name: "args",
        about: "print the argument count, then each argument with its index",
        run: hello::args_main,
    },
    GuestEntry {
        name: "clock",
        about: "print one monotonic clock reading as seconds and nanoseconds",
        run: clock::clock_main,
    },
    GuestEntry {
        name: "dir",
        about: "list /subdir entries in order, silent when it is missing",
        run: dir::dir_main,
    },
    GuestEntry {
        name: "dir-logged",
        about: "list /subdir entries, logging the error code when open fails",
        run: dir::dir_logged_main,
    },
    GuestEntry {
        name: "echo",
        about: "copy stdin to stdout line by line until the source drains",
        run: echo::echo_main,
    },
    GuestEntry {
        name: "echo-head",
        about: "copy only the first stdin line to stdout",
        run: echo::echo_head_main,
    },
    GuestEntry {
        name: "env",
        about: "print the TEST environment variable when set",
        run: hello::env_main,
    },
    GuestEntry {
        name: "hello",
        about: "greet the second argument, with GREET overriding the greeting",
        run: hello::hello_main,
    },
    GuestEntry {
        name: "mkdir",
        about: "create /tmp and register exit cleanup that removes it",
        run: mkdir::mkdir_main,
    },
    GuestEntry {
        name: "mkdir-nested",
        about: "create /tmp and /tmp/sub with one cleanup removing child first",
        run: mkdir::mkdir_nested_main,
    },
    GuestEntry {
        name: "read",
        about: "print test.txt byte by byte, exit 1 when it cannot be opened",
        run: read::read_main,
    },
];

/// Look up a guest by its registered name.
pub fn find(name: &str) -> Option<&'static GuestEntry> {
    REGISTRY.iter().find(|entry| entry.name == name)
}
