//! Argument and environment probes.

use crate::sandbox::sys::Sys;

/// Print the argument count, then each argument prefixed by its index.
pub fn args_main(sys: &mut Sys) -> i32 {
    let args = sys.args();
    sys.print(&format!("{}\n", args.len()));
    for (idx, arg) in args.iter().enumerate() {
        sys.print(&format!("{idx}: {arg}\n"));
    }
    0
}

/// Print the `TEST` environment variable when set, nothing otherwise.
pub fn env_main(sys: &mut Sys) -> i32 {
    if let Some(value) = sys.env_get("TEST") {
        sys.print(&format!("{value}\n"));
    }
    0
}

/// Greet the second argument. `GREET` overrides the default greeting;
/// a missing argument is an error exit.
pub fn hello_main(sys: &mut Sys) -> i32 {
    let args = sys.args();
    let Some(who) = args.get(1) else {
        return -1;
    };
    let greet = sys
        .env_get("GREET")
        .unwrap_or_else(|| "greetings".to_string());
    sys.print(&format!("{greet} {who}\n"));
    0
}
