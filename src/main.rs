//! Guestbox CLI
//!
//! Runs fixture guest programs inside the deterministic sandbox and checks
//! their captured traces against recorded expectations. Record mode runs a
//! fixture and overwrites its expected trace with what was captured.
//!
//! # Output Format
//!
//! Per-fixture verdicts are written to stdout as: `<name> ... <verdict>`
//!
//! Statistics are written to stderr upon completion:
//! `fixtures=N passed=N failed=N`
//!
//! # Exit Codes
//!
//! - `0`: All fixtures passed (or were recorded)
//! - `1`: At least one fixture diverged or crashed
//! - `2`: Invalid arguments or configuration error

use std::env;
use std::path::{Path, PathBuf};
use std::process;

use guestbox_rs::guests;
use guestbox_rs::sandbox::{
    fixture_name, record_fixture, run_suite, suite_paths, FixtureSpec, RunOptions, RunOutcome,
};

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!(
        "usage: {} [OPTIONS] <command> [fixture...]

COMMANDS:
    run        Run fixtures and compare against their expected traces
    record     Run fixtures and overwrite their expected traces
    list       List the built-in guest programs

OPTIONS:
    --fixtures=<dir>        Fixture directory (default: fixtures)
    --debug                 Log each intercepted call to stderr
    --help, -h              Show this help message",
        exe.to_string_lossy()
    );
}

fn main() {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "guestbox-rs".into());
    let mut fixtures_dir = PathBuf::from("fixtures");
    let mut debug = false;
    let mut command: Option<String> = None;
    let mut names: Vec<String> = Vec::new();

    for arg in args {
        let Some(flag) = arg.to_str() else {
            eprintln!("invalid argument: {}", arg.to_string_lossy());
            process::exit(2);
        };
        if let Some(value) = flag.strip_prefix("--fixtures=") {
            fixtures_dir = PathBuf::from(value);
            continue;
        }
        match flag {
            "--debug" => {
                debug = true;
                continue;
            }
            "--help" | "-h" => {
                print_usage(&exe);
                process::exit(0);
            }
            _ if flag.starts_with("--") => {
                eprintln!("unknown flag: {flag}");
                print_usage(&exe);
                process::exit(2);
            }
            _ => {}
        }
        if command.is_none() {
            command = Some(flag.to_string());
        } else {
            names.push(flag.to_string());
        }
    }

    let Some(command) = command else {
        print_usage(&exe);
        process::exit(2);
    };

    let opts = RunOptions {
        debug,
        ..RunOptions::default()
    };

    let code = match command.as_str() {
        "run" => cmd_run(&fixtures_dir, &names, &opts),
        "record" => cmd_record(&fixtures_dir, &names, &opts),
        "list" => cmd_list(),
        other => {
            eprintln!("unknown command: {other}");
            print_usage(&exe);
            2
        }
    };
    process::exit(code);
}

fn cmd_run(dir: &Path, names: &[String], opts: &RunOptions) -> i32 {
    let report = match run_suite(dir, names, opts) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };
    for result in &report.results {
        println!("{} ... {}", result.name, result.verdict);
    }
    eprintln!(
        "fixtures={} passed={} failed={}",
        report.results.len(),
        report.passed(),
        report.failed()
    );
    if report.all_passed() {
        0
    } else {
        1
    }
}

fn cmd_record(dir: &Path, names: &[String], opts: &RunOptions) -> i32 {
    let paths = match suite_paths(dir, names) {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };
    let mut recorded = 0usize;
    for path in &paths {
        let name = fixture_name(path);
        let mut spec = match FixtureSpec::load(path) {
            Ok(spec) => spec,
            Err(err) => {
                eprintln!("error: {err}");
                return 2;
            }
        };
        let report = match record_fixture(&mut spec, opts) {
            Ok(report) => report,
            Err(err) => {
                eprintln!("error: {err}");
                return 2;
            }
        };
        match report.outcome {
            RunOutcome::Completed { exit_code } => {
                if let Err(err) = spec.save(path) {
                    eprintln!("error: {err}");
                    return 2;
                }
                println!(
                    "{name} recorded ({} bytes, exit {exit_code})",
                    report.trace.stdout_bytes().len()
                );
                recorded += 1;
            }
            RunOutcome::Crashed { fault } => {
                eprintln!("{name}: crashed: {fault}");
                return 1;
            }
        }
    }
    eprintln!("fixtures={} recorded={recorded}", paths.len());
    0
}

fn cmd_list() -> i32 {
    for entry in guests::REGISTRY {
        println!("{:<14} {}", entry.name, entry.about);
    }
    0
}
