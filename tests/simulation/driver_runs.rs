//! Full runs exercising scope isolation and cross-run determinism.

use guestbox_rs::sandbox::{run_fixture, run_guest, FixtureSpec, RunOptions, RunOutcome};
use guestbox_rs::vos::clock::ClockSpec;
use guestbox_rs::Sys;
use guestbox_rs::{BytesSpec, TraceSpec};

fn read_clock_twice(sys: &mut Sys) -> i32 {
    let first = sys.clock_read();
    let second = sys.clock_read();
    sys.print(&format!(
        "{} {}\n{} {}\n",
        first.secs, first.nanos, second.secs, second.nanos
    ));
    0
}

#[test]
fn ticking_clock_advances_within_a_run_and_resets_across_runs() {
    let mut spec = FixtureSpec::inline("clock");
    spec.clock = ClockSpec::Ticking {
        start_secs: 5,
        start_nanos: 999_999_000,
        tick_nanos: 2_000,
    };

    let first = run_guest(read_clock_twice, &spec, &RunOptions::default()).expect("first run");
    assert_eq!(first.trace.stdout_bytes(), b"5 999999000\n6 1000\n");

    // A fresh scope starts the clock over.
    let second = run_guest(read_clock_twice, &spec, &RunOptions::default()).expect("second run");
    assert_eq!(first.trace.events(), second.trace.events());
}

fn probe_host_env(sys: &mut Sys) -> i32 {
    if sys.env_get("GUESTBOX_HOST_ONLY").is_some() {
        return 1;
    }
    0
}

#[test]
fn host_environment_never_leaks_into_a_scope() {
    std::env::set_var("GUESTBOX_HOST_ONLY", "leaked");
    let spec = FixtureSpec::inline("env");
    let report = run_guest(probe_host_env, &spec, &RunOptions::default()).expect("run");
    assert_eq!(
        report.outcome,
        RunOutcome::Completed { exit_code: 0 },
        "guest saw a host environment variable"
    );
}

#[test]
fn filesystem_state_is_discarded_between_runs() {
    // mkdir-nested creates /tmp and /tmp/sub; a second run must start from
    // an empty tree and succeed identically.
    let mut spec = FixtureSpec::inline("mkdir-nested");
    spec.expected = Some(TraceSpec {
        chunks: vec![
            BytesSpec::Text("a 0 0\n".to_string()),
            BytesSpec::Text("b 0 0\n".to_string()),
            BytesSpec::Text("c 0 0\n".to_string()),
            BytesSpec::Text("d 0 0\n".to_string()),
        ],
        exit_code: 0,
    });

    for _ in 0..3 {
        let (verdict, _) = run_fixture(&spec, &RunOptions::default()).expect("run");
        assert!(verdict.passed(), "run left state behind: {verdict}");
    }
}

#[test]
fn stdin_consumption_does_not_carry_across_runs() {
    let mut spec = FixtureSpec::inline("echo-head");
    spec.stdin = vec![BytesSpec::Text("first\nsecond\n".to_string())];
    spec.expected = Some(TraceSpec {
        chunks: vec![BytesSpec::Text("first\n".to_string())],
        exit_code: 0,
    });

    for _ in 0..2 {
        let (verdict, _) = run_fixture(&spec, &RunOptions::default()).expect("run");
        assert!(verdict.passed(), "stale stdin cursor: {verdict}");
    }
}

fn emit_then_register(sys: &mut Sys) -> i32 {
    sys.at_exit(|sys| sys.print("cleanup\n"));
    sys.print("main\n");
    0
}

#[test]
fn callback_output_lands_after_main_output_in_the_same_trace() {
    let spec = FixtureSpec::inline("echo");
    let report = run_guest(emit_then_register, &spec, &RunOptions::default()).expect("run");
    assert_eq!(report.trace.stdout_bytes(), b"main\ncleanup\n");
    assert_eq!(report.outcome, RunOutcome::Completed { exit_code: 0 });
}

fn loud_stderr(sys: &mut Sys) -> i32 {
    sys.eprint("diagnostic noise\n");
    sys.print("payload\n");
    0
}

#[test]
fn stderr_is_captured_but_kept_out_of_the_trace() {
    let spec = FixtureSpec::inline("echo");
    let report = run_guest(loud_stderr, &spec, &RunOptions::default()).expect("run");
    assert_eq!(report.trace.stdout_bytes(), b"payload\n");
    assert_eq!(report.stderr, b"diagnostic noise\n");
}
