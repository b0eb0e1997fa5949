//! End-to-end tests against the built CLI binary.
//!
//! Run with: `cargo test --test integration`

mod cli_run;
