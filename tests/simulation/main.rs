//! In-process driver simulations: whole guest runs through the public API.
//!
//! Run with: `cargo test --test simulation`

mod driver_runs;
