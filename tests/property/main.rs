//! Property-based tests over the virtual resources and the comparator.
//!
//! Run with: `cargo test --test property`

mod clock;
mod trace_compare;
mod vfs;
