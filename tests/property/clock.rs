//! Property tests for the virtual clock.
//!
//! Readings must be strictly increasing under a positive tick, stay in
//! canonical form (nanos below one second), and replay identically from
//! the same spec.

use proptest::prelude::*;

use guestbox_rs::vos::clock::{ClockSpec, VirtualClock};

proptest! {
    #[test]
    fn ticking_readings_strictly_increase(
        start_secs in 0u64..=1_000_000_000,
        start_nanos in 0u32..1_000_000_000,
        tick_nanos in 1u64..=5_000_000_000,
        reads in 1usize..64,
    ) {
        let mut clock = VirtualClock::ticking(start_secs, start_nanos, tick_nanos);
        let mut prev = clock.read();
        prop_assert!(prev.nanos < 1_000_000_000);
        for _ in 1..reads {
            let next = clock.read();
            prop_assert!(next > prev, "clock went backwards: {prev:?} -> {next:?}");
            prop_assert!(next.nanos < 1_000_000_000);
            prev = next;
        }
    }

    #[test]
    fn fixed_clock_never_advances(
        secs in 0u64..=u64::MAX / 2,
        nanos in 0u32..1_000_000_000,
        reads in 1usize..32,
    ) {
        let mut clock = VirtualClock::fixed(secs, nanos);
        let first = clock.read();
        for _ in 1..reads {
            prop_assert_eq!(clock.read(), first);
        }
        prop_assert_eq!(first.secs, secs);
        prop_assert_eq!(first.nanos, nanos);
    }

    #[test]
    fn clocks_from_the_same_spec_replay_identically(
        start_secs in 0u64..=1_000_000,
        start_nanos in 0u32..1_000_000_000,
        tick_nanos in 0u64..=3_000_000_000,
        reads in 1usize..48,
    ) {
        let spec = ClockSpec::Ticking { start_secs, start_nanos, tick_nanos };
        let mut a = VirtualClock::from_spec(&spec);
        let mut b = VirtualClock::from_spec(&spec);
        for _ in 0..reads {
            prop_assert_eq!(a.read(), b.read());
        }
    }
}
