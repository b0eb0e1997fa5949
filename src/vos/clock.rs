//! Virtual monotonic clock.
//!
//! The clock never consults the host: readings come from the scope's own
//! counter and advance only by the configured policy. Two runs with the same
//! `ClockSpec` observe identical timestamp sequences.
//!
//! Invariants:
//! - Readings are non-decreasing within one scope.
//! - `nanos` stays below one second; tick carry overflows into `secs`.

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A clock reading in seconds and nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timespec {
    pub secs: u64,
    pub nanos: u32,
}

impl Timespec {
    #[inline(always)]
    pub fn new(secs: u64, nanos: u32) -> Self {
        debug_assert!((nanos as u64) < NANOS_PER_SEC);
        Self { secs, nanos }
    }
}

/// Advancement policy for a scope's clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockSpec {
    /// Every reading returns the same instant.
    Fixed { secs: u64, nanos: u32 },
    /// First reading returns the start instant; each subsequent reading
    /// advances by `tick_nanos`.
    Ticking {
        start_secs: u64,
        start_nanos: u32,
        tick_nanos: u64,
    },
}

impl Default for ClockSpec {
    fn default() -> Self {
        ClockSpec::Fixed { secs: 0, nanos: 0 }
    }
}

impl ClockSpec {
    /// Check the declared start instant is canonical.
    ///
    /// The schema admits any `u32` in the nanosecond field; a value at or
    /// above one second is returned as `Err` and must be rejected before a
    /// clock is built from the spec.
    pub fn validate(&self) -> Result<(), u32> {
        let nanos = match *self {
            ClockSpec::Fixed { nanos, .. } => nanos,
            ClockSpec::Ticking { start_nanos, .. } => start_nanos,
        };
        if (nanos as u64) < NANOS_PER_SEC {
            Ok(())
        } else {
            Err(nanos)
        }
    }
}

/// Per-scope monotonic clock state.
#[derive(Clone, Debug)]
pub struct VirtualClock {
    now: Timespec,
    tick_nanos: u64,
}

impl VirtualClock {
    /// Build a clock from its fixture spec.
    pub fn from_spec(spec: &ClockSpec) -> Self {
        match *spec {
            ClockSpec::Fixed { secs, nanos } => Self::fixed(secs, nanos),
            ClockSpec::Ticking {
                start_secs,
                start_nanos,
                tick_nanos,
            } => Self::ticking(start_secs, start_nanos, tick_nanos),
        }
    }

    /// Clock that always reads the same instant.
    pub fn fixed(secs: u64, nanos: u32) -> Self {
        Self {
            now: Timespec::new(secs, nanos),
            tick_nanos: 0,
        }
    }

    /// Clock that advances by `tick_nanos` per reading.
    pub fn ticking(start_secs: u64, start_nanos: u32, tick_nanos: u64) -> Self {
        Self {
            now: Timespec::new(start_secs, start_nanos),
            tick_nanos,
        }
    }

    /// Current instant without advancing.
    #[inline(always)]
    pub fn now(&self) -> Timespec {
        self.now
    }

    /// Take a reading and advance by the configured tick.
    pub fn read(&mut self) -> Timespec {
        let reading = self.now;
        if self.tick_nanos > 0 {
            let total = self.now.nanos as u64 + self.tick_nanos;
            self.now.secs = self.now.secs.saturating_add(total / NANOS_PER_SEC);
            self.now.nanos = (total % NANOS_PER_SEC) as u32;
        }
        reading
    }
}
