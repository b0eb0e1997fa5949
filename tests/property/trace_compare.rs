//! Property tests for trace capture and comparison.
//!
//! A trace must match its own recording, comparison must not care how the
//! byte stream was chunked, and the first divergent byte must be located
//! exactly.

use proptest::prelude::*;

use guestbox_rs::sandbox::trace::{compare, BytesSpec, Divergence, Trace, TraceSpec, Verdict};

proptest! {
    #[test]
    fn a_trace_matches_its_own_recording(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..8),
        exit_code in -128i32..=127,
    ) {
        let mut trace = Trace::default();
        for chunk in &chunks {
            trace.push_stdout(chunk);
        }
        trace.seal(exit_code);
        let expected = TraceSpec { chunks: trace.chunk_specs(), exit_code };
        prop_assert_eq!(compare(&trace, &expected).unwrap(), Verdict::Match);
    }

    #[test]
    fn comparison_ignores_chunk_boundaries(
        bytes in prop::collection::vec(any::<u8>(), 0..256),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let mut trace = Trace::default();
        trace.push_stdout(&bytes);
        trace.seal(0);

        let mut offsets: Vec<usize> = cuts.iter().map(|cut| cut.index(bytes.len() + 1)).collect();
        offsets.push(0);
        offsets.push(bytes.len());
        offsets.sort_unstable();
        let chunks: Vec<BytesSpec> = offsets
            .windows(2)
            .map(|pair| BytesSpec::from_bytes(&bytes[pair[0]..pair[1]]))
            .collect();
        let expected = TraceSpec { chunks, exit_code: 0 };
        prop_assert_eq!(compare(&trace, &expected).unwrap(), Verdict::Match);
    }

    #[test]
    fn the_first_flipped_byte_is_located(
        bytes in prop::collection::vec(any::<u8>(), 1..128),
        pos in any::<prop::sample::Index>(),
        delta in 1u8..=255,
    ) {
        let at = pos.index(bytes.len());
        let mut mutated = bytes.clone();
        mutated[at] = mutated[at].wrapping_add(delta);

        let mut trace = Trace::default();
        trace.push_stdout(&mutated);
        trace.seal(0);
        let expected = TraceSpec {
            chunks: vec![BytesSpec::from_bytes(&bytes)],
            exit_code: 0,
        };
        match compare(&trace, &expected).unwrap() {
            Verdict::Diverges {
                at: got,
                detail: Divergence::Byte { observed, expected: want },
            } => {
                prop_assert_eq!(got, at);
                prop_assert_eq!(observed, mutated[at]);
                prop_assert_eq!(want, bytes[at]);
            }
            other => prop_assert!(false, "unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn truncated_output_diverges_at_its_end(
        bytes in prop::collection::vec(any::<u8>(), 1..128),
        keep in any::<prop::sample::Index>(),
    ) {
        let cut = keep.index(bytes.len());
        let mut trace = Trace::default();
        trace.push_stdout(&bytes[..cut]);
        trace.seal(0);
        let expected = TraceSpec {
            chunks: vec![BytesSpec::from_bytes(&bytes)],
            exit_code: 0,
        };
        match compare(&trace, &expected).unwrap() {
            Verdict::Diverges {
                at,
                detail: Divergence::ObservedShort { missing },
            } => {
                prop_assert_eq!(at, cut);
                prop_assert_eq!(missing, bytes.len() - cut);
            }
            other => prop_assert!(false, "unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn byte_specs_round_trip_arbitrary_bytes(
        bytes in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let spec = BytesSpec::from_bytes(&bytes);
        prop_assert_eq!(spec.decode().unwrap(), bytes.clone());

        let json = serde_json::to_string(&spec).unwrap();
        let back: BytesSpec = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.decode().unwrap(), bytes);
    }
}
