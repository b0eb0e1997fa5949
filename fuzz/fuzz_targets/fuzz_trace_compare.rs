#![no_main]

use libfuzzer_sys::fuzz_target;

use guestbox_rs::sandbox::trace::{compare, BytesSpec, Trace, TraceSpec, Verdict};

fuzz_target!(|data: &[u8]| {
    // Split point derived from input.
    let split = if data.is_empty() {
        0
    } else {
        (data[0] as usize) % (data.len() + 1)
    };

    let mut trace = Trace::default();
    trace.push_stdout(&data[..split]);
    trace.push_stdout(&data[split..]);
    trace.seal(0);

    // A trace always matches its own recording, however it was chunked.
    let recorded = TraceSpec {
        chunks: trace.chunk_specs(),
        exit_code: 0,
    };
    assert_eq!(compare(&trace, &recorded).unwrap(), Verdict::Match);

    let one_chunk = TraceSpec {
        chunks: vec![BytesSpec::from_bytes(data)],
        exit_code: 0,
    };
    assert_eq!(compare(&trace, &one_chunk).unwrap(), Verdict::Match);

    // Same inputs, same verdict, and divergence offsets stay in bounds.
    let flipped_bytes: Vec<u8> = data.iter().map(|b| b ^ 1).collect();
    let flipped = TraceSpec {
        chunks: vec![BytesSpec::from_bytes(&flipped_bytes)],
        exit_code: 0,
    };
    let a = compare(&trace, &flipped).unwrap();
    let b = compare(&trace, &flipped).unwrap();
    assert_eq!(a, b);
    if let Verdict::Diverges { at, .. } = a {
        assert!(at <= data.len());
    }

    // Arbitrary bytes as a spec document must parse or reject without
    // panicking, and parsed specs must compare cleanly.
    if let Ok(parsed) = serde_json::from_slice::<TraceSpec>(data) {
        let _ = compare(&trace, &parsed);
    }
});
