//! Captured run traces, the expected-trace schema, and the comparator.
//!
//! A trace is the ordered record of everything a guest observably produced:
//! stdout write events followed by a final exit event. Comparison is strict
//! and byte-exact over the flattened stdout stream plus the exit code;
//! write-call chunk boundaries are retained for forensics but carry no
//! meaning for equality. The first point of divergence is reported with its
//! byte offset and the differing bytes.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One observable event in a captured trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// Bytes the guest wrote to stdout in one call.
    Stdout(Vec<u8>),
    /// The final exit code. At most one, always last.
    Exit(i32),
}

/// Captured trace of one guest run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    events: Vec<TraceEvent>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stdout write. Empty writes are not observable and are
    /// dropped.
    pub fn push_stdout(&mut self, bytes: &[u8]) {
        debug_assert!(self.exit_code().is_none(), "write after seal");
        if bytes.is_empty() {
            return;
        }
        self.events.push(TraceEvent::Stdout(bytes.to_vec()));
    }

    /// Terminate the trace with the run's exit code.
    pub fn seal(&mut self, exit_code: i32) {
        debug_assert!(self.exit_code().is_none(), "trace sealed twice");
        self.events.push(TraceEvent::Exit(exit_code));
    }

    /// The sealed exit code, if the run completed.
    pub fn exit_code(&self) -> Option<i32> {
        match self.events.last() {
            Some(TraceEvent::Exit(code)) => Some(*code),
            _ => None,
        }
    }

    /// Events in capture order.
    #[inline(always)]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// The stdout stream with chunk boundaries flattened away.
    pub fn stdout_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for event in &self.events {
            if let TraceEvent::Stdout(bytes) = event {
                out.extend_from_slice(bytes);
            }
        }
        out
    }

    /// Stdout chunks encoded for an expected-trace file.
    pub fn chunk_specs(&self) -> Vec<BytesSpec> {
        self.events
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Stdout(bytes) => Some(BytesSpec::from_bytes(bytes)),
                TraceEvent::Exit(_) => None,
            })
            .collect()
    }
}

/// JSON-friendly byte chunk: a plain string when the bytes are UTF-8, a
/// lowercase-hex object otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BytesSpec {
    Text(String),
    Hex { hex: String },
}

impl BytesSpec {
    /// Encode bytes, preferring the readable form.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => BytesSpec::Text(text.to_string()),
            Err(_) => BytesSpec::Hex {
                hex: encode_hex(bytes),
            },
        }
    }

    /// Decode back to raw bytes. Fails only on a malformed hex field.
    pub fn decode(&self) -> Result<Vec<u8>, String> {
        match self {
            BytesSpec::Text(text) => Ok(text.as_bytes().to_vec()),
            BytesSpec::Hex { hex } => decode_hex(hex),
        }
    }
}

impl Default for BytesSpec {
    fn default() -> Self {
        BytesSpec::Text(String::new())
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().saturating_mul(2));
    for &b in bytes {
        out.push(hex_char(b >> 4));
        out.push(hex_char(b & 0x0f));
    }
    out
}

fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    let bytes = s.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err("hex string has odd length".to_string());
    }
    let mut out = Vec::with_capacity(bytes.len() / 2);
    let mut idx = 0;
    while idx < bytes.len() {
        let hi = hex_val(bytes[idx])?;
        let lo = hex_val(bytes[idx + 1])?;
        out.push((hi << 4) | lo);
        idx += 2;
    }
    Ok(out)
}

fn hex_char(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        10..=15 => (b'a' + (nibble - 10)) as char,
        _ => '0',
    }
}

fn hex_val(byte: u8) -> Result<u8, String> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        _ => Err("hex string contains non-hex char".to_string()),
    }
}

/// Expected trace for one fixture: ordered output chunks plus the final
/// exit code. Produced by hand or by the CLI's record mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSpec {
    #[serde(default)]
    pub chunks: Vec<BytesSpec>,
    pub exit_code: i32,
}

impl TraceSpec {
    /// Decode and concatenate the expected stdout stream.
    pub fn flatten(&self) -> Result<Vec<u8>, String> {
        let mut out = Vec::new();
        for chunk in &self.chunks {
            out.extend_from_slice(&chunk.decode()?);
        }
        Ok(out)
    }
}

/// Comparator outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Match,
    Diverges { at: usize, detail: Divergence },
}

/// First point of divergence between an observed and an expected trace.
///
/// `at` in the verdict is a byte offset into the flattened stdout stream;
/// for an exit-code mismatch it is the stream length.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Divergence {
    /// Streams differ at the offset.
    Byte { observed: u8, expected: u8 },
    /// Observed output ended while expected bytes remain.
    ObservedShort { missing: usize },
    /// Observed output continues past the expected stream.
    ObservedLong { extra: usize },
    /// Streams match but the exit codes differ.
    ExitCode { observed: i32, expected: i32 },
}

/// Compare an observed trace against an expected one.
///
/// Stdout is compared byte-for-byte with chunk boundaries ignored, then the
/// exit codes are compared. An unsealed trace compares as exit code 0.
/// `Err` means the expected trace itself could not be decoded.
pub fn compare(observed: &Trace, expected: &TraceSpec) -> Result<Verdict, String> {
    let want = expected.flatten()?;
    let got = observed.stdout_bytes();

    for (at, (&observed_byte, &expected_byte)) in got.iter().zip(want.iter()).enumerate() {
        if observed_byte != expected_byte {
            return Ok(Verdict::Diverges {
                at,
                detail: Divergence::Byte {
                    observed: observed_byte,
                    expected: expected_byte,
                },
            });
        }
    }
    if got.len() < want.len() {
        return Ok(Verdict::Diverges {
            at: got.len(),
            detail: Divergence::ObservedShort {
                missing: want.len() - got.len(),
            },
        });
    }
    if got.len() > want.len() {
        return Ok(Verdict::Diverges {
            at: want.len(),
            detail: Divergence::ObservedLong {
                extra: got.len() - want.len(),
            },
        });
    }

    let observed_code = observed.exit_code().unwrap_or(0);
    if observed_code != expected.exit_code {
        return Ok(Verdict::Diverges {
            at: want.len(),
            detail: Divergence::ExitCode {
                observed: observed_code,
                expected: expected.exit_code,
            },
        });
    }
    Ok(Verdict::Match)
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Match => write!(f, "match"),
            Verdict::Diverges { at, detail } => {
                write!(f, "diverged at byte {at}: {detail}")
            }
        }
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::Byte { observed, expected } => {
                write!(
                    f,
                    "observed {}, expected {}",
                    render_byte(*observed),
                    render_byte(*expected)
                )
            }
            Divergence::ObservedShort { missing } => {
                write!(f, "output ended early, {missing} expected byte(s) missing")
            }
            Divergence::ObservedLong { extra } => {
                write!(f, "{extra} unexpected trailing byte(s)")
            }
            Divergence::ExitCode { observed, expected } => {
                write!(f, "exit code {observed}, expected {expected}")
            }
        }
    }
}

/// Render a byte with its printable form when it has one.
fn render_byte(byte: u8) -> String {
    if byte.is_ascii_graphic() || byte == b' ' {
        format!("0x{byte:02x} '{}'", byte as char)
    } else {
        format!("0x{byte:02x}")
    }
}

/// Intercepted-call record kept for failure forensics.
///
/// `ret` follows the C convention: a non-negative value or count on success,
/// the negated error code on failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub op: SysOp,
    pub arg: String,
    pub ret: i64,
}

impl fmt::Display for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) -> {}", self.op.name(), self.arg, self.ret)
    }
}

/// Operation categories of the intercepted surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SysOp {
    ClockRead,
    EnvGet,
    ArgsGet,
    OpenDir,
    ReadDir,
    CloseDir,
    CreateDir,
    RemoveDir,
    OpenFile,
    ReadByte,
    ReadLine,
    CloseFile,
    StdinReadByte,
    StdinReadLine,
    StdoutWrite,
    StderrWrite,
    AtExit,
    Exit,
}

impl SysOp {
    pub fn name(self) -> &'static str {
        match self {
            SysOp::ClockRead => "clock_read",
            SysOp::EnvGet => "env_get",
            SysOp::ArgsGet => "args_get",
            SysOp::OpenDir => "open_dir",
            SysOp::ReadDir => "read_dir",
            SysOp::CloseDir => "close_dir",
            SysOp::CreateDir => "create_dir",
            SysOp::RemoveDir => "remove_dir",
            SysOp::OpenFile => "open_file",
            SysOp::ReadByte => "read_byte",
            SysOp::ReadLine => "read_line",
            SysOp::CloseFile => "close_file",
            SysOp::StdinReadByte => "stdin_read_byte",
            SysOp::StdinReadLine => "stdin_read_line",
            SysOp::StdoutWrite => "stdout_write",
            SysOp::StderrWrite => "stderr_write",
            SysOp::AtExit => "at_exit",
            SysOp::Exit => "exit",
        }
    }
}

/// Fixed-capacity ring of intercepted-call records; oldest evicted first.
#[derive(Clone, Debug)]
pub struct CallRing {
    cap: usize,
    buf: VecDeque<CallRecord>,
}

impl CallRing {
    /// Create a ring with at least one slot.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            buf: VecDeque::with_capacity(cap),
        }
    }

    #[inline(always)]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Push a record, evicting the oldest if at capacity.
    #[inline(always)]
    pub fn push(&mut self, record: CallRecord) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(record);
    }

    /// Snapshot the retained records in chronological order.
    pub fn dump(&self) -> Vec<CallRecord> {
        self.buf.iter().cloned().collect()
    }
}
