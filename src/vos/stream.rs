//! Virtual byte streams with a sequential read cursor.
//!
//! Backs the scope's standard input and the read side of virtual files.
//! Line reads return everything up to and including the next `\n`, or all
//! remaining bytes when no terminator follows; `None` only when nothing
//! remains. EOF is repeatable.

use memchr::memchr;

/// Read the next byte at `cursor`, advancing it by one.
#[inline(always)]
pub(crate) fn take_byte(data: &[u8], cursor: &mut usize) -> Option<u8> {
    let byte = *data.get(*cursor)?;
    *cursor += 1;
    Some(byte)
}

/// Read the next line at `cursor`, advancing past it.
///
/// The terminator is included when present; a final unterminated line is
/// returned as-is.
pub(crate) fn take_line(data: &[u8], cursor: &mut usize) -> Option<Vec<u8>> {
    let rest = data.get(*cursor..)?;
    if rest.is_empty() {
        return None;
    }
    let end = match memchr(b'\n', rest) {
        Some(idx) => idx + 1,
        None => rest.len(),
    };
    *cursor += end;
    Some(rest[..end].to_vec())
}

/// In-memory byte source for virtual standard input.
#[derive(Clone, Debug, Default)]
pub struct InputStream {
    data: Vec<u8>,
    cursor: usize,
}

impl InputStream {
    /// Stream over the given bytes, cursor at the start.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, cursor: 0 }
    }

    /// Empty stream (the default stdin source).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Next byte, or `None` at end of stream.
    pub fn read_byte(&mut self) -> Option<u8> {
        take_byte(&self.data, &mut self.cursor)
    }

    /// Next line including its terminator, or `None` at end of stream.
    pub fn read_line(&mut self) -> Option<Vec<u8>> {
        take_line(&self.data, &mut self.cursor)
    }

    /// Bytes not yet consumed.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }
}
