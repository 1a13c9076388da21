//! Incremental assembly of a top-level JSON object from a byte stream.
//!
//! The upstream grid payload is one JSON object whose values are large
//! per-channel arrays. Instead of buffering the entire body, the assembler
//! scans incoming chunks for completed top-level `"key": value` pairs,
//! decodes each value on its own, and drains the consumed bytes. Peak memory
//! is therefore bounded by the largest single value, not the whole payload.
//!
//! Completion is signalled only by the closing brace of the root object; a
//! stream that ends earlier is a truncation error, never a partial grid.

use crate::error::{CacheError, Result};
use crate::types::GridPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Before the root `{`.
    Start,
    /// Expecting a key string or the root `}`.
    BeforeKey,
    /// Inside a key string.
    InKey,
    /// Expecting the `:` after a key.
    AfterKey,
    /// Skipping whitespace before a value.
    BeforeValue,
    /// Scanning a value's bytes.
    InValue,
    /// Expecting `,` or the root `}` after a container value.
    AfterValue,
    /// Root object closed.
    Done,
}

/// Streaming assembler for one upstream grid object.
///
/// Feed response chunks with [`push`](Self::push) and call
/// [`finish`](Self::finish) once the stream ends.
#[derive(Debug)]
pub struct ObjectAssembler {
    buf: Vec<u8>,
    scan: usize,
    mode: Mode,
    key: Vec<u8>,
    value_start: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
    payload: GridPayload,
    bytes_seen: u64,
}

impl ObjectAssembler {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            scan: 0,
            mode: Mode::Start,
            key: Vec::new(),
            value_start: 0,
            depth: 0,
            in_string: false,
            escaped: false,
            payload: GridPayload::default(),
            bytes_seen: 0,
        }
    }

    /// Total bytes fed in so far.
    pub fn bytes_seen(&self) -> u64 {
        self.bytes_seen
    }

    /// Feed one chunk of the response body.
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        self.bytes_seen += chunk.len() as u64;
        self.buf.extend_from_slice(chunk);

        while self.scan < self.buf.len() {
            let byte = self.buf[self.scan];
            match self.mode {
                Mode::Start => {
                    if byte.is_ascii_whitespace() {
                        self.scan += 1;
                    } else if byte == b'{' {
                        self.mode = Mode::BeforeKey;
                        self.scan += 1;
                    } else {
                        return Err(CacheError::invalid_grid("payload root is not an object"));
                    }
                }
                Mode::BeforeKey => {
                    if byte.is_ascii_whitespace() {
                        self.scan += 1;
                    } else if byte == b'"' {
                        self.key.clear();
                        self.escaped = false;
                        self.mode = Mode::InKey;
                        self.scan += 1;
                    } else if byte == b'}' {
                        self.mode = Mode::Done;
                        self.scan += 1;
                        self.drain_consumed();
                    } else {
                        return Err(CacheError::invalid_grid(format!(
                            "expected key or end of object, found byte 0x{byte:02x}"
                        )));
                    }
                }
                Mode::InKey => {
                    if self.escaped {
                        self.escaped = false;
                        self.key.push(byte);
                    } else if byte == b'\\' {
                        self.escaped = true;
                        self.key.push(byte);
                    } else if byte == b'"' {
                        self.mode = Mode::AfterKey;
                    } else {
                        self.key.push(byte);
                    }
                    self.scan += 1;
                }
                Mode::AfterKey => {
                    if byte.is_ascii_whitespace() {
                        self.scan += 1;
                    } else if byte == b':' {
                        self.mode = Mode::BeforeValue;
                        self.scan += 1;
                    } else {
                        return Err(CacheError::invalid_grid("expected ':' after key"));
                    }
                }
                Mode::BeforeValue => {
                    if byte.is_ascii_whitespace() {
                        self.scan += 1;
                    } else {
                        // Re-examine this byte as the first of the value.
                        self.mode = Mode::InValue;
                        self.value_start = self.scan;
                        self.depth = 0;
                        self.in_string = false;
                        self.escaped = false;
                    }
                }
                Mode::InValue => self.scan_value_byte(byte)?,
                Mode::AfterValue => {
                    if byte.is_ascii_whitespace() {
                        self.scan += 1;
                    } else if byte == b',' {
                        self.mode = Mode::BeforeKey;
                        self.scan += 1;
                        self.drain_consumed();
                    } else if byte == b'}' {
                        self.mode = Mode::Done;
                        self.scan += 1;
                        self.drain_consumed();
                    } else {
                        return Err(CacheError::invalid_grid(
                            "expected ',' or end of object after value",
                        ));
                    }
                }
                Mode::Done => {
                    if byte.is_ascii_whitespace() {
                        self.scan += 1;
                    } else {
                        return Err(CacheError::invalid_grid(
                            "unexpected content after the grid object",
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Finalize assembly. Fails unless the root object was fully observed.
    pub fn finish(self) -> Result<GridPayload> {
        if self.mode == Mode::Done {
            Ok(self.payload)
        } else {
            Err(CacheError::Truncated)
        }
    }

    fn scan_value_byte(&mut self, byte: u8) -> Result<()> {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
            }
            self.scan += 1;
            return Ok(());
        }

        match byte {
            b'"' => {
                self.in_string = true;
                self.scan += 1;
            }
            b'{' | b'[' => {
                self.depth += 1;
                self.scan += 1;
            }
            b']' => {
                if self.depth == 0 {
                    return Err(CacheError::invalid_grid("unbalanced ']' in payload"));
                }
                self.depth -= 1;
                self.scan += 1;
                if self.depth == 0 {
                    self.complete_value(self.scan)?;
                    self.mode = Mode::AfterValue;
                }
            }
            b'}' => {
                if self.depth == 0 {
                    // Scalar value terminated by the root object closing.
                    self.complete_value(self.scan)?;
                    self.mode = Mode::Done;
                    self.scan += 1;
                    self.drain_consumed();
                } else {
                    self.depth -= 1;
                    self.scan += 1;
                    if self.depth == 0 {
                        self.complete_value(self.scan)?;
                        self.mode = Mode::AfterValue;
                    }
                }
            }
            b',' if self.depth == 0 => {
                // Scalar value terminated by the pair separator.
                self.complete_value(self.scan)?;
                self.mode = Mode::BeforeKey;
                self.scan += 1;
                self.drain_consumed();
            }
            _ => {
                self.scan += 1;
            }
        }

        Ok(())
    }

    fn complete_value(&mut self, end: usize) -> Result<()> {
        let key = String::from_utf8_lossy(&self.key).into_owned();
        let raw = &self.buf[self.value_start..end];
        self.payload.apply_raw(&key, raw)?;
        Ok(())
    }

    /// Drop everything the scanner is finished with.
    fn drain_consumed(&mut self) {
        self.buf.drain(..self.scan);
        self.scan = 0;
    }
}

impl Default for ObjectAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "lats": [1.0, 2.0, 3.0],
        "lons": [10.0, 20.0],
        "depth": [[-50.0, null], [null, -75.5], [-9999, -12.0]],
        "error": null,
        "extra_key": {"nested": [1, {"deeper": "}]"}]}
    }"#;

    fn assemble(doc: &[u8], chunk_size: usize) -> Result<GridPayload> {
        let mut assembler = ObjectAssembler::new();
        for chunk in doc.chunks(chunk_size.max(1)) {
            assembler.push(chunk)?;
        }
        assembler.finish()
    }

    #[test]
    fn test_single_push_matches_serde() {
        let assembled = assemble(DOC.as_bytes(), DOC.len()).unwrap();
        let buffered: GridPayload = serde_json::from_str(DOC).unwrap();

        assert_eq!(assembled.lats, buffered.lats);
        assert_eq!(assembled.lons, buffered.lons);
        assert_eq!(assembled.depth, buffered.depth);
        assert_eq!(assembled.error, None);
    }

    #[test]
    fn test_byte_at_a_time_assembly() {
        for chunk_size in [1, 2, 3, 7, 16] {
            let payload = assemble(DOC.as_bytes(), chunk_size).unwrap();
            assert_eq!(payload.lats.as_deref(), Some(&[1.0, 2.0, 3.0][..]));
            assert_eq!(payload.lons.as_deref(), Some(&[10.0, 20.0][..]));
            let depth = payload.depth.as_ref().unwrap();
            assert_eq!(depth.len(), 3);
            assert_eq!(depth[1].as_ref().unwrap()[1], Some(-75.5));
        }
    }

    #[test]
    fn test_unknown_keys_are_skipped() {
        let payload = assemble(DOC.as_bytes(), 5).unwrap();
        // extra_key contains braces and brackets inside a string; assembly
        // must not be confused by them.
        assert!(payload.lats.is_some());
    }

    #[test]
    fn test_truncated_stream_fails() {
        let doc = br#"{"lats": [1.0, 2.0], "lons": [1.0"#;
        let mut assembler = ObjectAssembler::new();
        assembler.push(doc).unwrap();
        assert!(matches!(assembler.finish(), Err(CacheError::Truncated)));
    }

    #[test]
    fn test_truncated_after_first_key_fails() {
        // The first top-level key is complete, but the object never closes;
        // completion must not be signalled early.
        let doc = br#"{"lats": [1.0, 2.0],"#;
        let mut assembler = ObjectAssembler::new();
        assembler.push(doc).unwrap();
        assert!(matches!(assembler.finish(), Err(CacheError::Truncated)));
    }

    #[test]
    fn test_non_object_root_fails() {
        let mut assembler = ObjectAssembler::new();
        assert!(assembler.push(b"[1, 2, 3]").is_err());
    }

    #[test]
    fn test_trailing_garbage_fails() {
        let mut assembler = ObjectAssembler::new();
        assert!(assembler.push(b"{\"lats\": [1.0]} tail").is_err());
    }

    #[test]
    fn test_scalar_error_value() {
        let doc = br#"{"error": "nc file missing"}"#;
        let payload = assemble(doc, 4).unwrap();
        assert_eq!(payload.error.as_deref(), Some("nc file missing"));
    }

    #[test]
    fn test_empty_object_completes() {
        let payload = assemble(b"{}", 1).unwrap();
        assert!(payload.lats.is_none());
    }

    #[test]
    fn test_buffer_drains_between_pairs() {
        let mut assembler = ObjectAssembler::new();
        assembler.push(br#"{"lats": [1.0, 2.0], "#).unwrap();
        // Everything consumed so far should have been dropped.
        assert!(assembler.buf.len() <= 1);
        assembler.push(br#""lons": [3.0]}"#).unwrap();
        let payload = assembler.finish().unwrap();
        assert_eq!(payload.lons.as_deref(), Some(&[3.0][..]));
    }

    #[test]
    fn test_split_inside_escape_sequence() {
        let doc = br#"{"error": "bad \"file\" name"}"#;
        for chunk_size in 1..8 {
            let payload = assemble(doc, chunk_size).unwrap();
            assert_eq!(payload.error.as_deref(), Some("bad \"file\" name"));
        }
    }
}
