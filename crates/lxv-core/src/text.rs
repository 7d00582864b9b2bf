//! Streaming text I/O in an arbitrary character encoding.
//!
//! [`TextLines`] turns a byte stream into lines through an `encoding_rs` decoder, so
//! UTF-16 and legacy single/multi-byte encodings are split on decoded newlines rather
//! than on raw bytes. [`TextSink`] does the reverse for the encoder.

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_16BE, UTF_16LE};
use std::io::{self, BufWriter, Read, Write};

const READ_CHUNK: usize = 8 * 1024;

/// Iterator over the lines of an encoded byte stream.
///
/// Lines are split on `\n`; a `\r` directly before it is dropped. A final line without
/// a terminator is still yielded. A byte-order mark, if present, selects the encoding
/// and is removed.
pub struct TextLines<R> {
    inner: R,
    decoder: Decoder,
    chunk: Box<[u8]>,
    pending: String,
    start: usize,
    /// Everything in `pending` before this offset is known to hold no `\n`.
    scanned: usize,
    eof: bool,
}

impl<R: Read> TextLines<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder(),
            chunk: vec![0u8; READ_CHUNK].into_boxed_slice(),
            pending: String::new(),
            start: 0,
            scanned: 0,
            eof: false,
        }
    }

    /// Next line, or `None` at end of stream.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            let from = self.scanned.max(self.start);
            if let Some(offset) = self.pending[from..].find('\n') {
                let end = from + offset;
                let line = trim_cr(&self.pending[self.start..end]).to_string();
                self.start = end + 1;
                self.scanned = self.start;
                return Ok(Some(line));
            }
            self.scanned = self.pending.len();
            if self.eof {
                if self.start >= self.pending.len() {
                    return Ok(None);
                }
                let line = trim_cr(&self.pending[self.start..]).to_string();
                self.start = self.pending.len();
                self.scanned = self.start;
                return Ok(Some(line));
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        if self.start > 0 {
            self.pending.drain(..self.start);
            self.scanned = self.scanned.saturating_sub(self.start);
            self.start = 0;
        }

        let n = loop {
            match self.inner.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        let last = n == 0;

        let mut src = &self.chunk[..n];
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(src.len())
                .unwrap_or(src.len() * 3 + 16);
            self.pending.reserve(needed);
            let (result, read, _had_errors) =
                self.decoder.decode_to_string(src, &mut self.pending, last);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }

        if last {
            self.eof = true;
        }
        Ok(())
    }
}

impl<R: Read> Iterator for TextLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}

fn trim_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Line writer that encodes text on the way out.
///
/// UTF-16 output is produced directly because `encoding_rs` only decodes UTF-16; every
/// other encoding goes through `Encoding::encode`, which substitutes numeric character
/// references for unmappable characters.
pub struct TextSink<W: Write> {
    inner: BufWriter<W>,
    encoding: &'static Encoding,
    scratch: Vec<u8>,
}

impl<W: Write> TextSink<W> {
    pub fn new(inner: W, encoding: &'static Encoding) -> Self {
        Self {
            inner: BufWriter::new(inner),
            encoding,
            scratch: Vec::new(),
        }
    }

    /// Write `line` followed by `\n`.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.write_str(line)?;
        self.write_str("\n")
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        if self.encoding == UTF_16LE || self.encoding == UTF_16BE {
            self.scratch.clear();
            let little_endian = self.encoding == UTF_16LE;
            for unit in text.encode_utf16() {
                let bytes = if little_endian {
                    unit.to_le_bytes()
                } else {
                    unit.to_be_bytes()
                };
                self.scratch.extend_from_slice(&bytes);
            }
            return self.inner.write_all(&self.scratch);
        }
        let (bytes, _, _) = self.encoding.encode(text);
        self.inner.write_all(&bytes)
    }

    /// Flush buffered output to the underlying writer.
    pub fn finish(mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
