//! ASCII armor (RFC 4880 §6)
//!
//! The writer streams base64 in 64-column lines and appends the CRC-24
//! checksum. The reader is lenient: CRLF line endings, arbitrary headers and
//! a missing checksum are all accepted.

use std::io::{self, Write};

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::CryptoError;

const BEGIN_MESSAGE: &str = "-----BEGIN PGP MESSAGE-----";
const END_MESSAGE: &str = "-----END PGP MESSAGE-----";

/// Raw bytes per armored line (64 base64 characters)
const LINE_BYTES: usize = 48;

const CRC24_INIT: u32 = 0x00B7_04CE;
const CRC24_POLY: u32 = 0x0186_4CFB;

/// Running CRC-24 as used by the armor checksum.
#[derive(Debug, Clone, Copy)]
pub struct Crc24(u32);

impl Crc24 {
    /// Fresh checksum state.
    pub fn new() -> Self {
        Self(CRC24_INIT)
    }

    /// Fold `data` into the checksum.
    pub fn update(&mut self, data: &[u8]) {
        for byte in data {
            self.0 ^= u32::from(*byte) << 16;
            for _ in 0..8 {
                self.0 <<= 1;
                if self.0 & 0x0100_0000 != 0 {
                    self.0 ^= CRC24_POLY;
                }
            }
        }
    }

    /// Final 24-bit value.
    pub fn finish(self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    fn to_bytes(self) -> [u8; 3] {
        let value = self.finish();
        [(value >> 16) as u8, (value >> 8) as u8, value as u8]
    }
}

impl Default for Crc24 {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming armor encoder for a PGP MESSAGE block.
pub struct ArmorWriter<W: Write> {
    inner: W,
    pending: Vec<u8>,
    crc: Crc24,
}

impl<W: Write> ArmorWriter<W> {
    /// Write the BEGIN line and `headers`, then accept binary data.
    pub fn new(mut inner: W, headers: &[(&str, &str)]) -> io::Result<Self> {
        writeln!(inner, "{BEGIN_MESSAGE}")?;
        for (name, value) in headers {
            writeln!(inner, "{name}: {value}")?;
        }
        writeln!(inner)?;
        Ok(Self { inner, pending: Vec::with_capacity(LINE_BYTES), crc: Crc24::new() })
    }

    /// Flush the last line, write the checksum and END line.
    pub fn finish(mut self) -> io::Result<W> {
        if !self.pending.is_empty() {
            let line = STANDARD.encode(&self.pending);
            writeln!(self.inner, "{line}")?;
        }
        let checksum = STANDARD.encode(self.crc.to_bytes());
        writeln!(self.inner, "={checksum}")?;
        writeln!(self.inner, "{END_MESSAGE}")?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for ArmorWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.crc.update(data);
        self.pending.extend_from_slice(data);

        let full = self.pending.len() / LINE_BYTES * LINE_BYTES;
        for line in self.pending[..full].chunks(LINE_BYTES) {
            let encoded = STANDARD.encode(line);
            writeln!(self.inner, "{encoded}")?;
        }
        self.pending.drain(..full);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Strip armor from `text` and return the binary message.
///
/// A present checksum must match. Anything that is not a PGP MESSAGE block
/// is [`CryptoError::InvalidMessage`].
pub fn decode(text: &str) -> Result<Vec<u8>, CryptoError> {
    let mut lines = text.lines().map(|line| line.trim_end_matches('\r').trim_end());

    lines.by_ref().find(|line| *line == BEGIN_MESSAGE).ok_or(CryptoError::InvalidMessage)?;

    // Headers run until the first blank line.
    for line in lines.by_ref() {
        if line.is_empty() {
            break;
        }
        if !line.contains(": ") {
            return Err(CryptoError::InvalidMessage);
        }
    }

    let mut body = String::new();
    let mut checksum = None;
    let mut terminated = false;
    for line in lines {
        if line == END_MESSAGE {
            terminated = true;
            break;
        }
        if let Some(crc) = line.strip_prefix('=') {
            checksum = Some(crc.to_owned());
        } else {
            body.push_str(line);
        }
    }
    if !terminated {
        return Err(CryptoError::InvalidMessage);
    }

    let data = STANDARD.decode(body.as_bytes()).map_err(|_| CryptoError::InvalidMessage)?;

    if let Some(encoded) = checksum {
        let expected = STANDARD.decode(encoded.as_bytes()).map_err(|_| CryptoError::InvalidMessage)?;
        let mut crc = Crc24::new();
        crc.update(&data);
        if expected.as_slice() != crc.to_bytes() {
            return Err(CryptoError::InvalidMessage);
        }
    }

    Ok(data)
}
