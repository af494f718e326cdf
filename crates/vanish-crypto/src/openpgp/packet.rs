//! OpenPGP packet framing (RFC 4880 §4)
//!
//! Reading accepts old- and new-format headers, including partial body
//! lengths. Writing always uses the new format.

use std::io::{self, Write};

use crate::CryptoError;

/// Symmetric-key encrypted session key
pub const TAG_SKESK: u8 = 3;
/// Compressed data
pub const TAG_COMPRESSED: u8 = 8;
/// Symmetrically encrypted data without integrity protection
pub const TAG_SED: u8 = 9;
/// Marker packet, ignored on read
pub const TAG_MARKER: u8 = 10;
/// Literal data
pub const TAG_LITERAL: u8 = 11;
/// Symmetrically encrypted and integrity protected data
pub const TAG_SEIPD: u8 = 18;
/// Modification detection code
pub const TAG_MDC: u8 = 19;

/// Partial body chunk size as a power of two (8 KiB)
const PARTIAL_CHUNK_POWER: u8 = 13;
const PARTIAL_CHUNK: usize = 1 << PARTIAL_CHUNK_POWER;

/// A packet with its body fully reassembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet tag
    pub tag: u8,
    /// Body with any partial-length framing removed
    pub body: Vec<u8>,
}

/// Bounds-checked cursor over a byte slice.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Next byte.
    pub fn u8(&mut self) -> Result<u8, CryptoError> {
        Ok(self.take(1)?[0])
    }

    /// Next big-endian u32.
    pub fn u32(&mut self) -> Result<u32, CryptoError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], CryptoError> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.data.len()).ok_or_else(
            || CryptoError::MalformedPacket(format!("truncated: wanted {len} bytes")),
        )?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Everything not yet consumed.
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }
}

/// Split `data` into packets.
pub fn parse_packets(data: &[u8]) -> Result<Vec<Packet>, CryptoError> {
    let mut reader = ByteReader::new(data);
    let mut packets = Vec::new();

    while !reader.is_empty() {
        let header = reader.u8()?;
        if header & 0x80 == 0 {
            return Err(CryptoError::MalformedPacket(format!("bad packet header {header:#04x}")));
        }

        let packet = if header & 0x40 != 0 {
            Packet { tag: header & 0x3f, body: read_new_format_body(&mut reader)? }
        } else {
            let tag = (header >> 2) & 0x0f;
            let body = match header & 0x03 {
                0 => {
                    let len = reader.u8()?;
                    reader.take(usize::from(len))?.to_vec()
                },
                1 => {
                    let len = u16::from_be_bytes([reader.u8()?, reader.u8()?]);
                    reader.take(usize::from(len))?.to_vec()
                },
                2 => {
                    let len = reader.u32()? as usize;
                    reader.take(len)?.to_vec()
                },
                _ => reader.rest().to_vec(),
            };
            Packet { tag, body }
        };

        packets.push(packet);
    }

    Ok(packets)
}

fn read_new_format_body(reader: &mut ByteReader<'_>) -> Result<Vec<u8>, CryptoError> {
    let mut body = Vec::new();
    loop {
        let first = reader.u8()?;
        match first {
            0..=191 => {
                body.extend_from_slice(reader.take(usize::from(first))?);
                return Ok(body);
            },
            192..=223 => {
                let second = reader.u8()?;
                let len = ((usize::from(first) - 192) << 8) + usize::from(second) + 192;
                body.extend_from_slice(reader.take(len)?);
                return Ok(body);
            },
            255 => {
                let len = reader.u32()? as usize;
                body.extend_from_slice(reader.take(len)?);
                return Ok(body);
            },
            partial => {
                let len = 1usize << (partial & 0x1f);
                body.extend_from_slice(reader.take(len)?);
            },
        }
    }
}

/// Append a new-format definite length.
pub fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 192 {
        out.push(len as u8);
    } else if len < 8384 {
        let adjusted = len - 192;
        out.push(((adjusted >> 8) + 192) as u8);
        out.push((adjusted & 0xff) as u8);
    } else {
        out.push(255);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
}

/// Serialize a complete packet with a definite length.
pub fn encode_packet(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 6);
    out.push(0xC0 | tag);
    write_length(&mut out, body.len());
    out.extend_from_slice(body);
    out
}

/// Writes one packet whose body length is not known up front.
///
/// The body is emitted as 8 KiB partial chunks followed by a final definite
/// length segment on [`finish`](Self::finish). Only one chunk is buffered.
pub struct PartialBodyWriter<W: Write> {
    inner: W,
    tag: u8,
    buffer: Vec<u8>,
    header_written: bool,
}

impl<W: Write> PartialBodyWriter<W> {
    /// Start a packet with `tag` on top of `inner`.
    pub fn new(inner: W, tag: u8) -> Self {
        Self { inner, tag, buffer: Vec::with_capacity(PARTIAL_CHUNK), header_written: false }
    }

    /// Write the final segment and hand back the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.write_header()?;
        let mut length = Vec::with_capacity(5);
        write_length(&mut length, self.buffer.len());
        self.inner.write_all(&length)?;
        self.inner.write_all(&self.buffer)?;
        self.buffer.clear();
        Ok(self.inner)
    }

    fn write_header(&mut self) -> io::Result<()> {
        if !self.header_written {
            self.inner.write_all(&[0xC0 | self.tag])?;
            self.header_written = true;
        }
        Ok(())
    }

    fn emit_partial_chunk(&mut self) -> io::Result<()> {
        self.write_header()?;
        self.inner.write_all(&[0xE0 | PARTIAL_CHUNK_POWER])?;
        self.inner.write_all(&self.buffer[..PARTIAL_CHUNK])?;
        self.buffer.drain(..PARTIAL_CHUNK);
        Ok(())
    }
}

impl<W: Write> Write for PartialBodyWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(data);
        // Strictly greater: the final segment must carry the tail.
        while self.buffer.len() > PARTIAL_CHUNK {
            self.emit_partial_chunk()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definite_lengths_roundtrip() {
        for len in [0usize, 1, 191, 192, 8383, 8384, 100_000] {
            let body = vec![0xAB; len];
            let encoded = encode_packet(TAG_LITERAL, &body);
            let packets = parse_packets(&encoded).unwrap();
            assert_eq!(packets, vec![Packet { tag: TAG_LITERAL, body }], "length {len}");
        }
    }

    #[test]
    fn partial_bodies_reassemble() {
        let body: Vec<u8> = (0..30_000u32).map(|i| i as u8).collect();
        let mut writer = PartialBodyWriter::new(Vec::new(), TAG_SEIPD);
        for piece in body.chunks(1000) {
            writer.write_all(piece).unwrap();
        }
        let encoded = writer.finish().unwrap();

        // 3 partial chunks of 8 KiB then the definite tail
        assert_eq!(encoded[0], 0xC0 | TAG_SEIPD);
        assert_eq!(encoded[1], 0xE0 | PARTIAL_CHUNK_POWER);

        let packets = parse_packets(&encoded).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].tag, TAG_SEIPD);
        assert_eq!(packets[0].body, body);
    }

    #[test]
    fn exact_chunk_size_keeps_tail_in_final_segment() {
        let body = vec![7u8; PARTIAL_CHUNK];
        let mut writer = PartialBodyWriter::new(Vec::new(), TAG_LITERAL);
        writer.write_all(&body).unwrap();
        let encoded = writer.finish().unwrap();

        // two-octet definite length, no partial chunk
        assert_eq!(encoded[1], 223);
        assert_eq!(parse_packets(&encoded).unwrap()[0].body, body);
    }

    #[test]
    fn old_format_headers_parse() {
        // tag 11, one-octet length
        let one = [0x80 | (TAG_LITERAL << 2), 3, b'a', b'b', b'c'];
        assert_eq!(parse_packets(&one).unwrap()[0].body, b"abc");

        // tag 3, two-octet length
        let two = [0x80 | (TAG_SKESK << 2) | 1, 0, 2, 9, 9];
        assert_eq!(parse_packets(&two).unwrap()[0], Packet { tag: TAG_SKESK, body: vec![9, 9] });

        // indeterminate length consumes the rest
        let rest = [0x80 | (TAG_LITERAL << 2) | 3, 1, 2, 3];
        assert_eq!(parse_packets(&rest).unwrap()[0].body, vec![1, 2, 3]);
    }

    #[test]
    fn truncated_input_is_malformed() {
        let encoded = encode_packet(TAG_LITERAL, b"hello");
        let result = parse_packets(&encoded[..encoded.len() - 1]);
        assert!(matches!(result, Err(CryptoError::MalformedPacket(_))));
    }

    #[test]
    fn missing_high_bit_is_malformed() {
        assert!(matches!(parse_packets(&[0x3f, 0]), Err(CryptoError::MalformedPacket(_))));
    }
}
