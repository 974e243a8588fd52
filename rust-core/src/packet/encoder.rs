//! Packet wire format and encoder
//!
//! A packet is a run of `(index: u32, re: f32, im: f32)` entries followed by a
//! four byte terminator. Fields are little-endian, the byte order of the
//! target, so the encoder output matches a raw memory dump of the values.

use crate::spectrum::Compressor;
use num_complex::Complex32;

/// Size of one wire field in bytes
pub const FIELD_SIZE: usize = 4;

/// Size of one `(index, re, im)` entry in bytes
pub const ENTRY_SIZE: usize = 3 * FIELD_SIZE;

/// Terminator bytes on the wire: the quiet NaN `0x7FC00000`, high byte first
pub const PACKET_END_BYTES: [u8; FIELD_SIZE] = [0x7F, 0xC0, 0x00, 0x00];

/// Terminator as read into the index field
///
/// Above N/2 for every supported window size, so it can never be mistaken
/// for a bin index.
pub const PACKET_END: u32 = u32::from_le_bytes(PACKET_END_BYTES);

/// Reusable packet buffer
///
/// Sized for the worst case (every bin included) up front so encoding never
/// reallocates.
#[derive(Debug, Clone)]
pub struct PacketEncoder {
    buffer: Vec<u8>,
    entries: usize,
}

impl PacketEncoder {
    /// Create an encoder for spectra of `num_bins` bins
    pub fn new(num_bins: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(num_bins * ENTRY_SIZE + FIELD_SIZE),
            entries: 0,
        }
    }

    /// Compress `spectrum` and return the finished packet
    pub fn encode(&mut self, spectrum: &[Complex32], compressor: &Compressor) -> &[u8] {
        self.clear();
        compressor.select(spectrum, |index, value| self.push_entry(index, value));
        self.finish()
    }

    /// Append one entry
    pub fn push_entry(&mut self, index: u32, value: &Complex32) {
        self.buffer.extend_from_slice(&index.to_le_bytes());
        self.buffer.extend_from_slice(&value.re.to_le_bytes());
        self.buffer.extend_from_slice(&value.im.to_le_bytes());
        self.entries += 1;
    }

    /// Append the terminator and return the packet bytes
    pub fn finish(&mut self) -> &[u8] {
        self.buffer.extend_from_slice(&PACKET_END_BYTES);
        &self.buffer
    }

    /// Start a new packet
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.entries = 0;
    }

    /// Entries in the current packet
    pub fn entries(&self) -> usize {
        self.entries
    }
}
