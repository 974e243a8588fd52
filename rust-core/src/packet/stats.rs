//! Running compression statistics

use super::encoder::{ENTRY_SIZE, FIELD_SIZE};

/// Counts of what the spectrum task emitted
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompressionStats {
    /// Windows analyzed
    pub windows: u64,

    /// Entries emitted over all packets
    pub entries: u64,

    /// Packets that held only the terminator
    pub silent: u64,

    /// Window size N
    pub window_size: usize,
}

impl CompressionStats {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            ..Self::default()
        }
    }

    /// Account for one packet with `entries` entries
    pub fn record(&mut self, entries: usize) {
        self.windows += 1;
        self.entries += entries as u64;
        if entries == 0 {
            self.silent += 1;
        }
    }

    /// Bytes put on the outbound transport
    pub fn packet_bytes(&self) -> u64 {
        self.entries * ENTRY_SIZE as u64 + self.windows * FIELD_SIZE as u64
    }

    /// Bytes the raw samples of the same windows would take
    pub fn raw_bytes(&self) -> u64 {
        self.windows * self.window_size as u64 * FIELD_SIZE as u64
    }

    /// Fraction of the raw size saved (0 when nothing was sent yet)
    ///
    /// Negative when packets were larger than the samples.
    pub fn compression_ratio(&self) -> f64 {
        let raw = self.raw_bytes();
        if raw == 0 {
            return 0.0;
        }
        1.0 - self.packet_bytes() as f64 / raw as f64
    }

    /// Mean entries per packet
    pub fn mean_entries(&self) -> f64 {
        if self.windows == 0 {
            return 0.0;
        }
        self.entries as f64 / self.windows as f64
    }
}
