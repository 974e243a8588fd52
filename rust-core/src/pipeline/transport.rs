//! Inbound sample transport
//!
//! The sampling task only needs to know how many bytes are waiting, to read
//! them, and to shut the line down on a missed deadline. [`SerialLine`] is an
//! in-memory stand-in for the serial port, a lock-free byte ring between a
//! transmitter thread and the sampling task.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Size of one sample on the wire
pub const SAMPLE_SIZE: usize = std::mem::size_of::<f32>();

/// Byte stream the sampling task drains
pub trait SampleSource {
    /// Bytes that can be read without waiting
    fn available(&self) -> usize;

    /// Read `buf.len()` bytes. Callers never ask for more than `available()`.
    ///
    /// Returns the number of bytes read.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Stop accepting input
    fn halt(&mut self);

    /// No more bytes will ever become available
    fn is_finished(&self) -> bool;
}

/// Reads from a byte slice, for offline runs and tests
#[derive(Debug)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    halted: bool,
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            halted: false,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

impl SampleSource for SliceSource<'_> {
    fn available(&self) -> usize {
        if self.halted {
            0
        } else {
            self.bytes.len()
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.available());
        buf[..n].copy_from_slice(&self.bytes[..n]);
        self.bytes = &self.bytes[n..];
        n
    }

    fn halt(&mut self) {
        self.halted = true;
    }

    fn is_finished(&self) -> bool {
        self.halted || self.bytes.is_empty()
    }
}

struct LineState {
    halted: AtomicBool,
    closed: AtomicBool,
}

/// In-memory serial line
pub struct SerialLine;

impl SerialLine {
    /// Create a line buffering up to `capacity` bytes
    pub fn new(capacity: usize) -> (LineWriter, LineReader) {
        let rb = HeapRb::<u8>::new(capacity);
        let (producer, consumer) = rb.split();
        let state = Arc::new(LineState {
            halted: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        });

        (
            LineWriter {
                producer,
                state: Arc::clone(&state),
            },
            LineReader { consumer, state },
        )
    }
}

/// Transmitting end of the line
pub struct LineWriter {
    producer: HeapProducer<u8>,
    state: Arc<LineState>,
}

impl LineWriter {
    /// Write bytes to the line
    ///
    /// # Returns
    /// Number of bytes accepted (less than `bytes.len()` if the line is full,
    /// zero once the receiver halted or the line was closed)
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        if self.is_halted() || self.state.closed.load(Ordering::Acquire) {
            return 0;
        }
        self.producer.push_slice(bytes)
    }

    /// Write one sample, all four bytes or none
    pub fn write_sample(&mut self, sample: f32) -> bool {
        if self.producer.free_len() < SAMPLE_SIZE {
            return false;
        }
        self.write(&sample.to_le_bytes()) == SAMPLE_SIZE
    }

    /// Get number of free bytes
    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }

    /// The receiver stopped listening
    pub fn is_halted(&self) -> bool {
        self.state.halted.load(Ordering::Acquire)
    }

    /// End of transmission
    pub fn close(&self) {
        self.state.closed.store(true, Ordering::Release);
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Receiving end of the line
pub struct LineReader {
    consumer: HeapConsumer<u8>,
    state: Arc<LineState>,
}

impl LineReader {
    pub fn is_halted(&self) -> bool {
        self.state.halted.load(Ordering::Acquire)
    }
}

impl SampleSource for LineReader {
    fn available(&self) -> usize {
        if self.is_halted() {
            return 0;
        }
        self.consumer.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        self.consumer.pop_slice(buf)
    }

    fn halt(&mut self) {
        self.state.halted.store(true, Ordering::Release);
    }

    fn is_finished(&self) -> bool {
        self.is_halted() || (self.state.closed.load(Ordering::Acquire) && self.consumer.is_empty())
    }
}
