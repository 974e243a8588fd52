//! Fixed-capacity analysis window

use num_complex::Complex32;

/// Window of N complex samples, filled with `(sample, 0)` by the producer
///
/// Storage is reserved once; `clear` only resets the fill count, so the
/// window never reallocates in the sampling loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    samples: Vec<Complex32>,
    capacity: usize,
}

impl Window {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a real sample
    ///
    /// # Panics
    /// If the window is already full.
    pub fn push(&mut self, sample: f32) {
        assert!(!self.is_full(), "push into a full window");
        self.samples.push(Complex32::new(sample, 0.0));
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[Complex32] {
        &self.samples
    }
}
