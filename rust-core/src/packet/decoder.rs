//! Host-side packet decoder and lossy reconstruction
//!
//! Turns the outbound byte stream back into frames of N/2 + 1 bins (bins
//! that were not transmitted are zero) and optionally back into time-domain
//! samples with an inverse real FFT.
//!
//! Wire bins carry the conjugate of the standard forward spectrum; frames
//! hold the standard spectrum.

use super::encoder::{ENTRY_SIZE, FIELD_SIZE, PACKET_END};
use crate::config::validate_window_size;
use crate::error::{ConfigError, DecodeError};
use num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner};
use std::sync::Arc;

/// One decoded packet
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// All N/2 + 1 bins, zero where nothing was transmitted
    ///
    /// Standard sign convention: a sine at bin k has a negative imaginary part.
    pub bins: Vec<Complex32>,

    /// Indices received, in stream order
    pub indices: Vec<u32>,
}

impl Frame {
    fn empty(num_bins: usize) -> Self {
        Self {
            bins: vec![Complex32::new(0.0, 0.0); num_bins],
            indices: Vec::new(),
        }
    }

    /// A frame with no entries encodes a silent window
    pub fn is_silent(&self) -> bool {
        self.indices.is_empty()
    }

    /// Window size N this frame was computed from
    pub fn window_size(&self) -> usize {
        self.bins.len().saturating_sub(1) * 2
    }

    /// Lossy time-domain reconstruction of the window
    pub fn reconstruct(&self) -> Result<Vec<f32>, ConfigError> {
        let mut reconstructor = Reconstructor::new(self.window_size())?;
        Ok(reconstructor.reconstruct(self).to_vec())
    }
}

/// Streaming decoder; bytes may arrive split at any position
#[derive(Debug)]
pub struct PacketDecoder {
    num_bins: usize,
    pending: Vec<u8>,
    frame: Frame,
}

impl PacketDecoder {
    /// Create decoder for packets of windows of `window_size` samples
    pub fn new(window_size: usize) -> Result<Self, ConfigError> {
        validate_window_size(window_size)?;
        let num_bins = window_size / 2 + 1;

        Ok(Self {
            num_bins,
            pending: Vec::with_capacity(ENTRY_SIZE),
            frame: Frame::empty(num_bins),
        })
    }

    /// Feed bytes; returns every frame completed by them.
    ///
    /// An out-of-range index drops the partial frame and all buffered bytes,
    /// since the stream cannot be resynchronized from inside an entry.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<Frame>, DecodeError> {
        self.pending.extend_from_slice(bytes);

        let mut frames = Vec::new();
        let mut cursor = 0;

        while self.pending.len() - cursor >= FIELD_SIZE {
            let index = read_u32(&self.pending[cursor..]);

            if index == PACKET_END {
                cursor += FIELD_SIZE;
                let frame = std::mem::replace(&mut self.frame, Frame::empty(self.num_bins));
                frames.push(frame);
                continue;
            }

            if index as usize >= self.num_bins {
                self.reset();
                return Err(DecodeError::IndexOutOfRange {
                    index,
                    num_bins: self.num_bins,
                });
            }

            if self.pending.len() - cursor < ENTRY_SIZE {
                break;
            }

            let re = f32::from_bits(read_u32(&self.pending[cursor + FIELD_SIZE..]));
            let im = f32::from_bits(read_u32(&self.pending[cursor + 2 * FIELD_SIZE..]));
            self.frame.bins[index as usize] = Complex32::new(re, -im);
            self.frame.indices.push(index);
            cursor += ENTRY_SIZE;
        }

        self.pending.drain(..cursor);
        Ok(frames)
    }

    /// Drop buffered bytes and the partial frame
    pub fn reset(&mut self) {
        self.pending.clear();
        self.frame = Frame::empty(self.num_bins);
    }

    /// Bytes waiting for the rest of their field
    pub fn pending_bytes(&self) -> usize {
        self.pending.len()
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Inverse real FFT for frames of a fixed window size
pub struct Reconstructor {
    window_size: usize,
    c2r: Arc<dyn ComplexToReal<f32>>,
    input: Vec<Complex32>,
    output: Vec<f32>,
}

impl Reconstructor {
    pub fn new(window_size: usize) -> Result<Self, ConfigError> {
        validate_window_size(window_size)?;

        let mut planner = RealFftPlanner::<f32>::new();
        let c2r = planner.plan_fft_inverse(window_size);
        let input = c2r.make_input_vec();
        let output = c2r.make_output_vec();

        Ok(Self {
            window_size,
            c2r,
            input,
            output,
        })
    }

    /// Reconstruct the time-domain window of `frame`, normalized by 1/N
    ///
    /// # Panics
    /// If the frame was decoded for a different window size.
    pub fn reconstruct(&mut self, frame: &Frame) -> &[f32] {
        assert_eq!(frame.window_size(), self.window_size, "frame window size mismatch");

        self.input.copy_from_slice(&frame.bins);
        // DC and Nyquist of a real signal are real
        let last = self.input.len() - 1;
        self.input[0].im = 0.0;
        self.input[last].im = 0.0;

        if let Err(e) = self.c2r.process(&mut self.input, &mut self.output) {
            log::warn!("Inverse FFT failed: {}", e);
            self.output.fill(0.0);
        }

        let scale = 1.0 / self.window_size as f32;
        for sample in self.output.iter_mut() {
            *sample *= scale;
        }

        &self.output
    }
}
