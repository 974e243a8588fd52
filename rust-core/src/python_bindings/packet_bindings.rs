//! Python bindings for the packet encoder and the host-side decoder

use super::value_error;
use crate::packet::{Frame, PacketDecoder, PacketEncoder, Reconstructor};
use crate::spectrum::{Compressor, RealFft};
use num_complex::Complex32;
use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;
use pyo3::types::PyBytes;

/// Streaming packet decoder exposed to Python
///
/// Feed it the raw bytes read from the serial port; it returns every packet
/// completed so far.
#[pyclass(name = "PacketDecoder")]
pub struct PyPacketDecoder {
    decoder: PacketDecoder,
    reconstructor: Reconstructor,
    frames: Vec<Frame>,
}

#[pymethods]
impl PyPacketDecoder {
    /// Args:
    ///     window_size: Window size N used by the transmitter
    #[new]
    #[pyo3(signature = (window_size=64))]
    fn new(window_size: usize) -> PyResult<Self> {
        Ok(Self {
            decoder: PacketDecoder::new(window_size).map_err(value_error)?,
            reconstructor: Reconstructor::new(window_size).map_err(value_error)?,
            frames: Vec::new(),
        })
    }

    /// Decode received bytes
    ///
    /// Returns:
    ///     List of complex64 numpy arrays, one per completed packet, in the
    ///     numpy.fft.rfft sign convention
    fn push<'py>(
        &mut self,
        py: Python<'py>,
        data: &[u8],
    ) -> PyResult<Vec<&'py PyArray1<Complex32>>> {
        self.frames = self.decoder.push(data).map_err(value_error)?;
        Ok(self
            .frames
            .iter()
            .map(|frame| PyArray1::from_slice(py, &frame.bins))
            .collect())
    }

    /// Time-domain reconstruction of the packets returned by the last `push`
    ///
    /// Returns:
    ///     List of float32 numpy arrays of window_size samples
    fn reconstruct<'py>(&mut self, py: Python<'py>) -> Vec<&'py PyArray1<f32>> {
        let mut windows = Vec::with_capacity(self.frames.len());
        for frame in &self.frames {
            windows.push(PyArray1::from_slice(py, self.reconstructor.reconstruct(frame)));
        }
        windows
    }

    /// Drop partially received data
    fn reset(&mut self) {
        self.decoder.reset();
        self.frames.clear();
    }

    fn pending_bytes(&self) -> usize {
        self.decoder.pending_bytes()
    }
}

/// Compress one window exactly as the spectrum task does
///
/// Args:
///     samples: float32 numpy array, length a power of two
///     threshold: Fraction of the peak amplitude a bin needs
///
/// Returns:
///     Packet bytes, terminator included
#[pyfunction]
#[pyo3(signature = (samples, threshold=0.1))]
pub fn encode_window<'py>(
    py: Python<'py>,
    samples: PyReadonlyArray1<f32>,
    threshold: f32,
) -> PyResult<&'py PyBytes> {
    let samples = samples.as_slice().map_err(value_error)?;
    let mut engine = RealFft::new(samples.len()).map_err(value_error)?;
    let spectrum = engine.transform(samples);

    let mut encoder = PacketEncoder::new(engine.num_bins());
    let packet = encoder.encode(&spectrum, &Compressor::new(threshold));
    Ok(PyBytes::new(py, packet))
}
