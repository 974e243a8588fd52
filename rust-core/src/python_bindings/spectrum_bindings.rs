//! Python bindings for the RealFFT engine

use super::value_error;
use crate::spectrum::RealFft;
use numpy::{PyArray1, PyReadonlyArray1};
use num_complex::Complex32;
use pyo3::prelude::*;

/// RealFFT engine exposed to Python
#[pyclass(name = "RealFft")]
pub struct PyRealFft {
    engine: RealFft,
}

#[pymethods]
impl PyRealFft {
    /// Create an engine for windows of `fft_size` samples
    ///
    /// Args:
    ///     fft_size: Window size (power of two, at least 2)
    #[new]
    #[pyo3(signature = (fft_size=64))]
    fn new(fft_size: usize) -> PyResult<Self> {
        Ok(Self {
            engine: RealFft::new(fft_size).map_err(value_error)?,
        })
    }

    /// Transform one window of real samples
    ///
    /// Args:
    ///     samples: float32 numpy array of length fft_size
    ///
    /// Returns:
    ///     complex64 numpy array of fft_size / 2 + 1 bins, the complex
    ///     conjugate of numpy.fft.rfft(samples)
    fn transform<'py>(
        &mut self,
        py: Python<'py>,
        samples: PyReadonlyArray1<f32>,
    ) -> PyResult<&'py PyArray1<Complex32>> {
        let samples = samples.as_slice().map_err(value_error)?;
        if samples.len() != self.engine.fft_size() {
            return Err(value_error(format!(
                "expected {} samples, got {}",
                self.engine.fft_size(),
                samples.len()
            )));
        }

        Ok(PyArray1::from_vec(py, self.engine.transform(samples)))
    }

    /// Frequency of each bin in Hz for a given sampling interval
    ///
    /// Args:
    ///     sampling_interval: Seconds between two samples
    #[pyo3(signature = (sampling_interval=0.001))]
    fn frequencies<'py>(&self, py: Python<'py>, sampling_interval: f64) -> &'py PyArray1<f64> {
        let freqs: Vec<f64> = (0..self.engine.num_bins())
            .map(|bin| self.engine.bin_to_hz(bin, sampling_interval))
            .collect();
        PyArray1::from_vec(py, freqs)
    }

    fn fft_size(&self) -> usize {
        self.engine.fft_size()
    }

    fn num_bins(&self) -> usize {
        self.engine.num_bins()
    }
}
