//! Spectral analysis: real FFT and spectrum compression

pub mod compress;
pub mod fft;

pub use compress::{abs2, peak_index, Compressor};
pub use fft::RealFft;
