//! Real-input FFT engine
//!
//! Transforms a window of N real samples (stored as complex values with zero
//! imaginary part) into its N/2 + 1 unique bins. The even and odd samples are
//! transformed as two N/2-point complex FFTs and merged with one butterfly
//! pass; the conjugate-symmetric upper half of the spectrum is never computed.
//!
//! The kernel is exp(+2πik/N), so bins are the complex conjugate of the
//! usual forward transform (numpy, realfft). Receivers conjugate back.

use crate::config::validate_window_size;
use crate::error::ConfigError;
use num_complex::Complex32;
use std::f64::consts::PI;

/// FFT engine for real-valued windows of a fixed power-of-two size
#[derive(Debug, Clone)]
pub struct RealFft {
    /// FFT size N (number of samples)
    fft_size: usize,

    /// log2(N/2), the width of the bit-reversed index
    half_bits: u32,

    /// W_N^k = exp(+2πik/N) for k in 0..N/2
    ///
    /// Every second entry is the N/2-point table, so both stages share it.
    twiddles: Vec<Complex32>,

    /// Scratch for the even-indexed half
    even: Vec<Complex32>,

    /// Scratch for the odd-indexed half
    odd: Vec<Complex32>,
}

impl RealFft {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples, power of two, at least 2)
    pub fn new(fft_size: usize) -> Result<Self, ConfigError> {
        validate_window_size(fft_size)?;

        let half = fft_size / 2;
        let twiddles = (0..half)
            .map(|k| {
                let angle = 2.0 * PI * k as f64 / fft_size as f64;
                Complex32::new(angle.cos() as f32, angle.sin() as f32)
            })
            .collect();

        Ok(Self {
            fft_size,
            half_bits: half.trailing_zeros(),
            twiddles,
            even: vec![Complex32::new(0.0, 0.0); half],
            odd: vec![Complex32::new(0.0, 0.0); half],
        })
    }

    /// Transform `window` (N values) into `spectrum` (N/2 + 1 bins).
    ///
    /// The window is only read. Only the real parts are meaningful input; the
    /// imaginary parts are carried through the butterflies unchanged in role,
    /// so callers must keep them at zero for a real transform.
    ///
    /// # Panics
    /// If the slice lengths do not match the engine size.
    pub fn process(&mut self, window: &[Complex32], spectrum: &mut [Complex32]) {
        assert_eq!(window.len(), self.fft_size, "window length must equal the FFT size");
        assert_eq!(spectrum.len(), self.num_bins(), "spectrum length must be N/2 + 1");

        let half = self.fft_size / 2;
        for i in 0..half {
            self.even[i] = window[2 * i];
            self.odd[i] = window[2 * i + 1];
        }

        fft_in_place(&mut self.even, &self.twiddles, self.half_bits);
        fft_in_place(&mut self.odd, &self.twiddles, self.half_bits);

        for i in 0..half {
            spectrum[i] = self.even[i] + self.twiddles[i] * self.odd[i];
        }

        // W_N^(N/2) is exactly -1
        spectrum[half] = self.even[0] - self.odd[0];
    }

    /// Transform real samples, allocating the window and the result
    ///
    /// Convenience for callers off the real-time path.
    pub fn transform(&mut self, samples: &[f32]) -> Vec<Complex32> {
        let window: Vec<Complex32> = samples.iter().map(|&s| Complex32::new(s, 0.0)).collect();
        let mut spectrum = vec![Complex32::new(0.0, 0.0); self.num_bins()];
        self.process(&window, &mut spectrum);
        spectrum
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Convert bin index to Hz for a given sampling interval in seconds
    pub fn bin_to_hz(&self, bin: usize, sampling_interval_s: f64) -> f64 {
        bin as f64 / (self.fft_size as f64 * sampling_interval_s)
    }
}

/// Reverse the low `width` bits of `x`
fn reverse_bits(x: usize, width: u32) -> usize {
    if width == 0 {
        return 0;
    }
    (x as u32).reverse_bits() as usize >> (32 - width)
}

/// In-place iterative radix-2 decimation-in-time FFT
///
/// `data.len()` is M = 2^`bits`; `twiddles` is the table for 2M points, so the
/// factor for a sub-transform of length `size` is every (2M/size)-th entry.
fn fft_in_place(data: &mut [Complex32], twiddles: &[Complex32], bits: u32) {
    let n = data.len();

    for i in 0..n {
        let j = reverse_bits(i, bits);
        if j > i {
            data.swap(i, j);
        }
    }

    let mut size = 2;
    while size <= n {
        let half_size = size / 2;
        let table_step = 2 * n / size;

        for start in (0..n).step_by(size) {
            for k in 0..half_size {
                let a = data[start + k];
                let t = data[start + k + half_size] * twiddles[k * table_step];
                data[start + k] = a + t;
                data[start + k + half_size] = a - t;
            }
        }

        size *= 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use realfft::RealFftPlanner;

    /// Deterministic pseudo-random samples in -1..1
    fn noise(n: usize, seed: u32) -> Vec<f32> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 23) as f32 - 1.0
            })
            .collect()
    }

    fn tone(n: usize, bin: usize, amplitude: f32) -> Vec<f32> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * (bin * i) as f64 / n as f64).cos() as f32)
            .collect()
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(RealFft::new(0).is_err());
        assert!(RealFft::new(1).is_err());
        assert!(RealFft::new(96).is_err());
        assert!(RealFft::new(2).is_ok());
        assert!(RealFft::new(64).is_ok());
    }

    #[test]
    fn test_reverse_bits() {
        assert_eq!(reverse_bits(0b001, 3), 0b100);
        assert_eq!(reverse_bits(0b110, 3), 0b011);
        assert_eq!(reverse_bits(5, 0), 0);
    }

    #[test]
    fn test_pure_tone_peaks_at_its_bin() {
        let mut fft = RealFft::new(64).unwrap();

        for bin in 1..32 {
            let spectrum = fft.transform(&tone(64, bin, 1.0));
            assert_eq!(spectrum.len(), 33);

            for (k, value) in spectrum.iter().enumerate() {
                if k == bin {
                    // A unit cosine puts N/2 into its bin
                    assert_abs_diff_eq!(value.re, 32.0, epsilon = 1e-3);
                    assert_abs_diff_eq!(value.im, 0.0, epsilon = 1e-3);
                } else {
                    assert!(value.norm() < 1e-3, "bin {} leaked {} for tone {}", k, value, bin);
                }
            }
        }
    }

    #[test]
    fn test_dc_and_nyquist() {
        let mut fft = RealFft::new(16).unwrap();

        let spectrum = fft.transform(&[1.0; 16]);
        assert_abs_diff_eq!(spectrum[0].re, 16.0, epsilon = 1e-5);
        assert!(spectrum[1..].iter().all(|c| c.norm() < 1e-5));

        let alternating: Vec<f32> = (0..16).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let spectrum = fft.transform(&alternating);
        assert_abs_diff_eq!(spectrum[8].re, 16.0, epsilon = 1e-5);
        assert!(spectrum[..8].iter().all(|c| c.norm() < 1e-5));
    }

    #[test]
    fn test_sine_has_positive_imaginary_part() {
        let mut fft = RealFft::new(64).unwrap();
        let sine: Vec<f32> = (0..64)
            .map(|i| (2.0 * PI * (8 * i) as f64 / 64.0).sin() as f32)
            .collect();

        let spectrum = fft.transform(&sine);
        assert_abs_diff_eq!(spectrum[8].re, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(spectrum[8].im, 32.0, epsilon = 1e-3);
    }

    #[test]
    fn test_smallest_size() {
        let mut fft = RealFft::new(2).unwrap();
        let spectrum = fft.transform(&[3.0, 1.0]);
        assert_eq!(spectrum, vec![Complex32::new(4.0, 0.0), Complex32::new(2.0, 0.0)]);
    }

    #[test]
    fn test_matches_realfft() {
        for n in [4, 8, 64, 256, 1024] {
            let samples = noise(n, n as u32);
            let mut fft = RealFft::new(n).unwrap();
            let ours = fft.transform(&samples);

            let mut planner = RealFftPlanner::<f32>::new();
            let r2c = planner.plan_fft_forward(n);
            let mut input = samples.clone();
            let mut reference = r2c.make_output_vec();
            r2c.process(&mut input, &mut reference).unwrap();

            let tolerance = 1e-5 * n as f32;
            for (a, b) in ours.iter().zip(reference.iter()) {
                let b = b.conj();
                assert_abs_diff_eq!(a.re, b.re, epsilon = tolerance);
                assert_abs_diff_eq!(a.im, b.im, epsilon = tolerance);
            }
        }
    }

    #[test]
    fn test_matches_full_complex_fft() {
        let n = 128;
        let samples = noise(n, 7);
        let mut fft = RealFft::new(n).unwrap();
        let ours = fft.transform(&samples);

        let mut buffer: Vec<Complex32> = samples.iter().map(|&s| Complex32::new(s, 0.0)).collect();
        rustfft::FftPlanner::<f32>::new().plan_fft_forward(n).process(&mut buffer);

        // The upper half is the mirror image and is not produced
        for (a, b) in ours.iter().zip(&buffer[..n / 2 + 1]) {
            let b = b.conj();
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-3);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_linearity() {
        let mut fft = RealFft::new(64).unwrap();
        let x = noise(64, 1);
        let y = noise(64, 2);
        let (a, b) = (2.5_f32, -0.75_f32);

        let combined: Vec<f32> = x.iter().zip(&y).map(|(&x, &y)| a * x + b * y).collect();
        let lhs = fft.transform(&combined);
        let fx = fft.transform(&x);
        let fy = fft.transform(&y);

        for k in 0..fft.num_bins() {
            let rhs = fx[k] * a + fy[k] * b;
            assert_abs_diff_eq!(lhs[k].re, rhs.re, epsilon = 1e-3);
            assert_abs_diff_eq!(lhs[k].im, rhs.im, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_window_is_not_mutated() {
        let mut fft = RealFft::new(8).unwrap();
        let window: Vec<Complex32> = (0..8).map(|i| Complex32::new(i as f32, 0.0)).collect();
        let copy = window.clone();
        let mut spectrum = vec![Complex32::new(0.0, 0.0); 5];
        fft.process(&window, &mut spectrum);
        assert_eq!(window, copy);
    }

    #[test]
    #[should_panic(expected = "window length")]
    fn test_wrong_window_length_panics() {
        let mut fft = RealFft::new(8).unwrap();
        let mut spectrum = vec![Complex32::new(0.0, 0.0); 5];
        fft.process(&[Complex32::new(0.0, 0.0); 4], &mut spectrum);
    }

    #[test]
    fn test_bin_frequencies() {
        let fft = RealFft::new(64).unwrap();
        assert_eq!(fft.bin_to_hz(0, 0.001), 0.0);
        // 1 ms sampling, 64 samples: 15.625 Hz per bin
        assert!((fft.bin_to_hz(8, 0.001) - 125.0).abs() < 1e-9);
    }
}
