//! Synthetic test signals
//!
//! Used by the command line simulator, the benches and the tests. Tones are
//! placed on exact bins so their spectra are known in closed form: a cosine
//! of amplitude A at bin k (0 < k < N/2) shows up as `A·N/2` at bin k.

use std::f64::consts::PI;
use std::time::Duration;

/// A sinusoid aligned to an FFT bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Cycles per window
    pub bin: usize,
    pub amplitude: f32,
    /// Phase offset in radians
    pub phase: f32,
}

impl Tone {
    pub fn new(bin: usize, amplitude: f32, phase: f32) -> Self {
        Self {
            bin,
            amplitude,
            phase,
        }
    }

    /// Value of sample `n` of a window of `window_size` samples
    pub fn sample(&self, n: usize, window_size: usize) -> f32 {
        let angle = 2.0 * PI * (self.bin * n) as f64 / window_size as f64 + self.phase as f64;
        (self.amplitude as f64 * angle.cos()) as f32
    }
}

/// One window holding the sum of `tones`
pub fn synthesize(window_size: usize, tones: &[Tone]) -> Vec<f32> {
    (0..window_size)
        .map(|n| tones.iter().map(|tone| tone.sample(n, window_size)).sum())
        .collect()
}

/// Host demo signal `8 cos(2π·20t) + 3 sin(2π·80t) − 5`, `t` in seconds
pub fn demo_signal(t: f64) -> f32 {
    (8.0 * (2.0 * PI * 20.0 * t).cos() + 3.0 * (2.0 * PI * 80.0 * t).sin() - 5.0) as f32
}

/// `count` samples of the demo signal taken every `interval`
pub fn demo_samples(count: usize, interval: Duration) -> Vec<f32> {
    let dt = interval.as_secs_f64();
    (0..count).map(|i| demo_signal(i as f64 * dt)).collect()
}

/// Encode samples the way the transmitter puts them on the line
pub fn to_bytes(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
