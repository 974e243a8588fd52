//! Spectrum compression: keep only bins close enough to the peak
//!
//! The peak is picked with the cheap |re| + |im| metric while the inclusion
//! test uses true squared magnitudes; neither needs a square root. The two
//! metrics can rank bins differently, so the peak is not always the bin with
//! the largest magnitude.

use num_complex::Complex32;

/// Squared magnitude, re² + im²
#[inline]
pub fn abs2(value: &Complex32) -> f32 {
    value.re * value.re + value.im * value.im
}

/// Taxicab distance from the origin, |re| + |im|
#[inline]
pub fn taxicab(value: &Complex32) -> f32 {
    value.re.abs() + value.im.abs()
}

/// Index of the reference peak bin
///
/// Left-to-right scan where only a strictly greater |re| + |im| replaces the
/// current candidate, so the first of several equal maxima wins.
/// Returns `None` for an empty spectrum.
pub fn peak_index(spectrum: &[Complex32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, value) in spectrum.iter().enumerate() {
        let distance = taxicab(value);
        let replace = match best {
            None => true,
            Some((_, current)) => current < distance,
        };
        if replace {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// Selects the bins that go into a packet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compressor {
    /// Squared amplitude threshold relative to the peak
    threshold_squared: f32,
}

impl Compressor {
    /// Create a compressor
    ///
    /// # Arguments
    /// * `amplitude_threshold` - Fraction of the peak amplitude (0 to 1)
    pub fn new(amplitude_threshold: f32) -> Self {
        Self {
            threshold_squared: amplitude_threshold * amplitude_threshold,
        }
    }

    /// Visit the included bins in ascending index order.
    ///
    /// Returns the number of bins visited. A spectrum whose peak has zero
    /// energy is silence and visits nothing.
    pub fn select<F>(&self, spectrum: &[Complex32], mut emit: F) -> usize
    where
        F: FnMut(u32, &Complex32),
    {
        let Some(peak) = peak_index(spectrum) else {
            return 0;
        };

        let peak_energy = abs2(&spectrum[peak]);
        if peak_energy == 0.0 {
            return 0;
        }

        let multiplier = 1.0 / peak_energy;
        let mut count = 0;
        for (index, value) in spectrum.iter().enumerate() {
            if abs2(value) * multiplier >= self.threshold_squared {
                emit(index as u32, value);
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f32, im: f32) -> Complex32 {
        Complex32::new(re, im)
    }

    fn selected(compressor: &Compressor, spectrum: &[Complex32]) -> Vec<u32> {
        let mut indices = Vec::new();
        compressor.select(spectrum, |index, _| indices.push(index));
        indices
    }

    #[test]
    fn test_peak_uses_taxicab_metric() {
        // |3+3i| taxicab 6 beats |5| taxicab 5 although 5 has more energy (25 vs 18)
        let spectrum = [c(5.0, 0.0), c(3.0, 3.0), c(1.0, 0.0)];
        assert_eq!(peak_index(&spectrum), Some(1));
    }

    #[test]
    fn test_peak_tie_keeps_first() {
        let spectrum = [c(0.0, 0.0), c(2.0, 0.0), c(0.0, -2.0), c(1.0, 1.0)];
        assert_eq!(peak_index(&spectrum), Some(1));
        assert_eq!(peak_index(&[]), None);
    }

    #[test]
    fn test_single_bin_selected() {
        let mut spectrum = vec![c(0.0, 0.0); 33];
        spectrum[5] = c(0.0, -4.0);
        assert_eq!(selected(&Compressor::new(0.1), &spectrum), vec![5]);
    }

    #[test]
    fn test_silence_selects_nothing() {
        let spectrum = vec![c(0.0, 0.0); 33];
        assert!(selected(&Compressor::new(0.1), &spectrum).is_empty());
    }

    #[test]
    fn test_threshold_boundary() {
        // 0.1 of the peak amplitude is 1% of its energy
        let spectrum = [c(10.0, 0.0), c(1.01, 0.0), c(0.99, 0.0)];
        assert_eq!(selected(&Compressor::new(0.1), &spectrum), vec![0, 1]);
    }

    #[test]
    fn test_inclusion_relative_to_taxicab_peak() {
        // Peak (by taxicab) is bin 1 with energy 18; bin 0 has energy 25 > 18,
        // so its ratio exceeds 1 and it is still included.
        let spectrum = [c(5.0, 0.0), c(3.0, 3.0), c(0.5, 0.0)];
        assert_eq!(selected(&Compressor::new(0.5), &spectrum), vec![0, 1]);
    }

    #[test]
    fn test_zero_threshold_keeps_everything() {
        let spectrum = [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.5)];
        assert_eq!(selected(&Compressor::new(0.0), &spectrum), vec![0, 1, 2]);
    }
}
