//! Spectrum task: transform, compress and transmit the newest window

use super::window::Window;
use crate::error::{ConfigError, PipelineError};
use crate::handoff::WindowConsumer;
use crate::packet::{CompressionStats, PacketEncoder};
use crate::spectrum::{Compressor, RealFft};
use num_complex::Complex32;
use std::io::Write;

/// Result of one spectrum cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No window was published since the last cycle
    Skipped,
    /// The window was silent; only the terminator was sent
    Silence,
    /// A packet with `entries` entries was sent
    Emitted { entries: usize },
}

/// Consumer side of the pipeline
///
/// Owns the FFT engine and every buffer it needs, so a cycle never allocates.
pub struct SpectrumPipeline {
    consumer: WindowConsumer<Window>,
    engine: RealFft,
    spectrum: Vec<Complex32>,
    compressor: Compressor,
    encoder: PacketEncoder,
    stats: CompressionStats,
}

impl SpectrumPipeline {
    /// Create the spectrum side
    ///
    /// # Arguments
    /// * `consumer` - Consumer end of the window handoff
    /// * `engine` - FFT engine sized for the windows
    /// * `amplitude_threshold` - Fraction of the peak amplitude a bin needs
    /// * `window_capacity` - Capacity of the windows in the handoff
    pub fn new(
        consumer: WindowConsumer<Window>,
        engine: RealFft,
        amplitude_threshold: f32,
        window_capacity: usize,
    ) -> Result<Self, ConfigError> {
        if window_capacity != engine.fft_size() {
            return Err(ConfigError::WindowMismatch {
                capacity: window_capacity,
                fft_size: engine.fft_size(),
            });
        }

        let num_bins = engine.num_bins();
        Ok(Self {
            consumer,
            spectrum: vec![Complex32::new(0.0, 0.0); num_bins],
            compressor: Compressor::new(amplitude_threshold),
            encoder: PacketEncoder::new(num_bins),
            stats: CompressionStats::new(engine.fft_size()),
            engine,
        })
    }

    /// Run one cycle against the outbound transport
    ///
    /// The window is released as soon as the transform finished, before the
    /// packet is built, to keep the read section short. Each packet goes out
    /// in a single write.
    pub fn cycle<Wr>(&mut self, sink: &mut Wr) -> Result<CycleOutcome, PipelineError>
    where
        Wr: Write + ?Sized,
    {
        let Some(window) = self.consumer.start_reading() else {
            log::trace!("No new window, cycle skipped");
            return Ok(CycleOutcome::Skipped);
        };
        self.engine.process(window.as_slice(), &mut self.spectrum);
        self.consumer.end_reading();

        let packet = self.encoder.encode(&self.spectrum, &self.compressor);
        sink.write_all(packet)?;
        sink.flush()?;

        let entries = self.encoder.entries();
        self.stats.record(entries);
        log::debug!("Window {} sent with {} entries", self.stats.windows, entries);

        Ok(if entries == 0 {
            CycleOutcome::Silence
        } else {
            CycleOutcome::Emitted { entries }
        })
    }

    /// Spectrum of the last analysed window
    pub fn spectrum(&self) -> &[Complex32] {
        &self.spectrum
    }

    pub fn stats(&self) -> &CompressionStats {
        &self.stats
    }
}
