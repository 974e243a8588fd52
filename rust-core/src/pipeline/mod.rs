//! Sampling and spectrum tasks and the plumbing between them

pub mod analysis;
pub mod runner;
pub mod sampling;
pub mod ticker;
pub mod transport;
pub mod window;

pub use analysis::{CycleOutcome, SpectrumPipeline};
pub use runner::{PipelineRunner, RunSummary};
pub use sampling::SamplingPipeline;
pub use ticker::Ticker;
pub use transport::{LineReader, LineWriter, SampleSource, SerialLine, SliceSource, SAMPLE_SIZE};
pub use window::Window;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::handoff::HandoffBuffer;
use crate::packet::CompressionStats;
use crate::spectrum::RealFft;
use std::io::Write;

/// Build both sides of a pipeline around a fresh handoff buffer
pub fn build(
    config: &PipelineConfig,
) -> Result<(SamplingPipeline, SpectrumPipeline), PipelineError> {
    config.validate()?;

    let n = config.window_size;
    let engine = RealFft::new(n)?;
    let (producer, consumer) = HandoffBuffer::new(Window::new(n), Window::new(n)).split();
    let spectrum = SpectrumPipeline::new(consumer, engine, config.amplitude_threshold, n)?;

    Ok((SamplingPipeline::new(producer), spectrum))
}

/// Run recorded sample bytes through the pipeline without real-time pacing
///
/// Windows are handed over one at a time, so every complete window produces
/// exactly one packet. Trailing bytes that do not fill a window are ignored.
pub fn analyze_offline<W>(
    config: &PipelineConfig,
    samples: &[u8],
    sink: &mut W,
) -> Result<CompressionStats, PipelineError>
where
    W: Write + ?Sized,
{
    let (mut sampling, mut spectrum) = build(config)?;

    for chunk in samples.chunks(config.window_size * SAMPLE_SIZE) {
        sampling.poll(&mut SliceSource::new(chunk))?;
        spectrum.cycle(sink)?;
    }

    Ok(*spectrum.stats())
}
