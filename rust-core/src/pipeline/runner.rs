//! Two-task runner
//!
//! Runs the sampling task and the spectrum task on their own threads, each
//! paced by a [`Ticker`]. The sampling task wakes every sampling interval,
//! the spectrum task every N intervals, so in steady state each spectrum
//! cycle finds exactly one new window.

use super::analysis::{CycleOutcome, SpectrumPipeline};
use super::sampling::SamplingPipeline;
use super::ticker::Ticker;
use super::transport::{SampleSource, SAMPLE_SIZE};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::packet::CompressionStats;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// What a finished run did
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Windows handed over by the sampling task
    pub windows_published: u64,

    /// Packets written, silent ones included
    pub packets: u64,

    /// Packets that held only the terminator
    pub silent_packets: u64,

    /// Spectrum cycles that found no new window
    pub skipped_cycles: u64,

    /// Window whose completion missed the deadline, if any
    pub missed_deadline: Option<u64>,

    pub stats: CompressionStats,
}

struct SamplingReport {
    windows_published: u64,
    missed_deadline: Option<u64>,
}

struct SpectrumReport {
    skipped_cycles: u64,
    stats: CompressionStats,
}

/// Runs both tasks until the input ends, a deadline is missed or `stop` is called
pub struct PipelineRunner {
    /// Cleared to request shutdown
    running: Arc<AtomicBool>,

    sampling_thread: Option<JoinHandle<SamplingReport>>,

    spectrum_thread: Option<JoinHandle<Result<SpectrumReport, PipelineError>>>,
}

impl PipelineRunner {
    /// Validate the configuration, build both tasks and start them
    ///
    /// # Arguments
    /// * `config` - Pipeline configuration
    /// * `source` - Inbound sample transport
    /// * `sink` - Outbound packet transport
    pub fn start<S, W>(config: &PipelineConfig, source: S, sink: W) -> Result<Self, PipelineError>
    where
        S: SampleSource + Send + 'static,
        W: Write + Send + 'static,
    {
        let (sampling, spectrum) = super::build(config)?;

        let running = Arc::new(AtomicBool::new(true));
        let ingest_done = Arc::new(AtomicBool::new(false));

        log::info!(
            "Starting pipeline: N = {}, sampling every {:?}, spectrum every {:?}",
            config.window_size,
            config.sampling_interval,
            config.window_period()
        );

        if config.bytes_per_interval() < SAMPLE_SIZE as f64 {
            log::warn!(
                "{} baud carries {:.2} bytes per sampling interval, fewer than one sample",
                config.baud_rate,
                config.bytes_per_interval()
            );
        }

        let sampling_thread = {
            let running = Arc::clone(&running);
            let ingest_done = Arc::clone(&ingest_done);
            let interval = config.sampling_interval;
            std::thread::Builder::new()
                .name("sampling".into())
                .spawn(move || {
                    let report = sampling_task(sampling, source, interval, &running);
                    ingest_done.store(true, Ordering::Release);
                    report
                })?
        };

        let spectrum_thread = {
            let flag = Arc::clone(&running);
            let period = config.window_period();
            // Half an interval out of phase with the sampling wake-ups
            let first = Instant::now() + period + config.sampling_interval / 2;
            let ticker = Ticker::starting_at(first, period);
            let spawned = std::thread::Builder::new()
                .name("spectrum".into())
                .spawn(move || spectrum_task(spectrum, sink, ticker, &flag, &ingest_done));

            match spawned {
                Ok(handle) => handle,
                Err(e) => {
                    running.store(false, Ordering::Release);
                    let _ = sampling_thread.join();
                    return Err(e.into());
                }
            }
        };

        Ok(Self {
            running,
            sampling_thread: Some(sampling_thread),
            spectrum_thread: Some(spectrum_thread),
        })
    }

    /// Whether both tasks are still expected to run
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Request shutdown; the spectrum task still runs one last cycle
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Wait for both tasks to finish
    pub fn join(mut self) -> Result<RunSummary, PipelineError> {
        let sampling = match self.sampling_thread.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PipelineError::TaskPanicked("sampling"))?,
            None => return Err(PipelineError::TaskPanicked("sampling")),
        };

        let spectrum = match self.spectrum_thread.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PipelineError::TaskPanicked("spectrum"))??,
            None => return Err(PipelineError::TaskPanicked("spectrum")),
        };

        let summary = RunSummary {
            windows_published: sampling.windows_published,
            packets: spectrum.stats.windows,
            silent_packets: spectrum.stats.silent,
            skipped_cycles: spectrum.skipped_cycles,
            missed_deadline: sampling.missed_deadline,
            stats: spectrum.stats,
        };

        log::info!(
            "Pipeline stopped: {} windows published, {} packets sent",
            summary.windows_published,
            summary.packets
        );
        Ok(summary)
    }
}

impl Drop for PipelineRunner {
    fn drop(&mut self) {
        self.stop();

        if let Some(handle) = self.sampling_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.spectrum_thread.take() {
            let _ = handle.join();
        }
    }
}

fn sampling_task<S: SampleSource>(
    mut sampling: SamplingPipeline,
    mut source: S,
    interval: Duration,
    running: &AtomicBool,
) -> SamplingReport {
    let mut ticker = Ticker::new(interval);
    let mut missed_deadline = None;

    while running.load(Ordering::Acquire) {
        match sampling.poll(&mut source) {
            Ok(_) => {}
            Err(PipelineError::MissedDeadline { window }) => {
                missed_deadline = Some(window);
                break;
            }
            Err(e) => {
                log::error!("Sampling task failed: {}", e);
                break;
            }
        }

        if source.is_finished() {
            log::debug!("Inbound transport finished");
            break;
        }
        ticker.wait();
    }

    if ticker.overruns() > 0 {
        log::warn!("Sampling task overran its period {} times", ticker.overruns());
    }

    SamplingReport {
        windows_published: sampling.windows_published(),
        missed_deadline,
    }
}

fn spectrum_task<W: Write>(
    mut spectrum: SpectrumPipeline,
    mut sink: W,
    mut ticker: Ticker,
    running: &AtomicBool,
    ingest_done: &AtomicBool,
) -> Result<SpectrumReport, PipelineError> {
    let mut skipped_cycles = 0;

    loop {
        ticker.wait();

        // Sampled before the cycle, so the last published window is still read
        let last = ingest_done.load(Ordering::Acquire) || !running.load(Ordering::Acquire);

        match spectrum.cycle(&mut sink) {
            Ok(CycleOutcome::Skipped) => skipped_cycles += 1,
            Ok(_) => {}
            Err(e) => {
                log::error!("Spectrum task failed: {}", e);
                running.store(false, Ordering::Release);
                return Err(e);
            }
        }

        if last {
            break;
        }
    }

    Ok(SpectrumReport {
        skipped_cycles,
        stats: *spectrum.stats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PacketDecoder;
    use crate::pipeline::transport::SerialLine;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Sink shared with the test thread
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn config(window_size: usize) -> PipelineConfig {
        PipelineConfig {
            window_size,
            sampling_interval: Duration::from_millis(1),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let (_writer, reader) = SerialLine::new(64);
        let result = PipelineRunner::start(&config(6), reader, Vec::new());
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_runs_until_input_ends() {
        let (mut writer, reader) = SerialLine::new(1024);
        // One window of DC, fully buffered before the tasks start
        for _ in 0..8 {
            assert!(writer.write_sample(1.0));
        }
        writer.close();

        let sink = SharedSink::default();
        let runner = PipelineRunner::start(&config(8), reader, sink.clone()).unwrap();
        let summary = runner.join().unwrap();

        assert_eq!(summary.windows_published, 1);
        assert_eq!(summary.missed_deadline, None);
        assert_eq!(summary.packets, 1);

        let bytes = sink.0.lock().unwrap().clone();
        let frames = PacketDecoder::new(8).unwrap().push(&bytes).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].indices, vec![0]);
    }

    #[test]
    fn test_stop_ends_idle_run() {
        let (_writer, reader) = SerialLine::new(64);
        let sink = SharedSink::default();
        let runner = PipelineRunner::start(&config(8), reader, sink.clone()).unwrap();
        assert!(runner.is_running());

        std::thread::sleep(Duration::from_millis(20));
        runner.stop();
        let summary = runner.join().unwrap();

        assert_eq!(summary.windows_published, 0);
        assert_eq!(summary.packets, 0);
        assert!(summary.skipped_cycles >= 1);
        assert!(sink.0.lock().unwrap().is_empty());
    }
}
