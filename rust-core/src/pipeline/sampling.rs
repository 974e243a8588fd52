//! Sampling task: fills windows from the inbound transport
//!
//! Each call to [`SamplingPipeline::poll`] is one periodic wake-up. Whole
//! little-endian `f32` samples are appended to the window currently owned by
//! the producer; when the window fills it is published and a fresh write
//! section is opened.
//!
//! If the freshly opened section lands on the same slot as the previous one,
//! the consumer was still reading when the window completed and the flip was
//! deferred. Writing on would overwrite the published window before it is
//! analysed, so the pipeline halts the transport and stops instead.

use super::transport::{SampleSource, SAMPLE_SIZE};
use super::window::Window;
use crate::error::PipelineError;
use crate::handoff::{Slot, WindowProducer};

/// Producer side of the pipeline
pub struct SamplingPipeline {
    producer: WindowProducer<Window>,
    previous: Option<Slot>,
    published: u64,
    halted: bool,
}

impl SamplingPipeline {
    /// Take ownership of the producer end and open the first write section
    pub fn new(mut producer: WindowProducer<Window>) -> Self {
        producer.start_writing().clear();
        let previous = producer.write_slot();

        Self {
            producer,
            previous,
            published: 0,
            halted: false,
        }
    }

    /// Drain every whole sample currently available from `source`
    ///
    /// # Returns
    /// Number of samples ingested. After a missed deadline the error is
    /// returned once; later polls ingest nothing and return `Ok(0)`.
    pub fn poll<S>(&mut self, source: &mut S) -> Result<usize, PipelineError>
    where
        S: SampleSource + ?Sized,
    {
        if self.halted {
            return Ok(0);
        }

        let mut ingested = 0;
        let mut bytes = [0u8; SAMPLE_SIZE];

        while source.available() >= SAMPLE_SIZE {
            if source.read(&mut bytes) != SAMPLE_SIZE {
                break;
            }
            ingested += 1;

            let window = self.producer.start_writing();
            window.push(f32::from_le_bytes(bytes));

            if window.is_full() {
                self.publish(source)?;
            }
        }

        Ok(ingested)
    }

    fn publish<S>(&mut self, source: &mut S) -> Result<(), PipelineError>
    where
        S: SampleSource + ?Sized,
    {
        self.producer.stop_writing();
        self.published += 1;

        self.producer.start_writing();
        let slot = self.producer.write_slot();

        if slot == self.previous {
            // The slot still holds the published window: leave it intact for
            // the consumer and stop writing altogether.
            self.producer.stop_writing();
            self.halted = true;
            source.halt();

            log::error!(
                "Missed deadline: window {} completed while the previous one was in analysis",
                self.published
            );
            return Err(PipelineError::MissedDeadline {
                window: self.published,
            });
        }

        if let Some(window) = self.producer.writing() {
            window.clear();
        }
        self.previous = slot;

        log::debug!("Published window {} ({:?} is now the write slot)", self.published, slot);
        Ok(())
    }

    /// Whether a missed deadline stopped the pipeline
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Windows handed over to the consumer so far
    pub fn windows_published(&self) -> u64 {
        self.published
    }

    /// Samples buffered in the window being filled
    pub fn pending_samples(&mut self) -> usize {
        self.producer.writing().map_or(0, |window| window.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::HandoffBuffer;
    use crate::pipeline::transport::SliceSource;

    fn pipeline(window_size: usize) -> (SamplingPipeline, crate::handoff::WindowConsumer<Window>) {
        let (producer, consumer) =
            HandoffBuffer::new(Window::new(window_size), Window::new(window_size)).split();
        (SamplingPipeline::new(producer), consumer)
    }

    fn encode(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_publishes_full_window() {
        let (mut sampling, mut consumer) = pipeline(4);
        let bytes = encode(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut source = SliceSource::new(&bytes);

        assert_eq!(sampling.poll(&mut source).unwrap(), 5);
        assert_eq!(sampling.windows_published(), 1);
        assert_eq!(sampling.pending_samples(), 1);

        let window = consumer.start_reading().unwrap();
        let reals: Vec<f32> = window.as_slice().iter().map(|c| c.re).collect();
        assert_eq!(reals, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(window.as_slice().iter().all(|c| c.im == 0.0));
        consumer.end_reading();
    }

    #[test]
    fn test_partial_sample_waits_for_next_poll() {
        let (mut sampling, _consumer) = pipeline(4);
        let bytes = encode(&[1.0]);

        let mut source = SliceSource::new(&bytes[..3]);
        assert_eq!(sampling.poll(&mut source).unwrap(), 0);
        assert_eq!(source.available(), 3);
        assert_eq!(sampling.pending_samples(), 0);
    }

    #[test]
    fn test_missed_deadline_is_signalled_once() {
        let (mut sampling, mut consumer) = pipeline(2);

        let bytes = encode(&[1.0, 2.0]);
        sampling.poll(&mut SliceSource::new(&bytes)).unwrap();

        // Consumer stalls inside its read while the next window completes
        assert!(consumer.start_reading().is_some());
        let bytes = encode(&[3.0, 4.0, 5.0, 6.0]);
        let mut source = SliceSource::new(&bytes);

        let result = sampling.poll(&mut source);
        assert!(matches!(result, Err(PipelineError::MissedDeadline { window: 2 })));
        assert!(sampling.is_halted());
        assert!(source.is_halted());

        // No more input, no more errors
        assert_eq!(sampling.poll(&mut SliceSource::new(&bytes)).unwrap(), 0);

        // The window that completed during the stall is still delivered intact
        consumer.end_reading();
        let window = consumer.start_reading().unwrap();
        assert_eq!(window.as_slice()[0].re, 3.0);
        assert_eq!(window.as_slice()[1].re, 4.0);
        consumer.end_reading();
    }

    #[test]
    fn test_unread_windows_are_replaced_without_error() {
        let (mut sampling, mut consumer) = pipeline(2);
        let bytes = encode(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        // Consumer idle, not reading: newer windows replace older ones
        assert_eq!(sampling.poll(&mut SliceSource::new(&bytes)).unwrap(), 6);
        assert_eq!(sampling.windows_published(), 3);

        let window = consumer.start_reading().unwrap();
        assert_eq!(window.as_slice()[0].re, 5.0);
        consumer.end_reading();
    }
}
