//! Spectrum Link - Real-Time Spectrum Analyzer Core
//!
//! Streams samples into fixed-size windows, computes their real FFT and sends
//! a thresholded, compressed spectrum per window. A two-slot wait-free
//! handoff sits between the sampling task and the spectrum task.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod config;
pub mod error;
pub mod handoff;
pub mod packet;
pub mod pipeline;
pub mod signal;
pub mod spectrum;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use config::PipelineConfig;
pub use error::{ConfigError, DecodeError, PipelineError};
pub use handoff::{HandoffBuffer, WindowConsumer, WindowProducer};
pub use packet::{CompressionStats, Frame, PacketDecoder, PacketEncoder};
pub use pipeline::{PipelineRunner, RunSummary, SamplingPipeline, SpectrumPipeline, Window};
pub use spectrum::{Compressor, RealFft};
