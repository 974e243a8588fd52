//! Error types for the spectrum link pipeline

use thiserror::Error;

/// Construction-time configuration errors
///
/// These are programming errors: they surface before any task is scheduled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Window size must be a power of two and at least 2 (found: {0})")]
    WindowSizeNotPowerOfTwo(usize),

    #[error("Window size {0} exceeds the largest supported window")]
    WindowTooLarge(usize),

    #[error("Amplitude threshold must be within 0..=1 (found: {0})")]
    InvalidThreshold(f32),

    #[error("Sampling interval must be non-zero")]
    ZeroSamplingInterval,

    #[error("Baud rate must be non-zero")]
    ZeroBaudRate,

    #[error("Window capacity {capacity} does not match the FFT size {fft_size}")]
    WindowMismatch { capacity: usize, fft_size: usize },
}

/// Errors raised while the two tasks are running
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The producer filled a window before the consumer vacated the previous one
    #[error("Missed deadline: window {window} completed before the previous one was released")]
    MissedDeadline { window: u64 },

    #[error("Outbound transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task panicked: {0}")]
    TaskPanicked(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised by the host-side packet decoder
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Bin index {index} is out of range for {num_bins} bins")]
    IndexOutOfRange { index: u32, num_bins: usize },
}
