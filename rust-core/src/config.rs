//! Build-time configuration for the sampling and spectrum tasks
//!
//! Values are read when the pipeline is built and not consulted afterwards.

use crate::error::ConfigError;
use std::time::Duration;

/// Samples per analysis window (must be a power of two)
pub const WINDOW_SIZE: usize = 64;

/// Largest supported window; bin indices must stay below the packet terminator
pub const MAX_WINDOW_SIZE: usize = 1 << 16;

/// Interval between two inbound samples
pub const SAMPLING_INTERVAL: Duration = Duration::from_millis(1);

/// Fraction of the peak amplitude a bin needs to be transmitted
pub const AMPLITUDE_THRESHOLD: f32 = 0.1;

/// Serial line speed of the sample transport
pub const BAUD_RATE: u32 = 115_200;

/// Read/write timeout of the sample transport
pub const TRANSPORT_TIMEOUT: Duration = Duration::from_millis(1);

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Window size N (number of samples, power of two)
    pub window_size: usize,

    /// Sampling interval of the producer task
    pub sampling_interval: Duration,

    /// Inclusion threshold as a fraction of the peak amplitude (0 to 1)
    pub amplitude_threshold: f32,

    /// Transport baud rate, carried for the transport collaborator
    pub baud_rate: u32,

    /// Transport timeout, carried for the transport collaborator
    pub transport_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
            sampling_interval: SAMPLING_INTERVAL,
            amplitude_threshold: AMPLITUDE_THRESHOLD,
            baud_rate: BAUD_RATE,
            transport_timeout: TRANSPORT_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    /// Check the configuration before any task is scheduled
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_window_size(self.window_size)?;

        if !self.amplitude_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.amplitude_threshold)
        {
            return Err(ConfigError::InvalidThreshold(self.amplitude_threshold));
        }

        if self.sampling_interval.is_zero() {
            return Err(ConfigError::ZeroSamplingInterval);
        }

        if self.baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }

        Ok(())
    }

    /// Duration of one full window (N sampling intervals), the spectrum task cadence
    pub fn window_period(&self) -> Duration {
        self.sampling_interval * self.window_size as u32
    }

    /// Number of unique bins produced per window (N/2 + 1)
    pub fn num_bins(&self) -> usize {
        self.window_size / 2 + 1
    }

    /// Bytes the transport can carry during one sampling interval (8N1 framing)
    pub fn bytes_per_interval(&self) -> f64 {
        self.baud_rate as f64 / 10.0 * self.sampling_interval.as_secs_f64()
    }
}

/// Window sizes must be a power of two between 2 and [`MAX_WINDOW_SIZE`]
pub fn validate_window_size(window_size: usize) -> Result<(), ConfigError> {
    if window_size < 2 || !window_size.is_power_of_two() {
        return Err(ConfigError::WindowSizeNotPowerOfTwo(window_size));
    }
    if window_size > MAX_WINDOW_SIZE {
        return Err(ConfigError::WindowTooLarge(window_size));
    }
    Ok(())
}
