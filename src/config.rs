//! Configuration parameters for live analysis

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Analyzer configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Nominal analysis window in seconds (default: 0.1)
    ///
    /// The spectrum rounds this window up to a power of two; the amplitude
    /// envelope uses it as-is.
    pub window_duration_secs: f32,

    /// Number of spectrum output values (default: 32)
    pub spectrum_width: usize,

    /// Number of amplitude output values (default: 32)
    pub amplitude_buckets: usize,

    /// Seconds of audio the ring buffer retains (default: 3)
    pub buffer_seconds: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_duration_secs: 0.1,
            spectrum_width: 32,
            amplitude_buckets: 32,
            buffer_seconds: 3,
        }
    }
}

impl AnalyzerConfig {
    /// Build a configuration from the three caller-facing knobs, keeping the
    /// default buffer horizon
    pub fn new(window_duration_secs: f32, spectrum_width: usize, amplitude_buckets: usize) -> Self {
        Self {
            window_duration_secs,
            spectrum_width,
            amplitude_buckets,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_scope::AnalyzerConfig;
    ///
    /// let config = AnalyzerConfig::from_json(r#"{ "spectrum_width": 64 }"#)?;
    /// assert_eq!(config.spectrum_width, 64);
    /// assert_eq!(config.buffer_seconds, 3);
    /// # Ok::<(), stratum_scope::AnalysisError>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalyzerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the parameters describe a usable analyzer
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.window_duration_secs.is_finite() || self.window_duration_secs < 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "window duration must be finite and >= 0, got {}",
                self.window_duration_secs
            )));
        }

        if self.buffer_seconds == 0 {
            return Err(AnalysisError::InvalidInput(
                "buffer horizon must be at least one second".to_string(),
            ));
        }

        // Older samples have already been overwritten
        if self.window_duration_secs > self.buffer_seconds as f32 {
            return Err(AnalysisError::InvalidInput(format!(
                "window duration {}s exceeds the {}s buffer horizon",
                self.window_duration_secs, self.buffer_seconds
            )));
        }

        Ok(())
    }
}
