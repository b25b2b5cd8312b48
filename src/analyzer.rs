//! Live spectrum analyzer
//!
//! [`SpectrumAnalyzer`] owns the ring buffer, the stream and timing state,
//! the configuration and the attached playback source, all behind one mutex.
//! The producer takes that lock for one block copy; the consumer takes it for
//! one full analysis, FFT included.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use stratum_scope::{AnalyzerConfig, PcmBlock, PcmSink, PlaybackSource, SpectrumAnalyzer};
//!
//! struct FixedClock(Duration);
//!
//! impl PlaybackSource for FixedClock {
//!     fn playback_time(&self) -> Duration { self.0 }
//!     fn is_paused(&self) -> bool { false }
//! }
//!
//! let analyzer = SpectrumAnalyzer::new(AnalyzerConfig::new(0.05, 8, 8))?;
//! let sink = analyzer.attach(Arc::new(FixedClock(Duration::from_millis(900))));
//!
//! let samples = vec![1000i16; 8000];
//! sink.process_block(&PcmBlock::from_samples(
//!     1,
//!     8000,
//!     &samples,
//!     Duration::from_secs(1),
//!     Duration::ZERO,
//! ));
//!
//! assert_eq!(analyzer.get_amplitude(0), vec![1000.0; 8]);
//! assert_eq!(analyzer.get_spectrum(0).len(), 8);
//! # Ok::<(), stratum_scope::AnalysisError>(())
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::analysis::amplitude::compute_amplitude;
use crate::analysis::channel::{scrub_non_finite, select_row, ChannelSplit};
use crate::analysis::{select_window, SpectrumEngine, WindowRequest};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::producer::{PcmSink, PlaybackSource};
use crate::stream::{PcmBlock, StreamBuffer};

/// Why a query produced a zero-filled result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotReady {
    Detached,
    Paused,
    NoBuffer,
    EmptyWindow,
    WindowBeforeHistory,
}

/// Snapshot of the buffered stream, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferStatus {
    /// Whether a playback source is attached
    pub attached: bool,
    /// Channel count of the current stream (0 if none)
    pub channels: u16,
    /// Sample rate of the current stream (0 if none)
    pub sample_rate: u32,
    /// Ring buffer capacity in samples
    pub capacity: usize,
    /// Samples written since the last (re)allocation
    pub written: u64,
    /// Seconds of audio currently held by the ring buffer
    pub buffered_seconds: f64,
}

struct AnalyzerState {
    config: AnalyzerConfig,
    source: Option<Arc<dyn PlaybackSource>>,
    /// Bumped on every attach/detach; sinks from older generations are ignored
    generation: u64,
    buffer: StreamBuffer,
    spectrum: SpectrumEngine,
}

impl AnalyzerState {
    fn window_request(&self) -> Result<WindowRequest, NotReady> {
        let source = self.source.as_ref().ok_or(NotReady::Detached)?;
        if source.is_paused() {
            return Err(NotReady::Paused);
        }

        let stream = self.buffer.stream().ok_or(NotReady::NoBuffer)?;
        if !self.buffer.ring().is_allocated() {
            return Err(NotReady::NoBuffer);
        }

        Ok(WindowRequest {
            write_position: self.buffer.ring().written(),
            stream,
            window_duration_secs: self.config.window_duration_secs,
            last_write_time: self.buffer.last_write_time(),
            playback_time: source.playback_time(),
        })
    }

    fn spectrum_rows(&mut self, split: ChannelSplit) -> Result<Vec<Vec<f32>>, NotReady> {
        let request = self.window_request()?;
        let range = select_window(&request)
            .ok_or(NotReady::EmptyWindow)?
            .expand_to_power_of_two()
            .ok_or(NotReady::WindowBeforeHistory)?
            .align_to_frames(request.stream.channels);

        Ok(self.spectrum.compute(
            self.buffer.ring(),
            range,
            request.stream.channels,
            split,
            self.config.spectrum_width,
        ))
    }

    fn amplitude_rows(&self, split: ChannelSplit) -> Result<Vec<Vec<f32>>, NotReady> {
        let request = self.window_request()?;
        let range = select_window(&request)
            .ok_or(NotReady::EmptyWindow)?
            .align_to_frames(request.stream.channels);

        Ok(compute_amplitude(
            self.buffer.ring(),
            range,
            request.stream.channels,
            split,
            self.config.amplitude_buckets,
        ))
    }

    fn channel_count(&self) -> u16 {
        self.buffer.stream().map(|stream| stream.channels).unwrap_or(0)
    }
}

/// Write the selected row into `out`, or zero-fill it when not ready
///
/// An out-of-range selector leaves `out` untouched.
fn deliver(
    rows: Result<Vec<Vec<f32>>, NotReady>,
    selector: usize,
    width: usize,
    channels: u16,
    what: &str,
    out: &mut Vec<f32>,
) {
    let rows = match rows {
        Ok(rows) => rows,
        Err(reason) => {
            log::trace!("{} not ready: {:?}", what, reason);
            out.clear();
            out.resize(width, 0.0);
            return;
        }
    };

    match select_row(rows, selector) {
        Some(mut row) => {
            scrub_non_finite(&mut row);
            *out = row;
        }
        None => {
            log::error!(
                "{}: requested channel {}, stream only has {} channel(s)",
                what,
                selector,
                channels
            );
        }
    }
}

/// Lag-compensated spectrum and amplitude analyzer over a live PCM stream
pub struct SpectrumAnalyzer {
    state: Arc<Mutex<AnalyzerState>>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::from_valid_config(AnalyzerConfig::default())
    }
}

impl SpectrumAnalyzer {
    /// Create an analyzer with no playback source attached
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the configuration is invalid.
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: AnalyzerConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(AnalyzerState {
                config,
                source: None,
                generation: 0,
                buffer: StreamBuffer::default(),
                spectrum: SpectrumEngine::new(),
            })),
        }
    }

    /// Change window duration and output sizes
    ///
    /// Buffered audio is kept; the new sizes apply from the next query.
    pub fn configure(
        &self,
        window_duration_secs: f32,
        spectrum_width: usize,
        amplitude_buckets: usize,
    ) -> Result<(), AnalysisError> {
        let mut state = self.state.lock();
        let config = AnalyzerConfig {
            window_duration_secs,
            spectrum_width,
            amplitude_buckets,
            ..state.config.clone()
        };
        config.validate()?;
        state.config = config;
        Ok(())
    }

    /// Replace the whole configuration
    pub fn set_config(&self, config: AnalyzerConfig) -> Result<(), AnalysisError> {
        config.validate()?;
        self.state.lock().config = config;
        Ok(())
    }

    /// Current configuration
    pub fn config(&self) -> AnalyzerConfig {
        self.state.lock().config.clone()
    }

    /// Attach to a playback source and get the sink its producer feeds
    ///
    /// Any previous attachment is dropped together with its buffered audio,
    /// and sinks handed out earlier stop having any effect.
    pub fn attach(&self, source: Arc<dyn PlaybackSource>) -> AnalyzerSink {
        let mut state = self.state.lock();
        state.generation += 1;
        state.source = Some(source);
        state.buffer.reset();
        log::debug!("Attached playback source (generation {})", state.generation);

        AnalyzerSink {
            state: Arc::downgrade(&self.state),
            generation: state.generation,
        }
    }

    /// Detach from the playback source and discard buffered audio
    ///
    /// Blocks still arriving through old sinks are ignored.
    pub fn detach(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.source = None;
        state.buffer.reset();
        log::debug!("Detached playback source");
    }

    /// Whether a playback source is attached
    pub fn is_attached(&self) -> bool {
        self.state.lock().source.is_some()
    }

    /// Frequency spectrum for a channel selector
    ///
    /// Selector 0 averages all channels; selector `k` returns channel `k`
    /// (1-based). The result always has `spectrum_width` values and is all
    /// zeros when no audible window is available.
    pub fn get_spectrum(&self, selector: usize) -> Vec<f32> {
        let mut state = self.state.lock();
        let width = state.config.spectrum_width;
        let mut out = vec![0.0; width];
        let rows = state.spectrum_rows(ChannelSplit::from_selector(selector));
        deliver(rows, selector, width, state.channel_count(), "Spectrum", &mut out);
        out
    }

    /// Like [`get_spectrum`](Self::get_spectrum), writing into `out`
    ///
    /// On an out-of-range selector `out` keeps its previous contents.
    pub fn spectrum_into(&self, selector: usize, out: &mut Vec<f32>) {
        let mut state = self.state.lock();
        let width = state.config.spectrum_width;
        let rows = state.spectrum_rows(ChannelSplit::from_selector(selector));
        deliver(rows, selector, width, state.channel_count(), "Spectrum", out);
    }

    /// Amplitude envelope for a channel selector
    ///
    /// Same selector rules as [`get_spectrum`](Self::get_spectrum); the result
    /// always has `amplitude_buckets` values.
    pub fn get_amplitude(&self, selector: usize) -> Vec<f32> {
        let state = self.state.lock();
        let buckets = state.config.amplitude_buckets;
        let mut out = vec![0.0; buckets];
        let rows = state.amplitude_rows(ChannelSplit::from_selector(selector));
        deliver(rows, selector, buckets, state.channel_count(), "Amplitude", &mut out);
        out
    }

    /// Like [`get_amplitude`](Self::get_amplitude), writing into `out`
    pub fn amplitude_into(&self, selector: usize, out: &mut Vec<f32>) {
        let state = self.state.lock();
        let buckets = state.config.amplitude_buckets;
        let rows = state.amplitude_rows(ChannelSplit::from_selector(selector));
        deliver(rows, selector, buckets, state.channel_count(), "Amplitude", out);
    }

    /// Snapshot of what is currently buffered
    pub fn status(&self) -> BufferStatus {
        let state = self.state.lock();
        let ring = state.buffer.ring();
        let stream = state.buffer.stream();
        let held = ring.written().min(ring.capacity() as u64);
        let buffered_seconds = match stream {
            Some(stream) if stream.samples_per_second() > 0 => {
                held as f64 / stream.samples_per_second() as f64
            }
            _ => 0.0,
        };

        BufferStatus {
            attached: state.source.is_some(),
            channels: stream.map(|s| s.channels).unwrap_or(0),
            sample_rate: stream.map(|s| s.sample_rate).unwrap_or(0),
            capacity: ring.capacity(),
            written: ring.written(),
            buffered_seconds,
        }
    }
}

/// Producer-facing handle returned by [`SpectrumAnalyzer::attach`]
///
/// Holds only a weak reference: once the analyzer is dropped, detached, or
/// re-attached, delivered blocks are ignored.
#[derive(Clone)]
pub struct AnalyzerSink {
    state: Weak<Mutex<AnalyzerState>>,
    generation: u64,
}

impl AnalyzerSink {
    /// Whether blocks delivered through this sink still reach the analyzer
    pub fn is_live(&self) -> bool {
        self.state
            .upgrade()
            .map(|state| state.lock().generation == self.generation)
            .unwrap_or(false)
    }
}

impl PcmSink for AnalyzerSink {
    fn process_block(&self, block: &PcmBlock<'_>) {
        let Some(shared) = self.state.upgrade() else {
            log::trace!("Analyzer dropped, ignoring block");
            return;
        };

        let mut state = shared.lock();
        if state.generation != self.generation {
            log::trace!(
                "Ignoring block from stale sink (generation {} != {})",
                self.generation,
                state.generation
            );
            return;
        }

        let buffer_seconds = state.config.buffer_seconds;
        if let Err(e) = state.buffer.ingest(block, buffer_seconds) {
            log::warn!("Dropping audio block: {}", e);
        }
    }
}
