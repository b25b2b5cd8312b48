//! # Stratum Scope
//!
//! A live spectrum and amplitude analyzer for PCM audio streams, built for
//! visualizers that must follow what the listener is hearing rather than
//! what the decoder has already produced.
//!
//! ## Features
//!
//! - **Ring buffering**: a few seconds of interleaved 16-bit audio, sized to
//!   the stream and reset when the stream changes
//! - **Lag compensation**: analysis windows anchored at the audible position,
//!   not the write position
//! - **Spectrum**: Hann-windowed FFT, log power, grouped into a fixed number
//!   of bands
//! - **Amplitude**: mean absolute level over the same window, in a fixed
//!   number of buckets
//! - **Channel selection**: combined output or a single channel of a stereo
//!   stream
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use stratum_scope::io::{decode_audio, BufferedPlayer};
//! use stratum_scope::{AnalyzerConfig, SpectrumAnalyzer};
//!
//! let audio = decode_audio("track.wav")?;
//! let player = Arc::new(BufferedPlayer::new(audio, Duration::from_millis(50)));
//!
//! let analyzer = SpectrumAnalyzer::new(AnalyzerConfig::new(0.1, 32, 32))?;
//! let sink = analyzer.attach(player.clone());
//!
//! while player.pump(&sink, Duration::from_millis(20)) {
//!     let spectrum = analyzer.get_spectrum(0);
//!     let amplitude = analyzer.get_amplitude(0);
//!     println!("{:?} {:?}", &spectrum[..4], &amplitude[..4]);
//! }
//! # Ok::<(), stratum_scope::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Producer → IngestPath → RingBuffer ← WindowSelector → Spectrum / Amplitude → Consumer
//! ```
//!
//! The producer pushes blocks through an [`AnalyzerSink`]; the consumer pulls
//! results from the [`SpectrumAnalyzer`] on demand. Both sides share one lock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod analyzer;
pub mod buffer;
pub mod config;
pub mod error;
pub mod io;
pub mod producer;
pub mod stream;

// Re-export main types
pub use analysis::ChannelSplit;
pub use analyzer::{AnalyzerSink, BufferStatus, SpectrumAnalyzer};
pub use buffer::RingBuffer;
pub use config::AnalyzerConfig;
pub use error::AnalysisError;
pub use producer::{PcmSink, PlaybackSource};
pub use stream::{PcmBlock, PcmData, StreamState};
