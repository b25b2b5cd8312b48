//! Producer-side interfaces
//!
//! The analyzer never talks to a media framework directly. A producer pushes
//! blocks through a [`PcmSink`] and the player answers time and pause queries
//! through a [`PlaybackSource`]. Platform capture shims implement these
//! interfaces and stay outside the analysis core.

pub mod waveform;

use std::time::Duration;

use crate::stream::PcmBlock;

/// Player-side clock queried once per analysis call
///
/// Called while the analyzer lock is held: implementations must not call
/// back into the analyzer.
pub trait PlaybackSource: Send + Sync {
    /// Timestamp of the audio the listener currently hears
    fn playback_time(&self) -> Duration;

    /// Whether playback is paused (both analyses report not-ready)
    fn is_paused(&self) -> bool;
}

/// Destination for delivered PCM blocks
pub trait PcmSink: Send + Sync {
    /// Deliver one block; the payload is only borrowed for this call
    fn process_block(&self, block: &PcmBlock<'_>);
}
