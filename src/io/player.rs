//! Buffered player over decoded audio
//!
//! Drives an analyzer the way a media pipeline would: blocks are delivered
//! ahead of what is audible, and the audible position trails the delivered
//! one by a fixed output latency. Time is simulated, advancing by one block
//! per [`BufferedPlayer::pump`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::decoder::DecodedAudio;
use crate::producer::{PcmSink, PlaybackSource};
use crate::stream::PcmBlock;

/// Player that feeds decoded audio to a sink block by block
#[derive(Debug)]
pub struct BufferedPlayer {
    audio: DecodedAudio,
    output_latency: Duration,
    /// Frames delivered so far
    position: Mutex<usize>,
    paused: AtomicBool,
}

impl BufferedPlayer {
    /// Create a player positioned at the start of `audio`
    pub fn new(audio: DecodedAudio, output_latency: Duration) -> Self {
        Self {
            audio,
            output_latency,
            position: Mutex::new(0),
            paused: AtomicBool::new(false),
        }
    }

    /// Delay between delivering a sample and it becoming audible
    pub fn output_latency(&self) -> Duration {
        self.output_latency
    }

    /// The audio being played
    pub fn audio(&self) -> &DecodedAudio {
        &self.audio
    }

    fn frames_to_duration(&self, frames: usize) -> Duration {
        if self.audio.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(frames as u64 * 1_000_000_000 / self.audio.sample_rate as u64)
    }

    /// Media time of everything delivered so far
    pub fn delivered_time(&self) -> Duration {
        self.frames_to_duration(*self.position.lock())
    }

    /// Deliver the next block of about `block_duration` to `sink`
    ///
    /// Returns `false` without delivering anything while paused or once all
    /// audio has been delivered.
    pub fn pump(&self, sink: &dyn PcmSink, block_duration: Duration) -> bool {
        if self.is_paused() {
            return false;
        }

        let channels = self.audio.channels.max(1) as usize;
        let total_frames = self.audio.frames();

        let mut position = self.position.lock();
        if *position >= total_frames {
            return false;
        }

        let block_frames =
            ((block_duration.as_secs_f64() * self.audio.sample_rate as f64).round() as usize).max(1);
        let start = *position;
        let end = (start + block_frames).min(total_frames);

        let timestamp = self.frames_to_duration(start);
        let duration = self.frames_to_duration(end) - timestamp;
        let samples = &self.audio.samples[start * channels..end * channels];

        // Advance before delivering so playback_time sees the new position
        *position = end;
        drop(position);

        sink.process_block(&PcmBlock::from_samples(
            self.audio.channels,
            self.audio.sample_rate,
            samples,
            duration,
            timestamp,
        ));

        true
    }

    /// Stop delivering; the analyzer reports not-ready while paused
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Continue delivering
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    /// Whether every frame has been delivered
    pub fn is_finished(&self) -> bool {
        *self.position.lock() >= self.audio.frames()
    }
}

impl PlaybackSource for BufferedPlayer {
    fn playback_time(&self) -> Duration {
        self.delivered_time().saturating_sub(self.output_latency)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}
