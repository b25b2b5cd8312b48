//! Lag-compensated window selection
//!
//! The producer writes audio ahead of what is audible: the last written
//! sample is stamped `last_write_time`, while the player reports
//! `playback_time` for what the listener currently hears. The window is
//! anchored that far back from the write position so the analysis follows the
//! audible signal rather than the buffered one.
//!
//! # Algorithm
//!
//! 1. `lag = last_write_time - playback_time` (seconds, signed)
//! 2. `lag_samples = trunc(lag * sample_rate * channels)`
//! 3. `last = write_position - lag_samples - 1`
//! 4. `count = trunc(window_secs * sample_rate * channels)`
//! 5. `first = last - count`, the window is `[first, last)`
//! 6. an empty window is not ready
//!
//! The spectrum additionally widens the window to a power of two around its
//! centre with [`SampleRange::expand_to_power_of_two`].

use std::time::Duration;

use crate::stream::StreamState;

/// Inputs for one window computation
#[derive(Debug, Clone, Copy)]
pub struct WindowRequest {
    /// Logical write position (samples written since allocation)
    pub write_position: u64,
    /// Stream the buffered samples belong to
    pub stream: StreamState,
    /// Nominal window length in seconds
    pub window_duration_secs: f32,
    /// Timestamp of the sample following the last written one
    pub last_write_time: Duration,
    /// What the player reports as currently audible
    pub playback_time: Duration,
}

/// Half-open range `[first, last)` of logical sample indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    /// First logical index (may be negative for the amplitude window)
    pub first: i64,
    /// One past the last logical index
    pub last: i64,
}

impl SampleRange {
    /// Number of interleaved samples in the range
    pub fn len(&self) -> i64 {
        self.last - self.first
    }

    /// Whether the range holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }

    /// Widen to the next power of two, spreading the extra samples evenly
    /// before and after the window
    ///
    /// Returns `None` when the widened window would start before logical
    /// index 0. Such a window is abandoned instead of shifted forward, which
    /// would bias it toward audio that is not yet audible.
    pub fn expand_to_power_of_two(self) -> Option<SampleRange> {
        if self.is_empty() {
            return None;
        }
        let count = self.len();
        let pot = (count as u64).next_power_of_two().max(2) as i64;
        let first = self.first - (pot - count) / 2;
        if first < 0 {
            return None;
        }
        Some(SampleRange {
            first,
            last: first + pot,
        })
    }

    /// Move the range down so it starts on a frame boundary
    ///
    /// Interleaved channels share one index space; starting mid-frame would
    /// swap left and right. The length is preserved.
    pub fn align_to_frames(self, channels: u16) -> SampleRange {
        let channels = channels.max(1) as i64;
        let shift = self.first.rem_euclid(channels);
        SampleRange {
            first: self.first - shift,
            last: self.last - shift,
        }
    }
}

/// Select the window matching what is currently audible
///
/// Returns `None` (not ready) when the window is empty.
pub fn select_window(request: &WindowRequest) -> Option<SampleRange> {
    let samples_per_second = request.stream.samples_per_second() as f64;

    let lag_seconds =
        request.last_write_time.as_secs_f64() - request.playback_time.as_secs_f64();
    let lag_samples = (lag_seconds * samples_per_second) as i64;

    let last = request.write_position as i64 - lag_samples - 1;
    let count = (request.window_duration_secs as f64 * samples_per_second) as i64;
    let range = SampleRange {
        first: last - count,
        last,
    };

    if range.is_empty() {
        log::trace!(
            "Window not ready: {} samples requested (window {:.3}s)",
            count,
            request.window_duration_secs
        );
        return None;
    }

    log::trace!(
        "Window [{}, {}) for lag {:.4}s ({} samples), write position {}",
        range.first,
        range.last,
        lag_seconds,
        lag_samples,
        request.write_position
    );

    Some(range)
}
