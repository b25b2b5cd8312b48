//! Waveform capture adapter
//!
//! Some platforms hand out periodic 8-bit unsigned mono captures of the
//! output mix instead of a PCM stream. [`WaveformCapture`] widens each byte to
//! 16 bits, stamps the capture with its own monotonic clock and forwards it
//! to a sink as a mono block. A capture is already audible when delivered, so
//! the playback time is the end of the latest capture and the lag is zero.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{PcmSink, PlaybackSource};
use crate::stream::PcmBlock;

/// Widen one unsigned 8-bit sample to signed 16-bit
#[inline]
pub fn widen_u8(sample: u8) -> i16 {
    (sample as i16 - 128) << 8
}

/// Converts 8-bit waveform captures and acts as their clock
pub struct WaveformCapture {
    epoch: Instant,
    enabled: AtomicBool,
    /// End of the latest delivered capture, in nanoseconds since `epoch`
    last_end_nanos: AtomicU64,
    scratch: Mutex<Vec<i16>>,
}

impl WaveformCapture {
    /// Create a disabled capture
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            enabled: AtomicBool::new(false),
            last_end_nanos: AtomicU64::new(0),
            scratch: Mutex::new(Vec::new()),
        }
    }

    /// Start or stop forwarding captures
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        log::debug!("Waveform capture {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Whether captures are being forwarded
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Forward one capture to `sink`
    ///
    /// # Arguments
    ///
    /// * `sink` - Destination, usually an analyzer sink
    /// * `bytes` - Unsigned 8-bit mono samples
    /// * `sample_rate_millihertz` - Capture rate in millihertz
    ///
    /// Captures are dropped while disabled or when the rate is below 1 Hz.
    pub fn deliver(&self, sink: &dyn PcmSink, bytes: &[u8], sample_rate_millihertz: u32) {
        if !self.is_enabled() || bytes.is_empty() {
            return;
        }
        let sample_rate = sample_rate_millihertz / 1000;
        if sample_rate == 0 {
            log::warn!("Ignoring waveform capture at {} mHz", sample_rate_millihertz);
            return;
        }

        let duration = Duration::from_nanos(
            bytes.len() as u64 * 1_000_000_000_000 / sample_rate_millihertz as u64,
        );
        let now = self.epoch.elapsed();
        let timestamp = now.saturating_sub(duration);

        let mut scratch = self.scratch.lock();
        scratch.clear();
        scratch.extend(bytes.iter().map(|&b| widen_u8(b)));

        self.last_end_nanos
            .store((timestamp + duration).as_nanos() as u64, Ordering::Release);
        sink.process_block(&PcmBlock::from_samples(
            1,
            sample_rate,
            &scratch,
            duration,
            timestamp,
        ));
    }
}

impl Default for WaveformCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSource for WaveformCapture {
    fn playback_time(&self) -> Duration {
        Duration::from_nanos(self.last_end_nanos.load(Ordering::Acquire))
    }

    fn is_paused(&self) -> bool {
        !self.is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        blocks: Mutex<Vec<(u16, u32, Vec<i16>, Duration, Duration)>>,
    }

    impl PcmSink for RecordingSink {
        fn process_block(&self, block: &PcmBlock<'_>) {
            let samples = match block.data {
                crate::stream::PcmData::Samples(samples) => samples.to_vec(),
                crate::stream::PcmData::Bytes(_) => Vec::new(),
            };
            self.blocks.lock().push((
                block.channels,
                block.sample_rate,
                samples,
                block.duration,
                block.end_time(),
            ));
        }
    }

    #[test]
    fn test_widen_u8() {
        assert_eq!(widen_u8(128), 0);
        assert_eq!(widen_u8(0), i16::MIN);
        assert_eq!(widen_u8(255), 127 << 8);
        assert_eq!(widen_u8(129), 256);
    }

    #[test]
    fn test_disabled_drops_captures() {
        let sink = RecordingSink::default();
        let capture = WaveformCapture::new();
        assert!(capture.is_paused());

        capture.deliver(&sink, &[128; 64], 8_000_000);
        assert!(sink.blocks.lock().is_empty());
    }

    #[test]
    fn test_forwards_mono_block() {
        let sink = RecordingSink::default();
        let capture = WaveformCapture::new();
        capture.set_enabled(true);
        assert!(!capture.is_paused());

        capture.deliver(&sink, &[0, 128, 255, 129], 8_000_000);

        let blocks = sink.blocks.lock();
        assert_eq!(blocks.len(), 1);
        let (channels, rate, samples, duration, end) = &blocks[0];
        assert_eq!(*channels, 1);
        assert_eq!(*rate, 8000);
        assert_eq!(samples, &vec![i16::MIN, 0, 127 << 8, 256]);
        assert_eq!(*duration, Duration::from_micros(500));
        assert_eq!(capture.playback_time(), *end);
    }

    #[test]
    fn test_sub_hertz_rate_ignored() {
        let sink = RecordingSink::default();
        let capture = WaveformCapture::new();
        capture.set_enabled(true);
        capture.deliver(&sink, &[128; 16], 500);
        assert!(sink.blocks.lock().is_empty());
        assert_eq!(capture.playback_time(), Duration::ZERO);
    }

    #[test]
    fn test_playback_time_is_monotonic() {
        let sink = RecordingSink::default();
        let capture = WaveformCapture::new();
        capture.set_enabled(true);

        capture.deliver(&sink, &[128; 32], 44_100_000);
        let first = capture.playback_time();
        std::thread::sleep(Duration::from_millis(2));
        capture.deliver(&sink, &[128; 32], 44_100_000);
        assert!(capture.playback_time() >= first);
    }
}
