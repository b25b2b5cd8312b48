//! Producer-side write path
//!
//! Every delivered block goes through [`StreamBuffer::ingest`], which runs on
//! the audio thread under the analyzer lock. The work is bounded by the block
//! size: an optional reallocation, one timestamp update, and a sample copy.

use std::time::Duration;

use super::{PcmBlock, PcmData, StreamState};
use crate::buffer::RingBuffer;
use crate::error::AnalysisError;

/// Ring buffer plus the stream and timing state that describe its contents
#[derive(Debug, Default)]
pub struct StreamBuffer {
    ring: RingBuffer,
    stream: Option<StreamState>,
    /// Unsupported stream the last block was rejected for
    rejected: Option<StreamState>,
    last_write_time: Duration,
}

impl StreamBuffer {
    /// Copy one block into the ring buffer
    ///
    /// A block whose channel count or sample rate differs from the current
    /// stream resets the buffer first. Blocks the engines cannot analyze
    /// (no channels, more than two channels, zero sample rate) reset the
    /// buffer and are rejected, so queries report not-ready instead of
    /// analyzing stale audio from the previous stream. Only the first block
    /// of an unsupported stream is an error; repeats are dropped quietly and
    /// report zero samples written.
    ///
    /// Returns the number of samples written.
    pub fn ingest(&mut self, block: &PcmBlock<'_>, buffer_seconds: u32) -> Result<usize, AnalysisError> {
        let stream = block.stream();

        if !stream.is_supported() {
            if self.rejected == Some(stream) {
                log::trace!("Dropping block of rejected stream");
                return Ok(0);
            }
            self.reset();
            self.rejected = Some(stream);
            return Err(AnalysisError::UnsupportedStream(format!(
                "{} channels at {} Hz",
                stream.channels, stream.sample_rate
            )));
        }

        if self.stream != Some(stream) {
            if let Some(previous) = self.stream {
                log::debug!(
                    "Stream changed from {}ch/{}Hz to {}ch/{}Hz, discarding buffered audio",
                    previous.channels,
                    previous.sample_rate,
                    stream.channels,
                    stream.sample_rate
                );
            }
            self.reset();
            self.stream = Some(stream);
        }

        let samples_needed = stream.samples_per_second() * buffer_seconds as u64;
        self.ring.ensure_capacity(samples_needed as usize);

        self.last_write_time = block.end_time();

        let written = match block.data {
            PcmData::Samples(samples) => {
                self.ring.write_slice(samples);
                samples.len()
            }
            PcmData::Bytes(bytes) => {
                let chunks = bytes.chunks_exact(2);
                let count = chunks.len();
                for pair in chunks {
                    self.ring.write(i16::from_ne_bytes([pair[0], pair[1]]));
                }
                count
            }
        };

        log::trace!(
            "Ingested {} samples, write position {}, last write at {:.3}s",
            written,
            self.ring.written(),
            self.last_write_time.as_secs_f64()
        );

        Ok(written)
    }

    /// Drop all buffered audio and the stream description
    pub fn reset(&mut self) {
        self.ring = RingBuffer::default();
        self.stream = None;
        self.rejected = None;
        self.last_write_time = Duration::ZERO;
    }

    /// The sample store
    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    /// Current stream parameters, if a supported stream is connected
    pub fn stream(&self) -> Option<StreamState> {
        self.stream
    }

    /// Timestamp of the sample following the last written one
    pub fn last_write_time(&self) -> Duration {
        self.last_write_time
    }
}
