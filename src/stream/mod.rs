//! Incoming PCM stream description
//!
//! - `StreamState`: channel count and sample rate of the connected producer
//! - `PcmBlock`: one delivered block of interleaved samples with its timing
//! - `ingest`: the producer-side write path into the ring buffer

pub mod ingest;

use std::time::Duration;

pub use ingest::StreamBuffer;

/// Largest channel count the analysis engines accept
pub const MAX_CHANNELS: u16 = 2;

/// Channel count and sample rate of the current producer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamState {
    /// Interleaved channel count
    pub channels: u16,
    /// Sample rate in Hz (frames per second)
    pub sample_rate: u32,
}

impl StreamState {
    /// Interleaved samples per second of audio (`sample_rate × channels`)
    pub fn samples_per_second(&self) -> u64 {
        self.sample_rate as u64 * self.channels as u64
    }

    /// Whether the analysis engines can handle this stream
    pub fn is_supported(&self) -> bool {
        self.sample_rate > 0 && (1..=MAX_CHANNELS).contains(&self.channels)
    }
}

/// Interleaved 16-bit payload of a block
#[derive(Debug, Clone, Copy)]
pub enum PcmData<'a> {
    /// Already-typed samples
    Samples(&'a [i16]),
    /// Raw native-endian bytes as handed over by a media pipeline
    ///
    /// A trailing odd byte is ignored.
    Bytes(&'a [u8]),
}

impl PcmData<'_> {
    /// Payload size in bytes
    pub fn byte_len(&self) -> usize {
        match self {
            PcmData::Samples(samples) => samples.len() * 2,
            PcmData::Bytes(bytes) => bytes.len(),
        }
    }

    /// Number of whole samples in the payload
    pub fn sample_count(&self) -> usize {
        self.byte_len() / 2
    }
}

/// One block delivered by the producer
///
/// The payload is borrowed for the duration of the callback only; the
/// analyzer copies it into the ring buffer and never retains it.
#[derive(Debug, Clone, Copy)]
pub struct PcmBlock<'a> {
    /// Interleaved channel count
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved sample payload
    pub data: PcmData<'a>,
    /// Nominal duration of the block
    pub duration: Duration,
    /// Host timestamp of the start of the block
    pub timestamp: Duration,
}

impl<'a> PcmBlock<'a> {
    /// Block over typed samples
    pub fn from_samples(
        channels: u16,
        sample_rate: u32,
        samples: &'a [i16],
        duration: Duration,
        timestamp: Duration,
    ) -> Self {
        Self {
            channels,
            sample_rate,
            data: PcmData::Samples(samples),
            duration,
            timestamp,
        }
    }

    /// Block over raw native-endian bytes
    pub fn from_bytes(
        channels: u16,
        sample_rate: u32,
        bytes: &'a [u8],
        duration: Duration,
        timestamp: Duration,
    ) -> Self {
        Self {
            channels,
            sample_rate,
            data: PcmData::Bytes(bytes),
            duration,
            timestamp,
        }
    }

    /// Stream parameters carried by this block
    pub fn stream(&self) -> StreamState {
        StreamState {
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Timestamp of the sample following the last one in this block
    pub fn end_time(&self) -> Duration {
        self.timestamp + self.duration
    }
}
