//! Audio decoding using Symphonia
//!
//! Produces interleaved 16-bit PCM, the format the analyzer buffers.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AnalysisError;

/// Decoded interleaved audio
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved 16-bit samples
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
}

impl DecodedAudio {
    /// Wrap already-decoded samples
    pub fn from_samples(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file to interleaved 16-bit PCM
///
/// # Arguments
///
/// * `path` - Path to audio file
///
/// # Errors
///
/// Returns `AnalysisError::ProcessingError` if the file cannot be opened and
/// `AnalysisError::DecodingError` if its format is unsupported or corrupt.
pub fn decode_audio(path: impl AsRef<Path>) -> Result<DecodedAudio, AnalysisError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {}", path.display());

    let file = File::open(path)?;
    let extension = path.extension().and_then(|ext| ext.to_str());
    decode_source(Box::new(file), extension)
}

/// Decode audio from any media source
///
/// `extension` is a format hint such as `"wav"`; the container is probed
/// either way.
pub fn decode_source(
    source: Box<dyn MediaSource>,
    extension: Option<&str>,
) -> Result<DecodedAudio, AnalysisError> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::DecodingError("No supported audio tracks found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<i16> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<i16>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count() as u16;

        let frames = decoded.capacity();
        let required = frames * spec.channels.count();
        if sample_buf.as_ref().map_or(true, |buf| buf.capacity() < required) {
            sample_buf = Some(SampleBuffer::<i16>::new(frames as u64, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    if channels == 0 || sample_rate == 0 {
        return Err(AnalysisError::DecodingError(
            "Stream has no channel layout or sample rate".to_string(),
        ));
    }

    log::debug!(
        "Decoded {} samples ({} channel(s) at {} Hz)",
        samples.len(),
        channels,
        sample_rate
    );

    Ok(DecodedAudio::from_samples(samples, sample_rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Minimal 16-bit PCM WAV
    fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
        out.extend_from_slice(&(channels * 2).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_pcm_wav() {
        let samples: Vec<i16> = (0..2000).map(|i| (i as i16 - 1000) * 16).collect();
        let bytes = wav_bytes(&samples, 8000, 2);

        let decoded = decode_source(Box::new(Cursor::new(bytes)), Some("wav")).unwrap();
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.samples, samples);
        assert_eq!(decoded.frames(), 1000);
        assert!((decoded.duration_secs() - 0.125).abs() < 1e-9);
    }

    #[test]
    fn test_garbage_is_decoding_error() {
        let result = decode_source(Box::new(Cursor::new(vec![0u8; 64])), None);
        assert!(matches!(result, Err(AnalysisError::DecodingError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = decode_audio("/nonexistent/stratum-scope-test.wav");
        assert!(matches!(result, Err(AnalysisError::ProcessingError(_))));
    }
}
