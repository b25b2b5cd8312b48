//! Hann-windowed FFT spectrum
//!
//! # Algorithm
//!
//! For a power-of-two window holding `n` frames per channel:
//!
//! 1. Window each channel: `x[i] * 0.5 * (1 - cos(2π·i / (n - 1)))`
//! 2. Forward complex FFT per channel (zero imaginary input)
//! 3. Log power per bin: `10 * log10(re'² + im'²)` with `re' = re * 2/n`,
//!    `im' = im * 2/n`
//! 4. Split bins `1..=n/2` into `width` contiguous groups (the first
//!    `(n/2) % width` groups take one extra bin) and average each group
//!
//! In combined mode the log powers of every channel are summed into one row
//! and divided by the number of values summed. Channels are therefore mixed
//! in the log domain, not as power.

use std::ops::Range;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::channel::ChannelSplit;
use super::window::SampleRange;
use crate::buffer::RingBuffer;

/// Hann window weight for position `index` of a window of `len` samples
#[inline]
pub fn hann_weight(index: usize, len: usize) -> f32 {
    if len > 1 {
        let t = 2.0 * std::f32::consts::PI * index as f32 / (len - 1) as f32;
        0.5 * (1.0 - t.cos())
    } else {
        1.0
    }
}

/// Log power of one FFT output bin after `2/n` amplitude scaling
#[inline]
pub fn log_power(bin: Complex<f32>, scale: f32) -> f32 {
    let re = bin.re * scale;
    let im = bin.im * scale;
    10.0 * (re * re + im * im).log10()
}

/// FFT bin ranges feeding each of the `width` output groups
///
/// Covers bins `1..=fft_size/2`. When there are fewer bins than groups the
/// trailing groups receive empty ranges.
pub fn group_ranges(fft_size: usize, width: usize) -> Vec<Range<usize>> {
    if width == 0 {
        return Vec::new();
    }
    let usable = fft_size / 2;
    let per_group = usable / width;
    let excess = usable % width;

    let mut ranges = Vec::with_capacity(width);
    let mut start = 1;
    for group in 0..width {
        let len = per_group + usize::from(group < excess);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Frequency in Hz at the centre of FFT bin `bin`
pub fn bin_frequency(bin: usize, fft_size: usize, sample_rate: u32) -> f32 {
    if fft_size == 0 {
        return 0.0;
    }
    bin as f32 * sample_rate as f32 / fft_size as f32
}

/// FFT engine with cached plans and per-channel scratch buffers
///
/// Lives inside the analyzer state so plans survive between queries.
pub struct SpectrumEngine {
    planner: FftPlanner<f32>,
    plan: Option<Arc<dyn Fft<f32>>>,
    buffers: Vec<Vec<Complex<f32>>>,
}

impl Default for SpectrumEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SpectrumEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumEngine")
            .field("fft_size", &self.plan.as_ref().map(|plan| plan.len()))
            .field("channels", &self.buffers.len())
            .finish()
    }
}

impl SpectrumEngine {
    /// Create an engine with no plan yet
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            plan: None,
            buffers: Vec::new(),
        }
    }

    fn plan_for(&mut self, fft_size: usize) -> Arc<dyn Fft<f32>> {
        match &self.plan {
            Some(plan) if plan.len() == fft_size => Arc::clone(plan),
            _ => {
                log::debug!("Planning {}-point FFT", fft_size);
                let plan = self.planner.plan_fft_forward(fft_size);
                self.plan = Some(Arc::clone(&plan));
                plan
            }
        }
    }

    /// Compute spectrum rows for a frame-aligned power-of-two range
    ///
    /// # Arguments
    ///
    /// * `ring` - Sample store the range indexes into
    /// * `range` - Interleaved logical range, already widened and aligned
    /// * `channels` - Interleaved channel count (1 or 2)
    /// * `split` - Combined or per-channel rows
    /// * `width` - Number of output groups per row
    ///
    /// # Returns
    ///
    /// `split.row_count(channels)` rows of `width` averaged log powers. Values
    /// may be non-finite (log of zero power); callers scrub the row they
    /// return.
    pub fn compute(
        &mut self,
        ring: &RingBuffer,
        range: SampleRange,
        channels: u16,
        split: ChannelSplit,
        width: usize,
    ) -> Vec<Vec<f32>> {
        let channels = channels.max(1) as usize;
        let fft_size = range.len().max(0) as usize / channels;
        let mut rows = vec![vec![0.0f32; width]; split.row_count(channels)];

        if fft_size == 0 || width == 0 {
            return rows;
        }

        let fft = self.plan_for(fft_size);

        self.buffers.resize_with(channels, Vec::new);
        for buffer in self.buffers.iter_mut() {
            buffer.clear();
            buffer.reserve(fft_size);
        }

        let mut index = range.first;
        for frame in 0..fft_size {
            let weight = hann_weight(frame, fft_size);
            for buffer in self.buffers.iter_mut() {
                let raw = ring.read(index) as f32;
                buffer.push(Complex::new(raw * weight, 0.0));
                index += 1;
            }
        }

        for buffer in self.buffers.iter_mut() {
            fft.process(buffer);
        }

        let scale = 2.0 / fft_size as f32;
        let channels_per_row = channels / rows.len();
        let mut sums = vec![0.0f64; rows.len()];

        for (group, bins) in group_ranges(fft_size, width).into_iter().enumerate() {
            if bins.is_empty() {
                continue;
            }

            sums.iter_mut().for_each(|sum| *sum = 0.0);
            for (channel, buffer) in self.buffers.iter().enumerate() {
                let row = split.row_for(channel);
                for bin in &buffer[bins.clone()] {
                    sums[row] += log_power(*bin, scale) as f64;
                }
            }

            let values_per_row = (bins.len() * channels_per_row) as f64;
            for (row, sum) in rows.iter_mut().zip(&sums) {
                row[group] = (sum / values_per_row) as f32;
            }
        }

        log::trace!(
            "Spectrum: {}-point FFT over {} channel(s), {} groups, {:?}",
            fft_size,
            channels,
            width,
            split
        );

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with(samples: &[i16]) -> RingBuffer {
        let mut ring = RingBuffer::with_capacity(samples.len());
        ring.write_slice(samples);
        ring
    }

    fn sine(frequency: f32, sample_rate: u32, len: usize, amplitude: f32) -> Vec<i16> {
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (amplitude as f64 * (2.0 * std::f64::consts::PI * frequency as f64 * t).sin()) as i16
            })
            .collect()
    }

    #[test]
    fn test_hann_weight() {
        assert_eq!(hann_weight(0, 8), 0.0);
        assert!(hann_weight(7, 8).abs() < 1e-6);
        assert!((hann_weight(4, 9) - 1.0).abs() < 1e-6);
        assert_eq!(hann_weight(0, 1), 1.0);
    }

    #[test]
    fn test_log_power() {
        let value = log_power(Complex::new(5.0, 0.0), 2.0);
        // (5 * 2)^2 = 100 -> 20 dB
        assert!((value - 20.0).abs() < 1e-4);
        assert_eq!(log_power(Complex::new(0.0, 0.0), 1.0), f32::NEG_INFINITY);
    }

    #[test]
    fn test_group_ranges_even() {
        let ranges = group_ranges(16, 4);
        assert_eq!(ranges, vec![1..3, 3..5, 5..7, 7..9]);
    }

    #[test]
    fn test_group_ranges_remainder_goes_first() {
        let ranges = group_ranges(16, 3);
        // 8 usable bins: 3, 3, 2
        assert_eq!(ranges, vec![1..4, 4..7, 7..9]);
    }

    #[test]
    fn test_group_ranges_more_groups_than_bins() {
        let ranges = group_ranges(4, 4);
        assert_eq!(ranges, vec![1..2, 2..3, 3..3, 3..3]);
        assert!(group_ranges(4, 0).is_empty());
    }

    #[test]
    fn test_bin_frequency() {
        assert_eq!(bin_frequency(0, 1024, 44100), 0.0);
        assert!((bin_frequency(512, 1024, 44100) - 22050.0).abs() < 1e-3);
    }

    #[test]
    fn test_sine_peak_localization() {
        let sample_rate = 8000;
        let fft_size = 1024;
        // 8 groups of 64 bins, 7.8125 Hz per bin: 1260 Hz is bin ~161, group 2
        let samples = sine(1260.0, sample_rate, fft_size, 12000.0);
        let ring = ring_with(&samples);
        let range = SampleRange { first: 0, last: fft_size as i64 };

        let mut engine = SpectrumEngine::new();
        let rows = engine.compute(&ring, range, 1, ChannelSplit::Combined, 8);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        let peak = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 2, "spectrum: {:?}", row);
        assert!(row[2] > row[7] + 10.0, "spectrum: {:?}", row);
    }

    #[test]
    fn test_silence_is_non_finite_before_scrub() {
        let ring = ring_with(&[0i16; 256]);
        let range = SampleRange { first: 0, last: 256 };
        let mut engine = SpectrumEngine::new();
        let rows = engine.compute(&ring, range, 1, ChannelSplit::Combined, 4);
        assert!(rows[0].iter().all(|v| !v.is_finite()));
    }

    #[test]
    fn test_stereo_split_rows() {
        let sample_rate = 8000;
        let frames = 512;
        let left = sine(510.0, sample_rate, frames, 12000.0);
        let right = sine(2510.0, sample_rate, frames, 12000.0);
        let interleaved: Vec<i16> = left
            .iter()
            .zip(&right)
            .flat_map(|(&l, &r)| [l, r])
            .collect();
        let ring = ring_with(&interleaved);
        let range = SampleRange { first: 0, last: interleaved.len() as i64 };

        let mut engine = SpectrumEngine::new();
        let rows = engine.compute(&ring, range, 2, ChannelSplit::PerChannel, 4);
        assert_eq!(rows.len(), 2);

        // 256 usable bins of 15.625 Hz, 64 per group (1000 Hz each)
        assert!(rows[0][0] > rows[0][2], "left: {:?}", rows[0]);
        assert!(rows[1][2] > rows[1][0], "right: {:?}", rows[1]);

        let combined = engine.compute(&ring, range, 2, ChannelSplit::Combined, 4);
        assert_eq!(combined.len(), 1);
        for group in 0..4 {
            let mean = (rows[0][group] + rows[1][group]) / 2.0;
            assert!((combined[0][group] - mean).abs() < 1e-3);
        }
    }

    #[test]
    fn test_plan_is_reused() {
        let ring = ring_with(&sine(440.0, 8000, 256, 1000.0));
        let range = SampleRange { first: 0, last: 256 };
        let mut engine = SpectrumEngine::new();

        let first = engine.compute(&ring, range, 1, ChannelSplit::Combined, 4);
        let second = engine.compute(&ring, range, 1, ChannelSplit::Combined, 4);
        assert_eq!(first, second);
        assert_eq!(engine.plan.as_ref().map(|plan| plan.len()), Some(256));
    }
}
