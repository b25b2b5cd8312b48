//! Time-domain amplitude envelope
//!
//! Mean absolute sample value per bucket over the lag-compensated window.
//! No windowing function and no power-of-two rounding are applied.

use super::channel::ChannelSplit;
use super::window::SampleRange;
use crate::buffer::RingBuffer;

/// Compute amplitude rows over a frame-aligned range
///
/// # Arguments
///
/// * `ring` - Sample store the range indexes into
/// * `range` - Interleaved logical range `[first, last)`
/// * `channels` - Interleaved channel count (1 or 2)
/// * `split` - Combined or per-channel rows
/// * `buckets` - Number of output values per row
///
/// # Returns
///
/// `split.row_count(channels)` rows of `buckets` values. The range's frames
/// are divided evenly across buckets with the remainder going to the first
/// buckets. A per-channel row holds the mean absolute value of that channel;
/// the combined row holds the mean absolute value over every interleaved
/// sample of the bucket. Buckets that receive no frames stay 0.
pub fn compute_amplitude(
    ring: &RingBuffer,
    range: SampleRange,
    channels: u16,
    split: ChannelSplit,
    buckets: usize,
) -> Vec<Vec<f32>> {
    let channels = channels.max(1) as usize;
    let mut rows = vec![vec![0.0f32; buckets]; split.row_count(channels)];

    if buckets == 0 || range.is_empty() {
        return rows;
    }

    let frames = range.len() as usize / channels;
    let per_bucket = frames / buckets;
    let excess = frames % buckets;
    let channels_per_row = channels / rows.len();

    let mut sums = vec![0i64; rows.len()];
    let mut index = range.first;

    for bucket in 0..buckets {
        let bucket_frames = per_bucket + usize::from(bucket < excess);
        if bucket_frames == 0 {
            continue;
        }

        sums.iter_mut().for_each(|sum| *sum = 0);
        for _ in 0..bucket_frames {
            for channel in 0..channels {
                sums[split.row_for(channel)] += (ring.read(index) as i64).abs();
                index += 1;
            }
        }

        let values_per_row = (bucket_frames * channels_per_row) as f32;
        for (row, &sum) in rows.iter_mut().zip(&sums) {
            row[bucket] = sum as f32 / values_per_row;
        }
    }

    log::trace!(
        "Amplitude: {} frames over {} channel(s) into {} buckets, {:?}",
        frames,
        channels,
        buckets,
        split
    );

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with(samples: &[i16]) -> RingBuffer {
        let mut ring = RingBuffer::with_capacity(samples.len());
        ring.write_slice(samples);
        ring
    }

    #[test]
    fn test_mono_buckets() {
        let ring = ring_with(&[1, -1, 2, -2, 3, -3, 4, -4]);
        let range = SampleRange { first: 0, last: 8 };
        let rows = compute_amplitude(&ring, range, 1, ChannelSplit::Combined, 4);
        assert_eq!(rows, vec![vec![1.0, 2.0, 3.0, 4.0]]);
    }

    #[test]
    fn test_remainder_goes_to_first_buckets() {
        let ring = ring_with(&[10, 10, 10, 20, 20, 30, 30]);
        let range = SampleRange { first: 0, last: 7 };
        // 7 frames into 3 buckets: 3, 2, 2
        let rows = compute_amplitude(&ring, range, 1, ChannelSplit::Combined, 3);
        assert_eq!(rows[0], vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_stereo_split_and_combined() {
        // Left at 100, right at -300
        let samples: Vec<i16> = (0..16).map(|i| if i % 2 == 0 { 100 } else { -300 }).collect();
        let ring = ring_with(&samples);
        let range = SampleRange { first: 0, last: 16 };

        let split = compute_amplitude(&ring, range, 2, ChannelSplit::PerChannel, 2);
        assert_eq!(split, vec![vec![100.0, 100.0], vec![300.0, 300.0]]);

        let combined = compute_amplitude(&ring, range, 2, ChannelSplit::Combined, 2);
        assert_eq!(combined, vec![vec![200.0, 200.0]]);
    }

    #[test]
    fn test_silence_is_zero() {
        let ring = ring_with(&[0; 64]);
        let range = SampleRange { first: 0, last: 64 };
        let rows = compute_amplitude(&ring, range, 1, ChannelSplit::Combined, 8);
        assert!(rows[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_more_buckets_than_frames() {
        let ring = ring_with(&[5, 5]);
        let range = SampleRange { first: 0, last: 2 };
        let rows = compute_amplitude(&ring, range, 1, ChannelSplit::Combined, 4);
        assert_eq!(rows[0], vec![5.0, 5.0, 0.0, 0.0]);
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let ring = ring_with(&[i16::MIN; 32]);
        let range = SampleRange { first: 0, last: 32 };
        let rows = compute_amplitude(&ring, range, 1, ChannelSplit::Combined, 1);
        assert_eq!(rows[0][0], 32768.0);
    }

    #[test]
    fn test_zero_buckets() {
        let ring = ring_with(&[1; 8]);
        let range = SampleRange { first: 0, last: 8 };
        let rows = compute_amplitude(&ring, range, 1, ChannelSplit::Combined, 0);
        assert_eq!(rows, vec![Vec::<f32>::new()]);
    }
}
