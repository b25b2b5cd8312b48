//! Channel split policy shared by the spectrum and amplitude engines

/// How accumulators are organised across channels
///
/// Derived from the caller's channel selector: 0 asks for one combined row,
/// any other value asks for per-channel rows from which one is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSplit {
    /// One shared row for all channels
    Combined,
    /// One row per channel
    PerChannel,
}

impl ChannelSplit {
    /// Policy implied by a channel selector
    pub fn from_selector(selector: usize) -> Self {
        if selector == 0 {
            ChannelSplit::Combined
        } else {
            ChannelSplit::PerChannel
        }
    }

    /// Number of output rows for a stream with `channels` channels
    pub fn row_count(self, channels: usize) -> usize {
        match self {
            ChannelSplit::Combined => 1,
            ChannelSplit::PerChannel => channels,
        }
    }

    /// Row that receives values from `channel`
    #[inline]
    pub fn row_for(self, channel: usize) -> usize {
        match self {
            ChannelSplit::Combined => 0,
            ChannelSplit::PerChannel => channel,
        }
    }
}

/// Pick the row a selector refers to
///
/// Selector 0 takes the first row; selector `k` takes row `k - 1`.
/// Returns `None` if the selector is past the last row.
pub fn select_row(mut rows: Vec<Vec<f32>>, selector: usize) -> Option<Vec<f32>> {
    let index = selector.saturating_sub(1);
    if index >= rows.len() {
        return None;
    }
    Some(rows.swap_remove(index))
}

/// Replace NaN and infinities with zero
pub fn scrub_non_finite(values: &mut [f32]) {
    for value in values.iter_mut() {
        if !value.is_finite() {
            *value = 0.0;
        }
    }
}
