//! Analysis engines
//!
//! Everything the consumer runs while holding the analyzer lock:
//! - Window selection with lag compensation
//! - Hann-windowed FFT spectrum
//! - Amplitude envelope
//! - Channel split policy and output scrubbing

pub mod amplitude;
pub mod channel;
pub mod spectrum;
pub mod window;

pub use channel::ChannelSplit;
pub use spectrum::SpectrumEngine;
pub use window::{select_window, SampleRange, WindowRequest};
