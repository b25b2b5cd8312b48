//! Audio I/O modules
//!
//! File decoding using Symphonia and a buffered player that feeds decoded
//! audio to an analyzer.

pub mod decoder;
pub mod player;

pub use decoder::{decode_audio, decode_source, DecodedAudio};
pub use player::BufferedPlayer;
