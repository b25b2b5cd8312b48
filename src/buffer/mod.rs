//! Sample storage
//!
//! The circular i16 store shared between the producer's ingest path and the
//! consumer's analysis queries.

pub mod ring_buffer;

pub use ring_buffer::RingBuffer;
