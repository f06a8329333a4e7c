//! Audio decoding and spectral front end.

pub mod decoder;
pub mod mel;

pub use decoder::decode_mono;
pub use mel::{MelSpectrogram, power_to_db};
