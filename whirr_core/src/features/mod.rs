//! MFCC feature pipeline: log-mel, cepstrum and delta stacking.

pub mod cepstrum;
pub mod extractor;
pub mod params;

pub use extractor::FeatureExtractor;
pub use params::{DELTA_WIDTH, FeatureParams, N_MELS, SAMPLE_RATE};
