//! Precomputed MFCC feature archives for machine-sound anomaly detection.
//!
//! Recordings under `{data_root}/{machine_class}/{split}` are decoded to
//! 16 kHz mono, turned into `[mfcc | delta | delta2]` matrices and stored one
//! archive per machine id under `feature_root`.

pub mod audio;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;

pub use crate::config::Settings;
pub use crate::dataset::{ArchiveVariant, BuildReport, DatasetBuilder, ErrorPolicy, FeatureArchive};
pub use crate::error::{Error, Result};
pub use crate::features::{FeatureExtractor, FeatureParams};
