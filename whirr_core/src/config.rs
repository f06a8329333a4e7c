//! Settings document: where raw recordings live and where archives go.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Fixed location of the settings document, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "param.yaml";

/// Directory roots shared by every build step.
///
/// Both keys are required; there are no defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Root of the raw recordings, laid out as `{machine_class}/{split}/*.wav`
    pub data_root: PathBuf,
    /// Directory receiving the feature archives. Must already exist.
    pub feature_root: PathBuf,
}

impl Settings {
    /// Load settings from a YAML document at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).format(::config::FileFormat::Yaml))
            .build()?
            .try_deserialize::<Settings>()?;

        tracing::debug!(
            data_root = %settings.data_root.display(),
            feature_root = %settings.feature_root.display(),
            "loaded settings from {}",
            path.display()
        );
        Ok(settings)
    }

    /// Load settings from [`DEFAULT_SETTINGS_PATH`].
    pub fn load_default() -> Result<Self> {
        Self::load(DEFAULT_SETTINGS_PATH)
    }

    /// `{data_root}/{machine_class}`
    pub fn class_dir(&self, machine_class: &str) -> PathBuf {
        self.data_root.join(machine_class)
    }

    /// `{data_root}/{machine_class}/{split}`
    pub fn split_dir(&self, machine_class: &str, split: &str) -> PathBuf {
        self.class_dir(machine_class).join(split)
    }
}
