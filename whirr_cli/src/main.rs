use anyhow::{Context, Result};
use tracing::info;

use whirr_core::config::DEFAULT_SETTINGS_PATH;
use whirr_core::{DatasetBuilder, FeatureParams, Settings};

/// Machine classes processed on every run, in order.
const MACHINE_CLASSES: [&str; 6] = ["ToyCar", "fan", "slider", "pump", "ToyConveyor", "valve"];
const SPLITS: [&str; 2] = ["train", "test"];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load_default()
        .with_context(|| format!("failed to load settings from {DEFAULT_SETTINGS_PATH}"))?;
    let builder = DatasetBuilder::new(&settings, FeatureParams::standard())?;

    let mut total = 0usize;
    for machine_class in MACHINE_CLASSES {
        for split in SPLITS {
            let report = builder
                .build(machine_class, split)
                .with_context(|| format!("failed to build {machine_class}/{split}"))?;
            info!(
                archives = report.archives.len(),
                entries = report.entry_count(),
                "finished {machine_class}/{split}"
            );
            total += report.entry_count();
        }
    }

    info!("wrote {total} feature matrices to {}", settings.feature_root.display());
    Ok(())
}
