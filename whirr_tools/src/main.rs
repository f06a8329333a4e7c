mod manifest;

use anyhow::{Context, Result};
use std::path::Path;

use whirr_core::Settings;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load_default().context("Failed to load settings")?;
    let summary = manifest::write_manifest(&settings.feature_root, Path::new("manifests"))?;

    tracing::info!("Archives: {}", summary.archives);
    tracing::info!("Entries: {}", summary.entries);
    Ok(())
}
