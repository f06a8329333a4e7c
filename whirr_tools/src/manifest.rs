use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use whirr_core::FeatureArchive;
use whirr_core::dataset::archive::ARCHIVE_EXT;

#[derive(Debug, Serialize)]
struct EntryLine<'a> {
    archive: &'a str,
    entry: &'a str,
    frames: usize,
    channels: usize,
}

#[derive(Debug, Serialize)]
struct ArchiveRow<'a> {
    archive: &'a str,
    entries: usize,
    total_frames: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub archives: usize,
    pub entries: usize,
}

fn archives_in(feature_root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(feature_root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(ARCHIVE_EXT))
        .collect();
    paths.sort();
    paths
}

/// Write `features.jsonl` (one line per entry) and `archives.tsv` (one row
/// per archive) into `out_dir` for every archive under `feature_root`.
pub fn write_manifest(feature_root: &Path, out_dir: &Path) -> Result<Summary> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output dir: {}", out_dir.display()))?;

    let jsonl_path = out_dir.join("features.jsonl");
    let tsv_path = out_dir.join("archives.tsv");

    let out_file = File::create(&jsonl_path)
        .with_context(|| format!("Failed to create output: {}", jsonl_path.display()))?;
    let mut jsonl = BufWriter::new(out_file);

    let mut tsv = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(&tsv_path)
        .with_context(|| format!("Failed to create output: {}", tsv_path.display()))?;

    let mut summary = Summary::default();

    for path in archives_in(feature_root) {
        let shapes = FeatureArchive::read_shapes(&path)
            .with_context(|| format!("Failed to read archive: {}", path.display()))?;
        let archive = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for shape in &shapes {
            let line = EntryLine {
                archive: &archive,
                entry: &shape.name,
                frames: shape.rows,
                channels: shape.cols,
            };
            serde_json::to_writer(&mut jsonl, &line)?;
            jsonl.write_all(b"\n")?;
        }

        tsv.serialize(ArchiveRow {
            archive: &archive,
            entries: shapes.len(),
            total_frames: shapes.iter().map(|s| s.rows).sum(),
        })?;

        summary.archives += 1;
        summary.entries += shapes.len();
    }

    jsonl.flush()?;
    tsv.flush()?;

    tracing::info!("Wrote: {}", jsonl_path.display());
    tracing::info!("Wrote: {}", tsv_path.display());
    Ok(summary)
}
