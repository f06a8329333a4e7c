//! Feature archives: one HDF5 file per (machine class, machine id, split).
//!
//! Each recording gets a group named after its file stem holding a single
//! `mfccs` dataset, so h5py reads it as `f["{stem}/mfccs"]`.

use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::error::{Error, Result};

/// Dataset name under each recording's group.
pub const DATASET_NAME: &str = "mfccs";
pub const ARCHIVE_EXT: &str = "hdf5";

/// Which builder produced an archive; becomes the last part of its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveVariant {
    /// Every file of every machine id
    Full,
    /// Capped file count, last machine id only
    Small,
}

impl ArchiveVariant {
    pub fn tag(self) -> &'static str {
        match self {
            ArchiveVariant::Full => "mfcc2",
            ArchiveVariant::Small => "mfcc_small",
        }
    }
}

/// `{machine_class}_{machine_id}_{split}_{tag}.hdf5`
pub fn archive_file_name(
    machine_class: &str,
    machine_id: &str,
    split: &str,
    variant: ArchiveVariant,
) -> String {
    format!(
        "{}.{ARCHIVE_EXT}",
        [machine_class, machine_id, split, variant.tag()].join("_")
    )
}

/// Dataset path for a recording stem: `{stem}/mfccs`.
pub fn entry_name(stem: &str) -> String {
    format!("{stem}/{DATASET_NAME}")
}

/// Shape of one stored feature matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryShape {
    /// Dataset path inside the file, `{stem}/mfccs`
    pub name: String,
    pub rows: usize,
    pub cols: usize,
}

/// Archive open for writing.
///
/// The file is flushed after every entry, so entries added before a failure
/// stay readable even when the archive is dropped without [`FeatureArchive::finish`].
pub struct FeatureArchive {
    path: PathBuf,
    file: hdf5::File,
    entries: usize,
}

impl FeatureArchive {
    /// Create (or truncate) the archive at `path`. The parent directory must exist.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = hdf5::File::create(&path).map_err(|e| Error::archive(&path, e.to_string()))?;
        Ok(Self {
            path,
            file,
            entries: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Store `features` as the dataset `{stem}/mfccs`.
    pub fn write_entry(&mut self, stem: &str, features: &Array2<f32>) -> Result<()> {
        let fail = |e: hdf5::Error| Error::archive(&self.path, format!("{stem}: {e}"));
        self.file
            .create_group(stem)
            .map_err(fail)?
            .new_dataset_builder()
            .with_data(features)
            .create(DATASET_NAME)
            .map_err(fail)?;
        self.file.flush().map_err(fail)?;
        self.entries += 1;
        Ok(())
    }

    /// Flush and close the file.
    pub fn finish(self) -> Result<PathBuf> {
        let Self { path, file, .. } = self;
        file.flush().map_err(|e| Error::archive(&path, e.to_string()))?;
        drop(file);
        Ok(path)
    }

    /// Names and shapes of every entry. HDF5 lists links by name, so the
    /// result is sorted by stem rather than in write order.
    pub fn read_shapes<P: AsRef<Path>>(path: P) -> Result<Vec<EntryShape>> {
        let path = path.as_ref();
        let fail = |e: hdf5::Error| Error::archive(path, e.to_string());
        let file = Self::open(path)?;

        let mut shapes = Vec::new();
        for stem in file.member_names().map_err(fail)? {
            let group = file.group(&stem).map_err(fail)?;
            for dataset in group.member_names().map_err(fail)? {
                let shape = group.dataset(&dataset).map_err(fail)?.shape();
                let &[rows, cols] = shape.as_slice() else {
                    return Err(Error::archive(
                        path,
                        format!("{stem}/{dataset} has shape {shape:?}, expected 2-D"),
                    ));
                };
                shapes.push(EntryShape {
                    name: format!("{stem}/{dataset}"),
                    rows,
                    cols,
                });
            }
        }
        Ok(shapes)
    }

    /// Load one entry by dataset path (`{stem}/mfccs`).
    pub fn read_entry<P: AsRef<Path>>(path: P, name: &str) -> Result<Array2<f32>> {
        let path = path.as_ref();
        let fail = |e: hdf5::Error| Error::archive(path, format!("{name}: {e}"));
        Self::open(path)?
            .dataset(name)
            .map_err(fail)?
            .read_2d::<f32>()
            .map_err(fail)
    }

    fn open(path: &Path) -> Result<hdf5::File> {
        if !path.exists() {
            return Err(Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "archive not found"),
            ));
        }
        hdf5::File::open(path).map_err(|e| Error::archive(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_names_follow_layout() {
        assert_eq!(
            archive_file_name("fan", "id_00", "train", ArchiveVariant::Full),
            "fan_id_00_train_mfcc2.hdf5"
        );
        assert_eq!(
            archive_file_name("ToyCar", "id_07", "mixed_snr_0db", ArchiveVariant::Small),
            "ToyCar_id_07_mixed_snr_0db_mfcc_small.hdf5"
        );
        assert_eq!(entry_name("normal_id_00_0001"), "normal_id_00_0001/mfccs");
    }

    #[test]
    fn entries_are_readable_after_finish() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fan_id_00_train_mfcc2.hdf5");

        let a = Array2::from_shape_fn((5, 6), |(r, c)| (r * 6 + c) as f32);
        let b = Array2::<f32>::zeros((3, 6));

        let mut archive = FeatureArchive::create(&path).unwrap();
        archive.write_entry("normal_id_00_0001", &a).unwrap();
        archive.write_entry("normal_id_00_0002", &b).unwrap();
        assert_eq!(archive.len(), 2);
        archive.finish().unwrap();

        let shapes = FeatureArchive::read_shapes(&path).unwrap();
        assert_eq!(
            shapes,
            vec![
                EntryShape { name: "normal_id_00_0001/mfccs".into(), rows: 5, cols: 6 },
                EntryShape { name: "normal_id_00_0002/mfccs".into(), rows: 3, cols: 6 },
            ]
        );
        let back = FeatureArchive::read_entry(&path, "normal_id_00_0001/mfccs").unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn writes_hdf5_container() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fan_id_00_train_mfcc2.hdf5");

        let mut archive = FeatureArchive::create(&path).unwrap();
        archive.write_entry("normal_id_00_0001", &Array2::<f32>::ones((27, 120))).unwrap();
        archive.finish().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89HDF\r\n\x1a\n");
    }

    #[test]
    fn shapes_are_listed_by_stem() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("valve_id_00_mixed_snr_0db_mfcc2.hdf5");

        let mut archive = FeatureArchive::create(&path).unwrap();
        archive.write_entry("normal_id_00_0001", &Array2::<f32>::zeros((4, 2))).unwrap();
        archive.write_entry("anomaly_id_00_0003", &Array2::<f32>::zeros((5, 2))).unwrap();
        archive.finish().unwrap();

        let names: Vec<_> = FeatureArchive::read_shapes(&path)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["anomaly_id_00_0003/mfccs", "normal_id_00_0001/mfccs"]);
    }

    #[test]
    fn duplicate_stem_is_an_archive_error() {
        let dir = TempDir::new().unwrap();
        let mut archive = FeatureArchive::create(dir.path().join("dup.hdf5")).unwrap();
        archive.write_entry("same", &Array2::<f32>::ones((2, 3))).unwrap();

        let err = archive.write_entry("same", &Array2::<f32>::ones((2, 3))).unwrap_err();
        assert!(matches!(err, Error::Archive { .. }), "got {err:?}");
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn reading_missing_archive_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = FeatureArchive::read_shapes(dir.path().join("absent.hdf5")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "got {err:?}");
    }

    #[test]
    fn dropped_archive_keeps_written_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.hdf5");
        {
            let mut archive = FeatureArchive::create(&path).unwrap();
            archive.write_entry("first", &Array2::<f32>::ones((2, 3))).unwrap();
        }
        let shapes = FeatureArchive::read_shapes(&path).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].name, "first/mfccs");
    }

    #[test]
    fn create_truncates_previous_archive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("again.hdf5");

        let mut archive = FeatureArchive::create(&path).unwrap();
        archive.write_entry("old", &Array2::<f32>::ones((2, 3))).unwrap();
        archive.finish().unwrap();

        let archive = FeatureArchive::create(&path).unwrap();
        assert!(archive.is_empty());
        archive.finish().unwrap();

        assert!(FeatureArchive::read_shapes(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_parent_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = FeatureArchive::create(dir.path().join("nope/out.hdf5")).err().unwrap();
        assert!(matches!(err, Error::Archive { .. }));
    }
}
