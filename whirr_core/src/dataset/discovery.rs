//! Locating recordings and the machine ids they belong to.
//!
//! Everything except [`list_audio_files`] is pure and works on file names, so
//! the ordering rules can be checked without touching the filesystem.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};

/// Prefix of mixed-condition splits, e.g. `mixed_snr_0db`.
pub const MIXED_PREFIX: &str = "mixed_";
/// Split whose normal recordings are prepended to every mixed split.
pub const TEST_SPLIT: &str = "test";
/// File name prefix of normal (non-anomalous) recordings.
pub const NORMAL_PREFIX: &str = "normal_";
/// Extension of the raw recordings.
pub const AUDIO_EXT: &str = "wav";

/// How a split's file list is put together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKind {
    /// Only the files of the split itself
    Plain,
    /// Normal files of the test split, then the files of the split
    Mixed,
}

impl SplitKind {
    pub fn of(split: &str) -> Self {
        if split.starts_with(MIXED_PREFIX) {
            SplitKind::Mixed
        } else {
            SplitKind::Plain
        }
    }
}

/// Every `id_NN` token (two ASCII digits) appearing in `name`, left to right,
/// without overlap.
fn id_tokens(name: &str) -> impl Iterator<Item = &str> + '_ {
    let bytes = name.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos + 5 <= bytes.len() {
            let window = &bytes[pos..pos + 5];
            if window.starts_with(b"id_")
                && window[3].is_ascii_digit()
                && window[4].is_ascii_digit()
            {
                let token = &name[pos..pos + 5];
                pos += 5;
                return Some(token);
            }
            pos += 1;
        }
        None
    })
}

/// Distinct machine ids found in `names`, sorted.
pub fn machine_ids<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ids = BTreeSet::new();
    for name in names {
        ids.extend(id_tokens(name.as_ref()).map(str::to_owned));
    }
    ids.into_iter().collect()
}

/// Ordered list of files to process for one split.
///
/// `split_files` is the listing of the split directory, `test_files` the
/// listing of the plain test split (only consulted for mixed splits). Both are
/// sorted here; duplicates are kept.
pub fn assemble_file_list(
    kind: SplitKind,
    mut split_files: Vec<PathBuf>,
    test_files: Vec<PathBuf>,
) -> Vec<PathBuf> {
    split_files.sort();
    match kind {
        SplitKind::Plain => split_files,
        SplitKind::Mixed => {
            let mut normals: Vec<PathBuf> = test_files
                .into_iter()
                .filter(|p| file_name(p).starts_with(NORMAL_PREFIX))
                .collect();
            normals.sort();
            normals.extend(split_files);
            normals
        }
    }
}

/// Keep the files whose name contains `machine_id`, at most `cap` of them.
pub fn filter_by_id(files: &[PathBuf], machine_id: &str, cap: Option<usize>) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|p| file_name(p).contains(machine_id))
        .take(cap.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

/// Entry name for a recording: its file name up to the first `.`.
pub fn entry_stem(path: &Path) -> String {
    let name = file_name(path);
    name.split('.').next().unwrap_or(name).to_owned()
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// Regular files directly under `dir` with extension `ext`, sorted.
///
/// Hidden files (leading `.`, e.g. `._x.wav` resource forks) are left out, as
/// a shell glob would. A missing directory is an empty listing.
pub fn list_audio_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        tracing::debug!("no directory at {}", dir.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            Error::io(path, e.into())
        })?;
        let matches_ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == ext);
        if entry.file_type().is_file() && matches_ext {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Sorted machine ids of the recordings in `{class_dir}/{split}`.
pub fn discover_machine_ids(class_dir: &Path, split: &str, ext: &str) -> Result<Vec<String>> {
    let files = list_audio_files(&class_dir.join(split), ext)?;
    Ok(machine_ids(files.iter().map(|p| file_name(p))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn no_names_no_ids() {
        assert!(machine_ids(Vec::<String>::new()).is_empty());
        assert!(machine_ids(["normal_0001.wav", "id_1.wav", "ID_02.wav"]).is_empty());
    }

    #[test]
    fn ids_are_distinct_and_sorted() {
        let ids = machine_ids([
            "anomaly_id_04_0003.wav",
            "normal_id_00_0001.wav",
            "normal_id_02_0001.wav",
            "normal_id_00_0002.wav",
        ]);
        assert_eq!(ids, vec!["id_00", "id_02", "id_04"]);
    }

    #[test]
    fn every_token_in_a_name_counts() {
        let ids = machine_ids(["mix_id_06_with_id_01.wav", "id_123.wav"]);
        assert_eq!(ids, vec!["id_01", "id_06", "id_12"]);
    }

    #[test]
    fn split_kind_by_prefix() {
        assert_eq!(SplitKind::of("train"), SplitKind::Plain);
        assert_eq!(SplitKind::of("test"), SplitKind::Plain);
        assert_eq!(SplitKind::of("mixed_snr_6db"), SplitKind::Mixed);
        assert_eq!(SplitKind::of("unmixed_a"), SplitKind::Plain);
    }

    #[test]
    fn plain_split_is_sorted_and_ignores_test_listing() {
        let files = assemble_file_list(
            SplitKind::Plain,
            paths(&["b/normal_id_00_0002.wav", "b/normal_id_00_0001.wav"]),
            paths(&["t/normal_id_00_0009.wav"]),
        );
        assert_eq!(
            files,
            paths(&["b/normal_id_00_0001.wav", "b/normal_id_00_0002.wav"])
        );
    }

    #[test]
    fn mixed_split_puts_normals_first() {
        let files = assemble_file_list(
            SplitKind::Mixed,
            paths(&["m/anomaly_id_00_0002.wav", "m/anomaly_id_00_0001.wav"]),
            paths(&[
                "t/normal_id_00_0002.wav",
                "t/anomaly_id_00_0001.wav",
                "t/normal_id_00_0001.wav",
            ]),
        );
        assert_eq!(
            files,
            paths(&[
                "t/normal_id_00_0001.wav",
                "t/normal_id_00_0002.wav",
                "m/anomaly_id_00_0001.wav",
                "m/anomaly_id_00_0002.wav",
            ])
        );
    }

    #[test]
    fn mixed_split_keeps_duplicates() {
        let files = assemble_file_list(
            SplitKind::Mixed,
            paths(&["normal_id_00_0001.wav"]),
            paths(&["normal_id_00_0001.wav"]),
        );
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn filter_matches_file_name_and_caps() {
        let files = paths(&[
            "id_00_dir/normal_id_01_0001.wav",
            "x/normal_id_00_0001.wav",
            "x/normal_id_00_0002.wav",
            "x/normal_id_00_0003.wav",
        ]);
        assert_eq!(filter_by_id(&files, "id_00", None).len(), 3);
        assert_eq!(
            filter_by_id(&files, "id_00", Some(2)),
            paths(&["x/normal_id_00_0001.wav", "x/normal_id_00_0002.wav"])
        );
        assert!(filter_by_id(&files, "id_07", None).is_empty());
    }

    #[test]
    fn stem_stops_at_first_dot() {
        assert_eq!(entry_stem(Path::new("/a/normal_id_00_0001.wav")), "normal_id_00_0001");
        assert_eq!(entry_stem(Path::new("a/take.2.wav")), "take");
    }

    #[test]
    fn listing_filters_extension_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b_id_01.wav", "a_id_00.wav", "notes.txt", "c_id_02.WAV"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.wav")).unwrap();

        let files = list_audio_files(dir.path(), "wav").unwrap();
        let names: Vec<_> = files.iter().map(|p| file_name(p).to_owned()).collect();
        assert_eq!(names, vec!["a_id_00.wav", "b_id_01.wav"]);
    }

    #[test]
    fn listing_skips_hidden_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("normal_id_00_0001.wav"), b"").unwrap();
        fs::write(dir.path().join("._normal_id_00_0001.wav"), b"").unwrap();
        fs::write(dir.path().join(".anomaly_id_09_0001.wav"), b"").unwrap();

        let files = list_audio_files(dir.path(), "wav").unwrap();
        assert_eq!(files, vec![dir.path().join("normal_id_00_0001.wav")]);
        assert_eq!(
            discover_machine_ids(dir.path().parent().unwrap(), file_name(dir.path()), "wav").unwrap(),
            vec!["id_00"]
        );
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(list_audio_files(&dir.path().join("absent"), "wav").unwrap().is_empty());
        assert!(discover_machine_ids(dir.path(), "train", "wav").unwrap().is_empty());
    }

    #[test]
    fn discovery_reads_the_split_directory() {
        let dir = TempDir::new().unwrap();
        let train = dir.path().join("train");
        fs::create_dir(&train).unwrap();
        for name in ["normal_id_04_0001.wav", "normal_id_02_0001.wav", "normal_id_04_0002.wav"] {
            fs::write(train.join(name), b"").unwrap();
        }
        let ids = discover_machine_ids(dir.path(), "train", "wav").unwrap();
        assert_eq!(ids, vec!["id_02", "id_04"]);
    }
}
