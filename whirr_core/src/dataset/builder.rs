use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::dataset::archive::{ArchiveVariant, FeatureArchive, archive_file_name};
use crate::dataset::discovery::{
    AUDIO_EXT, SplitKind, TEST_SPLIT, assemble_file_list, discover_machine_ids, entry_stem,
    filter_by_id, list_audio_files,
};
use crate::error::{Error, Result};
use crate::features::{FeatureExtractor, FeatureParams};

/// Files written by the size-limited builder per archive unless told otherwise.
pub const DEFAULT_SMALL_FILE_CAP: usize = 100;

/// What to do when one recording cannot be turned into features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the whole build at the first failing file
    #[default]
    Abort,
    /// Log the failure, record it in the report and carry on
    Skip,
}

/// Outcome for one archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveReport {
    pub machine_id: String,
    pub path: PathBuf,
    /// `(entry stem, rows, cols)` for each stored matrix, in write order
    pub entries: Vec<(String, usize, usize)>,
    /// Files skipped under [`ErrorPolicy::Skip`]
    pub failed: Vec<PathBuf>,
}

/// Outcome of one `(machine_class, split)` build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub archives: Vec<ArchiveReport>,
}

impl BuildReport {
    pub fn entry_count(&self) -> usize {
        self.archives.iter().map(|a| a.entries.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.archives.iter().map(|a| a.failed.len()).sum()
    }
}

/// Builds feature archives for one machine class and split at a time.
pub struct DatasetBuilder<'a> {
    settings: &'a Settings,
    extractor: FeatureExtractor,
    policy: ErrorPolicy,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(settings: &'a Settings, params: FeatureParams) -> Result<Self> {
        Ok(Self {
            settings,
            extractor: FeatureExtractor::new(params)?,
            policy: ErrorPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// One `mfcc2` archive per machine id found in the split.
    pub fn build(&self, machine_class: &str, split: &str) -> Result<BuildReport> {
        let ids = self.machine_ids(machine_class, split)?;
        let files = self.file_list(machine_class, split)?;

        let mut report = BuildReport::default();
        for machine_id in &ids {
            let selected = filter_by_id(&files, machine_id, None);
            report.archives.push(self.write_archive(
                machine_class,
                machine_id,
                split,
                ArchiveVariant::Full,
                &selected,
            )?);
        }
        Ok(report)
    }

    /// A single `mfcc_small` archive for the last machine id, holding at most
    /// `file_cap` recordings. Meant for quick smoke runs.
    pub fn build_small(
        &self,
        machine_class: &str,
        split: &str,
        file_cap: usize,
    ) -> Result<BuildReport> {
        let ids = self.machine_ids(machine_class, split)?;
        let Some(machine_id) = ids.last() else {
            return Ok(BuildReport::default());
        };
        let files = self.file_list(machine_class, split)?;
        let selected = filter_by_id(&files, machine_id, Some(file_cap));
        debug!(count = selected.len(), "selected files for {machine_id}");

        let archive = self.write_archive(
            machine_class,
            machine_id,
            split,
            ArchiveVariant::Small,
            &selected,
        )?;
        Ok(BuildReport {
            archives: vec![archive],
        })
    }

    fn machine_ids(&self, machine_class: &str, split: &str) -> Result<Vec<String>> {
        let ids = discover_machine_ids(&self.settings.class_dir(machine_class), split, AUDIO_EXT)?;
        info!("{machine_class}/{split}: machine ids {ids:?}");
        Ok(ids)
    }

    fn file_list(&self, machine_class: &str, split: &str) -> Result<Vec<PathBuf>> {
        let kind = SplitKind::of(split);
        let split_files = list_audio_files(&self.settings.split_dir(machine_class, split), AUDIO_EXT)?;
        let test_files = match kind {
            SplitKind::Mixed => {
                info!("{split} is a mixed split, prepending normal {TEST_SPLIT} files");
                list_audio_files(&self.settings.split_dir(machine_class, TEST_SPLIT), AUDIO_EXT)?
            }
            SplitKind::Plain => Vec::new(),
        };
        Ok(assemble_file_list(kind, split_files, test_files))
    }

    fn write_archive(
        &self,
        machine_class: &str,
        machine_id: &str,
        split: &str,
        variant: ArchiveVariant,
        files: &[PathBuf],
    ) -> Result<ArchiveReport> {
        let path = self
            .settings
            .feature_root
            .join(archive_file_name(machine_class, machine_id, split, variant));
        info!("writing {} ({} files)", path.display(), files.len());

        let mut archive = FeatureArchive::create(&path)?;
        let mut entries = Vec::with_capacity(files.len());
        let mut failed = Vec::new();

        for file in files {
            match self.process_file(&mut archive, file) {
                Ok(entry) => entries.push(entry),
                Err(err @ Error::Archive { .. }) => return Err(err),
                Err(err) if self.policy == ErrorPolicy::Skip => {
                    warn!("skipping {}: {err}", file.display());
                    failed.push(file.clone());
                }
                Err(err) => return Err(err),
            }
        }

        let path = archive.finish()?;
        Ok(ArchiveReport {
            machine_id: machine_id.to_owned(),
            path,
            entries,
            failed,
        })
    }

    fn process_file(
        &self,
        archive: &mut FeatureArchive,
        file: &Path,
    ) -> Result<(String, usize, usize)> {
        let features = self.extractor.extract_file(file)?;
        let stem = entry_stem(file);
        info!("{}: {:?}", file.display(), features.dim());
        archive.write_entry(&stem, &features)?;
        Ok((stem, features.nrows(), features.ncols()))
    }
}
