//! Turning a `{data_root}/{machine_class}/{split}` tree into feature archives.

pub mod archive;
pub mod builder;
pub mod discovery;

pub use archive::{ArchiveVariant, EntryShape, FeatureArchive};
pub use builder::{ArchiveReport, BuildReport, DEFAULT_SMALL_FILE_CAP, DatasetBuilder, ErrorPolicy};
pub use discovery::{SplitKind, assemble_file_list, machine_ids};
