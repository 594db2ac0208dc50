use std::path::Path;

use anyhow::Result;
use arrow::record_batch::RecordBatch;

use crate::data::labels::LabelResolver;
use crate::data::loader::site_name;

/// Dataset layer: assembling, writing and reading back the labeled tables
/// consumed by the downstream classifier.
///
/// ```text
///   Vec<PathBuf> ──► count     ──► CountDataset    ─┐
///               └──► sequence  ──► SequenceDataset ─┼─► writer (.csv / .parquet)
///                                                   │
///   dataset file ──► reader ──► FeatureTable ───────┘ (inspect preview)
/// ```
pub mod count;
pub mod reader;
pub mod sequence;
pub mod writer;

pub use count::{build_count_dataset, CountDataset};
pub use reader::{load_dataset, FeatureTable};
pub use sequence::{build_sequence_dataset, SequenceDataset};
pub use writer::write_dataset;

/// A rectangular table with a header that can be written as CSV or Parquet.
pub trait Tabular {
    fn column_names(&self) -> Vec<String>;

    fn num_rows(&self) -> usize;

    /// Row `idx` rendered as CSV fields, in `column_names` order.
    fn csv_row(&self, idx: usize) -> Vec<String>;

    fn to_record_batch(&self) -> Result<RecordBatch>;
}

/// Label for the file at `path`, or `None` (with a warning) when no rule
/// matches. Unlabeled files are skipped, never fatal.
pub fn label_for(path: &Path, resolver: &dyn LabelResolver) -> Option<i64> {
    let name = site_name(path).to_lowercase();
    let label = resolver.resolve(&name);
    if label.is_none() {
        log::warn!("Could not determine label for {name}, skipping...");
    }
    label
}
