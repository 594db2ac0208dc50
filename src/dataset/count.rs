use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Int64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use super::{label_for, Tabular};
use crate::data::labels::LabelResolver;
use crate::data::loader::{read_timing_rows, MarkerPolicy};
use crate::data::model::{CountRecord, TimingRow};

// ---------------------------------------------------------------------------
// Count dataset: one record per marker row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountDataset {
    pub records: Vec<CountRecord>,
}

/// Every marker row of a file, as `(sample_count, label)`.
///
/// Works at row granularity: each marker contributes one record regardless
/// of where probes begin or end.
pub fn count_records(rows: &[TimingRow], label: i64) -> impl Iterator<Item = CountRecord> + '_ {
    rows.iter().filter_map(move |r| {
        r.sample_count.map(|num_samples| CountRecord { num_samples, label })
    })
}

/// Build the count dataset over `files`, in file-then-row order.
///
/// Unlabeled files are skipped with a warning; a malformed marker aborts.
pub fn build_count_dataset(
    files: &[PathBuf],
    resolver: &dyn LabelResolver,
) -> Result<CountDataset> {
    let mut records = Vec::new();
    for path in files {
        let Some(label) = label_for(path, resolver) else {
            continue;
        };
        let rows = read_timing_rows(path, MarkerPolicy::Reject)?;
        records.extend(count_records(&rows, label));
    }
    Ok(CountDataset { records })
}

impl Tabular for CountDataset {
    fn column_names(&self) -> Vec<String> {
        vec!["num_samples".to_string(), "label".to_string()]
    }

    fn num_rows(&self) -> usize {
        self.records.len()
    }

    fn csv_row(&self, idx: usize) -> Vec<String> {
        let rec = &self.records[idx];
        vec![rec.num_samples.to_string(), rec.label.to_string()]
    }

    fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("num_samples", DataType::Int64, false),
            Field::new("label", DataType::Int64, false),
        ]));
        let num_samples = Int64Array::from_iter_values(self.records.iter().map(|r| r.num_samples));
        let labels = Int64Array::from_iter_values(self.records.iter().map(|r| r.label));

        RecordBatch::try_new(schema, vec![Arc::new(num_samples), Arc::new(labels)])
            .context("building count record batch")
    }
}
