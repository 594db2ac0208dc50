use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use super::{label_for, Tabular};
use crate::data::labels::LabelResolver;
use crate::data::loader::{read_timing_rows, MarkerPolicy};
use crate::data::model::{LabeledProbe, PaddedDatasetRow};
use crate::data::segment::segment_probes;

// ---------------------------------------------------------------------------
// Sequence dataset: one padded row per probe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceDataset {
    /// Length of the longest probe; every row has this many cells.
    pub max_len: usize,
    pub rows: Vec<PaddedDatasetRow>,
}

/// Segment every labeled file into probes, in file order.
///
/// Unlabeled files are skipped with a warning; an unreadable file or a
/// malformed marker aborts.
pub fn collect_labeled_probes(
    files: &[PathBuf],
    resolver: &dyn LabelResolver,
) -> Result<Vec<LabeledProbe>> {
    let mut all = Vec::new();
    for path in files {
        let Some(label) = label_for(path, resolver) else {
            continue;
        };
        let rows = read_timing_rows(path, MarkerPolicy::Reject)?;
        let probes = segment_probes(&rows);
        log::debug!("{}: {} probes", path.display(), probes.len());
        all.extend(probes.into_iter().map(|probe| LabeledProbe { probe, label }));
    }
    Ok(all)
}

pub fn max_probe_len(probes: &[LabeledProbe]) -> usize {
    probes.iter().map(|p| p.probe.len()).max().unwrap_or(0)
}

/// Right-pad every probe to the longest one.
pub fn pad_probes(probes: Vec<LabeledProbe>) -> SequenceDataset {
    let max_len = max_probe_len(&probes);
    let rows = probes
        .into_iter()
        .map(|lp| PaddedDatasetRow::new(lp.probe, max_len, lp.label))
        .collect();
    SequenceDataset { max_len, rows }
}

pub fn build_sequence_dataset(
    files: &[PathBuf],
    resolver: &dyn LabelResolver,
) -> Result<SequenceDataset> {
    Ok(pad_probes(collect_labeled_probes(files, resolver)?))
}

impl Tabular for SequenceDataset {
    fn column_names(&self) -> Vec<String> {
        (0..self.max_len)
            .map(|i| format!("sample_{i}"))
            .chain(std::iter::once("label".to_string()))
            .collect()
    }

    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn csv_row(&self, idx: usize) -> Vec<String> {
        let row = &self.rows[idx];
        row.cells()
            .map(|c| c.to_string())
            .chain(std::iter::once(row.label.to_string()))
            .collect()
    }

    fn to_record_batch(&self) -> Result<RecordBatch> {
        let names = self.column_names();
        let mut fields: Vec<Field> = names[..self.max_len]
            .iter()
            .map(|name| Field::new(name, DataType::Float64, false))
            .collect();
        fields.push(Field::new("label", DataType::Int64, false));

        let mut values = vec![Vec::with_capacity(self.rows.len()); self.max_len];
        for row in &self.rows {
            for (column, cell) in values.iter_mut().zip(row.cells()) {
                column.push(cell.value());
            }
        }
        let mut columns: Vec<ArrayRef> = values
            .into_iter()
            .map(|column| Arc::new(Float64Array::from(column)) as ArrayRef)
            .collect();
        columns.push(Arc::new(Int64Array::from_iter_values(
            self.rows.iter().map(|r| r.label),
        )));

        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
            .context("building sequence record batch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::labels::{LabelMapping, SubstringResolver};
    use crate::data::model::{Cell, Probe};
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolver() -> SubstringResolver {
        SubstringResolver {
            mapping: LabelMapping::new().with("bbc", 0).with("wikipedia", 1),
        }
    }

    fn probe(timings: &[f64]) -> Probe {
        let mut p = Probe::starting_with(timings[0]);
        for &t in &timings[1..] {
            p.push(t);
        }
        p
    }

    #[test]
    fn single_file_example() {
        let dir = TempDir::new().unwrap();
        let bbc = dir.path().join("bbc_probe.csv");
        fs::write(&bbc, "1.5,3\n2.0,\n0.9,2\n1.1,\n").unwrap();

        let ds = build_sequence_dataset(&[bbc], &resolver()).unwrap();
        assert_eq!(ds.max_len, 2);
        assert_eq!(ds.column_names(), ["sample_0", "sample_1", "label"]);
        assert_eq!(ds.csv_row(0), ["1.5", "2.0", "0"]);
        assert_eq!(ds.csv_row(1), ["0.9", "1.1", "0"]);
    }

    #[test]
    fn width_is_global_across_files() {
        let dir = TempDir::new().unwrap();
        let bbc = dir.path().join("bbc.csv");
        let wiki = dir.path().join("wikipedia.csv");
        let skipped = dir.path().join("unknown.csv");
        fs::write(&bbc, "1,1\n2,1\n").unwrap();
        fs::write(&wiki, "10,3\n11\n12\n").unwrap();
        fs::write(&skipped, "1\n2\n3\n4\n5\n6\n").unwrap();

        let ds = build_sequence_dataset(&[bbc, wiki, skipped], &resolver()).unwrap();
        assert_eq!(ds.max_len, 3);
        assert_eq!(ds.rows.len(), 3);
        assert_eq!(ds.csv_row(0), ["1.0", "-1", "-1", "0"]);
        assert_eq!(ds.csv_row(2), ["10.0", "11.0", "12.0", "1"]);
    }

    #[test]
    fn file_without_markers_is_one_probe() {
        let dir = TempDir::new().unwrap();
        let wiki = dir.path().join("wikipedia.csv");
        fs::write(&wiki, "3\n4\n5\n").unwrap();

        let probes = collect_labeled_probes(&[wiki], &resolver()).unwrap();
        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].probe.timings(), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn file_with_only_bad_timings_adds_no_rows() {
        let dir = TempDir::new().unwrap();
        let bbc = dir.path().join("bbc.csv");
        let wiki = dir.path().join("wikipedia.csv");
        fs::write(&bbc, "n/a,3\n??,4\n").unwrap();
        fs::write(&wiki, "10,2\n11\n").unwrap();

        assert!(collect_labeled_probes(&[bbc.clone()], &resolver())
            .unwrap()
            .is_empty());

        let ds = build_sequence_dataset(&[bbc, wiki], &resolver()).unwrap();
        assert_eq!(ds.max_len, 2);
        assert_eq!(ds.rows.len(), 1);
        assert_eq!(ds.csv_row(0), ["10.0", "11.0", "1"]);
    }

    #[test]
    fn no_probes_gives_empty_dataset() {
        let ds = pad_probes(Vec::new());
        assert_eq!(ds.max_len, 0);
        assert_eq!(ds.column_names(), ["label"]);
        assert_eq!(ds.num_rows(), 0);
    }

    #[test]
    fn record_batch_uses_sentinel_for_padding() {
        let ds = pad_probes(vec![
            LabeledProbe { probe: probe(&[5.0]), label: 0 },
            LabeledProbe { probe: probe(&[1.0, 2.0]), label: 1 },
        ]);
        let batch = ds.to_record_batch().unwrap();
        assert_eq!(batch.num_columns(), 3);
        let tail = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(tail.value(0), -1.0);
        assert_eq!(tail.value(1), 2.0);
    }

    proptest! {
        #[test]
        fn padding_preserves_timings(
            lens in prop::collection::vec(1usize..20, 1..30)
        ) {
            let probes: Vec<LabeledProbe> = lens
                .iter()
                .enumerate()
                .map(|(i, &len)| {
                    let timings: Vec<f64> = (0..len).map(|j| (i * 100 + j) as f64).collect();
                    LabeledProbe { probe: probe(&timings), label: (i % 2) as i64 }
                })
                .collect();
            let originals = probes.clone();
            let ds = pad_probes(probes);

            prop_assert_eq!(ds.max_len, *lens.iter().max().unwrap());
            for (row, orig) in ds.rows.iter().zip(&originals) {
                let cells: Vec<Cell> = row.cells().collect();
                prop_assert_eq!(cells.len(), ds.max_len);
                let len = orig.probe.len();
                for (cell, &t) in cells[..len].iter().zip(orig.probe.timings()) {
                    prop_assert_eq!(*cell, Cell::Timing(t));
                }
                prop_assert!(cells[len..].iter().all(|c| *c == Cell::Padding));
                prop_assert_eq!(row.label, orig.label);
            }
        }
    }
}
