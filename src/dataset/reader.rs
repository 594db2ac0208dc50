use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::writer::DatasetFormat;
use super::Tabular;
use crate::data::model::{format_timing, PADDING_SENTINEL};

// ---------------------------------------------------------------------------
// FeatureTable – a dataset as the classifier sees it
// ---------------------------------------------------------------------------

/// Feature matrix plus label vector, read back from a produced dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub feature_names: Vec<String>,
    /// One row per record, `feature_names.len()` values each.
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<i64>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn width(&self) -> usize {
        self.feature_names.len()
    }

    /// Number of records per label.
    pub fn label_counts(&self) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for &label in &self.labels {
            *counts.entry(label).or_default() += 1;
        }
        counts
    }

    /// Share of feature cells holding the padding sentinel, in `[0, 1]`.
    pub fn padding_ratio(&self) -> f64 {
        let total = self.len() * self.width();
        if total == 0 {
            return 0.0;
        }
        let padded = self
            .features
            .iter()
            .flatten()
            .filter(|&&v| v == PADDING_SENTINEL)
            .count();
        padded as f64 / total as f64
    }

    /// The first `n` records.
    pub fn head(&self, n: usize) -> FeatureTable {
        let n = n.min(self.len());
        FeatureTable {
            feature_names: self.feature_names.clone(),
            features: self.features[..n].to_vec(),
            labels: self.labels[..n].to_vec(),
        }
    }
}

impl Tabular for FeatureTable {
    fn column_names(&self) -> Vec<String> {
        let mut names = self.feature_names.clone();
        names.push("label".to_string());
        names
    }

    fn num_rows(&self) -> usize {
        self.len()
    }

    fn csv_row(&self, idx: usize) -> Vec<String> {
        self.features[idx]
            .iter()
            .map(|&v| format_timing(v))
            .chain(std::iter::once(self.labels[idx].to_string()))
            .collect()
    }

    fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields: Vec<Field> = self
            .feature_names
            .iter()
            .map(|name| Field::new(name, DataType::Float64, false))
            .collect();
        fields.push(Field::new("label", DataType::Int64, false));

        let mut columns: Vec<ArrayRef> = (0..self.width())
            .map(|col| {
                let values = self.features.iter().map(|row| row[col]);
                Arc::new(Float64Array::from_iter_values(values)) as ArrayRef
            })
            .collect();
        columns.push(Arc::new(Int64Array::from(self.labels.clone())));

        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
            .context("building feature record batch")
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset written by this crate. Dispatch by extension.
///
/// Features are the `num_samples` column when present, otherwise every
/// `sample_*` column in file order. The target is the `label` column.
pub fn load_dataset(path: &Path) -> Result<FeatureTable> {
    let loaded = match DatasetFormat::from_path(path)? {
        DatasetFormat::Csv => load_csv(path),
        DatasetFormat::Parquet => load_parquet(path),
    };
    loaded.with_context(|| format!("loading dataset {}", path.display()))
}

/// Column indices of the features and the label, given the header.
fn select_columns(headers: &[String]) -> Result<(Vec<usize>, usize)> {
    let label_idx = headers
        .iter()
        .position(|h| h == "label")
        .context("dataset missing 'label' column")?;

    let features: Vec<usize> = match headers.iter().position(|h| h == "num_samples") {
        Some(idx) => vec![idx],
        None => headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.starts_with("sample_"))
            .map(|(i, _)| i)
            .collect(),
    };
    Ok((features, label_idx))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<FeatureTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let (feature_idx, label_idx) = select_columns(&headers)?;

    let mut table = FeatureTable {
        feature_names: feature_idx.iter().map(|&i| headers[i].clone()).collect(),
        ..Default::default()
    };

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let row = feature_idx
            .iter()
            .map(|&i| {
                let cell = record.get(i).unwrap_or("");
                cell.trim().parse::<f64>().with_context(|| {
                    format!("Row {row_no}, {}: '{cell}' is not a number", headers[i])
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let cell = record.get(label_idx).unwrap_or("");
        let label = cell
            .trim()
            .parse::<i64>()
            .with_context(|| format!("Row {row_no}, label: '{cell}' is not an integer"))?;

        table.features.push(row);
        table.labels.push(label);
    }

    Ok(table)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

fn load_parquet(path: &Path) -> Result<FeatureTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let (feature_idx, label_idx) = select_columns(&headers)?;
    let reader = builder.build().context("building parquet reader")?;

    let mut table = FeatureTable {
        feature_names: feature_idx.iter().map(|&i| headers[i].clone()).collect(),
        ..Default::default()
    };

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let feature_cols = feature_idx
            .iter()
            .map(|&i| {
                cast(batch.column(i), &DataType::Float64)
                    .with_context(|| format!("column '{}' is not numeric", headers[i]))
            })
            .collect::<Result<Vec<ArrayRef>>>()?;
        let label_col = cast(batch.column(label_idx), &DataType::Int64)
            .context("column 'label' is not an integer")?;

        for col in feature_cols.iter().chain(std::iter::once(&label_col)) {
            if col.null_count() > 0 {
                bail!("null values are not allowed in a dataset");
            }
        }

        let feature_cols: Vec<&Float64Array> = feature_cols
            .iter()
            .map(|c| c.as_primitive::<Float64Type>())
            .collect();
        let labels = label_col.as_primitive::<Int64Type>();

        for row in 0..batch.num_rows() {
            table
                .features
                .push(feature_cols.iter().map(|c| c.value(row)).collect());
            table.labels.push(labels.value(row));
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{LabeledProbe, Probe};
    use crate::dataset::sequence::pad_probes;
    use crate::dataset::write_dataset;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_count_dataset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample_count.csv");
        fs::write(&path, "num_samples,label\n3,0\n2,0\n7,1\n").unwrap();

        let table = load_dataset(&path).unwrap();
        assert_eq!(table.feature_names, ["num_samples"]);
        assert_eq!(table.features, vec![vec![3.0], vec![2.0], vec![7.0]]);
        assert_eq!(table.labels, [0, 0, 1]);
        assert_eq!(table.label_counts(), BTreeMap::from([(0, 2), (1, 1)]));
    }

    #[test]
    fn loads_padded_sequences() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cycles_count.csv");
        fs::write(&path, "sample_0,sample_1,label\n1.5,2.0,0\n9.0,-1,1\n").unwrap();

        let table = load_dataset(&path).unwrap();
        assert_eq!(table.width(), 2);
        assert_eq!(table.features[1], [9.0, -1.0]);
        assert_eq!(table.padding_ratio(), 0.25);
    }

    #[test]
    fn missing_label_column_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "sample_0,sample_1\n1,2\n").unwrap();

        let err = load_dataset(&path).unwrap_err();
        assert!(format!("{err:#}").contains("label"), "{err:#}");
    }

    #[test]
    fn ragged_rows_are_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "sample_0,sample_1,label\n1,2,0\n1,0\n").unwrap();

        assert!(load_dataset(&path).is_err());
    }

    #[test]
    fn parquet_dataset_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cycles.parquet");
        let mut long = Probe::starting_with(1.0);
        long.push(2.0);
        let ds = pad_probes(vec![
            LabeledProbe { probe: long, label: 1 },
            LabeledProbe { probe: Probe::starting_with(4.0), label: 0 },
        ]);
        write_dataset(&path, &ds).unwrap();

        let table = load_dataset(&path).unwrap();
        assert_eq!(table.feature_names, ["sample_0", "sample_1"]);
        assert_eq!(table.features, vec![vec![1.0, 2.0], vec![4.0, -1.0]]);
        assert_eq!(table.labels, [1, 0]);
    }

    #[test]
    fn head_limits_rows() {
        let table = FeatureTable {
            feature_names: vec!["num_samples".into()],
            features: vec![vec![1.0], vec![2.0], vec![3.0]],
            labels: vec![0, 1, 0],
        };
        let head = table.head(2);
        assert_eq!(head.len(), 2);
        assert_eq!(head.csv_row(1), ["2.0", "1"]);
        assert_eq!(table.head(10).len(), 3);
        assert_eq!(head.to_record_batch().unwrap().num_rows(), 2);
    }
}
