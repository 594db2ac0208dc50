use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use parquet::arrow::ArrowWriter;

use super::Tabular;

/// Output encodings, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Parquet,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(DatasetFormat::Csv),
            "parquet" | "pq" => Ok(DatasetFormat::Parquet),
            other => bail!("Unsupported dataset extension: .{other}"),
        }
    }
}

/// Write a whole dataset to `path`.
///
/// The table is written to a hidden sibling file first and renamed into
/// place, so a failed run never leaves a truncated dataset behind.
pub fn write_dataset(path: &Path, table: &dyn Tabular) -> Result<()> {
    let format = DatasetFormat::from_path(path)?;
    let partial = partial_path(path);

    let written = match format {
        DatasetFormat::Csv => write_csv(&partial, table),
        DatasetFormat::Parquet => write_parquet(&partial, table),
    };
    if let Err(err) = written {
        let _ = std::fs::remove_file(&partial);
        return Err(err.context(format!("writing {}", path.display())));
    }

    std::fs::rename(&partial, path)
        .with_context(|| format!("moving dataset into place at {}", path.display()))
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

fn write_csv(path: &Path, table: &dyn Tabular) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer
        .write_record(table.column_names())
        .context("writing CSV header")?;
    for idx in 0..table.num_rows() {
        writer
            .write_record(table.csv_row(idx))
            .with_context(|| format!("writing CSV row {idx}"))?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(path: &Path, table: &dyn Tabular) -> Result<()> {
    let batch = table.to_record_batch()?;
    let file = File::create(path).context("creating parquet file")?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
