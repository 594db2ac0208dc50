use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;

use crate::config::{DEFAULT_COUNT_DATASET, DEFAULT_REPORT, DEFAULT_SEQUENCE_DATASET};
use crate::data::labels::LabelResolver;
use crate::data::loader::list_csv_files;
use crate::dataset::{
    build_count_dataset, build_sequence_dataset, load_dataset, write_dataset, Tabular,
};
use crate::report::{analyze_files, render_report};

// ---------------------------------------------------------------------------
// Runs behind each subcommand
// ---------------------------------------------------------------------------

// Every run first lists the `*.csv` files of the source directory. An empty
// listing is reported and ends the run successfully without writing anything.

/// Summary of a written sequence dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceSummary {
    pub max_len: usize,
    pub probes: usize,
}

/// The CSV files of `dir` other than the artifacts in `outputs`, or `None`
/// (with a warning) when there are none.
///
/// Artifacts written into the source directory by an earlier run would
/// otherwise be read back as site files.
pub fn input_files(dir: &Path, outputs: &[&Path]) -> Result<Option<Vec<PathBuf>>> {
    let outputs: Vec<PathBuf> = outputs
        .iter()
        .filter_map(|p| std::fs::canonicalize(p).ok())
        .collect();
    let files: Vec<PathBuf> = list_csv_files(dir)?
        .into_iter()
        .filter(|path| match std::fs::canonicalize(path) {
            Ok(real) if outputs.contains(&real) => {
                log::debug!("Skipping {}: it is an output of this run", path.display());
                false
            }
            _ => true,
        })
        .collect();

    if files.is_empty() {
        log::warn!("No CSV files found in {}", dir.display());
        return Ok(None);
    }
    log::debug!("Found {} CSV files in {}", files.len(), dir.display());
    Ok(Some(files))
}

/// Build the report, save it to `output` and return its text.
pub fn run_report(dir: &Path, output: &Path) -> Result<Option<String>> {
    let Some(files) = input_files(dir, &[output])? else {
        return Ok(None);
    };
    report_files(&files, output).map(Some)
}

/// Build and save the count dataset; returns the record count.
pub fn run_counts(dir: &Path, output: &Path, resolver: &dyn LabelResolver) -> Result<Option<usize>> {
    let Some(files) = input_files(dir, &[output])? else {
        return Ok(None);
    };
    count_files(&files, output, resolver).map(Some)
}

/// Build and save the padded sequence dataset.
pub fn run_sequences(
    dir: &Path,
    output: &Path,
    resolver: &dyn LabelResolver,
) -> Result<Option<SequenceSummary>> {
    let Some(files) = input_files(dir, &[output])? else {
        return Ok(None);
    };
    sequence_files(&files, output, resolver).map(Some)
}

/// All three artifacts under `out_dir`, built from one listing of `dir`.
/// Returns the report text.
pub fn run_all(dir: &Path, out_dir: &Path, resolver: &dyn LabelResolver) -> Result<Option<String>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    if let (Ok(a), Ok(b)) = (std::fs::canonicalize(dir), std::fs::canonicalize(out_dir)) {
        if a == b {
            log::warn!(
                "Output directory is the source directory {}; earlier artifacts are not read as input",
                dir.display()
            );
        }
    }

    let report = out_dir.join(DEFAULT_REPORT);
    let counts = out_dir.join(DEFAULT_COUNT_DATASET);
    let cycles = out_dir.join(DEFAULT_SEQUENCE_DATASET);
    let Some(files) = input_files(dir, &[&report, &counts, &cycles])? else {
        return Ok(None);
    };

    let text = report_files(&files, &report)?;
    count_files(&files, &counts, resolver)?;
    sequence_files(&files, &cycles, resolver)?;
    Ok(Some(text))
}

fn report_files(files: &[PathBuf], output: &Path) -> Result<String> {
    let text = render_report(&analyze_files(files)?);
    std::fs::write(output, &text).with_context(|| format!("writing {}", output.display()))?;
    log::info!("Report written to {}", output.display());
    Ok(text)
}

fn count_files(files: &[PathBuf], output: &Path, resolver: &dyn LabelResolver) -> Result<usize> {
    let dataset = build_count_dataset(files, resolver)?;
    write_dataset(output, &dataset)?;
    log::info!(
        "Count dataset written to {} with {} samples.",
        output.display(),
        dataset.num_rows()
    );
    Ok(dataset.num_rows())
}

fn sequence_files(
    files: &[PathBuf],
    output: &Path,
    resolver: &dyn LabelResolver,
) -> Result<SequenceSummary> {
    let dataset = build_sequence_dataset(files, resolver)?;
    log::info!("Maximum probe length detected: {} samples.", dataset.max_len);
    write_dataset(output, &dataset)?;
    log::info!(
        "Sequence dataset written to {} with {} probes.",
        output.display(),
        dataset.num_rows()
    );
    Ok(SequenceSummary {
        max_len: dataset.max_len,
        probes: dataset.num_rows(),
    })
}

/// Human-readable summary of a dataset file with a preview of its first rows.
pub fn inspect(path: &Path, head: usize) -> Result<String> {
    let table = load_dataset(path)?;

    let mut out = String::new();
    writeln!(out, "Dataset: {}", path.display())?;
    writeln!(out, "  Rows: {}", table.len())?;
    writeln!(out, "  Features: {}", table.width())?;
    for (label, count) in table.label_counts() {
        writeln!(out, "  Label {label}: {count}")?;
    }
    writeln!(out, "  Padding cells: {:.2}%", table.padding_ratio() * 100.0)?;

    if head > 0 && !table.is_empty() {
        let preview = table.head(head).to_record_batch()?;
        let rendered = pretty_format_batches(&[preview]).context("formatting preview")?;
        writeln!(out, "{rendered}")?;
    }
    Ok(out)
}
