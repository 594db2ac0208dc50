use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    LabelSpec, Matcher, DEFAULT_COUNT_DATASET, DEFAULT_REPORT, DEFAULT_SEQUENCE_DATASET,
};

/// Command-line surface of the `probeset` binary.
#[derive(Parser, Debug)]
#[command(name = "probeset")]
#[command(version)]
#[command(about = "Build labeled classifier datasets from cache-probing timing CSVs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where labels come from.
#[derive(Args, Debug, Clone, Default)]
pub struct LabelArgs {
    /// JSON config file with an ordered "labels" list and optional "matcher"
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keyword-to-label rule (repeatable; the first matching rule wins)
    #[arg(short = 'l', long = "label", value_name = "KEYWORD=LABEL")]
    pub labels: Vec<LabelSpec>,

    /// How keywords are matched against file names
    #[arg(long, value_enum, value_name = "MODE")]
    pub matcher: Option<Matcher>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print and save per-site timing statistics
    Report {
        /// Directory holding the probing CSV files
        dir: PathBuf,
        /// Report file
        #[arg(short, long, default_value = DEFAULT_REPORT)]
        output: PathBuf,
    },

    /// Build the sample-count dataset (one row per marker row)
    Counts {
        /// Directory holding the probing CSV files
        dir: PathBuf,
        /// Dataset file (.csv or .parquet)
        #[arg(short, long, default_value = DEFAULT_COUNT_DATASET)]
        output: PathBuf,
        #[command(flatten)]
        labels: LabelArgs,
    },

    /// Build the padded timing-sequence dataset (one row per probe)
    Sequences {
        /// Directory holding the probing CSV files
        dir: PathBuf,
        /// Dataset file (.csv or .parquet)
        #[arg(short, long, default_value = DEFAULT_SEQUENCE_DATASET)]
        output: PathBuf,
        #[command(flatten)]
        labels: LabelArgs,
    },

    /// Produce the report and both datasets with their default names
    All {
        /// Directory holding the probing CSV files
        dir: PathBuf,
        /// Directory the three artifacts are written to
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
        #[command(flatten)]
        labels: LabelArgs,
    },

    /// Summarize a produced dataset file
    Inspect {
        /// Dataset file (.csv or .parquet)
        dataset: PathBuf,
        /// Number of rows to preview
        #[arg(long, default_value_t = 5)]
        head: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_counts_with_label_rules() {
        let cli = Cli::parse_from([
            "probeset",
            "counts",
            "runs",
            "-l",
            "bbc=0",
            "--label",
            "cnn=2",
            "--matcher",
            "segment",
        ]);
        let Commands::Counts { dir, output, labels } = cli.command else {
            panic!("expected counts");
        };
        assert_eq!(dir, PathBuf::from("runs"));
        assert_eq!(output, PathBuf::from(DEFAULT_COUNT_DATASET));
        assert_eq!(labels.labels.len(), 2);
        assert_eq!(labels.labels[1].keyword, "cnn");
        assert_eq!(labels.matcher, Some(Matcher::Segment));
    }

    #[test]
    fn bad_label_rule_is_rejected() {
        assert!(Cli::try_parse_from(["probeset", "counts", "runs", "-l", "bbc"]).is_err());
    }

    #[test]
    fn inspect_defaults() {
        let cli = Cli::parse_from(["probeset", "inspect", "cycles_count.csv"]);
        assert!(matches!(cli.command, Commands::Inspect { head: 5, .. }));
    }
}
