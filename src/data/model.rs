use std::fmt;

/// Sentinel written into the unused tail of a short probe.
pub const PADDING_SENTINEL: f64 = -1.0;

// ---------------------------------------------------------------------------
// TimingRow – one parsed line of a probing-tool CSV
// ---------------------------------------------------------------------------

/// A single timing sample.
///
/// `sample_count` is only present on rows whose second column was non-empty.
/// Its presence marks the first row of a new probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingRow {
    pub timing: f64,
    pub sample_count: Option<i64>,
}

impl TimingRow {
    pub fn new(timing: f64, sample_count: Option<i64>) -> Self {
        Self {
            timing,
            sample_count,
        }
    }

    /// Whether this row opens a new probe.
    pub fn is_marker(&self) -> bool {
        self.sample_count.is_some()
    }
}

// ---------------------------------------------------------------------------
// Probe – a contiguous run of timings from one file
// ---------------------------------------------------------------------------

/// An ordered, never-empty sequence of timings.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe(Vec<f64>);

#[allow(clippy::len_without_is_empty)] // a probe always holds at least one timing
impl Probe {
    /// Open a probe with its first timing.
    pub fn starting_with(timing: f64) -> Self {
        Probe(vec![timing])
    }

    pub fn push(&mut self, timing: f64) {
        self.0.push(timing);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn timings(&self) -> &[f64] {
        &self.0
    }
}

/// A probe paired with the label resolved for its source file.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledProbe {
    pub probe: Probe,
    pub label: i64,
}

// ---------------------------------------------------------------------------
// SiteStatistics – per-file summary for the report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SiteStatistics {
    pub site_name: String,
    /// Mean of every parsed timing in the file.
    pub mean_timing: f64,
    /// Mean of the marker values, or 0 when the file had no marker rows.
    pub mean_sample_count: f64,
}

// ---------------------------------------------------------------------------
// Dataset rows
// ---------------------------------------------------------------------------

/// One record of the count dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRecord {
    pub num_samples: i64,
    pub label: i64,
}

/// A single cell of a padded sequence row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Timing(f64),
    Padding,
}

impl Cell {
    pub fn value(self) -> f64 {
        match self {
            Cell::Timing(v) => v,
            Cell::Padding => PADDING_SENTINEL,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Timing(v) => write!(f, "{}", format_timing(*v)),
            Cell::Padding => write!(f, "{}", PADDING_SENTINEL as i64),
        }
    }
}

/// A probe stretched to the dataset width, plus its label.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedDatasetRow {
    timings: Vec<f64>,
    width: usize,
    pub label: i64,
}

impl PaddedDatasetRow {
    /// Pad `probe` to `width` cells. `width` must be at least the probe length.
    pub fn new(probe: Probe, width: usize, label: i64) -> Self {
        debug_assert!(probe.len() <= width, "probe longer than dataset width");
        PaddedDatasetRow {
            timings: probe.0,
            width,
            label,
        }
    }

    /// Number of real (non-padding) cells.
    pub fn probe_len(&self) -> usize {
        self.timings.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// All `width` cells: the probe's timings followed by padding.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.timings
            .iter()
            .map(|&v| Cell::Timing(v))
            .chain(std::iter::repeat(Cell::Padding))
            .take(self.width)
    }
}

/// Render a timing the way the downstream tooling expects: every integral
/// value keeps one decimal (`2.0`, `10000000000000000.0`), other finite values
/// use the shortest round-trip form in plain decimal notation, and non-finite
/// values are `nan`, `inf` or `-inf`.
pub fn format_timing(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_timings_keep_a_decimal() {
        assert_eq!(format_timing(2.0), "2.0");
        assert_eq!(format_timing(1234.0), "1234.0");
        assert_eq!(format_timing(1.5), "1.5");
        assert_eq!(format_timing(0.1), "0.1");
    }

    #[test]
    fn large_and_non_finite_timings() {
        assert_eq!(format_timing(1e16), "10000000000000000.0");
        assert_eq!(format_timing(-3e17), "-300000000000000000.0");
        assert_eq!(format_timing(1e-5), "0.00001");
        assert_eq!(format_timing(f64::NAN), "nan");
        assert_eq!(format_timing(f64::INFINITY), "inf");
        assert_eq!(format_timing(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_timing(1e16).parse::<f64>().unwrap(), 1e16);
    }

    #[test]
    fn padded_row_fills_tail_with_sentinel() {
        let mut probe = Probe::starting_with(3.0);
        probe.push(4.5);
        let row = PaddedDatasetRow::new(probe, 4, 1);

        let cells: Vec<Cell> = row.cells().collect();
        assert_eq!(
            cells,
            vec![Cell::Timing(3.0), Cell::Timing(4.5), Cell::Padding, Cell::Padding]
        );
        let rendered: Vec<String> = cells.iter().map(Cell::to_string).collect();
        assert_eq!(rendered, ["3.0", "4.5", "-1", "-1"]);
        assert_eq!(row.probe_len(), 2);
    }

    #[test]
    fn marker_rows_are_detected() {
        assert!(TimingRow::new(1.0, Some(3)).is_marker());
        assert!(!TimingRow::new(1.0, None).is_marker());
    }
}
