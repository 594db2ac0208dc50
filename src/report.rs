use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::data::loader::{read_timing_rows, site_name, MarkerPolicy};
use crate::data::model::{SiteStatistics, TimingRow};

const RULE_WIDTH: usize = 40;
const TITLE: &str = "           PROBING REPORT";

// ---------------------------------------------------------------------------
// Site statistics
// ---------------------------------------------------------------------------

/// Fold one file's rows into its statistics.
///
/// Returns `None` when there are no timings at all; such a file is left out
/// of the report.
pub fn site_statistics(site_name: &str, rows: &[TimingRow]) -> Option<SiteStatistics> {
    if rows.is_empty() {
        return None;
    }
    let mean_timing = rows.iter().map(|r| r.timing).sum::<f64>() / rows.len() as f64;

    let counts: Vec<i64> = rows.iter().filter_map(|r| r.sample_count).collect();
    let mean_sample_count = if counts.is_empty() {
        0.0
    } else {
        counts.iter().map(|&c| c as f64).sum::<f64>() / counts.len() as f64
    };

    Some(SiteStatistics {
        site_name: site_name.to_string(),
        mean_timing,
        mean_sample_count,
    })
}

/// Statistics for a single file. Malformed rows never abort the report.
pub fn analyze_file(path: &Path) -> Result<Option<SiteStatistics>> {
    let rows = read_timing_rows(path, MarkerPolicy::Tolerate)?;
    let stats = site_statistics(&site_name(path), &rows);
    if stats.is_none() {
        log::warn!("No timings in {}, leaving it out of the report", path.display());
    }
    Ok(stats)
}

/// Statistics for every file, in the given order, skipping empty ones.
pub fn analyze_files(files: &[PathBuf]) -> Result<Vec<SiteStatistics>> {
    let mut all = Vec::with_capacity(files.len());
    for path in files {
        if let Some(stats) = analyze_file(path)? {
            all.push(stats);
        }
    }
    Ok(all)
}

// ---------------------------------------------------------------------------
// Report rendering – title banner, then one section per site
// ---------------------------------------------------------------------------

/// Render the report text: a title banner, then one section per site.
pub fn render_report(stats: &[SiteStatistics]) -> String {
    let banner = "=".repeat(RULE_WIDTH);
    let rule = "-".repeat(RULE_WIDTH);

    let mut lines = vec![banner.clone(), TITLE.to_string(), banner];
    for site in stats {
        lines.push(format!("Site: {}", site.site_name));
        lines.push(format!("  Average cycles per sample: {:.2}", site.mean_timing));
        lines.push(format!(
            "  Average num of samples per probe: {:.2}",
            site.mean_sample_count
        ));
        lines.push(rule.clone());
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
