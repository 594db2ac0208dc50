use std::path::Path;

// ---------------------------------------------------------------------------
// LabelMapping – ordered keyword → label table
// ---------------------------------------------------------------------------

/// Ordered keyword → label rules. Keywords are stored lowercase and the
/// first rule that matches a file name decides its label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMapping {
    entries: Vec<(String, i64)>,
}

impl LabelMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Later rules only apply when no earlier one matches.
    pub fn push(&mut self, keyword: &str, label: i64) {
        self.entries.push((keyword.to_lowercase(), label));
    }

    pub fn with(mut self, keyword: &str, label: i64) -> Self {
        self.push(keyword, label);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.entries.iter().map(|(k, l)| (k.as_str(), *l))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

/// Maps a source file name to a class label.
pub trait LabelResolver {
    /// Label for `file_name`, or `None` when no rule applies.
    fn resolve(&self, file_name: &str) -> Option<i64>;
}

/// First rule whose keyword occurs anywhere in the case-folded name.
pub fn resolve_substring(file_name: &str, mapping: &LabelMapping) -> Option<i64> {
    let name = file_name.to_lowercase();
    mapping
        .entries()
        .find(|(keyword, _)| name.contains(keyword))
        .map(|(_, label)| label)
}

/// First rule whose keyword equals a whole run of name segments.
///
/// The file stem and the keyword are both split on non-alphanumeric
/// characters, so `bbc` matches `bbc_probe.csv` but not `abbcd.csv`, and
/// `bbc_news` matches `run1-bbc-news.csv`.
pub fn resolve_segment(file_name: &str, mapping: &LabelMapping) -> Option<i64> {
    let lowered = file_name.to_lowercase();
    let stem = Path::new(&lowered)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(lowered.as_str());
    let segments = split_segments(stem);

    mapping
        .entries()
        .find(|(keyword, _)| {
            let needle = split_segments(keyword);
            !needle.is_empty() && segments.windows(needle.len()).any(|w| w == needle.as_slice())
        })
        .map(|(_, label)| label)
}

fn split_segments(s: &str) -> Vec<&str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|seg| !seg.is_empty())
        .collect()
}

/// Substring matching, compatible with existing datasets.
#[derive(Debug, Clone)]
pub struct SubstringResolver {
    pub mapping: LabelMapping,
}

impl LabelResolver for SubstringResolver {
    fn resolve(&self, file_name: &str) -> Option<i64> {
        resolve_substring(file_name, &self.mapping)
    }
}

/// Whole-segment matching; avoids false positives on embedded keywords.
#[derive(Debug, Clone)]
pub struct SegmentResolver {
    pub mapping: LabelMapping,
}

impl LabelResolver for SegmentResolver {
    fn resolve(&self, file_name: &str) -> Option<i64> {
        resolve_segment(file_name, &self.mapping)
    }
}
