use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

use crate::data::labels::{LabelMapping, LabelResolver, SegmentResolver, SubstringResolver};

// ---------------------------------------------------------------------------
// Defaults – artifact names and label mapping
// ---------------------------------------------------------------------------

pub const DEFAULT_REPORT: &str = "probe_report.txt";
pub const DEFAULT_COUNT_DATASET: &str = "sample_count.csv";
pub const DEFAULT_SEQUENCE_DATASET: &str = "cycles_count.csv";

/// Mapping used when neither a config file nor `--label` supplies one.
pub fn default_mapping() -> LabelMapping {
    LabelMapping::new().with("bbc", 0).with("wikipedia", 1)
}

/// Errors from `--label` rules and the JSON label config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid label rule '{0}': expected KEYWORD=LABEL")]
    BadLabelSpec(String),
    #[error("label keyword must not be empty")]
    EmptyKeyword,
    #[error("reading config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Matcher – which resolver to build
// ---------------------------------------------------------------------------

/// How label keywords are matched against file names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Matcher {
    /// Keyword anywhere in the name (first rule wins)
    #[default]
    Substring,
    /// Keyword must equal whole name segments split on punctuation
    Segment,
}

impl Matcher {
    pub fn resolver(self, mapping: LabelMapping) -> Box<dyn LabelResolver> {
        match self {
            Matcher::Substring => Box::new(SubstringResolver { mapping }),
            Matcher::Segment => Box::new(SegmentResolver { mapping }),
        }
    }
}

// ---------------------------------------------------------------------------
// LabelSpec – one `KEYWORD=LABEL` rule
// ---------------------------------------------------------------------------

/// Config-file rules are checked by the same constructor as `--label` flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawLabelSpec")]
pub struct LabelSpec {
    pub keyword: String,
    pub label: i64,
}

impl LabelSpec {
    /// Trims the keyword; an empty keyword would match every file name.
    pub fn new(keyword: &str, label: i64) -> Result<Self, ConfigError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ConfigError::EmptyKeyword);
        }
        Ok(LabelSpec {
            keyword: keyword.to_string(),
            label,
        })
    }
}

impl FromStr for LabelSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (keyword, label) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::BadLabelSpec(s.to_string()))?;
        let label = label
            .trim()
            .parse()
            .map_err(|_| ConfigError::BadLabelSpec(s.to_string()))?;
        LabelSpec::new(keyword, label)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLabelSpec {
    keyword: String,
    label: i64,
}

impl TryFrom<RawLabelSpec> for LabelSpec {
    type Error = ConfigError;

    fn try_from(raw: RawLabelSpec) -> Result<Self, Self::Error> {
        LabelSpec::new(&raw.keyword, raw.label)
    }
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// On-disk JSON config. `labels` is an array so that rule order survives.
///
/// ```json
/// { "labels": [{"keyword": "bbc", "label": 0}], "matcher": "segment" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub labels: Vec<LabelSpec>,
    #[serde(default)]
    pub matcher: Option<Matcher>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// LabelSettings – the merged result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSettings {
    pub mapping: LabelMapping,
    pub matcher: Matcher,
}

impl LabelSettings {
    /// Merge the sources. Command-line rules replace the file's rules and a
    /// command-line matcher replaces the file's matcher.
    pub fn merge(
        file: Option<ConfigFile>,
        cli_labels: &[LabelSpec],
        cli_matcher: Option<Matcher>,
    ) -> Self {
        let file = file.unwrap_or_default();
        let specs = if cli_labels.is_empty() {
            file.labels.as_slice()
        } else {
            cli_labels
        };

        let mapping = if specs.is_empty() {
            default_mapping()
        } else {
            specs.iter().fold(LabelMapping::new(), |m, spec| {
                m.with(&spec.keyword, spec.label)
            })
        };

        LabelSettings {
            mapping,
            matcher: cli_matcher.or(file.matcher).unwrap_or_default(),
        }
    }

    pub fn resolver(&self) -> Box<dyn LabelResolver> {
        self.matcher.resolver(self.mapping.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label_rules() {
        assert_eq!(
            "bbc=0".parse::<LabelSpec>().unwrap(),
            LabelSpec { keyword: "bbc".into(), label: 0 }
        );
        assert_eq!(
            " wikipedia = 12 ".parse::<LabelSpec>().unwrap(),
            LabelSpec { keyword: "wikipedia".into(), label: 12 }
        );
        assert!(matches!("bbc".parse::<LabelSpec>(), Err(ConfigError::BadLabelSpec(_))));
        assert!(matches!("bbc=x".parse::<LabelSpec>(), Err(ConfigError::BadLabelSpec(_))));
        assert!(matches!("=1".parse::<LabelSpec>(), Err(ConfigError::EmptyKeyword)));
    }

    #[test]
    fn defaults_when_nothing_given() {
        let settings = LabelSettings::merge(None, &[], None);
        assert_eq!(settings.mapping, default_mapping());
        assert_eq!(settings.matcher, Matcher::Substring);
    }

    #[test]
    fn config_file_keeps_rule_order() {
        let file: ConfigFile = serde_json::from_str(
            r#"{"labels": [{"keyword": "wiki", "label": 1}, {"keyword": "bbc", "label": 0}],
                "matcher": "segment"}"#,
        )
        .unwrap();
        let settings = LabelSettings::merge(Some(file), &[], None);

        let entries: Vec<(&str, i64)> = settings.mapping.entries().collect();
        assert_eq!(entries, [("wiki", 1), ("bbc", 0)]);
        assert_eq!(settings.matcher, Matcher::Segment);
    }

    #[test]
    fn command_line_overrides_file() {
        let file = ConfigFile {
            labels: vec![LabelSpec { keyword: "bbc".into(), label: 0 }],
            matcher: Some(Matcher::Segment),
        };
        let cli = ["cnn=5".parse::<LabelSpec>().unwrap()];
        let settings = LabelSettings::merge(Some(file), &cli, Some(Matcher::Substring));

        assert_eq!(settings.mapping, LabelMapping::new().with("cnn", 5));
        assert_eq!(settings.resolver().resolve("cnn_probe.csv"), Some(5));
        assert_eq!(settings.resolver().resolve("bbc.csv"), None);
    }

    #[test]
    fn config_file_rules_are_validated_like_flags() {
        let err = serde_json::from_str::<ConfigFile>(
            r#"{"labels": [{"keyword": "", "label": 7}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must not be empty"), "{err}");
        assert!(serde_json::from_str::<ConfigFile>(
            r#"{"labels": [{"keyword": "   ", "label": 7}]}"#
        )
        .is_err());

        let file: ConfigFile =
            serde_json::from_str(r#"{"labels": [{"keyword": " bbc ", "label": 0}]}"#).unwrap();
        let settings = LabelSettings::merge(Some(file), &[], None);
        assert_eq!(settings.mapping, LabelMapping::new().with("bbc", 0));
        assert_eq!(settings.resolver().resolve("bbc_probe.csv"), Some(0));
        assert_eq!(settings.resolver().resolve("google.csv"), None);
    }

    #[test]
    fn load_reports_empty_keyword_with_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"{"labels": [{"keyword": "", "label": 7}]}"#).unwrap();

        let err = ConfigFile::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("labels.json"));
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        assert!(serde_json::from_str::<ConfigFile>(r#"{"lables": []}"#).is_err());
    }
}
