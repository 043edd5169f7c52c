//! Mapping pack model, loading, and validation.
//!
//! A pack is loaded once per run from JSON, validated field by field (every
//! violation is collected, not just the first), and immutable afterwards.
//! Regex rules are compiled here so resolution never re-validates strategy
//! data; a pattern that fails to compile disarms its rule with a load
//! warning instead of failing the whole pack.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;
pub const DEFAULT_ASPECT_TOLERANCE: f64 = 0.05;

/// How a rule's `source` is matched against an asset name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Exact,
    Regex,
    Token,
    Similarity,
}

impl Strategy {
    fn parse(raw: &str) -> Option<Strategy> {
        match raw {
            "" | "exact" => Some(Strategy::Exact),
            "regex" => Some(Strategy::Regex),
            "token" => Some(Strategy::Token),
            "similarity" => Some(Strategy::Similarity),
            _ => None,
        }
    }
}

/// One declarative remap. Order within the pack is significant: the first
/// matching rule wins.
#[derive(Debug, Clone)]
pub struct Rule {
    pub source: String,
    pub strategy: Strategy,
    pub target: String,
    pub expected_resolution: Option<String>,
    pub expected_aspect: Option<f64>,
    pub similarity_threshold: Option<f64>,
    /// Compiled pattern for regex rules; `None` on a regex rule means the
    /// pattern failed to compile and the rule is disarmed.
    pub pattern: Option<Regex>,
}

#[derive(Debug, Default)]
pub struct MappingPack {
    pub rules: Vec<Rule>,
    pub root_folders: Vec<PathBuf>,
    pub similarity_threshold: f64,
    pub aspect_tolerance: f64,
    /// One entry per disarmed rule, surfaced as run warnings.
    pub load_warnings: Vec<String>,
}

impl MappingPack {
    /// The fuzzy-acceptance threshold for a rule: its own override if set,
    /// the pack default otherwise.
    pub fn threshold_for(&self, rule: &Rule) -> f64 {
        rule.similarity_threshold
            .unwrap_or(self.similarity_threshold)
    }
}

/// A single schema violation, addressed by JSON-pointer-ish field path.
#[derive(Debug, Clone, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum PackError {
    #[error("read mapping pack {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse mapping pack {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid mapping pack: {}", format_errors(.errors))]
    Invalid { errors: Vec<FieldError> },
}

fn format_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(FieldError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Deserialize)]
struct RawPack {
    rules: Option<Vec<RawRule>>,
    root_folders: Option<Vec<String>>,
    similarity_threshold: Option<f64>,
    aspect_tolerance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    source: Option<String>,
    strategy: Option<String>,
    target: Option<String>,
    expected_resolution: Option<String>,
    expected_aspect: Option<f64>,
    similarity_threshold: Option<f64>,
}

/// Load and validate a mapping pack from a JSON file.
pub fn load_mapping_pack(path: &Path) -> Result<MappingPack, PackError> {
    let content = std::fs::read_to_string(path).map_err(|source| PackError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawPack = serde_json::from_str(&content).map_err(|source| PackError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_pack(raw)
}

/// Validate a pack from an in-memory JSON string.
#[cfg(test)]
pub fn parse_mapping_pack(content: &str) -> Result<MappingPack, PackError> {
    let raw: RawPack = serde_json::from_str(content).map_err(|source| PackError::Parse {
        path: PathBuf::from("<inline>"),
        source,
    })?;
    validate_pack(raw)
}

fn validate_pack(raw: RawPack) -> Result<MappingPack, PackError> {
    let mut errors = Vec::new();
    let mut pack = MappingPack {
        similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        aspect_tolerance: DEFAULT_ASPECT_TOLERANCE,
        ..MappingPack::default()
    };

    if let Some(threshold) = raw.similarity_threshold {
        if threshold > 0.0 && threshold <= 1.0 {
            pack.similarity_threshold = threshold;
        } else {
            push_error(
                &mut errors,
                "similarity_threshold",
                format!("must be in (0, 1], got {threshold}"),
            );
        }
    }
    if let Some(tolerance) = raw.aspect_tolerance {
        if tolerance >= 0.0 {
            pack.aspect_tolerance = tolerance;
        } else {
            push_error(
                &mut errors,
                "aspect_tolerance",
                format!("must be non-negative, got {tolerance}"),
            );
        }
    }

    pack.root_folders = raw
        .root_folders
        .unwrap_or_default()
        .into_iter()
        .map(PathBuf::from)
        .collect();

    for (pos, raw_rule) in raw.rules.unwrap_or_default().into_iter().enumerate() {
        match validate_rule(pos, raw_rule, &mut errors) {
            Some((rule, warning)) => {
                if let Some(warning) = warning {
                    pack.load_warnings.push(warning);
                }
                pack.rules.push(rule);
            }
            None => continue,
        }
    }

    if errors.is_empty() {
        Ok(pack)
    } else {
        Err(PackError::Invalid { errors })
    }
}

fn validate_rule(
    pos: usize,
    raw: RawRule,
    errors: &mut Vec<FieldError>,
) -> Option<(Rule, Option<String>)> {
    let before = errors.len();

    let source = match raw.source {
        Some(source) if !source.is_empty() => source,
        _ => {
            push_error(errors, &format!("rules[{pos}].source"), "is required");
            String::new()
        }
    };
    let target = match raw.target {
        Some(target) if !target.is_empty() => target,
        _ => {
            push_error(errors, &format!("rules[{pos}].target"), "is required");
            String::new()
        }
    };
    let strategy = match Strategy::parse(raw.strategy.as_deref().unwrap_or("")) {
        Some(strategy) => strategy,
        None => {
            push_error(
                errors,
                &format!("rules[{pos}].strategy"),
                format!(
                    "unknown strategy {:?}; expected exact, regex, token, or similarity",
                    raw.strategy.unwrap_or_default()
                ),
            );
            Strategy::Exact
        }
    };
    if let Some(threshold) = raw.similarity_threshold {
        if !(threshold > 0.0 && threshold <= 1.0) {
            push_error(
                errors,
                &format!("rules[{pos}].similarity_threshold"),
                format!("must be in (0, 1], got {threshold}"),
            );
        }
    }
    if let Some(aspect) = raw.expected_aspect {
        if aspect <= 0.0 {
            push_error(
                errors,
                &format!("rules[{pos}].expected_aspect"),
                format!("must be positive, got {aspect}"),
            );
        }
    }
    if errors.len() > before {
        return None;
    }

    // Compile regex rules up front; a bad pattern disarms the rule rather
    // than failing the load (the run reports it once as a warning).
    let mut warning = None;
    let pattern = if strategy == Strategy::Regex {
        match RegexBuilder::new(&source).case_insensitive(true).build() {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                warning = Some(format!(
                    "rule {pos} ({source:?}): regex failed to compile, rule skipped: {err}"
                ));
                None
            }
        }
    } else {
        None
    };

    Some((
        Rule {
            source,
            strategy,
            target,
            expected_resolution: raw.expected_resolution,
            expected_aspect: raw.expected_aspect,
            similarity_threshold: raw.similarity_threshold,
            pattern,
        },
        warning,
    ))
}

fn push_error(errors: &mut Vec<FieldError>, field: &str, message: impl Into<String>) {
    errors.push(FieldError {
        field: field.to_string(),
        message: message.into(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_pack_gets_defaults() {
        let pack = parse_mapping_pack(r#"{"rules": [], "root_folders": []}"#)
            .expect("valid pack");
        assert!(pack.rules.is_empty());
        assert_eq!(pack.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(pack.aspect_tolerance, DEFAULT_ASPECT_TOLERANCE);
    }

    #[test]
    fn rule_strategies_parse_and_empty_means_exact() {
        let pack = parse_mapping_pack(
            r#"{
                "rules": [
                    {"source": "a.mov", "target": "b.mov"},
                    {"source": "a.mov", "strategy": "", "target": "b.mov"},
                    {"source": "v[0-9]+", "strategy": "regex", "target": "t"},
                    {"source": "clip final", "strategy": "token", "target": "t"},
                    {"source": "clipfinal", "strategy": "similarity", "target": "t",
                     "similarity_threshold": 0.8}
                ]
            }"#,
        )
        .expect("valid pack");
        let strategies: Vec<Strategy> = pack.rules.iter().map(|rule| rule.strategy).collect();
        assert_eq!(
            strategies,
            vec![
                Strategy::Exact,
                Strategy::Exact,
                Strategy::Regex,
                Strategy::Token,
                Strategy::Similarity,
            ]
        );
        assert!(pack.rules[2].pattern.is_some());
        assert_eq!(pack.threshold_for(&pack.rules[4]), 0.8);
        assert_eq!(pack.threshold_for(&pack.rules[0]), 0.9);
    }

    #[test]
    fn all_violations_are_enumerated_together() {
        let err = parse_mapping_pack(
            r#"{
                "similarity_threshold": 1.5,
                "rules": [
                    {"strategy": "fuzzy", "target": "t"},
                    {"source": "ok", "target": "t", "similarity_threshold": 0.0}
                ]
            }"#,
        )
        .expect_err("invalid pack");
        let PackError::Invalid { errors } = err else {
            panic!("expected validation errors, got {err:?}");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"similarity_threshold"));
        assert!(fields.contains(&"rules[0].source"));
        assert!(fields.contains(&"rules[0].strategy"));
        assert!(fields.contains(&"rules[1].similarity_threshold"));
    }

    #[test]
    fn bad_regex_disarms_the_rule_with_a_load_warning() {
        let pack = parse_mapping_pack(
            r#"{"rules": [{"source": "([unclosed", "strategy": "regex", "target": "t"}]}"#,
        )
        .expect("pack loads despite bad pattern");
        assert_eq!(pack.rules.len(), 1);
        assert!(pack.rules[0].pattern.is_none());
        assert_eq!(pack.load_warnings.len(), 1);
        assert!(pack.load_warnings[0].contains("[unclosed"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_mapping_pack("{not json").expect_err("parse failure");
        assert!(matches!(err, PackError::Parse { .. }));
    }
}
