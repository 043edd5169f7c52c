//! The resolution algorithm: rules first, index second, fuzzy last.

use crate::index::NameIndex;
use crate::pack::{MappingPack, Rule, Strategy};
use crate::similarity::{best_match, normalize, similarity_ratio, tokenize};
use std::collections::BTreeSet;

/// Which path produced a target.
#[derive(Debug, Clone)]
pub enum ResolvedVia<'a> {
    /// A pack rule matched; rules encode explicit human intent and always
    /// take precedence over the index fallback.
    Rule(&'a Rule),
    /// Direct normalized-name hit in the filesystem index.
    Index,
    /// Best fuzzy candidate from the index, at or above the pack threshold.
    Fuzzy { score: f64 },
}

/// Resolve one asset name to a replacement target.
///
/// Evaluation order is load-bearing: pack rules in declaration order (first
/// match wins), then a direct index lookup, then the fuzzy fallback. "No
/// match" is a normal outcome, not an error.
pub fn resolve<'a>(
    name: &str,
    pack: &'a MappingPack,
    index: &NameIndex,
) -> Option<(String, ResolvedVia<'a>)> {
    let normalized = normalize(name);

    for rule in &pack.rules {
        if rule_matches(rule, name, &normalized, pack) {
            return Some((rule.target.clone(), ResolvedVia::Rule(rule)));
        }
    }

    if let Some(path) = index.get(&normalized) {
        return Some((path.display().to_string(), ResolvedVia::Index));
    }

    let best = best_match(name, index.keys())?;
    if best.score >= pack.similarity_threshold {
        let path = index.get(&best.candidate)?;
        return Some((
            path.display().to_string(),
            ResolvedVia::Fuzzy { score: best.score },
        ));
    }
    None
}

fn rule_matches(rule: &Rule, name: &str, normalized_name: &str, pack: &MappingPack) -> bool {
    match rule.strategy {
        Strategy::Exact => {
            let source = normalize(&rule.source);
            !source.is_empty() && source == normalized_name
        }
        // Disarmed regex rules (pattern failed to compile at load) never
        // match; the run reports them separately.
        Strategy::Regex => match &rule.pattern {
            Some(pattern) => pattern.is_match(name),
            None => false,
        },
        Strategy::Token => {
            let source_tokens: BTreeSet<String> = tokenize(&rule.source).into_iter().collect();
            if source_tokens.is_empty() {
                return false;
            }
            let name_tokens: BTreeSet<String> = tokenize(normalized_name).into_iter().collect();
            source_tokens.is_subset(&name_tokens)
        }
        Strategy::Similarity => {
            let score = similarity_ratio(&normalize(&rule.source), normalized_name);
            score >= pack.threshold_for(rule)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use crate::pack::parse_mapping_pack;
    use std::fs;

    fn pack_from(json: &str) -> MappingPack {
        parse_mapping_pack(json).expect("valid test pack")
    }

    fn empty_index() -> NameIndex {
        build_index::<&std::path::Path>(&[])
    }

    #[test]
    fn earlier_rule_wins_over_later_matching_rule() {
        let pack = pack_from(
            r#"{
                "rules": [
                    {"source": "a.mov", "strategy": "exact", "target": "b.mov"},
                    {"source": "a.mov", "strategy": "similarity", "target": "wrong.mov"}
                ]
            }"#,
        );
        let (target, via) =
            resolve("a.mov", &pack, &empty_index()).expect("exact rule matches");
        assert_eq!(target, "b.mov");
        assert!(matches!(via, ResolvedVia::Rule(rule) if rule.target == "b.mov"));
    }

    #[test]
    fn regex_rule_searches_the_original_name_case_insensitively() {
        let pack = pack_from(
            r#"{"rules": [{"source": "_V[0-9]+", "strategy": "regex", "target": "latest.mov"}]}"#,
        );
        let (target, _) =
            resolve("Promo_v12_final.mov", &pack, &empty_index()).expect("regex matches");
        assert_eq!(target, "latest.mov");
        assert!(resolve("Promo_final.mov", &pack, &empty_index()).is_none());
    }

    #[test]
    fn token_rule_requires_source_tokens_as_a_subset() {
        let pack = pack_from(
            r#"{"rules": [{"source": "clip final", "strategy": "token", "target": "t.mov"}]}"#,
        );
        assert!(resolve("My_Clip_FINAL_v2.mov", &pack, &empty_index()).is_some());
        assert!(resolve("My_Clip_v2.mov", &pack, &empty_index()).is_none());
    }

    #[test]
    fn similarity_rule_uses_override_then_pack_threshold() {
        let pack = pack_from(
            r#"{
                "similarity_threshold": 0.99,
                "rules": [{"source": "clipfinal", "strategy": "similarity",
                           "target": "t.mov", "similarity_threshold": 0.8}]
            }"#,
        );
        assert!(resolve("clipfinall", &pack, &empty_index()).is_some());

        let strict = pack_from(
            r#"{
                "similarity_threshold": 0.99,
                "rules": [{"source": "clipfinal", "strategy": "similarity", "target": "t.mov"}]
            }"#,
        );
        assert!(resolve("clipfinall", &strict, &empty_index()).is_none());
    }

    #[test]
    fn index_fallback_matches_normalized_names() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join("clip_final.mov"), b"x").expect("write fixture");
        let index = build_index(&[dir.path()]);
        let pack = pack_from(r#"{"rules": []}"#);

        let (target, via) =
            resolve("Clip_Final.mov", &pack, &index).expect("index fallback hits");
        assert!(target.ends_with("clip_final.mov"));
        assert!(matches!(via, ResolvedVia::Index));
    }

    #[test]
    fn fuzzy_fallback_respects_the_pack_threshold() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join("clipfinal"), b"x").expect("write fixture");
        let index = build_index(&[dir.path()]);

        let permissive = pack_from(r#"{"rules": [], "similarity_threshold": 0.9}"#);
        let (target, via) =
            resolve("clipfinall", &permissive, &index).expect("fuzzy fallback hits");
        assert!(target.ends_with("clipfinal"));
        assert!(matches!(via, ResolvedVia::Fuzzy { score } if score >= 0.9));

        let strict = pack_from(r#"{"rules": [], "similarity_threshold": 0.95}"#);
        assert!(resolve("clipfinall", &strict, &index).is_none());
    }

    #[test]
    fn no_rules_no_index_is_no_target() {
        let pack = pack_from(r#"{"rules": []}"#);
        assert!(resolve("anything.mov", &pack, &empty_index()).is_none());
    }
}
