//! Text normalization and edit-distance scoring.
//!
//! Every comparison in the resolver goes through `normalize` first, on both
//! the subject string and all rule/index keys. Normalization is lossy on
//! purpose (case, punctuation, separators all collapse) so that
//! `My-File_01.MOV` and `myfile01mov` compare equal.

/// Case-fold and keep only `[a-z0-9]` runs, joined by single spaces.
pub fn normalize(text: &str) -> String {
    tokenize(text).join(" ")
}

/// The `[a-z0-9]` runs of the case-folded input, unjoined.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        let folded = ch.to_ascii_lowercase();
        if folded.is_ascii_alphanumeric() {
            current.push(folded);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Unit-cost edit distance (insert, delete, substitute) between two strings.
///
/// Two-row rolling DP; rows run over the shorter string so extra space is
/// O(min(len(a), len(b))).
pub fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let long: Vec<char> = a.chars().collect();
    let short: Vec<char> = b.chars().collect();
    let (long, short) = if long.len() >= short.len() {
        (long, short)
    } else {
        (short, long)
    };
    if short.is_empty() {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr: Vec<usize> = vec![0; short.len() + 1];
    for (i, ca) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in short.iter().enumerate() {
            let insert = curr[j] + 1;
            let delete = prev[j + 1] + 1;
            let replace = prev[j] + usize::from(ca != cb);
            curr[j + 1] = insert.min(delete).min(replace);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}

/// `1 - distance / max(len)`, with `1.0` for two empty strings.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 && len_b == 0 {
        return 1.0;
    }
    let dist = levenshtein(a, b);
    1.0 - (dist as f64 / len_a.max(len_b) as f64)
}

/// The winning candidate from a linear similarity scan.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub candidate: String,
    pub score: f64,
    pub method: String,
}

/// Score `target` against every candidate and keep the best.
///
/// Ties keep the first-encountered candidate; the scan is linear because
/// candidate sets here are one project's asset list, not a global corpus.
pub fn best_match<I, S>(target: &str, candidates: I) -> Option<MatchResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let normalized_target = normalize(target);
    let mut best: Option<MatchResult> = None;
    for cand in candidates {
        let cand = cand.as_ref();
        let score = similarity_ratio(&normalized_target, &normalize(cand));
        let better = match &best {
            Some(current) => score > current.score,
            None => true,
        };
        if better {
            best = Some(MatchResult {
                candidate: cand.to_string(),
                score,
                method: "levenshtein".to_string(),
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_case_and_punctuation() {
        // Separator choice and case never affect the normalized form; only
        // token boundaries survive.
        assert_eq!(normalize("My-File_01.MOV"), normalize("my.file.01.mov"));
        assert_eq!(normalize("My-File_01.MOV"), "my file 01 mov");
        assert_eq!(normalize("Clip Final v2.mov"), "clip final v2 mov");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("---"), "");
    }

    #[test]
    fn tokenize_returns_unjoined_runs() {
        assert_eq!(tokenize("A_b-1"), vec!["a", "b", "1"]);
        assert!(tokenize("!!").is_empty());
    }

    #[test]
    fn levenshtein_basic_distances() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
    }

    #[test]
    fn levenshtein_bounded_below_by_length_difference() {
        let cases = [("abcd", "a"), ("x", "xyzzy"), ("clip", "clip final")];
        for (a, b) in cases {
            let diff = a.len().abs_diff(b.len());
            assert!(levenshtein(a, b) >= diff, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn similarity_ratio_identity_and_symmetry() {
        for s in ["", "a", "clip_final", "Grüße"] {
            assert_eq!(similarity_ratio(s, s), 1.0);
        }
        let pairs = [("abc", "abd"), ("", "xyz"), ("clipfinal", "clipfinall")];
        for (a, b) in pairs {
            assert_eq!(similarity_ratio(a, b), similarity_ratio(b, a));
        }
    }

    #[test]
    fn best_match_prefers_highest_score_and_first_tie() {
        let result = best_match("clipfinall", ["intro", "clipfinal", "outro"])
            .expect("non-empty candidates");
        assert_eq!(result.candidate, "clipfinal");
        assert!(result.score >= 0.9);
        assert_eq!(result.method, "levenshtein");

        // Equal-scoring candidates keep the one seen first.
        let tie = best_match("ab", ["ax", "ay"]).expect("non-empty candidates");
        assert_eq!(tie.candidate, "ax");
    }

    #[test]
    fn best_match_empty_candidates_is_none() {
        assert!(best_match("anything", Vec::<String>::new()).is_none());
    }
}
