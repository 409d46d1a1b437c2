//! Identity matcher - fuzzy serial comparison
//!
//! Compares a target serial with an OCR candidate position by position. Only
//! pairs listed in [`AMBIGUOUS_GROUPS`] may differ, each costing half a point;
//! the total may not exceed one point. Any other differing pair fails at once.
//!
//! 注意：这不是编辑距离，不能放宽。

/// OCR-confusable characters. Characters in the same group are interchangeable.
pub const AMBIGUOUS_GROUPS: &[&[char]] = &[
    &['0', 'O', 'Q', 'D'],
    &['8', 'B'],
    &['Z', '2'],
    &['1', 'I', 'L'],
    &['5', 'S'],
];

/// Fuzzy budget in half-units (cost 1.0)
const FUZZY_BUDGET_HALVES: u32 = 2;

/// Maximum tolerated length difference (one dropped character)
const MAX_LENGTH_DIFF: usize = 1;

/// Uppercase and keep ASCII alphanumerics only
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Whether two (normalized) characters are a listed ambiguous pair
pub fn is_ambiguous_pair(a: char, b: char) -> bool {
    AMBIGUOUS_GROUPS
        .iter()
        .any(|group| group.contains(&a) && group.contains(&b))
}

/// One tolerated substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substitution {
    /// 0-based position in the normalized strings
    pub position: usize,
    pub expected: char,
    pub found: char,
}

/// Comparison verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Exact,
    Fuzzy {
        substitutions: Vec<Substitution>,
    },
    LengthMismatch {
        expected: usize,
        found: usize,
    },
    HardMismatch {
        position: usize,
        expected: char,
        found: char,
    },
    TooManyFuzzy {
        substitutions: Vec<Substitution>,
    },
}

/// Result of [`compare`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub outcome: MatchOutcome,
    /// Positions examined before the verdict (used to rank failures)
    pub compared: usize,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(
            self.outcome,
            MatchOutcome::Exact | MatchOutcome::Fuzzy { .. }
        )
    }

    pub fn is_length_mismatch(&self) -> bool {
        matches!(self.outcome, MatchOutcome::LengthMismatch { .. })
    }

    /// Accumulated fuzzy cost (0.5 per substitution)
    pub fn fuzzy_cost(&self) -> f64 {
        let halves = match &self.outcome {
            MatchOutcome::Fuzzy { substitutions } | MatchOutcome::TooManyFuzzy { substitutions } => {
                substitutions.len()
            }
            _ => 0,
        };
        halves as f64 * 0.5
    }

    /// Human-readable reason, precise enough to retake the photo
    pub fn reason(&self) -> String {
        match &self.outcome {
            MatchOutcome::Exact => "exact match".to_string(),
            MatchOutcome::Fuzzy { substitutions } => format!(
                "fuzzy match ({})",
                describe_substitutions(substitutions)
            ),
            MatchOutcome::LengthMismatch { expected, found } => format!(
                "length mismatch: expected {} characters, found {}",
                expected, found
            ),
            MatchOutcome::HardMismatch {
                position,
                expected,
                found,
            } => format!(
                "character {} mismatch: expected '{}', found '{}'",
                position + 1,
                expected,
                found
            ),
            MatchOutcome::TooManyFuzzy { substitutions } => format!(
                "too many ambiguous characters ({}; at most {} allowed)",
                describe_substitutions(substitutions),
                FUZZY_BUDGET_HALVES
            ),
        }
    }
}

fn describe_substitutions(substitutions: &[Substitution]) -> String {
    substitutions
        .iter()
        .map(|s| format!("{}→{} at {}", s.expected, s.found, s.position + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compare `target` with `candidate`
pub fn compare(target: &str, candidate: &str) -> MatchResult {
    let target: Vec<char> = normalize(target).chars().collect();
    let candidate: Vec<char> = normalize(candidate).chars().collect();

    let length_mismatch = MatchResult {
        outcome: MatchOutcome::LengthMismatch {
            expected: target.len(),
            found: candidate.len(),
        },
        compared: 0,
    };

    if target.len().abs_diff(candidate.len()) > MAX_LENGTH_DIFF {
        return length_mismatch;
    }
    // 一边为空时没有可比较的字符
    if target.is_empty() != candidate.is_empty() {
        return length_mismatch;
    }

    let mut substitutions = Vec::new();
    for (position, (&expected, &found)) in target.iter().zip(candidate.iter()).enumerate() {
        if expected == found {
            continue;
        }
        if !is_ambiguous_pair(expected, found) {
            return MatchResult {
                outcome: MatchOutcome::HardMismatch {
                    position,
                    expected,
                    found,
                },
                compared: position + 1,
            };
        }
        substitutions.push(Substitution {
            position,
            expected,
            found,
        });
        if substitutions.len() as u32 > FUZZY_BUDGET_HALVES {
            return MatchResult {
                outcome: MatchOutcome::TooManyFuzzy { substitutions },
                compared: position + 1,
            };
        }
    }

    let compared = target.len().min(candidate.len());
    let outcome = if substitutions.is_empty() {
        MatchOutcome::Exact
    } else {
        MatchOutcome::Fuzzy { substitutions }
    };
    MatchResult { outcome, compared }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflexive() {
        for s in ["0812345", "AB-12:34", "x", "", "OIZ3", "serial 99"] {
            let result = compare(s, s);
            assert!(result.is_match(), "{s} should match itself");
            assert_eq!(result.outcome, MatchOutcome::Exact);
            assert_eq!(result.fuzzy_cost(), 0.0);
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(" ab-12:c d "), "AB12CD");
        assert_eq!(normalize("序列号SN01"), "SN01");
    }

    #[test]
    fn test_two_fuzzy_is_boundary_pass() {
        let result = compare("0123", "OI23");
        assert!(result.is_match());
        assert_eq!(result.fuzzy_cost(), 1.0);
        assert!(result.reason().starts_with("fuzzy match"));
    }

    #[test]
    fn test_three_fuzzy_fails() {
        let result = compare("0123", "OIZ3");
        assert!(!result.is_match());
        assert_eq!(result.fuzzy_cost(), 1.5);
        assert!(matches!(result.outcome, MatchOutcome::TooManyFuzzy { .. }));
        assert_eq!(result.compared, 3);
    }

    #[test]
    fn test_unlisted_pair_fails_anywhere() {
        let first = compare("712", "212");
        assert_eq!(
            first.outcome,
            MatchOutcome::HardMismatch {
                position: 0,
                expected: '7',
                found: '2'
            }
        );
        assert_eq!(first.reason(), "character 1 mismatch: expected '7', found '2'");

        assert!(!compare("127", "122").is_match());
        assert!(!compare("A7B", "A2B").is_match());
    }

    #[test]
    fn test_length_difference_of_two_always_fails() {
        assert!(compare("0812345", "08123").is_length_mismatch());
        assert!(compare("08123", "0812345").is_length_mismatch());
        assert!(compare("AAAAAAA", "AAAAAAAAA").is_length_mismatch());
    }

    #[test]
    fn test_one_dropped_character_tolerated() {
        let result = compare("0812345", "081234");
        assert!(result.is_match());
        assert_eq!(result.compared, 6);
    }

    #[test]
    fn test_case_and_separators_ignored() {
        assert_eq!(compare("ab-1234", "AB 1234").outcome, MatchOutcome::Exact);
    }

    #[test]
    fn test_groups_are_symmetric() {
        for group in AMBIGUOUS_GROUPS {
            for &a in group.iter() {
                for &b in group.iter() {
                    assert!(is_ambiguous_pair(a, b));
                    assert!(is_ambiguous_pair(b, a));
                }
            }
        }
        assert!(!is_ambiguous_pair('0', '8'));
        assert!(!is_ambiguous_pair('7', '1'));
    }

    #[test]
    fn test_empty_against_nonempty_fails() {
        assert!(compare("", "A").is_length_mismatch());
        assert!(compare("A", "").is_length_mismatch());
    }

    #[test]
    fn test_fuzzy_example_from_field() {
        let result = compare("0812345", "O812345");
        assert!(result.is_match());
        assert_eq!(result.fuzzy_cost(), 0.5);
    }
}
