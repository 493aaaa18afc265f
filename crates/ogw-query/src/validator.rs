//! Structural validation of the NRQL-like domain query language (spec.md
//! §4.5). Hand-rolled token-scan validator — no parser-combinator crate is
//! in the teacher's dependency stack, and the grammar is small enough that
//! one isn't warranted (spec.md §4.5 supplement).

use crate::token::{tokenize, Token};

/// A structural validation failure, pointing at the first offending token
/// by byte offset (spec.md §4.5: "a hint pointing at the first offending
/// token"; Scenario B: `data.details.offset` pointing at `FORM`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub message: String,
    pub offset: usize,
    pub token: String,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at offset {}: {:?})", self.message, self.offset, self.token)
    }
}

/// An accepted query in canonical form (whitespace-normalised, keywords
/// upper-cased) plus the pieces downstream tools care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    pub canonical: String,
    pub has_since: bool,
}

const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "SINCE", "UNTIL", "FACET", "LIMIT", "ORDER", "BY", "AND", "OR", "AS",
];

const MUTATION_KEYWORDS: &[&str] = &["DELETE", "INSERT", "UPDATE", "DROP", "ALTER", "CREATE"];

/// Validates `query` per spec.md §4.5:
/// - balanced quotes and parentheses,
/// - no statement terminator (`;`) followed by another keyword (injection guard),
/// - no disallowed mutation keywords when `mutations_allowed` is false,
/// - a `FROM` (source) clause is present,
/// - a bounded `SINCE` time window no larger than `max_window_days`, unless
///   `allow_unbounded_window` opts a tool out of the cap.
pub fn validate(query: &str, mutations_allowed: bool, max_window_days: i64, allow_unbounded_window: bool) -> Result<ValidatedQuery, ValidationFailure> {
    check_balance(query)?;

    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Err(ValidationFailure { message: "query is empty".into(), offset: 0, token: String::new() });
    }

    check_injection(&tokens)?;
    check_mutations(&tokens, mutations_allowed)?;
    let from_index = check_source_clause(&tokens)?;
    let has_since = check_time_window(&tokens, from_index, max_window_days, allow_unbounded_window)?;

    Ok(ValidatedQuery { canonical: canonicalize(&tokens), has_since })
}

fn check_balance(query: &str) -> Result<(), ValidationFailure> {
    let mut paren_depth = 0i32;
    let mut quote: Option<char> = None;
    let mut paren_offset = 0usize;

    for (offset, ch) in query.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' => {
                if paren_depth == 0 {
                    paren_offset = offset;
                }
                paren_depth += 1;
            }
            ')' => {
                paren_depth -= 1;
                if paren_depth < 0 {
                    return Err(ValidationFailure {
                        message: "unbalanced parentheses: unexpected ')'".into(),
                        offset,
                        token: ")".into(),
                    });
                }
            }
            _ => {}
        }
    }

    if quote.is_some() {
        return Err(ValidationFailure { message: "unbalanced quotes".into(), offset: 0, token: query.to_string() });
    }
    if paren_depth > 0 {
        return Err(ValidationFailure {
            message: "unbalanced parentheses: missing ')'".into(),
            offset: paren_offset,
            token: "(".into(),
        });
    }
    Ok(())
}

/// Rejects `;` followed by another keyword — the classic "stack a second
/// statement after the terminator" injection shape (spec.md §4.5).
fn check_injection(tokens: &[Token]) -> Result<(), ValidationFailure> {
    for (i, tok) in tokens.iter().enumerate() {
        if tok.text.contains(';') {
            if let Some(next) = tokens.get(i + 1) {
                if is_keyword(&next.text) {
                    return Err(ValidationFailure {
                        message: "statement terminator followed by another clause is not allowed".into(),
                        offset: tok.offset,
                        token: tok.text.clone(),
                    });
                }
            }
            return Err(ValidationFailure {
                message: "statement terminators are not allowed in a single query".into(),
                offset: tok.offset,
                token: tok.text.clone(),
            });
        }
    }
    Ok(())
}

fn check_mutations(tokens: &[Token], mutations_allowed: bool) -> Result<(), ValidationFailure> {
    if mutations_allowed {
        return Ok(());
    }
    for tok in tokens {
        if MUTATION_KEYWORDS.iter().any(|k| tok.eq_ignore_case(k)) {
            return Err(ValidationFailure {
                message: format!("mutation keyword \"{}\" is not permitted by policy", tok.text),
                offset: tok.offset,
                token: tok.text.clone(),
            });
        }
    }
    Ok(())
}

/// Returns the token index immediately after `FROM` on success.
fn check_source_clause(tokens: &[Token]) -> Result<usize, ValidationFailure> {
    for (i, tok) in tokens.iter().enumerate() {
        if tok.eq_ignore_case("FROM") {
            if tokens.get(i + 1).is_none() {
                return Err(ValidationFailure {
                    message: "FROM clause has no source schema".into(),
                    offset: tok.offset,
                    token: tok.text.clone(),
                });
            }
            return Ok(i + 1);
        }
    }
    let first = &tokens[0];
    Err(ValidationFailure {
        message: "query has no FROM (source) clause".into(),
        offset: first.offset,
        token: first.text.clone(),
    })
}

/// Enforces a bounded time window: a `SINCE` clause must be present unless
/// the caller opted into unbounded windows, and when a relative duration
/// like "30 days" is given it must not exceed `max_window_days` (spec.md
/// §4.5: "reject unbounded time windows unless the tool descriptor opts
/// in"). Returns whether a SINCE clause was present.
fn check_time_window(
    tokens: &[Token],
    from_index: usize,
    max_window_days: i64,
    allow_unbounded_window: bool,
) -> Result<bool, ValidationFailure> {
    let since_index = tokens.iter().position(|t| t.eq_ignore_case("SINCE"));

    let Some(since_index) = since_index else {
        if allow_unbounded_window {
            return Ok(false);
        }
        let anchor = &tokens[from_index.min(tokens.len() - 1)];
        return Err(ValidationFailure {
            message: format!(
                "query has no bounded SINCE clause (max window {max_window_days} days); add one or opt the tool into unbounded windows"
            ),
            offset: anchor.offset,
            token: anchor.text.clone(),
        });
    };

    if let Some(days) = relative_days(tokens, since_index) {
        if days > max_window_days {
            let tok = &tokens[since_index];
            return Err(ValidationFailure {
                message: format!("SINCE window of {days} days exceeds the maximum of {max_window_days} days"),
                offset: tok.offset,
                token: tok.text.clone(),
            });
        }
    }

    Ok(true)
}

/// Parses `SINCE <n> DAYS|HOURS|MINUTES AGO`-style relative windows into a
/// day count; returns `None` for absolute timestamps, which are accepted
/// without a magnitude check (the Backend itself bounds absolute ranges).
fn relative_days(tokens: &[Token], since_index: usize) -> Option<i64> {
    let amount: i64 = tokens.get(since_index + 1)?.text.parse().ok()?;
    let unit = tokens.get(since_index + 2)?.text.to_ascii_uppercase();
    let days = match unit.trim_end_matches('S') {
        "DAY" => amount,
        "HOUR" => (amount + 23) / 24,
        "MINUTE" => (amount + 1439) / 1440,
        "WEEK" => amount * 7,
        _ => return None,
    };
    Some(days)
}

fn is_keyword(text: &str) -> bool {
    KEYWORDS.iter().any(|k| text.eq_ignore_ascii_case(k)) || MUTATION_KEYWORDS.iter().any(|k| text.eq_ignore_ascii_case(k))
}

/// Canonical form: keywords upper-cased, everything else left as-is,
/// single-space joined (spec.md §4.5 "accepted canonical form").
fn canonicalize(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| if is_keyword(&t.text) { t.text.to_ascii_uppercase() } else { t.text.clone() })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_query() {
        let result = validate("SELECT count(*) FROM Transaction SINCE 1 day ago", false, 30, false);
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn scenario_b_rejects_form_typo_and_points_at_it() {
        // Scenario B: `data.details.offset` pointing at `FORM`.
        let err = validate("SELECT * FORM Transaction", false, 30, false).unwrap_err();
        assert_eq!(err.token, "FORM");
        assert_eq!(&"SELECT * FORM Transaction"[err.offset..err.offset + 4], "FORM");
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        let err = validate("SELECT count( FROM Transaction SINCE 1 day ago", false, 30, false).unwrap_err();
        assert!(err.message.contains("parentheses"));
    }

    #[test]
    fn rejects_unbalanced_quotes() {
        let err = validate("SELECT * FROM Transaction WHERE name = 'oops", false, 30, false).unwrap_err();
        assert!(err.message.contains("quotes"));
    }

    #[test]
    fn rejects_statement_stacking() {
        let err = validate(
            "SELECT * FROM Transaction; DELETE FROM Transaction",
            true,
            30,
            false,
        )
        .unwrap_err();
        assert!(err.message.contains("terminator"));
    }

    #[test]
    fn rejects_mutation_keyword_when_forbidden() {
        let err = validate("DELETE FROM Transaction SINCE 1 day ago", false, 30, true).unwrap_err();
        assert!(err.message.contains("mutation"));
    }

    #[test]
    fn allows_mutation_keyword_when_policy_permits() {
        let result = validate("DELETE FROM Transaction SINCE 1 day ago", true, 30, false);
        assert!(result.is_ok());
    }

    #[test]
    fn requires_a_from_clause() {
        let err = validate("SELECT count(*) SINCE 1 day ago", false, 30, false).unwrap_err();
        assert!(err.message.contains("FROM"));
    }

    #[test]
    fn rejects_unbounded_window_by_default() {
        let err = validate("SELECT * FROM Transaction", false, 30, false).unwrap_err();
        assert!(err.message.contains("SINCE"));
    }

    #[test]
    fn allows_unbounded_window_when_opted_in() {
        let result = validate("SELECT * FROM Transaction", false, 30, true);
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_window_beyond_the_configured_maximum() {
        let err = validate("SELECT * FROM Transaction SINCE 90 days ago", false, 30, false).unwrap_err();
        assert!(err.message.contains("exceeds"));
    }

    #[test]
    fn canonical_form_upper_cases_keywords() {
        let result = validate("select * from Transaction since 1 day ago", false, 30, false).unwrap();
        assert!(result.canonical.starts_with("SELECT * FROM Transaction SINCE"));
    }
}
