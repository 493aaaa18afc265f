//! Edit-distance fuzzy matching for unknown tool names (spec.md §4.7 step
//! 1, §8 boundary property 15: "if any registered tool is within edit
//! distance 3, its name appears in `data.hint`").

/// Classic Levenshtein distance (insert/delete/substitute, each cost 1).
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());

    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0usize; m + 1];

    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}

/// The closest registered name to `unknown` within `max_distance`, or
/// `None` if nothing is close enough.
pub fn closest_match<'a>(unknown: &str, candidates: impl Iterator<Item = &'a str>, max_distance: usize) -> Option<&'a str> {
    candidates
        .map(|name| (name, levenshtein(unknown, name)))
        .filter(|(_, distance)| *distance <= max_distance)
        .min_by_key(|(_, distance)| *distance)
        .map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_has_distance_zero() {
        assert_eq!(levenshtein("discovery.list_schemas", "discovery.list_schemas"), 0);
    }

    #[test]
    fn single_typo_is_distance_one() {
        assert_eq!(levenshtein("discovry.list_schemas", "discovery.list_schemas"), 1);
    }

    #[test]
    fn scenario_a_finds_the_intended_tool() {
        let candidates = vec!["discovery.list_schemas", "query.execute", "dashboard.create"];
        let found = closest_match("discovry.list_schemas", candidates.into_iter(), 3);
        assert_eq!(found, Some("discovery.list_schemas"));
    }

    #[test]
    fn nothing_within_distance_returns_none() {
        let candidates = vec!["discovery.list_schemas"];
        let found = closest_match("totally_unrelated_method_name", candidates.into_iter(), 3);
        assert_eq!(found, None);
    }
}
