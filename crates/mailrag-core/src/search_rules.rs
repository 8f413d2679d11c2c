//! Keyword rules mapping natural-language requests to Gmail search syntax.
//!
//! Rules are checked in order; the first rule with any keyword contained
//! (case-insensitively) in the request wins.

/// One keyword-set to query-template rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRule {
    pub keywords: &'static [&'static str],
    pub query: &'static str,
}

impl SearchRule {
    pub fn matches(&self, natural: &str) -> bool {
        let lowered = natural.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

pub const SEARCH_RULES: &[SearchRule] = &[
    SearchRule {
        keywords: &["jobs", "career"],
        query: "from:(linkedin.com OR indeed.com OR glassdoor.com) OR subject:(job OR career OR opportunity OR hiring)",
    },
    SearchRule {
        keywords: &["meeting"],
        query: "subject:(meeting OR call OR zoom OR teams)",
    },
    SearchRule {
        keywords: &["urgent"],
        query: "subject:(urgent OR important OR ASAP)",
    },
    SearchRule {
        keywords: &["newsletter"],
        query: "subject:(newsletter OR update OR digest)",
    },
];

/// Query template of the first matching rule, if any.
pub fn rule_based_query(natural: &str) -> Option<&'static str> {
    SEARCH_RULES
        .iter()
        .find(|rule| rule.matches(natural))
        .map(|rule| rule.query)
}

/// Like [`rule_based_query`] but falls back to the trimmed input.
pub fn resolve_search_query(natural: &str) -> String {
    rule_based_query(natural)
        .map(str::to_string)
        .unwrap_or_else(|| natural.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_rule_matches_its_keyword() {
        assert_eq!(rule_based_query("show me JOBS"), Some(SEARCH_RULES[0].query));
        assert_eq!(rule_based_query("career stuff"), Some(SEARCH_RULES[0].query));
        assert_eq!(rule_based_query("next meeting"), Some(SEARCH_RULES[1].query));
        assert_eq!(rule_based_query("Urgent things"), Some(SEARCH_RULES[2].query));
        assert_eq!(rule_based_query("my newsletter"), Some(SEARCH_RULES[3].query));
    }

    #[test]
    fn test_first_rule_wins() {
        assert_eq!(
            rule_based_query("urgent meeting about jobs"),
            Some(SEARCH_RULES[0].query)
        );
        assert_eq!(rule_based_query("urgent meeting"), Some(SEARCH_RULES[1].query));
    }

    #[test]
    fn test_fallback_is_input() {
        assert_eq!(rule_based_query("from my mom"), None);
        assert_eq!(resolve_search_query("  from my mom "), "from my mom");
        assert_eq!(
            resolve_search_query("meeting notes"),
            "subject:(meeting OR call OR zoom OR teams)"
        );
    }
}
