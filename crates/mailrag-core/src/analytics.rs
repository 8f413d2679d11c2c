//! Inbox analytics over categorization responses.
//!
//! Aggregates `(email, categorization response)` pairs into category counts
//! and a top-senders table. Responses are parsed with
//! [`parse_categorization`]; anything that does not parse lands in the
//! [`UNCATEGORIZED`] bucket.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::Serialize;

use crate::categorize::{parse_categorization, UNCATEGORIZED};
use crate::models::EmailRecord;

/// How many senders [`InboxReport::top_senders`] keeps.
pub const TOP_SENDERS: usize = 10;

/// Extract the bare address from a `From` header value.
///
/// `"Ann <ann@x.com>"` yields `"ann@x.com"`; a value without angle brackets
/// is returned trimmed.
pub fn extract_sender_address(sender: &str) -> String {
    if let Some(start) = sender.find('<') {
        if let Some(len) = sender[start + 1..].find('>') {
            return sender[start + 1..start + 1 + len].trim().to_string();
        }
    }
    sender.trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderCount {
    pub address: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InboxReport {
    pub total: usize,
    /// Category label to email count, ordered by label.
    pub categories: BTreeMap<String, usize>,
    /// Most frequent senders, highest count first, ties by address.
    pub top_senders: Vec<SenderCount>,
}

impl InboxReport {
    pub fn from_categorized<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a EmailRecord, &'a str)>,
    {
        let mut report = InboxReport::default();
        let mut senders: HashMap<String, usize> = HashMap::new();

        for (email, response) in pairs {
            report.total += 1;
            let category = parse_categorization(response)
                .map(|c| c.category)
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            *report.categories.entry(category).or_insert(0) += 1;
            *senders.entry(extract_sender_address(&email.sender)).or_insert(0) += 1;
        }

        let mut top: Vec<SenderCount> = senders
            .into_iter()
            .map(|(address, count)| SenderCount { address, count })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.address.cmp(&b.address)));
        top.truncate(TOP_SENDERS);
        report.top_senders = top;

        report
    }

    /// Count for `category`, zero when absent.
    pub fn count(&self, category: &str) -> usize {
        self.categories.get(category).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(id: &str, sender: &str) -> EmailRecord {
        EmailRecord {
            id: id.into(),
            subject: String::new(),
            sender: sender.into(),
            date: String::new(),
            body: String::new(),
            thread_id: String::new(),
        }
    }

    #[test]
    fn test_extract_sender_address() {
        assert_eq!(extract_sender_address("Ann Lee <ann@x.com>"), "ann@x.com");
        assert_eq!(extract_sender_address("  bob@y.org "), "bob@y.org");
        assert_eq!(extract_sender_address("Broken <oops"), "Broken <oops");
    }

    #[test]
    fn test_counts_categories_and_uncategorized() {
        let emails = vec![
            email("1", "Boss <boss@corp.com>"),
            email("2", "boss@corp.com"),
            email("3", "Shop <deals@shop.com>"),
        ];
        let responses = [
            "Category: Work/Professional\nConfidence: 90%",
            "Category: Work/Professional\nConfidence: 80%",
            "I am not sure what this is.",
        ];
        let report =
            InboxReport::from_categorized(emails.iter().zip(responses.iter().copied()));
        assert_eq!(report.total, 3);
        assert_eq!(report.count("Work/Professional"), 2);
        assert_eq!(report.count(UNCATEGORIZED), 1);
        assert_eq!(report.count("Travel"), 0);
        assert_eq!(
            report.top_senders[0],
            SenderCount {
                address: "boss@corp.com".into(),
                count: 2
            }
        );
    }

    #[test]
    fn test_top_senders_truncated_and_tie_ordered() {
        let emails: Vec<EmailRecord> = (0..15)
            .map(|i| email(&i.to_string(), &format!("user{:02}@x.com", 14 - i)))
            .collect();
        let report = InboxReport::from_categorized(emails.iter().map(|e| (e, "Category: Other")));
        assert_eq!(report.top_senders.len(), TOP_SENDERS);
        assert_eq!(report.top_senders[0].address, "user00@x.com");
        assert_eq!(report.top_senders[9].address, "user09@x.com");
    }

    #[test]
    fn test_empty_input() {
        let none: Vec<(&EmailRecord, &str)> = Vec::new();
        let report = InboxReport::from_categorized(none);
        assert_eq!(report, InboxReport::default());
    }
}
