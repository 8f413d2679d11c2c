//! Email categories and the categorization response layout.
//!
//! Categorization responses use a pinned plain-text layout:
//!
//! ```text
//! Category: Work/Professional
//! Confidence: 90%
//! Explanation: business context
//! ```
//!
//! Consumers split on the literal labels, so label text and casing must not
//! change. A response without `Category:` is treated as uncategorized, never
//! as an error.

use serde::Serialize;

pub const CATEGORY_LABEL: &str = "Category:";
pub const CONFIDENCE_LABEL: &str = "Confidence:";
pub const EXPLANATION_LABEL: &str = "Explanation:";

/// Bucket name used by aggregators for responses that cannot be parsed.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// The fixed category set offered to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EmailCategory {
    WorkProfessional,
    Personal,
    JobsCareer,
    MarketingPromotional,
    NewsletterUpdates,
    SpamJunk,
    FinanceBanking,
    Travel,
    Education,
    Other,
}

impl EmailCategory {
    pub const ALL: [EmailCategory; 10] = [
        EmailCategory::WorkProfessional,
        EmailCategory::Personal,
        EmailCategory::JobsCareer,
        EmailCategory::MarketingPromotional,
        EmailCategory::NewsletterUpdates,
        EmailCategory::SpamJunk,
        EmailCategory::FinanceBanking,
        EmailCategory::Travel,
        EmailCategory::Education,
        EmailCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EmailCategory::WorkProfessional => "Work/Professional",
            EmailCategory::Personal => "Personal",
            EmailCategory::JobsCareer => "Jobs/Career",
            EmailCategory::MarketingPromotional => "Marketing/Promotional",
            EmailCategory::NewsletterUpdates => "Newsletter/Updates",
            EmailCategory::SpamJunk => "Spam/Junk",
            EmailCategory::FinanceBanking => "Finance/Banking",
            EmailCategory::Travel => "Travel",
            EmailCategory::Education => "Education",
            EmailCategory::Other => "Other",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }
}

/// A parsed categorization response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Categorization {
    /// Category text exactly as the model wrote it, trimmed.
    pub category: String,
    /// Confidence percentage, when present and numeric.
    pub confidence: Option<u8>,
    pub explanation: Option<String>,
}

impl Categorization {
    /// The category as a known [`EmailCategory`], if it is one.
    pub fn known_category(&self) -> Option<EmailCategory> {
        EmailCategory::from_label(&self.category)
    }

    /// Render in the pinned layout.
    pub fn render(&self) -> String {
        let mut out = format!("{} {}", CATEGORY_LABEL, self.category);
        if let Some(confidence) = self.confidence {
            out.push_str(&format!("\n{} {}%", CONFIDENCE_LABEL, confidence));
        }
        if let Some(explanation) = &self.explanation {
            out.push_str(&format!("\n{} {}", EXPLANATION_LABEL, explanation));
        }
        out
    }
}

/// Parse a categorization response.
///
/// Returns `None` when the `Category:` label is missing or followed by
/// nothing on its line.
pub fn parse_categorization(text: &str) -> Option<Categorization> {
    let category = label_value(text, CATEGORY_LABEL)?;
    if category.is_empty() {
        return None;
    }

    let confidence = label_value(text, CONFIDENCE_LABEL).and_then(|raw| {
        let digits: String = raw
            .trim_start_matches('[')
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse::<u8>().ok().filter(|c| *c <= 100)
    });

    let explanation = label_value(text, EXPLANATION_LABEL).filter(|e| !e.is_empty());

    Some(Categorization {
        category,
        confidence,
        explanation,
    })
}

/// Text between the first occurrence of `label` and the end of that line.
fn label_value(text: &str, label: &str) -> Option<String> {
    let (_, rest) = text.split_once(label)?;
    let line = rest.split('\n').next().unwrap_or_default();
    Some(line.trim().to_string())
}
