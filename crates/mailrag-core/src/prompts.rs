//! Fixed prompt templates, one per task.
//!
//! Every function is pure: it fills a scaffold with assembled context or a
//! single email and returns the final prompt string.

use std::fmt;
use std::str::FromStr;

use crate::categorize::EmailCategory;
use crate::models::EmailRecord;

/// Tone requested for a generated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReplyTone {
    #[default]
    Professional,
    Friendly,
    Formal,
    Casual,
    Enthusiastic,
    Apologetic,
    Urgent,
}

impl ReplyTone {
    pub const ALL: [ReplyTone; 7] = [
        ReplyTone::Professional,
        ReplyTone::Friendly,
        ReplyTone::Formal,
        ReplyTone::Casual,
        ReplyTone::Enthusiastic,
        ReplyTone::Apologetic,
        ReplyTone::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyTone::Professional => "professional",
            ReplyTone::Friendly => "friendly",
            ReplyTone::Formal => "formal",
            ReplyTone::Casual => "casual",
            ReplyTone::Enthusiastic => "enthusiastic",
            ReplyTone::Apologetic => "apologetic",
            ReplyTone::Urgent => "urgent",
        }
    }
}

impl fmt::Display for ReplyTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplyTone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ReplyTone::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = ReplyTone::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown reply tone '{}'; expected one of: {}", s, names.join(", "))
            })
    }
}

pub fn answer_question(context: &str, question: &str) -> String {
    format!(
        "You are an AI assistant that helps users understand their emails. \
You have access to the following email context:

{context}

User Question: {question}

Please provide a comprehensive answer based on the email context above. Your response should:

1. Directly address the user's question
2. Reference specific emails when relevant
3. Provide actionable insights when possible
4. Be clear and concise
5. If the question cannot be answered with the provided context, say so clearly

Answer:"
    )
}

pub fn suggest_questions(context: &str, count: usize) -> String {
    format!(
        "Based on these emails:

{context}

Generate {count} relevant questions that a user might want to ask about these emails.
Focus on practical, actionable questions that would help someone understand and manage their emails better.

Format as a simple list, one question per line:"
    )
}

pub fn analyze_patterns(context: &str) -> String {
    format!(
        "Analyze the following emails and provide insights about:

1. Common themes or topics
2. Sender patterns and relationships
3. Urgency levels and priorities
4. Action items and deadlines
5. Communication patterns and tone

Email Context:
{context}

Please provide a structured analysis with clear sections."
    )
}

pub fn summarize(email: &EmailRecord) -> String {
    format!(
        "Please provide a concise summary of this email:

Subject: {}
From: {}
Date: {}

Content: {}

Summary should include:
1. Main topic/purpose
2. Key points
3. Action items (if any)
4. Urgency level (Low/Medium/High)

Please format the summary clearly and concisely.",
        email.subject, email.sender, email.date, email.body
    )
}

pub fn reply(email: &EmailRecord, tone: ReplyTone) -> String {
    format!(
        "Generate a {tone} reply to this email:

Original Email:
Subject: {}
From: {}
Date: {}
Content: {}

Please write a thoughtful and appropriate response that:
1. Acknowledges the sender's message
2. Addresses their main points
3. Provides a clear response
4. Maintains a {tone} tone
5. Is concise but complete

Do not include subject line or sender information in the response, just the email body.",
        email.subject, email.sender, email.date, email.body
    )
}

/// Categorization prompt. The body is cut to `body_chars` characters.
///
/// The requested answer layout is parsed by
/// [`parse_categorization`](crate::categorize::parse_categorization); keep
/// the two in step.
pub fn categorize(email: &EmailRecord, body_chars: usize) -> String {
    let categories: Vec<String> = EmailCategory::ALL
        .iter()
        .map(|c| format!("- {}", c.label()))
        .collect();
    let body: String = email.body.chars().take(body_chars).collect();

    format!(
        "Categorize this email into one of these categories:
{}

Also provide a confidence score (0-100) for your categorization and a brief explanation.

Email Content:
Subject: {}
From: {}
Content: {}...

Format your response as:
Category: [category]
Confidence: [score]%
Explanation: [brief explanation]",
        categories.join("\n"),
        email.subject,
        email.sender,
        body
    )
}

pub fn action_items(email: &EmailRecord) -> String {
    format!(
        "Extract action items from this email. For each action item, provide:
1. What needs to be done
2. Who is responsible (if mentioned)
3. Deadline (if mentioned)
4. Priority level (High/Medium/Low)

Email Content:
Subject: {}
From: {}
Content: {}

If no action items are found, respond with \"No action items found.\"

Format each action item clearly with bullet points.",
        email.subject, email.sender, email.body
    )
}

pub fn sentiment(email: &EmailRecord) -> String {
    format!(
        "Analyze the sentiment and tone of this email:

Subject: {}
From: {}
Content: {}

Provide:
1. Overall sentiment (Positive/Negative/Neutral)
2. Tone (Formal/Informal/Friendly/Urgent/etc.)
3. Confidence level (0-100%)
4. Key emotional indicators

Format your response clearly.",
        email.subject, email.sender, email.body
    )
}

pub fn search_query(natural_query: &str) -> String {
    format!(
        "Convert this natural language query to a Gmail search query:

Natural Query: {natural_query}

Convert it to Gmail's search syntax. Common patterns:
- Jobs/Career: from:(linkedin.com OR indeed.com OR glassdoor.com) OR subject:(job OR career OR opportunity OR hiring)
- Meetings: subject:(meeting OR call OR zoom OR teams)
- Urgent: subject:(urgent OR important OR ASAP)
- Newsletters: subject:(newsletter OR update OR digest)

Return only the Gmail search query, nothing else."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> EmailRecord {
        EmailRecord {
            id: "1".into(),
            subject: "Quarterly report".into(),
            sender: "Boss <boss@corp.com>".into(),
            date: "Thu, 4 Jan 2024".into(),
            body: "é".repeat(600),
            thread_id: "t1".into(),
        }
    }

    #[test]
    fn test_tone_round_trips_through_str() {
        for tone in ReplyTone::ALL {
            assert_eq!(tone.as_str().parse::<ReplyTone>().unwrap(), tone);
        }
        assert_eq!(" Friendly ".parse::<ReplyTone>().unwrap(), ReplyTone::Friendly);
        assert!("sarcastic".parse::<ReplyTone>().is_err());
    }

    #[test]
    fn test_answer_prompt_embeds_context_and_question() {
        let p = answer_question("CTX", "who wrote?");
        assert!(p.contains("CTX"));
        assert!(p.contains("User Question: who wrote?"));
        assert!(p.contains("say so clearly"));
    }

    #[test]
    fn test_reply_prompt_mentions_tone_twice() {
        let p = reply(&email(), ReplyTone::Apologetic);
        assert_eq!(p.matches("apologetic").count(), 2);
    }

    #[test]
    fn test_categorize_truncates_by_chars() {
        let p = categorize(&email(), 500);
        assert!(p.contains(&format!("Content: {}...", "é".repeat(500))));
        assert!(!p.contains(&"é".repeat(501)));
    }

    #[test]
    fn test_categorize_lists_every_category_and_layout() {
        let p = categorize(&email(), 500);
        for c in EmailCategory::ALL {
            assert!(p.contains(&format!("- {}", c.label())));
        }
        assert!(p.contains("Category: [category]\nConfidence: [score]%\nExplanation: [brief explanation]"));
    }
}
