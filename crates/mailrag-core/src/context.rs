//! Renders email records into a single prompt-ready context block.
//!
//! Emails are numbered from 1 in input order (nearest-first when the input
//! comes from retrieval). Bodies are included in full; any truncation is the
//! caller's job.

use crate::models::EmailRecord;

/// Returned instead of an empty string so prompts always state the absence.
pub const NO_EMAILS_CONTEXT: &str = "No emails available for context.";

/// Assemble `emails` into one context string.
pub fn assemble<'a, I>(emails: I) -> String
where
    I: IntoIterator<Item = &'a EmailRecord>,
{
    let parts: Vec<String> = emails
        .into_iter()
        .enumerate()
        .map(|(i, email)| render_email(i + 1, email))
        .collect();

    if parts.is_empty() {
        return NO_EMAILS_CONTEXT.to_string();
    }
    parts.join("\n")
}

fn render_email(number: usize, email: &EmailRecord) -> String {
    format!(
        "\nEmail {}:\n- Subject: {}\n- From: {}\n- Date: {}\n- Content: {}\n---",
        number, email.subject, email.sender, email.date, email.body
    )
}
