//! Working-set listing, content search, and search-query translation.
//!
//! `mailrag search` is retrieval only: it embeds the working set, ranks it
//! against the query, and prints the nearest emails without calling a
//! generation backend.

use anyhow::Result;

use mailrag_core::models::EmailRecord;
use mailrag_core::search_rules::{resolve_search_query, rule_based_query};

use crate::assistant::{build_assistant, load_working_set, Selection};
use crate::config::Config;

const EXCERPT_CHARS: usize = 160;

pub async fn run_list(config: &Config, selection: &Selection) -> Result<()> {
    let emails = load_working_set(config, selection).await?;
    if emails.is_empty() {
        println!("No emails.");
        return Ok(());
    }
    for email in &emails {
        println!("{}  {}  {}", email.id, email.sender, email.subject);
    }
    Ok(())
}

pub async fn run_search(config: &Config, query: &str, selection: &Selection) -> Result<()> {
    let assistant = build_assistant(config)?;
    let emails = load_working_set(config, selection).await?;
    let hits = assistant.search_by_content(query, &emails).await?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, email) in hits.iter().enumerate() {
        print_hit(i + 1, email);
    }
    Ok(())
}

fn print_hit(rank: usize, email: &EmailRecord) {
    println!("{}. {}", rank, email.subject);
    println!("    from: {}", email.sender);
    println!("    date: {}", email.date);
    println!("    excerpt: \"{}\"", excerpt(&email.body));
    println!("    id: {}", email.id);
    println!();
}

fn excerpt(body: &str) -> String {
    let flat = body.replace(['\r', '\n'], " ");
    let flat = flat.trim();
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat.to_string();
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Print the Gmail query for `natural`. With `rules_only` the keyword
/// table is used and no generation call is made.
pub async fn run_translate(config: &Config, natural: &str, rules_only: bool) -> Result<()> {
    if rules_only {
        if rule_based_query(natural).is_none() {
            tracing::debug!(query = natural, "no search rule matched; using input as-is");
        }
        println!("{}", resolve_search_query(natural));
        return Ok(());
    }

    let assistant = build_assistant(config)?;
    println!("{}", assistant.translate_search_query(natural).await);
    Ok(())
}
