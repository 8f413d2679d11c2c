//! Inbox analytics report.
//!
//! Categorizes up to `retrieval.analytics_limit` emails (one generation call
//! each) and prints category counts and the most frequent senders. Used by
//! `mailrag analytics`.

use anyhow::Result;

use mailrag_core::analytics::InboxReport;

use crate::assistant::{build_assistant, load_working_set, Selection};
use crate::config::Config;

pub async fn run_analytics(config: &Config, selection: &Selection) -> Result<()> {
    let assistant = build_assistant(config)?;
    let selection = Selection {
        query: selection.query.clone(),
        limit: Some(
            selection
                .limit
                .unwrap_or(config.retrieval.analytics_limit)
                .min(config.retrieval.analytics_limit),
        ),
    };
    let emails = load_working_set(config, &selection).await?;
    let report = assistant.analyze_inbox(&emails).await;
    print!("{}", render_report(&report));
    Ok(())
}

fn render_report(report: &InboxReport) -> String {
    let mut out = String::new();
    out.push_str("Inbox Analytics\n");
    out.push_str("===============\n\n");
    out.push_str(&format!("  Emails analyzed: {}\n", report.total));

    if report.total == 0 {
        return out;
    }

    out.push_str("\n  Categories:\n");
    let mut categories: Vec<(&String, &usize)> = report.categories.iter().collect();
    categories.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (category, count) in categories {
        out.push_str(&format!(
            "    {:<24} {:>4} ({}%)\n",
            category,
            count,
            count * 100 / report.total
        ));
    }

    out.push_str("\n  Top senders:\n");
    for sender in &report.top_senders {
        out.push_str(&format!("    {:<40} {:>4}\n", sender.address, sender.count));
    }
    out
}
