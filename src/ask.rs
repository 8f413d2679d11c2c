//! Working-set commands backed by generation: `ask`, `suggest`, `patterns`.

use anyhow::Result;

use crate::assistant::{build_assistant, load_working_set, Selection};
use crate::config::Config;

pub async fn run_ask(config: &Config, question: &str, selection: &Selection) -> Result<()> {
    let assistant = build_assistant(config)?;
    let emails = load_working_set(config, selection).await?;
    let answer = assistant.answer_question(question, &emails).await?;
    println!("{}", answer);
    Ok(())
}

pub async fn run_suggest(config: &Config, selection: &Selection) -> Result<()> {
    let assistant = build_assistant(config)?;
    let emails = load_working_set(config, selection).await?;
    for question in assistant.suggest_questions(&emails).await? {
        println!("{}", question);
    }
    Ok(())
}

pub async fn run_patterns(config: &Config, selection: &Selection) -> Result<()> {
    let assistant = build_assistant(config)?;
    let emails = load_working_set(config, selection).await?;
    println!("{}", assistant.analyze_patterns(&emails).await);
    Ok(())
}
