//! # mailrag CLI
//!
//! ## Usage
//!
//! ```bash
//! mailrag --config ./config/mailrag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mailrag list` | List the working set |
//! | `mailrag ask "<question>"` | Answer a question from the most relevant emails |
//! | `mailrag suggest` | Suggest questions worth asking about the inbox |
//! | `mailrag patterns` | Describe communication patterns |
//! | `mailrag search "<query>"` | Retrieve the emails closest to a query |
//! | `mailrag summarize <id>` | Summarize one email |
//! | `mailrag categorize <id>` | Categorize one email |
//! | `mailrag actions <id>` | Extract action items from one email |
//! | `mailrag sentiment <id>` | Analyze the tone of one email |
//! | `mailrag reply <id>` | Draft (and optionally send) a reply |
//! | `mailrag translate "<text>"` | Turn a request into a Gmail search query |
//! | `mailrag analytics` | Category and sender breakdown |
//! | `mailrag chat` | Interactive question answering |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use mailrag::assistant::Selection;
use mailrag::triage::EmailTask;
use mailrag::{ask, chat, config, logging, search, stats, triage};
use mailrag_core::prompts::ReplyTone;

/// Retrieval-augmented assistant over your email.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/mailrag.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "mailrag", version, about = "Retrieval-augmented assistant over your email")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mailrag.toml")]
    config: PathBuf,

    /// Log debug output to stderr. `RUST_LOG` takes precedence.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which emails a command works over.
#[derive(Args, Clone, Default)]
struct WorkingSet {
    /// Mail store query (Gmail search syntax). Defaults to `mail.query`.
    #[arg(long)]
    query: Option<String>,

    /// Maximum number of emails to load. Defaults to `mail.max_results`.
    #[arg(long)]
    limit: Option<usize>,
}

impl From<WorkingSet> for Selection {
    fn from(set: WorkingSet) -> Self {
        Selection {
            query: set.query,
            limit: set.limit,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the emails in the working set.
    List {
        #[command(flatten)]
        set: WorkingSet,
    },

    /// Answer a question using the most relevant emails as context.
    Ask {
        question: String,
        #[command(flatten)]
        set: WorkingSet,
    },

    /// Suggest questions worth asking about the working set.
    Suggest {
        #[command(flatten)]
        set: WorkingSet,
    },

    /// Describe communication patterns across the working set.
    Patterns {
        #[command(flatten)]
        set: WorkingSet,
    },

    /// Retrieve the emails closest in meaning to a query.
    ///
    /// Retrieval only; no generation backend is called.
    Search {
        #[arg(id = "search_query", value_name = "QUERY")]
        query: String,
        #[command(flatten)]
        set: WorkingSet,
    },

    /// Summarize one email.
    Summarize { id: String },

    /// Categorize one email.
    Categorize { id: String },

    /// List the action items in one email.
    Actions { id: String },

    /// Analyze the sentiment of one email.
    Sentiment { id: String },

    /// Draft a reply to one email.
    Reply {
        id: String,

        /// professional, friendly, formal, casual, enthusiastic, apologetic,
        /// or urgent.
        #[arg(long, default_value = "professional")]
        tone: ReplyTone,

        /// Send the draft in the original thread.
        #[arg(long)]
        send: bool,
    },

    /// Translate a natural-language request into a Gmail search query.
    Translate {
        text: String,

        /// Use the built-in keyword rules instead of the generator.
        #[arg(long)]
        rules: bool,
    },

    /// Categorize the working set and report counts and top senders.
    Analytics {
        #[command(flatten)]
        set: WorkingSet,
    },

    /// Ask questions interactively over the working set.
    Chat {
        /// Persist the session (emails and history) to this JSON file.
        #[arg(long)]
        session: Option<PathBuf>,
        #[command(flatten)]
        set: WorkingSet,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::List { set } => {
            search::run_list(&cfg, &set.into()).await?;
        }
        Commands::Ask { question, set } => {
            ask::run_ask(&cfg, &question, &set.into()).await?;
        }
        Commands::Suggest { set } => {
            ask::run_suggest(&cfg, &set.into()).await?;
        }
        Commands::Patterns { set } => {
            ask::run_patterns(&cfg, &set.into()).await?;
        }
        Commands::Search { query, set } => {
            search::run_search(&cfg, &query, &set.into()).await?;
        }
        Commands::Summarize { id } => {
            triage::run_email_task(&cfg, &id, EmailTask::Summarize).await?;
        }
        Commands::Categorize { id } => {
            triage::run_email_task(&cfg, &id, EmailTask::Categorize).await?;
        }
        Commands::Actions { id } => {
            triage::run_email_task(&cfg, &id, EmailTask::ActionItems).await?;
        }
        Commands::Sentiment { id } => {
            triage::run_email_task(&cfg, &id, EmailTask::Sentiment).await?;
        }
        Commands::Reply { id, tone, send } => {
            triage::run_reply(&cfg, &id, tone, send).await?;
        }
        Commands::Translate { text, rules } => {
            search::run_translate(&cfg, &text, rules).await?;
        }
        Commands::Analytics { set } => {
            stats::run_analytics(&cfg, &set.into()).await?;
        }
        Commands::Chat { session, set } => {
            chat::run_chat(&cfg, &set.into(), session).await?;
        }
    }

    Ok(())
}
