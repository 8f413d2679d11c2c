//! # mailrag
//!
//! A retrieval-augmented assistant over your email.
//!
//! Emails are pulled from a mail store (a JSON mailbox file or the Gmail
//! REST API), embedded into an in-memory flat L2 index, and the nearest
//! matches are packed into a prompt for a configured generation backend.
//! The pure pipeline (embedding trait, index, retriever, context assembly,
//! prompts, task orchestration) lives in [`mailrag_core`]; this crate adds
//! configuration, backend adapters, mail access, and the CLI commands.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────┐   ┌────────────┐   ┌────────────┐
//! │  Mail store  │──▶│ Embedding │──▶│ Flat index │──▶│  Context   │
//! │ JSON / Gmail │   │ provider  │   │ (L2, top-k)│   │  + prompt  │
//! └──────────────┘   └───────────┘   └────────────┘   └─────┬──────┘
//!                                                           ▼
//!                                                     ┌────────────┐
//!                                                     │ Generator  │
//!                                                     └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`embedding`] | HTTP and local embedding providers |
//! | [`generation`] | OpenAI, Anthropic, Gemini, Grok, and Ollama generators |
//! | [`mail_store`] | Mail store trait and JSON mailbox store |
//! | [`gmail`] | Gmail REST store |
//! | [`assistant`] | Wiring config into an [`EmailAssistant`](mailrag_core::tasks::EmailAssistant) |
//! | [`ask`] | `ask`, `suggest`, `patterns` |
//! | [`search`] | `list`, `search`, `translate` |
//! | [`triage`] | Single-email tasks and replies |
//! | [`stats`] | Inbox analytics |
//! | [`chat`] | Interactive chat session |

pub mod ask;
pub mod assistant;
pub mod chat;
pub mod config;
pub mod embedding;
pub mod generation;
pub mod gmail;
pub mod logging;
pub mod mail_store;
pub mod search;
pub mod stats;
pub mod triage;
