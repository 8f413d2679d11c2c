//! # mailrag core
//!
//! Retrieval and orchestration logic for mailrag: email records, the
//! embedding provider trait, an exact flat similarity index, the per-request
//! retriever, context assembly, prompt templates, the generation trait, and
//! the task orchestrators built on top of them.
//!
//! This crate performs no network or filesystem I/O. Concrete embedding
//! providers, generation backends and mail stores live in the `mailrag`
//! app crate and plug in through [`embedding::EmbeddingProvider`] and
//! [`generation::Generator`].
//!
//! ## Pipeline
//!
//! ```text
//! emails ─▶ Retriever::index_emails ─▶ FlatIndex
//! question ─▶ Retriever::search ─▶ context::assemble ─▶ prompts ─▶ Generator
//! ```

pub mod analytics;
pub mod categorize;
pub mod context;
pub mod embedding;
pub mod generation;
pub mod index;
pub mod mock;
pub mod models;
pub mod prompts;
pub mod retriever;
pub mod search_rules;
pub mod session;
pub mod tasks;
