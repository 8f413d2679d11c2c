//! Task orchestrators.
//!
//! [`EmailAssistant`] turns a working set of emails plus a user request into
//! text. Each task builds a prompt from the templates in
//! [`prompts`](crate::prompts), makes at most one generation call per email
//! it works on, and post-processes the result.
//!
//! # Failure policy
//!
//! - An empty working set takes a fixed fallback branch and never reaches
//!   the generator.
//! - Generation failures are absorbed into an [`apology`] string.
//! - Retrieval failures ([`RetrievalError`]) are returned to the caller.
//!
//! Every generating call moves through [`TaskState`]s, which are logged at
//! `debug`.

use std::fmt;
use std::sync::Arc;

use crate::analytics::InboxReport;
use crate::context;
use crate::embedding::EmbeddingProvider;
use crate::generation::{apology, GenerationParams, Generator};
use crate::models::EmailRecord;
use crate::prompts::{self, ReplyTone};
use crate::retriever::{RetrievalError, Retriever};

pub const NO_EMAILS_TO_ANSWER: &str =
    "No emails are available to answer your question. Please select some emails first.";

pub const NO_EMAILS_TO_ANALYZE: &str = "No emails selected for analysis.";

/// Upper bound on suggested questions and on the emails seeding them.
pub const MAX_SUGGESTIONS: usize = 5;

/// Offered when there are no emails at all.
pub const DEFAULT_QUESTIONS: [&str; 5] = [
    "What are the main topics in my recent emails?",
    "Who are the most frequent senders?",
    "Are there any urgent emails I should prioritize?",
    "What meetings or events are mentioned?",
    "Are there any action items I need to follow up on?",
];

/// Offered when the model's suggestions contain no usable question.
pub const FALLBACK_QUESTIONS: [&str; 5] = [
    "What are the main topics in these emails?",
    "Who are the key senders and what do they want?",
    "Are there any deadlines or urgent matters mentioned?",
    "What meetings or events are scheduled?",
    "Are there any action items I need to address?",
];

/// Lifecycle of one orchestrator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    BuildingContext,
    Prompting,
    Generating,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::BuildingContext => "BUILDING_CONTEXT",
            TaskState::Prompting => "PROMPTING",
            TaskState::Generating => "GENERATING",
            TaskState::Succeeded => "SUCCEEDED",
            TaskState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn enter(task: &'static str, state: TaskState) {
    tracing::debug!(task, state = state.as_str(), "task state");
}

/// Sizes and limits used by the orchestrators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSettings {
    /// Emails retrieved as context for a question.
    pub answer_top_k: usize,
    /// Emails returned by content search.
    pub search_top_k: usize,
    /// Leading emails used to seed question suggestions.
    pub suggestion_seed: usize,
    pub max_suggestions: usize,
    /// Body characters included in a categorization prompt.
    pub categorize_body_chars: usize,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            answer_top_k: 5,
            search_top_k: 10,
            suggestion_seed: 5,
            max_suggestions: 5,
            categorize_body_chars: 500,
        }
    }
}

/// Stateless task runner over an encoder and a generator.
///
/// Holds no per-request state: each retrieval-backed task builds its own
/// [`Retriever`], so one assistant can serve concurrent callers.
#[derive(Clone)]
pub struct EmailAssistant {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn Generator>,
    params: GenerationParams,
    settings: TaskSettings,
}

impl EmailAssistant {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn Generator>,
        params: GenerationParams,
    ) -> Self {
        Self {
            embedder,
            generator,
            params,
            settings: TaskSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: TaskSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &TaskSettings {
        &self.settings
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Answer `question` from the emails most relevant to it.
    pub async fn answer_question(
        &self,
        question: &str,
        emails: &[EmailRecord],
    ) -> Result<String, RetrievalError> {
        const TASK: &str = "answer_question";
        if emails.is_empty() {
            return Ok(NO_EMAILS_TO_ANSWER.to_string());
        }

        enter(TASK, TaskState::BuildingContext);
        let mut retriever = Retriever::new(Arc::clone(&self.embedder));
        retriever.index_emails(emails).await?;
        let relevant = retriever
            .search(question, self.settings.answer_top_k)
            .await?;
        let ctx = context::assemble(relevant);

        enter(TASK, TaskState::Prompting);
        let prompt = prompts::answer_question(&ctx, question);
        Ok(self.generate(TASK, &prompt).await)
    }

    /// Suggest up to `max_suggestions` questions about the working set.
    ///
    /// The first `suggestion_seed` emails are indexed and used as context,
    /// not a relevance search. Both sizes are capped at [`MAX_SUGGESTIONS`].
    /// Every returned item contains a `?`. An encoder failure is returned;
    /// a generation failure yields [`FALLBACK_QUESTIONS`].
    pub async fn suggest_questions(
        &self,
        emails: &[EmailRecord],
    ) -> Result<Vec<String>, RetrievalError> {
        const TASK: &str = "suggest_questions";
        let limit = self.settings.max_suggestions.min(MAX_SUGGESTIONS);
        if emails.is_empty() {
            return Ok(fixed(&DEFAULT_QUESTIONS, limit));
        }

        enter(TASK, TaskState::BuildingContext);
        let seed_len = self.settings.suggestion_seed.min(MAX_SUGGESTIONS);
        let seed = &emails[..emails.len().min(seed_len)];
        let mut retriever = Retriever::new(Arc::clone(&self.embedder));
        retriever.index_emails(seed).await?;
        let ctx = context::assemble(seed);

        enter(TASK, TaskState::Prompting);
        let prompt = prompts::suggest_questions(&ctx, limit);

        enter(TASK, TaskState::Generating);
        let questions = match self.generator.generate(&prompt, &self.params).await {
            Ok(text) => {
                enter(TASK, TaskState::Succeeded);
                extract_questions(&text, limit)
            }
            Err(e) => {
                tracing::warn!(
                    task = TASK,
                    error = %e,
                    "generation failed; using fallback questions"
                );
                enter(TASK, TaskState::Failed);
                Vec::new()
            }
        };

        if questions.is_empty() {
            return Ok(fixed(&FALLBACK_QUESTIONS, limit));
        }
        Ok(questions)
    }

    /// Describe themes, senders and priorities across the whole set.
    pub async fn analyze_patterns(&self, emails: &[EmailRecord]) -> String {
        const TASK: &str = "analyze_patterns";
        if emails.is_empty() {
            return NO_EMAILS_TO_ANALYZE.to_string();
        }

        enter(TASK, TaskState::BuildingContext);
        let ctx = context::assemble(emails);
        enter(TASK, TaskState::Prompting);
        let prompt = prompts::analyze_patterns(&ctx);
        self.generate(TASK, &prompt).await
    }

    /// Retrieval only: the `search_top_k` emails nearest to `query`.
    pub async fn search_by_content<'a>(
        &self,
        query: &str,
        emails: &'a [EmailRecord],
    ) -> Result<Vec<&'a EmailRecord>, RetrievalError> {
        let mut retriever = Retriever::new(Arc::clone(&self.embedder));
        retriever.index_emails(emails).await?;
        retriever.search(query, self.settings.search_top_k).await
    }

    pub async fn summarize(&self, email: &EmailRecord) -> String {
        self.single("summarize", prompts::summarize(email)).await
    }

    pub async fn generate_reply(&self, email: &EmailRecord, tone: ReplyTone) -> String {
        self.single("generate_reply", prompts::reply(email, tone)).await
    }

    /// Raw categorization response in the `Category:`/`Confidence:`/
    /// `Explanation:` layout; see [`crate::categorize`].
    pub async fn categorize(&self, email: &EmailRecord) -> String {
        let prompt = prompts::categorize(email, self.settings.categorize_body_chars);
        self.single("categorize", prompt).await
    }

    pub async fn extract_action_items(&self, email: &EmailRecord) -> String {
        self.single("extract_action_items", prompts::action_items(email)).await
    }

    pub async fn analyze_sentiment(&self, email: &EmailRecord) -> String {
        self.single("analyze_sentiment", prompts::sentiment(email)).await
    }

    /// Ask the model to rewrite `natural_query` in Gmail search syntax.
    ///
    /// On failure the apology text is returned like any other task; use
    /// [`resolve_search_query`](crate::search_rules::resolve_search_query)
    /// for an offline translation.
    pub async fn translate_search_query(&self, natural_query: &str) -> String {
        let text = self
            .single("translate_search_query", prompts::search_query(natural_query))
            .await;
        text.trim().to_string()
    }

    /// Categorize every email, one generation call each, and aggregate.
    pub async fn analyze_inbox(&self, emails: &[EmailRecord]) -> InboxReport {
        let mut responses = Vec::with_capacity(emails.len());
        for email in emails {
            responses.push(self.categorize(email).await);
        }
        let report = InboxReport::from_categorized(
            emails.iter().zip(responses.iter().map(String::as_str)),
        );
        tracing::debug!(
            total = report.total,
            categories = report.categories.len(),
            "inbox analyzed"
        );
        report
    }

    async fn single(&self, task: &'static str, prompt: String) -> String {
        enter(task, TaskState::BuildingContext);
        enter(task, TaskState::Prompting);
        self.generate(task, &prompt).await
    }

    async fn generate(&self, task: &'static str, prompt: &str) -> String {
        enter(task, TaskState::Generating);
        match self.generator.generate(prompt, &self.params).await {
            Ok(text) => {
                enter(task, TaskState::Succeeded);
                text
            }
            Err(e) => {
                tracing::warn!(
                    task,
                    generator = self.generator.name(),
                    error = %e,
                    "generation failed"
                );
                enter(task, TaskState::Failed);
                apology(&e)
            }
        }
    }
}

fn fixed(questions: &[&str], limit: usize) -> Vec<String> {
    questions.iter().take(limit).map(|q| q.to_string()).collect()
}

/// Non-empty trimmed lines containing a `?`, at most `limit`.
fn extract_questions(text: &str, limit: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains('?'))
        .take(limit)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{DisabledProvider, HashedProvider};
    use crate::generation::is_apology;
    use crate::mock::MockGenerator;

    fn email(id: &str, subject: &str, body: &str) -> EmailRecord {
        EmailRecord {
            id: id.into(),
            subject: subject.into(),
            sender: format!("Sender {id} <s{id}@example.com>"),
            date: "Fri, 5 Jan 2024".into(),
            body: body.into(),
            thread_id: format!("t{id}"),
        }
    }

    fn inbox(n: usize) -> Vec<EmailRecord> {
        (1..=n)
            .map(|i| email(&i.to_string(), &format!("Subject {i}"), &format!("Body number {i}")))
            .collect()
    }

    fn assistant(mock: Arc<MockGenerator>) -> EmailAssistant {
        EmailAssistant::new(
            Arc::new(HashedProvider::new(64)),
            mock,
            GenerationParams::default(),
        )
    }

    #[tokio::test]
    async fn test_answer_without_emails_skips_generation() {
        let mock = Arc::new(MockGenerator::new());
        let answer = assistant(mock.clone())
            .answer_question("anything?", &[])
            .await
            .unwrap();
        assert_eq!(answer, NO_EMAILS_TO_ANSWER);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_answer_uses_top_k_context() {
        let mock = Arc::new(MockGenerator::with_default_response("It is at 3pm."));
        let mut emails = inbox(8);
        emails.push(email("9", "Meeting tomorrow", "Let's meet at 3pm"));
        let answer = assistant(mock.clone())
            .answer_question("when is the meeting", &emails)
            .await
            .unwrap();
        assert_eq!(answer, "It is at 3pm.");

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        let prompt = &calls[0].prompt;
        assert!(prompt.contains("User Question: when is the meeting"));
        assert!(prompt.contains("Email 5:"));
        assert!(!prompt.contains("Email 6:"));
        let first = prompt.find("Email 1:").unwrap();
        assert!(prompt[first..].starts_with("Email 1:\n- Subject: Meeting tomorrow"));
    }

    #[tokio::test]
    async fn test_answer_surfaces_encoder_outage() {
        let mock = Arc::new(MockGenerator::new());
        let assistant = EmailAssistant::new(
            Arc::new(DisabledProvider),
            mock.clone(),
            GenerationParams::default(),
        );
        let err = assistant
            .answer_question("q", &inbox(2))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::EncodingUnavailable(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_answer_absorbs_generation_failure() {
        let mock = Arc::new(MockGenerator::failing("rate limited"));
        let answer = assistant(mock).answer_question("q", &inbox(3)).await.unwrap();
        assert!(is_apology(&answer));
        assert!(answer.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_suggest_without_emails_is_fixed_list() {
        let mock = Arc::new(MockGenerator::new());
        let questions = assistant(mock.clone()).suggest_questions(&[]).await.unwrap();
        assert_eq!(questions, DEFAULT_QUESTIONS.to_vec());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_suggest_filters_lines_with_question_marks() {
        let mock = Arc::new(MockGenerator::new());
        mock.push_response(
            "Here are some questions:\n1. Who sent the invoice?\n\n  2. When is the meeting?  \nThanks\n3. What's due?\n4. a?\n5. b?\n6. c?",
        );
        let questions = assistant(mock.clone()).suggest_questions(&inbox(9)).await.unwrap();
        assert_eq!(
            questions,
            vec![
                "1. Who sent the invoice?",
                "2. When is the meeting?",
                "3. What's due?",
                "4. a?",
                "5. b?"
            ]
        );
        let prompt = &mock.calls()[0].prompt;
        assert!(prompt.contains("Email 5:"));
        assert!(!prompt.contains("Email 6:"));
    }

    #[tokio::test]
    async fn test_suggest_falls_back_when_nothing_usable() {
        let mock = Arc::new(MockGenerator::with_default_response("No questions here."));
        let questions = assistant(mock).suggest_questions(&inbox(2)).await.unwrap();
        assert_eq!(questions, FALLBACK_QUESTIONS.to_vec());
    }

    #[tokio::test]
    async fn test_suggest_falls_back_on_failure() {
        let mock = Arc::new(MockGenerator::failing("down?"));
        let questions = assistant(mock).suggest_questions(&inbox(2)).await.unwrap();
        assert_eq!(questions, FALLBACK_QUESTIONS.to_vec());
    }

    #[tokio::test]
    async fn test_suggest_caps_oversized_settings() {
        let mock = Arc::new(MockGenerator::with_default_response(
            "a?\nb?\nc?\nd?\ne?\nf?\ng?",
        ));
        let assistant = assistant(mock.clone()).with_settings(TaskSettings {
            max_suggestions: 8,
            suggestion_seed: 9,
            ..TaskSettings::default()
        });

        let questions = assistant.suggest_questions(&inbox(9)).await.unwrap();
        assert_eq!(questions, vec!["a?", "b?", "c?", "d?", "e?"]);
        let prompt = &mock.calls()[0].prompt;
        assert!(prompt.contains("Email 5:"));
        assert!(!prompt.contains("Email 6:"));

        let defaults = assistant.suggest_questions(&[]).await.unwrap();
        assert_eq!(defaults.len(), MAX_SUGGESTIONS);
    }

    #[tokio::test]
    async fn test_suggest_surfaces_encoder_outage() {
        let mock = Arc::new(MockGenerator::new());
        let assistant = EmailAssistant::new(
            Arc::new(DisabledProvider),
            mock.clone(),
            GenerationParams::default(),
        );
        let err = assistant.suggest_questions(&inbox(2)).await.unwrap_err();
        assert!(matches!(err, RetrievalError::EncodingUnavailable(_)));
        assert_eq!(mock.call_count(), 0);

        let defaults = assistant.suggest_questions(&[]).await.unwrap();
        assert_eq!(defaults, DEFAULT_QUESTIONS.to_vec());
    }

    #[tokio::test]
    async fn test_patterns_use_every_email() {
        let mock = Arc::new(MockGenerator::new());
        let a = assistant(mock.clone());
        assert_eq!(a.analyze_patterns(&[]).await, NO_EMAILS_TO_ANALYZE);
        assert_eq!(mock.call_count(), 0);

        a.analyze_patterns(&inbox(12)).await;
        assert!(mock.calls()[0].prompt.contains("Email 12:"));
    }

    #[tokio::test]
    async fn test_search_by_content_has_no_generation() {
        let mock = Arc::new(MockGenerator::new());
        let emails = inbox(15);
        let hits = assistant(mock.clone())
            .search_by_content("Body number 3", &emails)
            .await
            .unwrap();
        assert_eq!(hits.len(), 10);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_summarize_failure_returns_text() {
        let mock = Arc::new(MockGenerator::failing("boom"));
        let text = assistant(mock).summarize(&inbox(1)[0]).await;
        assert!(text.contains("couldn't generate a response"));
    }

    #[tokio::test]
    async fn test_reply_passes_tone_and_params() {
        let mock = Arc::new(MockGenerator::new());
        let params = GenerationParams {
            model: "gpt-4o".into(),
            temperature: 0.2,
            max_tokens: 300,
        };
        let a = EmailAssistant::new(
            Arc::new(HashedProvider::default()),
            mock.clone(),
            params.clone(),
        );
        a.generate_reply(&inbox(1)[0], ReplyTone::Friendly).await;
        let call = &mock.calls()[0];
        assert!(call.prompt.contains("Generate a friendly reply"));
        assert_eq!(call.params, params);
    }

    #[tokio::test]
    async fn test_translate_trims_output() {
        let mock = Arc::new(MockGenerator::with_default_response("  subject:(invoice)\n"));
        let q = assistant(mock).translate_search_query("invoices").await;
        assert_eq!(q, "subject:(invoice)");
    }

    #[tokio::test]
    async fn test_analyze_inbox_counts_failures_as_uncategorized() {
        let mock = Arc::new(MockGenerator::new());
        mock.push_response("Category: Travel\nConfidence: 80%\nExplanation: flight");
        mock.push_response("not in the layout");
        let report = assistant(mock.clone()).analyze_inbox(&inbox(2)).await;
        assert_eq!(mock.call_count(), 2);
        assert_eq!(report.total, 2);
        assert_eq!(report.count("Travel"), 1);
        assert_eq!(report.count(crate::categorize::UNCATEGORIZED), 1);
    }

    #[test]
    fn test_task_state_names() {
        assert_eq!(TaskState::BuildingContext.to_string(), "BUILDING_CONTEXT");
        assert_eq!(TaskState::Failed.as_str(), "FAILED");
    }
}
