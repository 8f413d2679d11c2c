//! End-to-end flows through the library: mailbox file, hashed embeddings,
//! and a scripted generator.

use std::sync::Arc;

use tempfile::TempDir;

use mailrag::mail_store::{fetch_emails, JsonFileStore};
use mailrag_core::categorize::{parse_categorization, EmailCategory};
use mailrag_core::embedding::HashedProvider;
use mailrag_core::generation::GenerationParams;
use mailrag_core::mock::MockGenerator;
use mailrag_core::models::EmailRecord;
use mailrag_core::session::ChatSession;
use mailrag_core::tasks::EmailAssistant;

const MAILBOX: &str = r#"[
  {"id": "a", "subject": "Quarterly planning", "sender": "Dana <dana@corp.com>",
   "date": "Mon, 8 Jan 2024", "body": "Please send your budget numbers by Friday.", "threadId": "ta"},
  {"id": "b", "subject": "Dinner on Saturday?", "sender": "sam@home.net",
   "date": "Tue, 9 Jan 2024", "body": "Want to grab dinner this weekend?", "threadId": "tb"}
]"#;

async fn load_mailbox() -> (TempDir, Vec<EmailRecord>) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("mailbox.json");
    std::fs::write(&path, MAILBOX).unwrap();
    let store = JsonFileStore::open(&path).unwrap();
    let emails = fetch_emails(&store, "", 10).await.unwrap();
    (tmp, emails)
}

fn assistant(generator: Arc<MockGenerator>) -> EmailAssistant {
    EmailAssistant::new(
        Arc::new(HashedProvider::new(128)),
        generator,
        GenerationParams::default(),
    )
}

#[tokio::test]
async fn test_categorize_work_email() {
    let (_tmp, emails) = load_mailbox().await;
    let generator = Arc::new(MockGenerator::with_default_response(
        "Category: Work/Professional\nConfidence: 90%\nExplanation: asks for budget numbers",
    ));
    let assistant = assistant(Arc::clone(&generator));

    let response = assistant.categorize(&emails[0]).await;
    let parsed = parse_categorization(&response).unwrap();

    assert_eq!(parsed.category, "Work/Professional");
    assert_eq!(parsed.known_category(), Some(EmailCategory::WorkProfessional));
    assert_eq!(parsed.confidence, Some(90));
    assert_eq!(generator.call_count(), 1);
    assert!(generator.calls()[0].prompt.contains("Quarterly planning"));
}

#[tokio::test]
async fn test_summarize_failure_is_reported_as_text() {
    let (_tmp, emails) = load_mailbox().await;
    let assistant = assistant(Arc::new(MockGenerator::failing("quota exceeded")));

    let summary = assistant.summarize(&emails[1]).await;
    assert!(summary.starts_with("Sorry, I couldn't generate a response"));
    assert!(summary.contains("quota exceeded"));
}

#[tokio::test]
async fn test_answer_uses_retrieved_context() {
    let (_tmp, emails) = load_mailbox().await;
    let generator = Arc::new(MockGenerator::with_default_response("By Friday."));
    let assistant = assistant(Arc::clone(&generator));

    let answer = assistant
        .answer_question("When are the budget numbers due?", &emails)
        .await
        .unwrap();

    assert_eq!(answer, "By Friday.");
    let prompt = &generator.calls()[0].prompt;
    assert!(prompt.contains("When are the budget numbers due?"));
    assert!(prompt.contains("budget numbers by Friday"));
}

#[tokio::test]
async fn test_chat_session_flow() {
    let (_tmp, emails) = load_mailbox().await;
    let generator = Arc::new(MockGenerator::new());
    generator.push_response("First answer.");
    generator.push_response("Second answer.");
    let assistant = assistant(Arc::clone(&generator));

    let session = ChatSession::new().with_emails(emails);
    let (session, first) = session.ask(&assistant, "Who wrote about dinner?").await.unwrap();
    let (session, second) = session.ask(&assistant, "What is due Friday?").await.unwrap();

    assert_eq!(first, "First answer.");
    assert_eq!(second, "Second answer.");
    assert_eq!(session.history.len(), 2);
    assert_eq!(session.history[1].question, "What is due Friday?");

    let session = session.remove_entry(0);
    assert_eq!(session.history.len(), 1);
    assert_eq!(session.history[0].answer, "Second answer.");

    let session = session.clear();
    assert!(session.loaded_emails.is_empty());
    assert!(session.history.is_empty());

    let (session, answer) = session.ask(&assistant, "Anything?").await.unwrap();
    assert!(answer.starts_with("No emails are available"));
    assert!(session.history.is_empty());
    assert_eq!(generator.call_count(), 2);
}
