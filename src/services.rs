use crate::errors::AppError;
use crate::knowledge_base::KnowledgeBase;
use crate::models::{ChatLogEntry, Lead};
use crate::store::{Collection, Document, DocumentStore};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Rule-based FAQ assistant.
///
/// Answers come from the shared [`KnowledgeBase`]. Each exchange is logged
/// to the `chatlog` collection on a best-effort basis: storage failures are
/// dropped so the caller always gets an answer, even with the database down.
#[derive(Clone)]
pub struct ChatService {
    knowledge_base: Arc<KnowledgeBase>,
    store: Arc<dyn DocumentStore>,
}

impl ChatService {
    pub fn new(knowledge_base: Arc<KnowledgeBase>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            knowledge_base,
            store,
        }
    }

    /// Answers `question` and schedules logging of the exchange.
    ///
    /// The logging task is detached; its handle is returned only so callers
    /// that care (tests, batch tools) can wait for it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the logging task is
    /// spawned with [`tokio::spawn`].
    pub fn ask(&self, question: &str, session_id: Option<String>) -> (String, JoinHandle<()>) {
        let answer = self.knowledge_base.answer(question).to_string();

        let service = self.clone();
        let question = question.to_string();
        let logged_answer = answer.clone();
        let handle = tokio::spawn(async move {
            service
                .record_exchange(&question, &logged_answer, session_id)
                .await;
        });

        (answer, handle)
    }

    /// Persists the user turn, then the assistant turn.
    ///
    /// Stops at the first failure. Failures are never returned.
    pub async fn record_exchange(&self, question: &str, answer: &str, session_id: Option<String>) {
        let turns = [
            ChatLogEntry::user(question, session_id.clone()),
            ChatLogEntry::assistant(answer, session_id),
        ];

        for turn in turns {
            if let Err(e) = self
                .store
                .create_document(Collection::ChatLog.name(), &Document::ChatLog(turn))
                .await
            {
                tracing::debug!("Chat log skipped: {}", e);
                return;
            }
        }
    }
}

/// Persists website leads.
#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn DocumentStore>,
}

impl LeadService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Stores an already-validated lead and returns its identifier.
    ///
    /// # Errors
    ///
    /// Any gateway failure becomes `AppError::InternalError` carrying the
    /// gateway's message. No retry.
    pub async fn submit(&self, lead: Lead) -> Result<String, AppError> {
        let id = self
            .store
            .create_document(Collection::Lead.name(), &Document::Lead(lead))
            .await
            .map_err(|e| AppError::InternalError(e.detail()))?;

        tracing::info!("Lead stored: {}", id);
        Ok(id)
    }
}
