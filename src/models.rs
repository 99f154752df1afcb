use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

fn default_source() -> String {
    "website".to_string()
}

/// An explicit `null` source falls back to the default as well.
fn source_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_source))
}

// ============ Collections ============

/// Contact-capture record submitted from the website form.
///
/// Stored in the `lead` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Full name (at least 2 characters).
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone, free-form.
    #[serde(default)]
    pub phone: Option<String>,
    /// Budget allocated per month. Never negative.
    #[serde(default)]
    pub monthly_budget: Option<f64>,
    /// Additional information from the prospect (up to 2000 characters).
    #[serde(default)]
    pub message: Option<String>,
    /// Lead source identifier.
    #[serde(default = "default_source", deserialize_with = "source_or_default")]
    pub source: String,
}

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One turn of a chat exchange.
///
/// Stored in the `chatlog` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub role: ChatRole,
    pub message: String,
    /// Anonymous session identifier.
    pub session_id: Option<String>,
}

impl ChatLogEntry {
    pub fn user(message: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            role: ChatRole::User,
            message: message.into(),
            session_id,
        }
    }

    pub fn assistant(message: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            message: message.into(),
            session_id,
        }
    }
}

/// Metadata the store attaches to every persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoredMeta {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl StoredMeta {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }
}

impl Default for StoredMeta {
    fn default() -> Self {
        Self::new()
    }
}

// ============ API Models ============

/// Body of `POST /api/ask`.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response of `POST /api/ask`.
///
/// `sources` is part of the wire contract but is never populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Option<Vec<String>>,
}

/// Response of `POST /api/leads`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadCreatedResponse {
    pub status: String,
    pub id: String,
}

/// Simple `{"message": ...}` body used by the static endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response of `GET /test`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsResponse {
    pub backend: String,
    pub database: String,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub connection_status: String,
    pub collections: Vec<String>,
}
