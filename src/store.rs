//! Persistence gateway.
//!
//! Services hand a named collection and a validated record to a
//! [`DocumentStore`] and get back an opaque identifier. The PostgreSQL
//! implementation keeps one table per collection; the in-memory one backs
//! tests; [`UnavailableStore`] stands in when no database is configured.

use crate::errors::{AppError, ResultExt};
use crate::models::{ChatLogEntry, Lead, StoredMeta};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Maximum number of collection names reported by diagnostics.
pub const MAX_LISTED_COLLECTIONS: usize = 10;

/// Named record types known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Lead,
    ChatLog,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Lead, Collection::ChatLog];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Lead => "lead",
            Collection::ChatLog => "chatlog",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// A validated record ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Lead(Lead),
    ChatLog(ChatLogEntry),
}

impl Document {
    /// The collection this record belongs to.
    pub fn collection(&self) -> Collection {
        match self {
            Document::Lead(_) => Collection::Lead,
            Document::ChatLog(_) => Collection::ChatLog,
        }
    }
}

/// Resolves `collection_name` and checks the document belongs to it.
fn resolve_collection(collection_name: &str, document: &Document) -> Result<Collection, AppError> {
    let collection = Collection::from_name(collection_name).ok_or_else(|| {
        AppError::Persistence(format!("Unknown collection '{}'", collection_name))
    })?;

    if collection != document.collection() {
        return Err(AppError::Persistence(format!(
            "Record of type '{}' cannot be stored in collection '{}'",
            document.collection().name(),
            collection_name
        )));
    }

    Ok(collection)
}

/// Storage abstraction used by the lead and chat services.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persists `document` into `collection_name` and returns its identifier.
    async fn create_document(
        &self,
        collection_name: &str,
        document: &Document,
    ) -> Result<String, AppError>;

    /// Names of existing collections, at most [`MAX_LISTED_COLLECTIONS`].
    async fn list_collections(&self) -> Result<Vec<String>, AppError>;

    /// Name of the backing database.
    async fn database_name(&self) -> Result<String, AppError>;

    /// False when no backing database was configured at all.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Quotes an SQL identifier, doubling any embedded double quote.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// PostgreSQL-backed store: one table per collection inside `schema`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    schema: String,
    quoted_schema: String,
}

impl PgDocumentStore {
    /// Any non-empty schema name is accepted; it is always quoted in SQL.
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Result<Self, AppError> {
        let schema = schema.into();
        if schema.trim().is_empty() {
            return Err(AppError::Configuration(
                "schema name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            pool,
            quoted_schema: quote_ident(&schema),
            schema,
        })
    }

    /// Fully qualified, quoted table name of a collection.
    pub fn table(&self, collection: Collection) -> String {
        format!("{}.{}", self.quoted_schema, quote_ident(collection.name()))
    }

    /// Creates the schema and collection tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.quoted_schema))
            .execute(&self.pool)
            .await
            .context("create schema")?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                monthly_budget NUMERIC CHECK (monthly_budget >= 0),
                message TEXT,
                source TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            self.table(Collection::Lead)
        ))
        .execute(&self.pool)
        .await
        .context("create lead table")?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                message TEXT NOT NULL,
                session_id TEXT,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            self.table(Collection::ChatLog)
        ))
        .execute(&self.pool)
        .await
        .context("create chatlog table")?;

        tracing::info!("Collections ready in schema '{}'", self.schema);
        Ok(())
    }

    async fn insert_lead(&self, meta: &StoredMeta, lead: &Lead) -> Result<(), AppError> {
        // Exact decimal for money columns
        let budget = lead
            .monthly_budget
            .map(|b| {
                BigDecimal::from_str(&b.to_string()).map_err(|e| {
                    AppError::Persistence(format!("Invalid monthly_budget {}: {}", b, e))
                })
            })
            .transpose()?;

        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, name, email, phone, monthly_budget, message, source, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            self.table(Collection::Lead)
        ))
        .bind(meta.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(budget)
        .bind(&lead.message)
        .bind(&lead.source)
        .bind(meta.created_at)
        .execute(&self.pool)
        .await
        .context("insert lead")?;

        Ok(())
    }

    async fn insert_chat_log(
        &self,
        meta: &StoredMeta,
        entry: &ChatLogEntry,
    ) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, role, message, session_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
            self.table(Collection::ChatLog)
        ))
        .bind(meta.id)
        .bind(entry.role.as_str())
        .bind(&entry.message)
        .bind(&entry.session_id)
        .bind(meta.created_at)
        .execute(&self.pool)
        .await
        .context("insert chatlog")?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create_document(
        &self,
        collection_name: &str,
        document: &Document,
    ) -> Result<String, AppError> {
        resolve_collection(collection_name, document)?;
        let meta = StoredMeta::new();

        match document {
            Document::Lead(lead) => self.insert_lead(&meta, lead).await?,
            Document::ChatLog(entry) => self.insert_chat_log(&meta, entry).await?,
        }

        tracing::debug!("Stored {} record {}", collection_name, meta.id);
        Ok(meta.id.to_string())
    }

    async fn list_collections(&self) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT table_name::text FROM information_schema.tables
            WHERE table_schema = $1
            ORDER BY table_name
            LIMIT $2
            "#,
        )
        .bind(&self.schema)
        .bind(MAX_LISTED_COLLECTIONS as i64)
        .fetch_all(&self.pool)
        .await
        .context("list collections")?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn database_name(&self) -> Result<String, AppError> {
        let (name,): (String,) = sqlx::query_as("SELECT current_database()::text")
            .fetch_one(&self.pool)
            .await
            .context("read database name")?;
        Ok(name)
    }
}

/// A record held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub meta: StoredMeta,
    pub document: Document,
}

/// In-process store. Writes can be switched off to simulate an outage.
#[derive(Debug)]
pub struct MemoryStore {
    documents: Mutex<Vec<StoredDocument>>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Stored documents of one collection, in insertion order.
    pub async fn documents(&self, collection: Collection) -> Vec<StoredDocument> {
        self.documents
            .lock()
            .await
            .iter()
            .filter(|d| d.document.collection() == collection)
            .cloned()
            .collect()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Persistence("Database not available".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(
        &self,
        collection_name: &str,
        document: &Document,
    ) -> Result<String, AppError> {
        self.check_available()?;
        resolve_collection(collection_name, document)?;

        let meta = StoredMeta::new();
        self.documents.lock().await.push(StoredDocument {
            meta,
            document: document.clone(),
        });
        Ok(meta.id.to_string())
    }

    async fn list_collections(&self) -> Result<Vec<String>, AppError> {
        self.check_available()?;
        let documents = self.documents.lock().await;
        Ok(Collection::ALL
            .into_iter()
            .filter(|c| documents.iter().any(|d| d.document.collection() == *c))
            .map(|c| c.name().to_string())
            .take(MAX_LISTED_COLLECTIONS)
            .collect())
    }

    async fn database_name(&self) -> Result<String, AppError> {
        self.check_available()?;
        Ok("memory".to_string())
    }
}

/// Store used when no database is configured. Every operation fails.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableStore {
    fn default() -> Self {
        Self::new("Database not available. Set DATABASE_URL to enable persistence")
    }
}

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn create_document(
        &self,
        _collection_name: &str,
        _document: &Document,
    ) -> Result<String, AppError> {
        Err(AppError::Persistence(self.reason.clone()))
    }

    async fn list_collections(&self) -> Result<Vec<String>, AppError> {
        Err(AppError::Persistence(self.reason.clone()))
    }

    async fn database_name(&self) -> Result<String, AppError> {
        Err(AppError::Persistence(self.reason.clone()))
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lead() -> Lead {
        Lead {
            name: "João Lima".to_string(),
            email: "joao@example.com".to_string(),
            phone: Some("+55 11 98765-4321".to_string()),
            monthly_budget: Some(500.0),
            message: None,
            source: "website".to_string(),
        }
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::from_name("lead"), Some(Collection::Lead));
        assert_eq!(Collection::from_name("chatlog"), Some(Collection::ChatLog));
        assert_eq!(Collection::from_name("users"), None);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("public"), "\"public\"");
        assert_eq!(quote_ident("aurum-vision"), "\"aurum-vision\"");
        assert_eq!(quote_ident("user"), "\"user\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/aurum")
            .unwrap()
    }

    #[tokio::test]
    async fn test_pg_store_quotes_any_schema_name() {
        let store = PgDocumentStore::new(lazy_pool(), "aurum-vision").unwrap();
        assert_eq!(store.table(Collection::Lead), "\"aurum-vision\".\"lead\"");

        // Reserved word as schema
        let store = PgDocumentStore::new(lazy_pool(), "user").unwrap();
        assert_eq!(store.table(Collection::ChatLog), "\"user\".\"chatlog\"");

        let store = PgDocumentStore::new(lazy_pool(), "AurumVision").unwrap();
        assert_eq!(store.table(Collection::Lead), "\"AurumVision\".\"lead\"");

        assert!(PgDocumentStore::new(lazy_pool(), "  ").is_err());
    }

    #[tokio::test]
    async fn test_memory_store_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let doc = Document::Lead(sample_lead());

        let a = store.create_document("lead", &doc).await.unwrap();
        let b = store.create_document("lead", &doc).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.documents(Collection::Lead).await.len(), 2);
        assert_eq!(store.list_collections().await.unwrap(), vec!["lead"]);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_wrong_collection() {
        let store = MemoryStore::new();
        let doc = Document::ChatLog(ChatLogEntry::user("hello", None));

        assert!(store.create_document("lead", &doc).await.is_err());
        assert!(store.create_document("users", &doc).await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store_outage() {
        let store = MemoryStore::new();
        store.set_available(false);

        let err = store
            .create_document("lead", &Document::Lead(sample_lead()))
            .await
            .unwrap_err();
        assert_eq!(err.detail(), "Database not available");

        store.set_available(true);
        assert!(store
            .create_document("lead", &Document::Lead(sample_lead()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_store_always_fails() {
        let store = UnavailableStore::default();
        assert!(!store.is_configured());
        assert!(store
            .create_document("lead", &Document::Lead(sample_lead()))
            .await
            .is_err());
        assert!(store.list_collections().await.is_err());
        assert!(store.database_name().await.is_err());
    }
}
