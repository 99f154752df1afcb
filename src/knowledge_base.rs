//! Rule-based FAQ knowledge base and keyword matcher.
//!
//! The knowledge base is an ordered table of topics. Each topic carries a set
//! of lowercase trigger keywords and one canonical answer. Matching is a
//! sequential scan: the first topic with any keyword occurring as a substring
//! of the lowercased question wins, regardless of how many keywords other
//! topics would have matched. Questions that hit nothing get the default
//! answer.
//!
//! A table is built once at startup and then shared read-only (behind an
//! `Arc`) by every request handler.

use crate::errors::AppError;
use serde::Deserialize;
use std::path::Path;

/// Fallback answer returned when no topic matches.
pub const DEFAULT_ANSWER: &str = "Aurum Vision helps you accumulate LBMA-certified 999.9 physical gold through simple monthly or custom plans with insured vault storage. Ask me about purity, storage, fees, liquidity, or how the plans work.";

/// Built-in topics in match order: (topic, keywords, answer).
const BUILTIN_TOPICS: &[(&str, &[&str], &str)] = &[
    (
        "purity",
        &["purity", "999", "lbma", "certified"],
        "Aurum Vision provides only LBMA-certified 999.9 purity investment-grade gold. Each purchase is traceable and auditable.",
    ),
    (
        "storage",
        &["storage", "vault", "insured", "security"],
        "Your gold is stored in institutional-grade, fully insured partner vaults with multi-layer security. You can also request home delivery when desired.",
    ),
    (
        "fees",
        &["fee", "pricing", "cost", "hidden"],
        "Pricing is transparent with no hidden fees. You pay the live market rate plus a small service fee that covers custody, insurance, and reporting.",
    ),
    (
        "liquidity",
        &["sell", "liquid", "liquidity", "exit"],
        "You can sell or convert your holdings anytime. We offer a streamlined liquidation process at competitive market rates.",
    ),
    (
        "plan",
        &["plan", "monthly", "accumulation", "custom"],
        "Start with a low monthly contribution or build a custom plan. We assess your goals and risk profile to recommend the ideal schedule.",
    ),
    (
        "paper",
        &["paper", "etf", "derivative"],
        "Physical gold is a tangible asset held outside the financial system, unlike paper gold (ETFs/derivatives) which carry counterparty and tracking-error risks.",
    ),
];

/// One topic of the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    topic: String,
    keywords: Vec<String>,
    answer: String,
}

impl KnowledgeEntry {
    /// Creates an entry, lowercasing keywords and dropping duplicates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if the topic or answer is blank, a
    /// keyword is blank, or no keywords are given.
    pub fn new<K, S>(
        topic: impl Into<String>,
        keywords: K,
        answer: impl Into<String>,
    ) -> Result<Self, AppError>
    where
        K: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let topic = topic.into();
        let answer = answer.into();

        if topic.trim().is_empty() {
            return Err(AppError::Configuration(
                "knowledge entry topic cannot be empty".to_string(),
            ));
        }
        if answer.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "knowledge entry '{}' has an empty answer",
                topic
            )));
        }

        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if keyword.is_empty() {
                return Err(AppError::Configuration(format!(
                    "knowledge entry '{}' has a blank keyword",
                    topic
                )));
            }
            if !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }

        if normalized.is_empty() {
            return Err(AppError::Configuration(format!(
                "knowledge entry '{}' has no keywords",
                topic
            )));
        }

        Ok(Self {
            topic,
            keywords: normalized,
            answer,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Whether any keyword occurs in `lowered`, which must already be lowercase.
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Ordered, immutable FAQ table.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
    default_answer: String,
}

/// On-disk layout accepted by [`KnowledgeBase::from_file`].
#[derive(Debug, Deserialize)]
struct KnowledgeBaseFile {
    #[serde(default)]
    default_answer: Option<String>,
    entries: Vec<KnowledgeEntryFile>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeEntryFile {
    topic: String,
    keywords: Vec<String>,
    answer: String,
}

impl KnowledgeBase {
    /// Creates a knowledge base from entries in match order.
    pub fn new(entries: Vec<KnowledgeEntry>, default_answer: impl Into<String>) -> Result<Self, AppError> {
        let default_answer = default_answer.into();
        if default_answer.trim().is_empty() {
            return Err(AppError::Configuration(
                "default answer cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            entries,
            default_answer,
        })
    }

    /// The built-in Aurum Vision FAQ table.
    pub fn builtin() -> Self {
        let entries = BUILTIN_TOPICS
            .iter()
            .map(|(topic, keywords, answer)| KnowledgeEntry {
                topic: (*topic).to_string(),
                keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
                answer: (*answer).to_string(),
            })
            .collect();

        Self {
            entries,
            default_answer: DEFAULT_ANSWER.to_string(),
        }
    }

    /// Parses a JSON table. Entry order in the document is the match order.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let file: KnowledgeBaseFile = serde_json::from_str(json)?;

        let entries = file
            .entries
            .into_iter()
            .map(|e| KnowledgeEntry::new(e.topic, e.keywords, e.answer))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(
            entries,
            file.default_answer
                .unwrap_or_else(|| DEFAULT_ANSWER.to_string()),
        )
    }

    /// Loads a JSON table from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!(
                "failed to read knowledge base {}: {}",
                path.display(),
                e
            ))
        })?;

        let kb = Self::from_json(&raw)?;
        tracing::info!(
            "Loaded {} FAQ topics from {}",
            kb.entries.len(),
            path.display()
        );
        Ok(kb)
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn default_answer(&self) -> &str {
        &self.default_answer
    }

    /// First entry whose keywords hit the question, if any.
    pub fn find(&self, question: &str) -> Option<&KnowledgeEntry> {
        let lowered = question.to_lowercase();
        self.entries.iter().find(|entry| entry.matches(&lowered))
    }

    /// Answers a question: first matching topic wins, otherwise the default.
    pub fn answer(&self, question: &str) -> &str {
        self.find(question)
            .map(KnowledgeEntry::answer)
            .unwrap_or(&self.default_answer)
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}
