//! Journal tool — the agent's long-term notebook, queried as a tool.
//!
//! The decision loop keeps no state across cycles; anything the agent wants
//! to remember (feedings, observations, interventions) goes through here.
//! The in-memory store is the default; a persistent store can replace it by
//! implementing the same methods behind the `Arc`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use verdant_core::error::ToolError;
use verdant_core::tool::{ArgKind, Tool, ToolSchema};

/// One journal entry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    pub text: String,
}

/// In-memory journal store.
pub struct JournalStore {
    entries: RwLock<Vec<JournalEntry>>,
}

impl JournalStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub async fn append(&self, text: &str) -> JournalEntry {
        let entry = JournalEntry {
            at: Utc::now(),
            text: text.to_string(),
        };
        self.entries.write().await.push(entry.clone());
        entry
    }

    /// Case-insensitive substring search, newest first.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<JournalEntry> {
        let needle = query.to_lowercase();
        self.entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| e.text.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for JournalStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool exposing append/search over the journal.
pub struct JournalTool {
    store: Arc<JournalStore>,
}

impl JournalTool {
    pub fn new(store: Arc<JournalStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for JournalTool {
    fn name(&self) -> &str {
        "journal"
    }

    fn description(&self) -> &str {
        "Append to or search the care journal. Use action 'append' with 'text' to \
         record an observation or intervention; use action 'search' with 'query' \
         to recall past entries."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .required("action", ArgKind::String, "'append' or 'search'")
            .optional("text", ArgKind::String, "Entry text (for append)")
            .optional("query", ArgKind::String, "Search query (for search)")
            .optional("limit", ArgKind::Integer, "Max results for search (default 5)")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let action = arguments["action"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'action' argument".into()))?;

        match action {
            "append" => {
                let text = arguments["text"].as_str().ok_or_else(|| {
                    ToolError::InvalidArguments("'append' requires a 'text' argument".into())
                })?;
                let entry = self.store.append(text).await;
                Ok(format!(
                    "Recorded at {}: {}",
                    entry.at.format("%Y-%m-%d %H:%M:%S"),
                    entry.text
                ))
            }
            "search" => {
                let query = arguments["query"].as_str().ok_or_else(|| {
                    ToolError::InvalidArguments("'search' requires a 'query' argument".into())
                })?;
                let limit = arguments["limit"].as_u64().unwrap_or(5) as usize;
                let hits = self.store.search(query, limit).await;
                if hits.is_empty() {
                    return Ok(format!("No journal entries match '{query}'."));
                }
                let lines: Vec<String> = hits
                    .iter()
                    .map(|e| format!("[{}] {}", e.at.format("%Y-%m-%d %H:%M"), e.text))
                    .collect();
                Ok(lines.join("\n"))
            }
            other => Err(ToolError::InvalidArguments(format!(
                "Unknown action '{other}' (expected 'append' or 'search')"
            ))),
        }
    }
}
