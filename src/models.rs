// Data structures shared by the search client, the session and the HTTP routes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Backend contract ---

// Request body sent to the search service
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub message: String,
    pub pages: u32,
    pub start_page: u32,
}

// The query as the backend understood it. Every field is optional: the backend only
// echoes a range when it managed to infer one from the free text.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct QueryEcho {
    pub message: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pages: Option<u32>,
}

impl QueryEcho {
    /// Inferred budget range, when the backend reported both bounds.
    pub fn parsed_range(&self) -> Option<(f64, f64)> {
        Some((self.min?, self.max?))
    }
}

// Price as sent by the backend: a bare number or a free-form string
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawPrice {
    Number(serde_json::Number),
    Text(String),
}

// Column-oriented results. Columns may be shorter than `count` and may hold nulls.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RawResults {
    #[serde(default)]
    pub name: Vec<Option<String>>,
    #[serde(default)]
    pub price: Vec<Option<RawPrice>>,
    #[serde(default)]
    pub location: Vec<Option<String>>,
    #[serde(default)]
    pub date: Vec<Option<String>>,
    #[serde(default)]
    pub image: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub url: Option<Vec<Option<String>>>,
}

// Successful response body from the search service
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: QueryEcho,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub results: RawResults,
}

// Error body returned alongside a non-success status
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<String>,
}

// --- Normalized listing ---

// A single car listing with every display field guaranteed present
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CarListing {
    pub name: String,
    pub price: String,
    pub location: String,
    pub date: String,
    pub image: Option<String>,
    pub url: Option<String>,
}

// --- Conversation ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    pub sent_at: DateTime<Utc>,
}
