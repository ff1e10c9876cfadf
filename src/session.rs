//! Conversation state for one browsing session.
//!
//! A [`SearchSession`] turns submitted budget phrases into paged fetches against a
//! [`SearchBackend`] and accumulates the normalized listings. A search lineage starts
//! with [`SearchSession::submit`] and grows through [`SearchSession::load_more`] until
//! the next successful submit replaces it.
//!
//! Listings are de-duplicated by url within a lineage: a listing whose url was already
//! shown is skipped, listings without a url are always kept.
//!
//! At most one fetch is in flight. A call that arrives while another one is running is
//! rejected with [`Rejection::Busy`] and leaves the state untouched; nothing is queued.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use crate::{
    models::{CarListing, ChatMessage, MessageId, QueryEcho, Role, SearchRequest},
    normalize::normalize_results,
    search_api::SearchBackend,
};

pub const DEFAULT_PAGE_WINDOW_SIZE: u32 = 5;
pub const MAX_PAGE_WINDOW_SIZE: u32 = 100;

const GREETING: &str = "Hello! I can help you find cars based on your budget. Just tell me how much you want to spend (in millions), and I'll search for available cars on Ouedkniss.";
const GREETING_EXAMPLES: [&str; 3] = [
    "I want a car for 300 million",
    "Show me cars around 500 million",
    "Bghit siyara b 400 million",
];
const NO_MATCHES: &str = "Sorry, I couldn't find any cars matching your criteria. Try adjusting your budget or search terms.";
const SUBMIT_FAILED: &str = "Sorry, something went wrong. Please try again.";
const LOAD_MORE_FAILED: &str = "Sorry, something went wrong while loading more cars.";

/// Why a call was refused before any fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rejection {
    EmptyQuery,
    Busy,
    NoActiveSearch,
}

impl Rejection {
    pub fn describe(self) -> &'static str {
        match self {
            Rejection::EmptyQuery => "Query text must not be empty",
            Rejection::Busy => "A search is already in progress",
            Rejection::NoActiveSearch => "There is no search to continue",
        }
    }
}

/// Result signal of a session operation. Failures are already reflected in the
/// message log; this only tells the caller how to update its controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Outcome {
    Loaded { count: usize },
    NoMatches,
    Appended { added: usize },
    Failed,
    Rejected { reason: Rejection },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::Loaded { .. } | Outcome::NoMatches | Outcome::Appended { .. }
        )
    }
}

// The search currently being paged
#[derive(Debug, Clone)]
struct Lineage {
    query: String,
    next_start_page: Option<u32>,
}

#[derive(Debug)]
struct SessionState {
    messages: Vec<ChatMessage>,
    listings: Vec<CarListing>,
    lineage: Option<Lineage>,
}

/// Point-in-time copy of the session for presentation layers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub messages: Vec<ChatMessage>,
    pub listings: Vec<CarListing>,
    pub busy: bool,
    pub active_query: Option<String>,
    pub next_start_page: Option<u32>,
    pub show_results: bool,
    pub can_load_more: bool,
}

// Holds the busy flag for the lifetime of one fetch; clears it on drop
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SearchSession {
    backend: Arc<dyn SearchBackend>,
    page_window_size: u32,
    busy: AtomicBool,
    next_message_id: AtomicU64,
    state: Mutex<SessionState>,
}

impl SearchSession {
    pub fn new(backend: Arc<dyn SearchBackend>, page_window_size: u32) -> Self {
        let session = Self {
            backend,
            page_window_size: page_window_size.clamp(1, MAX_PAGE_WINDOW_SIZE),
            busy: AtomicBool::new(false),
            next_message_id: AtomicU64::new(1),
            state: Mutex::new(SessionState {
                messages: Vec::new(),
                listings: Vec::new(),
                lineage: None,
            }),
        };
        session.greet(&mut session.lock_state());
        session
    }

    pub fn page_window_size(&self) -> u32 {
        self.page_window_size
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Starts a fresh search for `query_text`.
    ///
    /// The user message is logged before the fetch. On success the accumulated
    /// listings are replaced by the first window of results. On failure the previous
    /// lineage (listings and cursor) is kept and a generic failure message is logged.
    pub async fn submit(&self, query_text: &str) -> Outcome {
        let query = query_text.trim();
        if query.is_empty() {
            return Outcome::Rejected { reason: Rejection::EmptyQuery };
        }
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!("[SESSION] submit rejected: fetch already in flight");
            return Outcome::Rejected { reason: Rejection::Busy };
        };

        self.push_message(&mut self.lock_state(), Role::User, query.to_string());
        tracing::info!(query, "[SESSION] Submitting new search");

        let request = self.request(query, 1);
        let result = self.backend.search(&request).await;

        let mut state = self.lock_state();
        match result {
            Ok(response) => {
                let mut listings = Vec::new();
                let count = merge_unique(&mut listings, normalize_results(&response.results, response.count));
                tracing::info!(count, reported = response.count, "[SESSION] First window loaded");

                let next_start_page =
                    (count > 0).then(|| request.start_page.saturating_add(self.page_window_size));
                state.listings = listings;
                state.lineage = Some(Lineage {
                    query: query.to_string(),
                    next_start_page,
                });

                if count == 0 {
                    self.push_message(&mut state, Role::Assistant, NO_MATCHES.to_string());
                    Outcome::NoMatches
                } else {
                    self.push_message(&mut state, Role::Assistant, summary(&response.query, count));
                    Outcome::Loaded { count }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "[SESSION] Search request failed");
                self.push_message(&mut state, Role::Assistant, SUBMIT_FAILED.to_string());
                Outcome::Failed
            }
        }
    }

    /// Fetches the next window of the active search and appends it.
    ///
    /// Always pages the query that started the lineage. The cursor advances on every
    /// successful fetch, including one that returns nothing: an exhausted backend is
    /// indistinguishable from an empty window, so callers should stop once
    /// `Appended { added: 0 }` comes back.
    pub async fn load_more(&self) -> Outcome {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!("[SESSION] load_more rejected: fetch already in flight");
            return Outcome::Rejected { reason: Rejection::Busy };
        };

        let request = {
            let state = self.lock_state();
            match &state.lineage {
                Some(Lineage {
                    query,
                    next_start_page: Some(start_page),
                }) => self.request(query, *start_page),
                _ => return Outcome::Rejected { reason: Rejection::NoActiveSearch },
            }
        };
        tracing::info!(start_page = request.start_page, "[SESSION] Loading more results");

        let result = self.backend.search(&request).await;

        let mut state = self.lock_state();
        match result {
            Ok(response) => {
                let incoming = normalize_results(&response.results, response.count);
                let added = merge_unique(&mut state.listings, incoming);
                if let Some(lineage) = state.lineage.as_mut() {
                    lineage.next_start_page = Some(request.start_page.saturating_add(self.page_window_size));
                }
                tracing::info!(added, total = state.listings.len(), "[SESSION] Appended results");
                Outcome::Appended { added }
            }
            Err(e) => {
                tracing::warn!(error = %e, start_page = request.start_page, "[SESSION] Load more failed");
                self.push_message(&mut state, Role::Assistant, LOAD_MORE_FAILED.to_string());
                Outcome::Failed
            }
        }
    }

    /// Ends the current conversation and starts a new one holding only the greeting.
    pub fn reset(&self) -> Result<(), Rejection> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            return Err(Rejection::Busy);
        };
        let mut state = self.lock_state();
        state.messages.clear();
        state.listings.clear();
        state.lineage = None;
        self.greet(&mut state);
        tracing::info!("[SESSION] Conversation reset");
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let busy = self.is_busy();
        let state = self.lock_state();
        let next_start_page = state.lineage.as_ref().and_then(|l| l.next_start_page);
        SessionSnapshot {
            messages: state.messages.clone(),
            listings: state.listings.clone(),
            busy,
            active_query: state.lineage.as_ref().map(|l| l.query.clone()),
            next_start_page,
            show_results: !state.listings.is_empty(),
            can_load_more: !busy && next_start_page.is_some(),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock_state().messages.clone()
    }

    pub fn listings(&self) -> Vec<CarListing> {
        self.lock_state().listings.clone()
    }

    pub fn next_start_page(&self) -> Option<u32> {
        self.lock_state()
            .lineage
            .as_ref()
            .and_then(|l| l.next_start_page)
    }

    fn request(&self, query: &str, start_page: u32) -> SearchRequest {
        SearchRequest {
            message: query.to_string(),
            pages: self.page_window_size,
            start_page,
        }
    }

    // The lock is never held across an await, so a poisoned mutex still holds consistent data
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn greet(&self, state: &mut SessionState) {
        let id = self.next_id();
        state.messages.push(ChatMessage {
            id,
            role: Role::Assistant,
            text: GREETING.to_string(),
            examples: GREETING_EXAMPLES.iter().map(|e| e.to_string()).collect(),
            sent_at: Utc::now(),
        });
    }

    fn push_message(&self, state: &mut SessionState, role: Role, text: String) {
        let id = self.next_id();
        state.messages.push(ChatMessage {
            id,
            role,
            text,
            examples: Vec::new(),
            sent_at: Utc::now(),
        });
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_message_id.fetch_add(1, Ordering::Relaxed))
    }
}

// Appends listings whose url has not been seen yet, in arrival order; returns how many were added
fn merge_unique(existing: &mut Vec<CarListing>, incoming: Vec<CarListing>) -> usize {
    let mut seen: HashSet<String> = existing.iter().filter_map(|l| l.url.clone()).collect();
    let before = existing.len();
    existing.extend(incoming.into_iter().filter(|listing| match &listing.url {
        Some(url) => seen.insert(url.clone()),
        None => true,
    }));
    existing.len() - before
}

// Assistant summary for a non-empty first window
fn summary(query: &QueryEcho, count: usize) -> String {
    let Some((min, max)) = query.parsed_range() else {
        return format!("Found {} cars in the specified price range.", count);
    };
    let mut text = match &query.message {
        Some(message) => format!("I found {} cars for your search: \"{}\"\n\n", count, message),
        None => format!("I found {} cars.\n\n", count),
    };
    text.push_str(&format!("Searching in price range: {} - {} million", min, max));
    if let Some(pages) = query.pages {
        text.push_str(&format!("\nPages searched: {}", pages));
    }
    text
}
