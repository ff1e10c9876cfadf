// Budget-driven car search: a conversational session over a paged search service

pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod routes;
pub mod search_api;
pub mod session;

pub use session::SearchSession;
