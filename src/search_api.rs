// Client for the remote car search service

use async_trait::async_trait;
use reqwest::{Client, Proxy};
use std::time::Duration;

use crate::{
    config::Settings,
    error::SearchError,
    models::{ErrorBody, SearchRequest, SearchResponse},
};

const DEFAULT_FAILURE_DETAIL: &str = "Failed to search cars";

/// Anything that can answer a search request. The session only talks to this trait.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError>;
}

// Builds the shared reqwest client from settings
pub fn build_client(settings: &Settings) -> anyhow::Result<Client> {
    let mut builder = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(settings.request_timeout())
        .connect_timeout(Duration::from_secs(10));

    if let Some(proxy_url) = settings.proxy_url.as_deref().filter(|p| !p.is_empty()) {
        builder = builder.proxy(Proxy::all(proxy_url)?);
        tracing::info!("Routing search requests through configured proxy.");
    }

    Ok(builder.build()?)
}

// Search backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpSearchBackend {
    client: Client,
    endpoint: String,
}

impl HttpSearchBackend {
    pub fn new(client: Client, base_url: &str) -> Self {
        let endpoint = format!("{}/search", base_url.trim_end_matches('/'));
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            start_page = request.start_page,
            pages = request.pages,
            "Sending search request"
        );

        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            // The body is only used for logging; fall back to a fixed detail if unreadable
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| DEFAULT_FAILURE_DETAIL.to_string());
            return Err(SearchError::Status { status, detail });
        }

        let body: SearchResponse = response.json().await?;
        tracing::debug!(
            start_page = request.start_page,
            count = body.count,
            "Received search response"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(start_page: u32) -> SearchRequest {
        SearchRequest {
            message: "I want a car for 300 million".to_string(),
            pages: 5,
            start_page,
        }
    }

    #[tokio::test]
    async fn posts_request_and_decodes_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_json(json!({
                "message": "I want a car for 300 million",
                "pages": 5,
                "start_page": 6
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"message": "I want a car for 300 million", "min": 270, "max": 330, "pages": 5},
                "count": 1,
                "results": {
                    "name": ["Golf 7"],
                    "price": [300],
                    "location": ["Alger"],
                    "date": ["2024-05-01"],
                    "url": ["https://example.test/golf"]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpSearchBackend::new(Client::new(), &format!("{}/", server.uri()));
        let response = backend.search(&request(6)).await.expect("search ok");

        assert_eq!(response.count, 1);
        assert_eq!(response.query.parsed_range(), Some((270.0, 330.0)));
        assert_eq!(response.results.name, vec![Some("Golf 7".to_string())]);
    }

    #[tokio::test]
    async fn error_status_carries_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"detail": "Could not parse budget"})),
            )
            .mount(&server)
            .await;

        let backend = HttpSearchBackend::new(Client::new(), &server.uri());
        match backend.search(&request(1)).await {
            Err(SearchError::Status { status, detail }) => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(detail, "Could not parse budget");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_status_without_body_uses_default_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let backend = HttpSearchBackend::new(Client::new(), &server.uri());
        match backend.search(&request(1)).await {
            Err(SearchError::Status { detail, .. }) => assert_eq!(detail, DEFAULT_FAILURE_DETAIL),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_success_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let backend = HttpSearchBackend::new(Client::new(), &server.uri());
        assert!(matches!(
            backend.search(&request(1)).await,
            Err(SearchError::Http(_))
        ));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let backend = HttpSearchBackend::new(Client::new(), "http://localhost:8000/");
        assert_eq!(backend.endpoint(), "http://localhost:8000/search");
    }
}
