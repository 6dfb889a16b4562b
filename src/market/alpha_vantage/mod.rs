//! Alpha Vantage market data adapter

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::market::MarketDataProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Alpha Vantage query API implementation
pub struct AlphaVantageProvider {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Issue one GET against the query endpoint
    async fn query(&self, params: &[(&str, &str)]) -> Result<Value> {
        debug!("Alpha Vantage request: {:?}", params);

        let response = self
            .client
            .get(self.base_url.clone())
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        screen_body(body)
    }
}

/// Reject bodies that carry an API error or a throttling notice instead of data
pub(crate) fn screen_body(body: Value) -> Result<Value> {
    let object = body
        .as_object()
        .ok_or_else(|| AppError::MalformedPayload("Response is not a JSON object".to_string()))?;

    if let Some(message) = object.get("Error Message") {
        return Err(AppError::Upstream(text_of(message)));
    }

    // "Note" is the classic throttling notice; newer keys use "Information"
    for key in ["Note", "Information"] {
        if let Some(note) = object.get(key) {
            return Err(AppError::RateLimited(text_of(note)));
        }
    }

    Ok(body)
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn global_quote(&self, symbol: &str) -> Result<Value> {
        self.query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)]).await
    }

    async fn daily_series(&self, symbol: &str) -> Result<Value> {
        self.query(&[("function", "TIME_SERIES_DAILY"), ("symbol", symbol)]).await
    }

    async fn top_gainers_losers(&self) -> Result<Value> {
        self.query(&[("function", "TOP_GAINERS_LOSERS")]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    async fn fake_query(
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if params.get("apikey").map(String::as_str) != Some("test-key") {
            return (StatusCode::OK, Json(json!({ "Error Message": "Invalid API key" })));
        }

        let function = params.get("function").cloned().unwrap_or_default();
        let symbol = params.get("symbol").cloned().unwrap_or_default();

        match (function.as_str(), symbol.as_str()) {
            ("GLOBAL_QUOTE", "BOOM") => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
            ("GLOBAL_QUOTE", "BUSY") => (
                StatusCode::OK,
                Json(json!({
                    "Note": "Thank you for using Alpha Vantage! \
                             Our standard API call frequency is 5 calls per minute"
                })),
            ),
            ("GLOBAL_QUOTE", "BAD") => (
                StatusCode::OK,
                Json(json!({ "Error Message": "Invalid API call." })),
            ),
            ("GLOBAL_QUOTE", s) => (
                StatusCode::OK,
                Json(json!({ "Global Quote": { "01. symbol": s, "05. price": "175.8400" } })),
            ),
            ("TOP_GAINERS_LOSERS", _) => (
                StatusCode::OK,
                Json(json!({ "Information": "This is a premium endpoint." })),
            ),
            _ => (StatusCode::OK, Json(json!([]))),
        }
    }

    async fn spawn_upstream() -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/query", get(fake_query));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{}/query", addr)).unwrap()
    }

    fn provider(base_url: Url, api_key: &str) -> AlphaVantageProvider {
        AlphaVantageProvider::new(&ProviderConfig {
            api_key: api_key.to_string(),
            base_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_global_quote_success() {
        let provider = provider(spawn_upstream().await, "test-key");
        let body = provider.global_quote("AAPL").await.unwrap();
        assert_eq!(body["Global Quote"]["01. symbol"], "AAPL");
    }

    #[tokio::test]
    async fn test_failure_classification() {
        let provider = provider(spawn_upstream().await, "test-key");

        let err = provider.global_quote("BOOM").await.unwrap_err();
        assert!(matches!(err, AppError::Status(500)));

        let err = provider.global_quote("BUSY").await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited(_)));

        let err = provider.global_quote("BAD").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref m) if m == "Invalid API call."));

        let err = provider.top_gainers_losers().await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited(_)));

        let err = provider.daily_series("AAPL").await.unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn test_api_key_is_sent() {
        let provider = provider(spawn_upstream().await, "wrong-key");
        let err = provider.global_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref m) if m == "Invalid API key"));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/query", addr)).unwrap();
        let err = provider(url, "test-key").global_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, AppError::Http(_)));
    }

    #[test]
    fn test_screen_body_passes_data() {
        let body = json!({ "Time Series (Daily)": {} });
        assert!(screen_body(body).is_ok());
    }
}
