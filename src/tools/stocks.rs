//! Stock quote lookup backed by the Yahoo Finance quote endpoint.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::{Result, SidelineError};
use crate::tool::{Tool, ToolRegistry};
use crate::tools::response::{
    classify_transport_error, compile_query_pattern, response_date, validate_query, ToolResponse,
};

pub const DEFAULT_QUOTES_ENDPOINT: &str = "https://query1.finance.yahoo.com";

const API_SOURCE: &str = "Yahoo Finance";
// The quote endpoint rejects obviously non-browser agents.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; sideline/0.1)";

/// Settings for the stock toolkit.
#[derive(Debug, Clone)]
pub struct StockConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_QUOTES_ENDPOINT.to_string(),
            timeout_secs: 10,
        }
    }
}

impl StockConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Registry with the Yahoo Finance-backed tools registered.
pub fn stock_toolkit(config: &StockConfig) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(GetStockPriceTool::from_config(config)?);
    Ok(registry)
}

/// Fetches the current quote for a ticker symbol.
pub struct GetStockPriceTool {
    client: reqwest::Client,
    endpoint: String,
    pattern: Regex,
}

impl GetStockPriceTool {
    pub fn from_config(config: &StockConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        reqwest::Url::parse(&endpoint)
            .map_err(|err| SidelineError::Protocol(format!("invalid quotes endpoint: {err}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| SidelineError::Runtime(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            pattern: compile_query_pattern()?,
        })
    }

    async fn quote(&self, ticker: &str) -> Result<ToolResponse> {
        let term = match validate_query(ticker, &self.pattern, "ticker symbol") {
            Ok(term) => term.to_uppercase(),
            Err(resp) => {
                warn!(input = ticker, "rejected stock quote input");
                return Ok(resp);
            }
        };

        info!(ticker = %term, "fetching stock quote");
        let url = format!(
            "{}/v7/finance/quote?symbols={}",
            self.endpoint,
            urlencoding::encode(&term)
        );
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "stock API request failed");
                return Ok(classify_transport_error(&err, "stock API", "fetching stock data"));
            }
        };

        let retrieved_at = response_date(&response);
        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "stock API returned an error status");
            return Ok(ToolResponse::technical(
                format!("Failed to retrieve stock information for '{term}'. Please try again later."),
                format!("stock API responded with HTTP {status}"),
            ));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "failed to read stock API response body");
                return Ok(classify_transport_error(&err, "stock API", "fetching stock data"));
            }
        };
        let parsed: QuoteBody = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "stock API returned an unexpected body");
                return Ok(ToolResponse::api(
                    "Invalid response format from stock API",
                    err.to_string(),
                ));
            }
        };
        let envelope = match parsed.quote_response {
            Some(envelope) => envelope,
            None => {
                warn!("stock API body is missing the quote envelope");
                return Ok(ToolResponse::api(
                    "Invalid response format from stock API",
                    "missing `quoteResponse` field".to_string(),
                ));
            }
        };

        let quotes: Vec<Value> = envelope
            .result
            .into_iter()
            .filter_map(|record| serde_json::from_value::<QuoteRecord>(record).ok())
            .map(|record| record.normalized(&term))
            .collect();

        if quotes.is_empty() {
            info!(ticker = %term, "no quotes found");
            return Ok(ToolResponse::ok(
                json!({
                    "quotes": [],
                    "count": 0,
                    "search_term": term,
                    "api_source": API_SOURCE,
                    "retrieved_at": retrieved_at,
                }),
                format!("No stock data found for '{term}'. Verify the ticker symbol and try again."),
            ));
        }

        let count = quotes.len();
        info!(ticker = %term, count, "stock quote succeeded");
        Ok(ToolResponse::ok(
            json!({
                "quotes": quotes,
                "count": count,
                "search_term": term,
                "api_source": API_SOURCE,
                "retrieved_at": retrieved_at,
            }),
            format!("Found {count} quote(s) for '{term}'"),
        ))
    }
}

#[async_trait]
impl Tool for GetStockPriceTool {
    fn name(&self) -> &str {
        "get_stock_price"
    }

    fn description(&self) -> &str {
        "Get the current price, daily range, and currency for a stock ticker symbol."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol, e.g. 'AAPL'"
                }
            },
            "required": ["ticker"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let ticker = input
            .get("ticker")
            .and_then(Value::as_str)
            .unwrap_or_default();
        self.quote(ticker).await?.into_value()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire structures
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QuoteBody {
    #[serde(rename = "quoteResponse")]
    quote_response: Option<QuoteEnvelope>,
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(default)]
    result: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct QuoteRecord {
    symbol: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
    #[serde(rename = "regularMarketPrice")]
    price: Option<f64>,
    #[serde(rename = "regularMarketDayHigh")]
    day_high: Option<f64>,
    #[serde(rename = "regularMarketDayLow")]
    day_low: Option<f64>,
    currency: Option<String>,
}

impl QuoteRecord {
    /// Prices absent from the feed stay null so callers can tell "not
    /// traded" apart from zero.
    fn normalized(self, requested: &str) -> Value {
        json!({
            "ticker": self.symbol.unwrap_or_else(|| requested.to_string()),
            "company_name": self.short_name.unwrap_or_else(|| "Unknown".to_string()),
            "current_price": self.price,
            "daily_high": self.day_high,
            "daily_low": self.day_low,
            "currency": self.currency.unwrap_or_else(|| "USD".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn toolkit_for(server: &MockServer) -> ToolRegistry {
        let config = StockConfig::default()
            .with_endpoint(server.uri())
            .with_timeout_secs(1);
        stock_toolkit(&config).unwrap()
    }

    #[tokio::test]
    async fn maps_and_defaults_quote_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/quote"))
            .and(query_param("symbols", "AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "quoteResponse": {
                    "result": [{
                        "symbol": "AAPL",
                        "regularMarketPrice": 189.75,
                        "regularMarketDayHigh": 191.2,
                        "regularMarketDayLow": 188.1
                    }],
                    "error": null
                }
            })))
            .mount(&server)
            .await;

        let registry = toolkit_for(&server);
        let value = registry
            .call("get_stock_price", json!({"ticker": "aapl"}))
            .await
            .unwrap();

        assert_eq!(value["success"], json!(true));
        assert_eq!(value["message"], json!("Found 1 quote(s) for 'AAPL'"));
        let quote = &value["data"]["quotes"][0];
        assert_eq!(quote["ticker"], json!("AAPL"));
        assert_eq!(quote["company_name"], json!("Unknown"));
        assert_eq!(quote["current_price"], json!(189.75));
        assert_eq!(quote["currency"], json!("USD"));
        assert_eq!(value["data"]["api_source"], json!("Yahoo Finance"));
    }

    #[tokio::test]
    async fn empty_result_is_a_success_with_no_quotes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "quoteResponse": {"result": [], "error": null}
            })))
            .mount(&server)
            .await;

        let registry = toolkit_for(&server);
        let value = registry
            .call("get_stock_price", json!({"ticker": "ZZZZ"}))
            .await
            .unwrap();

        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"]["count"], json!(0));
        assert_eq!(
            value["message"],
            json!("No stock data found for 'ZZZZ'. Verify the ticker symbol and try again.")
        );
    }

    #[tokio::test]
    async fn missing_quote_envelope_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"finance": {}})))
            .mount(&server)
            .await;

        let registry = toolkit_for(&server);
        let value = registry
            .call("get_stock_price", json!({"ticker": "AAPL"}))
            .await
            .unwrap();

        assert_eq!(value["error_kind"], json!("api_error"));
        assert_eq!(value["error"], json!("Invalid response format from stock API"));
    }

    #[tokio::test]
    async fn invalid_ticker_never_reaches_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let registry = toolkit_for(&server);
        let value = registry
            .call("get_stock_price", json!({"ticker": "AAPL;rm"}))
            .await
            .unwrap();

        assert_eq!(value["error_kind"], json!("validation_failed"));
    }

    #[tokio::test]
    async fn rate_limited_server_maps_to_technical_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/quote"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let registry = toolkit_for(&server);
        let value = registry
            .call("get_stock_price", json!({"ticker": "AAPL"}))
            .await
            .unwrap();

        assert_eq!(value["error_kind"], json!("technical_error"));
        assert!(value["technical_detail"].as_str().unwrap().contains("429"));
        assert_eq!(
            value["error"],
            json!("Failed to retrieve stock information for 'AAPL'. Please try again later.")
        );
    }
}
