//! Nationality prediction backed by the nationalize.io API.

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

pub const DEFAULT_NATIONALIZE_ENDPOINT: &str = "https://api.nationalize.io";

const API_SOURCE: &str = "nationalize.io";
const USER_AGENT: &str = "sideline-agent/0.1";

/// Settings for the nationality toolkit.
#[derive(Debug, Clone)]
pub struct NationalityConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for NationalityConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_NATIONALIZE_ENDPOINT.to_string(),
            timeout_secs: 10,
        }
    }
}

impl NationalityConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Registry with the nationalize.io-backed tools registered.
pub fn nationality_toolkit(config: &NationalityConfig) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(PredictNationalityTool::from_config(config)?);
    Ok(registry)
}

/// Estimates likely countries of origin for a first name.
pub struct PredictNationalityTool {
    client: reqwest::Client,
    endpoint: String,
    pattern: Regex,
}

impl PredictNationalityTool {
    pub fn from_config(config: &NationalityConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        reqwest::Url::parse(&endpoint).map_err(|err| {
            SidelineError::Protocol(format!("invalid nationalize endpoint: {err}"))
        })?;
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

    async fn predict(&self, name: &str) -> Result<ToolResponse> {
        let term = match validate_query(name, &self.pattern, "name") {
            Ok(term) => term,
            Err(resp) => {
                warn!(input = name, "rejected nationality input");
                return Ok(resp);
            }
        };

        info!(name = %term, "predicting nationality");
        let url = format!("{}/?name={}", self.endpoint, urlencoding::encode(&term));
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "nationality API request failed");
                return Ok(classify_transport_error(
                    &err,
                    "nationality API",
                    "predicting nationality",
                ));
            }
        };

        let retrieved_at = response_date(&response);
        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "nationality API returned an error status");
            return Ok(ToolResponse::technical(
                format!("Unable to predict nationality for '{term}'. Please try again later."),
                format!("nationality API responded with HTTP {status}"),
            ));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "failed to read nationality API response body");
                return Ok(classify_transport_error(
                    &err,
                    "nationality API",
                    "predicting nationality",
                ));
            }
        };
        let parsed: NationalizeBody = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "nationality API returned an unexpected body");
                return Ok(ToolResponse::api(
                    "Invalid response format from nationality API",
                    err.to_string(),
                ));
            }
        };

        let predictions: Vec<Value> = parsed
            .country
            .unwrap_or_default()
            .into_iter()
            .filter_map(|record| serde_json::from_value::<CountryScore>(record).ok())
            .map(|record| record.normalized())
            .collect();

        if predictions.is_empty() {
            info!(name = %term, "no nationality data");
            return Ok(ToolResponse::ok(
                json!({
                    "name": term,
                    "predictions": [],
                    "count": 0,
                    "api_source": API_SOURCE,
                    "retrieved_at": retrieved_at,
                }),
                format!("No nationality data found for '{term}'. Try a different name."),
            ));
        }

        let count = predictions.len();
        info!(name = %term, count, "nationality prediction succeeded");
        Ok(ToolResponse::ok(
            json!({
                "name": term,
                "predictions": predictions,
                "count": count,
                "api_source": API_SOURCE,
                "retrieved_at": retrieved_at,
            }),
            format!("Found {count} nationality prediction(s) for '{term}'"),
        ))
    }
}

#[async_trait]
impl Tool for PredictNationalityTool {
    fn name(&self) -> &str {
        "predict_nationality"
    }

    fn description(&self) -> &str {
        "Predict the most likely countries of origin for a first name, with probabilities."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "First name to analyse, e.g. 'johnson'"
                }
            },
            "required": ["name"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let name = input.get("name").and_then(Value::as_str).unwrap_or_default();
        self.predict(name).await?.into_value()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire structures
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct NationalizeBody {
    country: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct CountryScore {
    country_id: Option<String>,
    probability: Option<f64>,
}

impl CountryScore {
    fn normalized(self) -> Value {
        json!({
            "country_id": self.country_id.unwrap_or_else(|| "Unknown".to_string()),
            "probability": self.probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn toolkit_for(server: &MockServer) -> ToolRegistry {
        let config = NationalityConfig::default()
            .with_endpoint(server.uri())
            .with_timeout_secs(1);
        nationality_toolkit(&config).unwrap()
    }

    #[tokio::test]
    async fn returns_ranked_predictions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("name", "johnson"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 498678,
                "name": "johnson",
                "country": [
                    {"country_id": "JM", "probability": 0.0914},
                    {"country_id": "US", "probability": 0.0491},
                    {"country_id": "NG", "probability": 0.0465}
                ]
            })))
            .mount(&server)
            .await;

        let registry = toolkit_for(&server);
        let value = registry
            .call("predict_nationality", json!({"name": "johnson"}))
            .await
            .unwrap();

        assert_eq!(value["success"], json!(true));
        assert_eq!(
            value["message"],
            json!("Found 3 nationality prediction(s) for 'johnson'")
        );
        assert_eq!(value["data"]["count"], json!(3));
        assert_eq!(value["data"]["predictions"][0]["country_id"], json!("JM"));
        assert_eq!(value["data"]["predictions"][0]["probability"], json!(0.0914));
        assert_eq!(value["data"]["api_source"], json!("nationalize.io"));
    }

    #[tokio::test]
    async fn empty_country_list_is_a_success_with_no_predictions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 0,
                "name": "zzzzz",
                "country": []
            })))
            .mount(&server)
            .await;

        let registry = toolkit_for(&server);
        let value = registry
            .call("predict_nationality", json!({"name": "zzzzz"}))
            .await
            .unwrap();

        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"]["count"], json!(0));
        assert_eq!(
            value["message"],
            json!("No nationality data found for 'zzzzz'. Try a different name.")
        );
    }

    #[tokio::test]
    async fn scores_without_country_id_fall_back_to_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 10,
                "name": "kai",
                "country": [{"probability": 0.5}]
            })))
            .mount(&server)
            .await;

        let registry = toolkit_for(&server);
        let value = registry
            .call("predict_nationality", json!({"name": "kai"}))
            .await
            .unwrap();

        assert_eq!(value["data"]["predictions"][0]["country_id"], json!("Unknown"));
        assert_eq!(value["data"]["predictions"][0]["probability"], json!(0.5));
    }

    #[tokio::test]
    async fn invalid_name_never_reaches_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let registry = toolkit_for(&server);
        let value = registry
            .call("predict_nationality", json!({"name": ""}))
            .await
            .unwrap();

        assert_eq!(value["error_kind"], json!("validation_failed"));
        assert_eq!(
            value["error"],
            json!("Invalid name provided. Please provide a valid name string.")
        );
    }

    #[tokio::test]
    async fn rate_limited_server_maps_to_technical_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let registry = toolkit_for(&server);
        let value = registry
            .call("predict_nationality", json!({"name": "johnson"}))
            .await
            .unwrap();

        assert_eq!(value["error_kind"], json!("technical_error"));
        assert!(value["technical_detail"].as_str().unwrap().contains("429"));
    }
}
