//! In-process tool for verifying tool-call plumbing without the network.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Result, SidelineError};
use crate::tool::{Tool, ToolRegistry};

/// Registry with only [`SimpleSearchTool`] registered.
pub fn probe_toolkit() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(SimpleSearchTool);
    registry
}

/// Echoes a canned result for any query.
pub struct SimpleSearchTool;

#[async_trait]
impl Tool for SimpleSearchTool {
    fn name(&self) -> &str {
        "simple_search"
    }

    fn description(&self) -> &str {
        "Return a canned search result for the given query."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Term to search for"
                }
            },
            "required": ["query"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let query = input
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| SidelineError::Protocol("missing `query` for simple_search".into()))?;
        Ok(json!({ "result": format!("Found result for: {query}") }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_a_canned_result() {
        let registry = probe_toolkit();

        let value = registry
            .call("simple_search", json!({"query": "Arsenal"}))
            .await
            .unwrap();

        assert_eq!(value["result"], json!("Found result for: Arsenal"));
    }

    #[tokio::test]
    async fn missing_query_is_an_error() {
        let registry = probe_toolkit();

        let err = registry.call("simple_search", json!({})).await.unwrap_err();

        assert!(err.to_string().contains("simple_search"));
    }
}
