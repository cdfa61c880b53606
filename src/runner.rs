//! Sentinel-framed rendering of one agent invocation.
//!
//! Callers parse stdout by the sentinel pairs, so the response is collected
//! fully before anything is printed. Nothing else may be written between the
//! sentinels.

use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, error};

use crate::descriptor::AgentDescriptor;
use crate::error::Result;
use crate::runtime::{AgentRuntime, RunChunk, RunRequest};

pub const RESPONSE_START: &str = "AGENT_RESPONSE_START";
pub const RESPONSE_END: &str = "AGENT_RESPONSE_END";
pub const ERROR_START: &str = "AGENT_ERROR_START";
pub const ERROR_END: &str = "AGENT_ERROR_END";

/// Final output of one invocation, ready to print.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub stdout: String,
    pub exit_code: i32,
}

pub fn frame_response(text: &str) -> String {
    format!("{RESPONSE_START}\n{text}\n{RESPONSE_END}\n")
}

pub fn frame_error(message: &str) -> String {
    format!("{ERROR_START}\n{message}\n{ERROR_END}\n")
}

/// Drains the run stream into the final response text. Function traffic is
/// counted for diagnostics but contributes no output.
pub async fn collect_response(
    runtime: &dyn AgentRuntime,
    agent: &AgentDescriptor,
    request: RunRequest,
) -> Result<String> {
    let mut stream = runtime.run_stream(agent, request).await?;
    let mut text = String::new();
    let mut chunks = 0usize;
    let mut tool_calls = 0usize;
    let mut tool_responses = 0usize;
    while let Some(item) = stream.next().await {
        let chunk = item?;
        chunks += 1;
        match &chunk {
            RunChunk::FunctionCall { name, .. } => {
                tool_calls += 1;
                debug!(tool = %name, "tool call streamed");
            }
            RunChunk::FunctionResponse { name, .. } => {
                tool_responses += 1;
                debug!(tool = %name, "tool response streamed");
            }
            RunChunk::Text(_) | RunChunk::Raw(_) => {}
        }
        if let Some(fragment) = chunk.display_text() {
            text.push_str(&fragment);
        }
    }
    debug!(chunks, tool_calls, tool_responses, "stream drained");
    Ok(text.trim().to_string())
}

/// Runs one invocation end to end and renders it for stdout. A context
/// payload that is not valid JSON fails the invocation before the runtime
/// is touched.
pub async fn invoke(
    runtime: &dyn AgentRuntime,
    agent: &AgentDescriptor,
    message: &str,
    context_json: Option<&str>,
) -> Rendered {
    let context = match context_json {
        None => Value::Object(Default::default()),
        Some(raw) => match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                error!(error = %err, "rejected context payload");
                return Rendered {
                    stdout: frame_error(&format!("Invalid context JSON: {err}")),
                    exit_code: 1,
                };
            }
        },
    };

    let request = RunRequest::new(message, context);
    match collect_response(runtime, agent, request).await {
        Ok(text) => Rendered {
            stdout: frame_response(&text),
            exit_code: 0,
        },
        Err(err) => {
            error!(error = %err, agent = %agent.name, "agent invocation failed");
            Rendered {
                stdout: frame_error(&format!("Error: {err}")),
                exit_code: 1,
            }
        }
    }
}
