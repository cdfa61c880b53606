//! Execution boundary between agent descriptors and the hosted engine.
//!
//! An [`AgentRuntime`] turns a [`RunRequest`] into a stream of [`RunChunk`]s.
//! [`EngineRuntime`] talks SSE to a remote engine; [`ScriptedRuntime`] replays
//! canned steps for tests and offline use.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::descriptor::AgentDescriptor;
use crate::error::{Result, SidelineError};
use crate::hooks::AgentHook;

/// One user turn handed to a runtime.
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    pub invocation_id: Uuid,
    pub message: String,
    pub context: Value,
}

impl RunRequest {
    pub fn new(message: impl Into<String>, context: Value) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            message: message.into(),
            context,
        }
    }
}

/// One streamed event, classified once at the engine boundary. Events that
/// fit none of the known part shapes are preserved as [`RunChunk::Raw`]
/// rather than dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum RunChunk {
    Text(String),
    FunctionCall { name: String, arguments: Value },
    FunctionResponse { name: String, output: Value },
    Raw(Value),
}

impl RunChunk {
    /// Classifies one event part. A part carrying several markers is taken
    /// in the order text, function call, function response.
    pub fn from_part(part: Value) -> Self {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            return RunChunk::Text(text.to_string());
        }
        if let Some(call) = part.get("functionCall") {
            if let Some(name) = call.get("name").and_then(Value::as_str) {
                let arguments = call.get("args").cloned().unwrap_or_else(|| json!({}));
                return RunChunk::FunctionCall {
                    name: name.to_string(),
                    arguments,
                };
            }
        }
        if let Some(response) = part.get("functionResponse") {
            if let Some(name) = response.get("name").and_then(Value::as_str) {
                let output = response.get("response").cloned().unwrap_or(Value::Null);
                return RunChunk::FunctionResponse {
                    name: name.to_string(),
                    output,
                };
            }
        }
        RunChunk::Raw(part)
    }

    /// Contribution of this chunk to the rendered response. Function traffic
    /// yields nothing.
    pub fn display_text(&self) -> Option<String> {
        match self {
            RunChunk::Text(text) => Some(text.clone()),
            RunChunk::Raw(value) => Some(value.to_string()),
            RunChunk::FunctionCall { .. } | RunChunk::FunctionResponse { .. } => None,
        }
    }
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<RunChunk>> + Send>>;

/// Executes an agent run and streams back the chunks.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn run_stream(&self, agent: &AgentDescriptor, request: RunRequest) -> Result<ChunkStream>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine runtime
// ─────────────────────────────────────────────────────────────────────────────

/// Client for a hosted engine speaking `streamQuery` over SSE.
pub struct EngineRuntime {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl EngineRuntime {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        reqwest::Url::parse(&endpoint)
            .map_err(|err| SidelineError::Protocol(format!("invalid engine endpoint: {err}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| SidelineError::Runtime(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl AgentRuntime for EngineRuntime {
    async fn run_stream(&self, agent: &AgentDescriptor, request: RunRequest) -> Result<ChunkStream> {
        for hook in &agent.hooks {
            hook.before_agent(&agent.name, &request).await?;
        }

        let url = format!(
            "{}/v1/agents/{}:streamQuery?alt=sse",
            self.endpoint,
            urlencoding::encode(&agent.name)
        );
        let mut outbound = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            outbound = outbound.bearer_auth(key);
        }
        let response = outbound
            .send()
            .await
            .map_err(|err| SidelineError::Runtime(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SidelineError::Runtime(format!(
                "engine request failed with {status}: {body}"
            )));
        }

        let (tx, rx) = mpsc::channel(16);
        let agent_name = agent.name.clone();
        let hooks = agent.hooks.clone();
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut lines = SseLineBuffer::new();
            let mut transcript = String::new();
            let mut done = false;
            while !done {
                let datas = match stream.next().await {
                    Some(Ok(bytes)) => lines.push(&bytes),
                    Some(Err(err)) => {
                        let _ = tx
                            .send(Err(SidelineError::Runtime(format!(
                                "engine stream error: {err}"
                            ))))
                            .await;
                        return;
                    }
                    None => {
                        done = true;
                        lines.finish()
                    }
                };
                for data in datas {
                    for part in event_parts(&data) {
                        let chunk = RunChunk::from_part(part);
                        let observed = match &chunk {
                            RunChunk::Text(text) => {
                                transcript.push_str(text);
                                Ok(())
                            }
                            RunChunk::FunctionCall { name, arguments } => {
                                notify_tool_call(&hooks, &agent_name, name, arguments).await
                            }
                            RunChunk::FunctionResponse { name, output } => {
                                notify_tool_result(&hooks, &agent_name, name, output).await
                            }
                            RunChunk::Raw(_) => Ok(()),
                        };
                        if let Err(err) = observed {
                            let _ = tx.send(Err(err)).await;
                            return;
                        }
                        if tx.send(Ok(chunk)).await.is_err() {
                            return;
                        }
                    }
                }
            }
            for hook in &hooks {
                if let Err(err) = hook.after_agent(&agent_name, transcript.trim()).await {
                    let _ = tx.send(Err(err)).await;
                    return;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Reassembles SSE `data:` lines from a byte stream. Network reads may cut
/// an event anywhere, including inside a multi-byte character, so bytes are
/// buffered raw and only complete lines are decoded. Keep-alive comments,
/// blank lines and `[DONE]` are dropped.
struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        self.drain_complete_lines()
    }

    /// Flushes a final event not terminated by a newline.
    fn finish(&mut self) -> Vec<String> {
        self.buffer.push(b'\n');
        self.drain_complete_lines()
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&byte| byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            // A newline byte never falls inside a multi-byte UTF-8
            // character, so a complete line always decodes cleanly.
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();
            if !line.starts_with("data:") {
                continue;
            }
            let data = line.trim_start_matches("data:").trim();
            if data.is_empty() || data == "[DONE]" {
                continue;
            }
            payloads.push(data.to_string());
        }
        payloads
    }
}

/// Parts of one SSE event. Events without a `content.parts` array are
/// treated as a single part; unparseable events are logged and skipped.
fn event_parts(data: &str) -> Vec<Value> {
    let event: Value = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "skipping unparseable engine event");
            return Vec::new();
        }
    };
    match event.pointer("/content/parts").and_then(Value::as_array) {
        Some(parts) => parts.clone(),
        None => vec![event],
    }
}

async fn notify_tool_call(
    hooks: &[Arc<dyn AgentHook>],
    agent: &str,
    tool: &str,
    arguments: &Value,
) -> Result<()> {
    for hook in hooks {
        hook.before_tool_call(agent, tool, arguments).await?;
    }
    Ok(())
}

async fn notify_tool_result(
    hooks: &[Arc<dyn AgentHook>],
    agent: &str,
    tool: &str,
    output: &Value,
) -> Result<()> {
    for hook in hooks {
        hook.after_tool_result(agent, tool, output).await?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Scripted runtime
// ─────────────────────────────────────────────────────────────────────────────

/// One step replayed by [`ScriptedRuntime`].
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    Text(String),
    CallTool { name: String, arguments: Value },
    Raw(Value),
    Fail(String),
}

/// Replays a fixed sequence of steps. `CallTool` steps execute against the
/// agent's own registry so tool plumbing is exercised end to end.
pub struct ScriptedRuntime {
    steps: Mutex<VecDeque<ScriptedStep>>,
    invocations: AtomicUsize,
}

impl ScriptedRuntime {
    pub fn new(steps: Vec<ScriptedStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            invocations: AtomicUsize::new(0),
        }
    }

    /// Number of runs started so far.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn run_stream(&self, agent: &AgentDescriptor, request: RunRequest) -> Result<ChunkStream> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        for hook in &agent.hooks {
            hook.before_agent(&agent.name, &request).await?;
        }

        let steps: Vec<ScriptedStep> = {
            let mut queue = self.steps.lock().expect("scripted runtime poisoned");
            queue.drain(..).collect()
        };

        let mut chunks: Vec<Result<RunChunk>> = Vec::new();
        let mut transcript = String::new();
        let mut failed = false;
        for step in steps {
            match step {
                ScriptedStep::Text(text) => {
                    transcript.push_str(&text);
                    chunks.push(Ok(RunChunk::Text(text)));
                }
                ScriptedStep::CallTool { name, arguments } => {
                    notify_tool_call(&agent.hooks, &agent.name, &name, &arguments).await?;
                    chunks.push(Ok(RunChunk::FunctionCall {
                        name: name.clone(),
                        arguments: arguments.clone(),
                    }));
                    let output = agent.tools.call(&name, arguments).await?;
                    notify_tool_result(&agent.hooks, &agent.name, &name, &output).await?;
                    chunks.push(Ok(RunChunk::FunctionResponse { name, output }));
                }
                ScriptedStep::Raw(value) => chunks.push(Ok(RunChunk::Raw(value))),
                ScriptedStep::Fail(message) => {
                    chunks.push(Err(SidelineError::Runtime(message)));
                    failed = true;
                    break;
                }
            }
        }
        if !failed {
            for hook in &agent.hooks {
                hook.after_agent(&agent.name, transcript.trim()).await?;
            }
        }

        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}
