use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::runtime::RunRequest;

/// Observation points around an agent run. All methods default to no-ops so
/// implementors only override the stages they care about. Hook failures
/// abort the run.
#[async_trait]
pub trait AgentHook: Send + Sync {
    async fn before_agent(&self, _agent: &str, _request: &RunRequest) -> Result<()> {
        Ok(())
    }

    async fn after_agent(&self, _agent: &str, _response: &str) -> Result<()> {
        Ok(())
    }

    async fn before_tool_call(&self, _agent: &str, _tool: &str, _arguments: &Value) -> Result<()> {
        Ok(())
    }

    async fn after_tool_result(&self, _agent: &str, _tool: &str, _output: &Value) -> Result<()> {
        Ok(())
    }
}

/// Emits one structured log line per lifecycle stage, keyed by invocation.
/// Response content is never logged, only its size.
pub struct TraceHook {
    workspace: Option<String>,
}

impl TraceHook {
    pub fn new(workspace: Option<String>) -> Self {
        Self { workspace }
    }

    fn workspace(&self) -> &str {
        self.workspace.as_deref().unwrap_or("default")
    }
}

#[async_trait]
impl AgentHook for TraceHook {
    async fn before_agent(&self, agent: &str, request: &RunRequest) -> Result<()> {
        info!(
            agent,
            invocation = %request.invocation_id,
            workspace = self.workspace(),
            "agent run started"
        );
        Ok(())
    }

    async fn after_agent(&self, agent: &str, response: &str) -> Result<()> {
        info!(
            agent,
            workspace = self.workspace(),
            response_chars = response.chars().count(),
            "agent run finished"
        );
        Ok(())
    }

    async fn before_tool_call(&self, agent: &str, tool: &str, _arguments: &Value) -> Result<()> {
        info!(agent, tool, workspace = self.workspace(), "tool call started");
        Ok(())
    }

    async fn after_tool_result(&self, agent: &str, tool: &str, _output: &Value) -> Result<()> {
        info!(agent, tool, workspace = self.workspace(), "tool call finished");
        Ok(())
    }
}
