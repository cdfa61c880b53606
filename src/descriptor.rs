use std::sync::Arc;

use crate::hooks::AgentHook;
use crate::tool::{ToolDescription, ToolRegistry};

/// Declarative description of one agent: identity, model, behavioural
/// instruction, and the tools it may call. Execution happens elsewhere,
/// through an [`crate::runtime::AgentRuntime`].
#[derive(Clone)]
pub struct AgentDescriptor {
    pub name: String,
    pub model: String,
    pub description: String,
    pub instruction: String,
    pub tools: ToolRegistry,
    pub hooks: Vec<Arc<dyn AgentHook>>,
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            description: String::new(),
            instruction: String::new(),
            tools: ToolRegistry::new(),
            hooks: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn AgentHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Names of the registered tools, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    /// Descriptions of the registered tools, sorted by name.
    pub fn describe_tools(&self) -> Vec<ToolDescription> {
        self.tools.describe()
    }
}

impl std::fmt::Debug for AgentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDescriptor")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("description", &self.description)
            .field("tools", &self.tool_names())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::probe_toolkit;

    #[test]
    fn builders_populate_the_descriptor() {
        let agent = AgentDescriptor::new("probe_agent", "gemini-2.5-pro")
            .with_description("A minimal agent used to verify tool-call plumbing")
            .with_instruction("Call simple_search for every message.")
            .with_tools(probe_toolkit());

        assert_eq!(agent.name, "probe_agent");
        assert_eq!(agent.model, "gemini-2.5-pro");
        assert_eq!(agent.tool_names(), vec!["simple_search"]);
        assert!(agent.hooks.is_empty());
    }

    #[test]
    fn describe_tools_exposes_parameter_schemas() {
        let agent = AgentDescriptor::new("probe_agent", "gemini-2.5-pro")
            .with_tools(probe_toolkit());

        let descriptions = agent.describe_tools();

        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions[0].name, "simple_search");
        assert!(descriptions[0].parameters.is_some());
    }
}
