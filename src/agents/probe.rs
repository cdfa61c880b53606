use crate::config::AppConfig;
use crate::descriptor::AgentDescriptor;
use crate::tools::probe_toolkit;

use super::{traced, DEFAULT_MODEL};

const INSTRUCTIONS: &str = "You MUST call the simple_search function when the user mentions any \
                            word. For 'Arsenal', call simple_search('Arsenal').";

/// Minimal agent for verifying tool-call plumbing end to end.
pub fn probe_agent(config: &AppConfig) -> AgentDescriptor {
    traced(
        AgentDescriptor::new("probe_agent", DEFAULT_MODEL)
            .with_description("A minimal agent used to verify tool-call plumbing")
            .with_instruction(INSTRUCTIONS)
            .with_tools(probe_toolkit()),
        config,
    )
}
