//! Built-in agent catalog.
//!
//! Each constructor builds a fully wired [`AgentDescriptor`] from the
//! application configuration. Nothing here executes a run; that is the
//! runtime's job.

mod nationality;
mod probe;
mod sports;
mod stocks;

pub use nationality::nationality_agent;
pub use probe::probe_agent;
pub use sports::sports_events_agent;
pub use stocks::stock_agent;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::descriptor::AgentDescriptor;
use crate::error::{Result, SidelineError};
use crate::hooks::TraceHook;

/// Model shared by every built-in agent.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// All built-in agents, in a stable order.
pub fn catalog(config: &AppConfig) -> Result<Vec<AgentDescriptor>> {
    Ok(vec![
        sports_events_agent(config)?,
        stock_agent(config)?,
        nationality_agent(config)?,
        probe_agent(config),
    ])
}

/// Looks up one built-in agent by name.
pub fn by_name(name: &str, config: &AppConfig) -> Result<AgentDescriptor> {
    catalog(config)?
        .into_iter()
        .find(|agent| agent.name == name)
        .ok_or_else(|| SidelineError::AgentNotFound(name.to_string()))
}

/// Attaches the trace hook when tracing is configured.
fn traced(agent: AgentDescriptor, config: &AppConfig) -> AgentDescriptor {
    if config.trace.api_key.is_some() {
        agent.with_hook(Arc::new(TraceHook::new(config.trace.workspace.clone())))
    } else {
        agent
    }
}
