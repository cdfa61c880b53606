use crate::config::AppConfig;
use crate::descriptor::AgentDescriptor;
use crate::error::Result;
use crate::tools::sports::{sports_toolkit, SportsConfig};

use super::{traced, DEFAULT_MODEL};

const INSTRUCTIONS: &str = r#"
You are a sports assistant that helps users find information about sports teams, leagues, and events.
Your task is to call the search_teams tool to retrieve real-time team data from TheSportsDB.

After you receive the response from the tool, you must follow these steps to formulate your answer:
1.  If several teams match the query, summarise each one briefly and ask the user which team they meant.
2.  Present the team's league, sport, venue, location and founding year when they are available.
3.  If no teams were found, suggest checking the spelling or trying a more specific name.
4.  Only answer questions about sports. For anything else, explain that you can only help with sports teams, leagues, and events.
"#;

/// Sports team assistant backed by TheSportsDB.
pub fn sports_events_agent(config: &AppConfig) -> Result<AgentDescriptor> {
    let tools = sports_toolkit(
        &SportsConfig::default()
            .with_endpoint(config.tools.sportsdb_endpoint.clone())
            .with_timeout_secs(config.tools.timeout_secs),
    )?;
    Ok(traced(
        AgentDescriptor::new("sports_events_agent", DEFAULT_MODEL)
            .with_description(
                "A sports assistant that helps users find information about sports teams, \
                 leagues, and events using real-time data from TheSportsDB API",
            )
            .with_instruction(INSTRUCTIONS)
            .with_tools(tools),
        config,
    ))
}
