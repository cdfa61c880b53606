use crate::config::AppConfig;
use crate::descriptor::AgentDescriptor;
use crate::error::Result;
use crate::tools::nationality::{nationality_toolkit, NationalityConfig};

use super::{traced, DEFAULT_MODEL};

const INSTRUCTIONS: &str = r#"
You are an agent that predicts the nationality of a given name.
Your task is to call the nationalize.io API to get the probability distribution of nationalities for a name.

After you receive the response from the API, you must follow these steps to formulate your answer:
1.  The API will return a list of possible countries. Identify the three countries with the highest probability scores.
2.  For each of these three countries, you must convert the probability score into a percentage. You should format the percentage to two decimal places. For example, if the probability is 0.3041847971748919, you should display it as 30.42%.
3.  You must convert the country code (e.g., "US") to the full country name (e.g., "United States").
4.  Present the final result in a user-friendly and clear manner. For instance: "For the name 'johnson', the most likely nationality is United States with a probability of 30.42%, and the second most likely is Jamaica with a probability of 9.14%."
"#;

/// Name-origin assistant backed by nationalize.io.
pub fn nationality_agent(config: &AppConfig) -> Result<AgentDescriptor> {
    let tools = nationality_toolkit(
        &NationalityConfig::default()
            .with_endpoint(config.tools.nationalize_endpoint.clone())
            .with_timeout_secs(config.tools.timeout_secs),
    )?;
    Ok(traced(
        AgentDescriptor::new("nationality_agent", DEFAULT_MODEL)
            .with_description("Predicts the likely nationality of a first name using the nationalize.io API")
            .with_instruction(INSTRUCTIONS)
            .with_tools(tools),
        config,
    ))
}
