use crate::config::AppConfig;
use crate::descriptor::AgentDescriptor;
use crate::error::Result;
use crate::tools::stocks::{stock_toolkit, StockConfig};

use super::{traced, DEFAULT_MODEL};

const INSTRUCTIONS: &str = "You are a helpful financial assistant that provides stock market \
                            information. When asked about stock prices, use the get_stock_price \
                            tool to retrieve current information. Explain the data in a clear, \
                            concise manner";

/// Stock quote assistant backed by Yahoo Finance.
pub fn stock_agent(config: &AppConfig) -> Result<AgentDescriptor> {
    let tools = stock_toolkit(
        &StockConfig::default()
            .with_endpoint(config.tools.quotes_endpoint.clone())
            .with_timeout_secs(config.tools.timeout_secs),
    )?;
    Ok(traced(
        AgentDescriptor::new("stock_agent", DEFAULT_MODEL)
            .with_description("An agent that provides stock market information")
            .with_instruction(INSTRUCTIONS)
            .with_tools(tools),
        config,
    ))
}
