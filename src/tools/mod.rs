//! Tool adapters and the shared result envelope.
//!
//! Each adapter module exposes a `*_toolkit` constructor returning a
//! [`crate::tool::ToolRegistry`] wired against one upstream API:
//! - Sports: team search via TheSportsDB
//! - Stocks: quote lookup via Yahoo Finance
//! - Nationality: name-origin prediction via nationalize.io
//! - Probe: in-process plumbing check, no network

pub mod nationality;
pub mod probe;
pub mod response;
pub mod sports;
pub mod stocks;

pub use nationality::{nationality_toolkit, NationalityConfig, PredictNationalityTool};
pub use probe::{probe_toolkit, SimpleSearchTool};
pub use response::{ToolErrorKind, ToolResponse};
pub use sports::{sports_toolkit, SearchTeamsTool, SportsConfig};
pub use stocks::{stock_toolkit, GetStockPriceTool, StockConfig};
