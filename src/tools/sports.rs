//! Sports team search backed by TheSportsDB.
//!
//! `search_teams` validates the requested team name, performs a single
//! bounded GET against the `searchteams.php` endpoint, and normalizes each
//! returned record into a fixed field set with explicit fallbacks.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::{Result, SidelineError};
use crate::tool::{Tool, ToolRegistry};
use crate::tools::response::{
    classify_transport_error, compile_query_pattern, response_date, truncate_text, validate_query,
    ToolResponse,
};

/// Public demo tier of TheSportsDB.
pub const DEFAULT_SPORTSDB_ENDPOINT: &str = "https://www.thesportsdb.com/api/v1/json/3";

const API_SOURCE: &str = "TheSportsDB";
const USER_AGENT: &str = "sideline-agent/0.1";
const DESCRIPTION_CHARS: usize = 200;

/// Settings for the sports toolkit.
#[derive(Debug, Clone)]
pub struct SportsConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for SportsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SPORTSDB_ENDPOINT.to_string(),
            timeout_secs: 10,
        }
    }
}

impl SportsConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Registry with the TheSportsDB-backed tools registered.
pub fn sports_toolkit(config: &SportsConfig) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(SearchTeamsTool::from_config(config)?);
    Ok(registry)
}

/// Looks up teams by name and returns normalized records.
pub struct SearchTeamsTool {
    client: reqwest::Client,
    endpoint: String,
    pattern: Regex,
}

impl SearchTeamsTool {
    pub fn from_config(config: &SportsConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        reqwest::Url::parse(&endpoint)
            .map_err(|err| SidelineError::Protocol(format!("invalid sports endpoint: {err}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| SidelineError::Runtime(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            pattern: compile_query_pattern()?,
        })
    }

    async fn search(&self, team_name: &str) -> Result<ToolResponse> {
        let term = match validate_query(team_name, &self.pattern, "team name") {
            Ok(term) => term,
            Err(resp) => {
                warn!(input = team_name, "rejected team search input");
                return Ok(resp);
            }
        };

        info!(team = %term, "searching for teams");
        let url = format!(
            "{}/searchteams.php?t={}",
            self.endpoint,
            urlencoding::encode(&term)
        );
        let response = match self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "sports API request failed");
                return Ok(classify_transport_error(&err, "sports API", "searching for teams"));
            }
        };

        let retrieved_at = response_date(&response);
        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "sports API returned an error status");
            return Ok(ToolResponse::technical(
                format!(
                    "Unable to search for teams matching '{term}'. Please try a different team name or try again later."
                ),
                format!("sports API responded with HTTP {status}"),
            ));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "failed to read sports API response body");
                return Ok(classify_transport_error(&err, "sports API", "searching for teams"));
            }
        };
        let parsed: SearchTeamsBody = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "sports API returned an unexpected body");
                return Ok(ToolResponse::api(
                    "Invalid response format from sports API",
                    err.to_string(),
                ));
            }
        };

        let teams: Vec<Value> = parsed
            .teams
            .unwrap_or_default()
            .into_iter()
            .filter_map(|record| serde_json::from_value::<TeamRecord>(record).ok())
            .map(|record| record.normalized())
            .collect();

        if teams.is_empty() {
            info!(team = %term, "no teams matched");
            return Ok(ToolResponse::ok(
                json!({
                    "teams": [],
                    "count": 0,
                    "search_term": term,
                    "api_source": API_SOURCE,
                    "retrieved_at": retrieved_at,
                }),
                format!(
                    "No teams found matching '{term}'. Try different spelling or a more specific name."
                ),
            ));
        }

        let count = teams.len();
        info!(team = %term, count, "team search succeeded");
        Ok(ToolResponse::ok(
            json!({
                "teams": teams,
                "count": count,
                "search_term": term,
                "api_source": API_SOURCE,
                "retrieved_at": retrieved_at,
            }),
            format!("Found {count} team(s) matching '{term}'"),
        ))
    }
}

#[async_trait]
impl Tool for SearchTeamsTool {
    fn name(&self) -> &str {
        "search_teams"
    }

    fn description(&self) -> &str {
        "Search for sports teams by name and return league, venue, and background details."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "team_name": {
                    "type": "string",
                    "description": "Team name to search for, e.g. 'Arsenal'"
                }
            },
            "required": ["team_name"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let team_name = input
            .get("team_name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        self.search(team_name).await?.into_value()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire structures
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchTeamsBody {
    // The API reports "no results" as a JSON null here.
    teams: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct TeamRecord {
    #[serde(rename = "idTeam")]
    id_team: Option<Value>,
    #[serde(rename = "strTeam")]
    team: Option<String>,
    #[serde(rename = "strAlternate")]
    alternate: Option<String>,
    #[serde(rename = "strLeague")]
    league: Option<String>,
    #[serde(rename = "strSport")]
    sport: Option<String>,
    #[serde(rename = "intFormedYear")]
    formed_year: Option<Value>,
    #[serde(rename = "strStadium")]
    stadium: Option<String>,
    #[serde(rename = "strLocation")]
    location: Option<String>,
    #[serde(rename = "strDescriptionEN")]
    description_en: Option<String>,
    #[serde(rename = "strWebsite")]
    website: Option<String>,
    #[serde(rename = "strTeamBadge")]
    badge: Option<String>,
    #[serde(rename = "strTeamJersey")]
    jersey: Option<String>,
    #[serde(rename = "strCountry")]
    country: Option<String>,
}

impl TeamRecord {
    /// Fixed output shape with per-field fallbacks. Absent identifiers stay
    /// null rather than being invented.
    fn normalized(self) -> Value {
        json!({
            "team_id": self.id_team.unwrap_or(Value::Null),
            "team_name": self.team.unwrap_or_else(|| "Unknown".to_string()),
            "alternate_name": self.alternate.unwrap_or_default(),
            "league": self.league.unwrap_or_else(|| "Unknown League".to_string()),
            "sport": self.sport.unwrap_or_else(|| "Unknown Sport".to_string()),
            "founded": scalar_to_string(self.formed_year),
            "venue": self.stadium.unwrap_or_else(|| "Unknown Venue".to_string()),
            "location": self.location.unwrap_or_else(|| "Unknown Location".to_string()),
            "description": truncate_text(&self.description_en.unwrap_or_default(), DESCRIPTION_CHARS),
            "website": self.website.unwrap_or_default(),
            "logo": self.badge.unwrap_or_default(),
            "jersey": self.jersey.unwrap_or_default(),
            "country": self.country.unwrap_or_else(|| "Unknown".to_string()),
        })
    }
}

/// The API serves `intFormedYear` inconsistently as a string or a number.
fn scalar_to_string(value: Option<Value>) -> String {
    match value {
        Some(Value::String(text)) => text,
        Some(Value::Number(num)) => num.to_string(),
        _ => String::new(),
    }
}
