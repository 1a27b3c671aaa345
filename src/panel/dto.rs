//! Request and response bodies of the admin panel.
//!
//! Every field is optional at the serde level so a missing field is reported
//! as a readable `{ "error": ... }` instead of an extractor rejection.

use serde::{Deserialize, Serialize};

use crate::error::{GuildForgeError, Result};
use crate::jobs::JobResult;

/// Discord ids arrive either as JSON numbers or as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdInput {
    Number(u64),
    Text(String),
}

impl IdInput {
    fn parse(&self, field: &str) -> Result<u64> {
        let id = match self {
            Self::Number(id) => Some(*id),
            Self::Text(raw) => raw.trim().parse::<u64>().ok(),
        };
        match id {
            Some(id) if id > 0 => Ok(id),
            _ => Err(GuildForgeError::Validation(format!("{} must be a positive id", field))),
        }
    }
}

/// Parse a required id field.
pub fn require_id(field: &str, value: Option<&IdInput>) -> Result<u64> {
    value
        .ok_or_else(|| GuildForgeError::Validation(format!("{} is required", field)))?
        .parse(field)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelsRequest {
    pub target_collection_id: Option<IdInput>,
    pub name_template: Option<String>,
    pub count: Option<u32>,
    #[serde(default)]
    pub delete_existing_first: bool,
    pub pacing_delay_ms: Option<u64>,
    /// Message handed to the spam loop over the created channels.
    pub spam_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Random,
    Custom,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolesRequest {
    pub target_collection_id: Option<IdInput>,
    pub name_template: Option<String>,
    pub count: Option<u32>,
    pub color_mode: Option<ColorMode>,
    pub custom_color: Option<String>,
    #[serde(default)]
    pub delete_existing_first: bool,
    pub pacing_delay_ms: Option<u64>,
}

/// Body of the delete-all and ban-all endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepRequest {
    pub target_collection_id: Option<IdInput>,
    pub pacing_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpamRequest {
    pub target_collection_id: Option<IdInput>,
    pub message: Option<String>,
    pub channel_ids: Option<Vec<IdInput>>,
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub source_id: Option<String>,
    pub cursor: Option<String>,
    pub page_size: Option<u16>,
}

/// Create-channels outcome, with the optional spam hand-off.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelsResponse {
    #[serde(flatten)]
    pub result: JobResult,
    pub spam_started: bool,
}

#[derive(Debug, Serialize)]
pub struct SpamStarted {
    pub started: bool,
    pub targets: usize,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub stopped: bool,
}
