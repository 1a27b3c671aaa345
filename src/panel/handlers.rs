use std::time::Duration;

use axum::extract::{Query, State};
use axum::Json;
use tracing::info;

use super::dto::{
    require_id, ColorMode, CreateChannelsRequest, CreateChannelsResponse, CreateRolesRequest,
    HistoryQuery, IdInput, SpamRequest, SpamStarted, StopResponse, SweepRequest,
};
use super::AppState;
use crate::error::{GuildForgeError, Result};
use crate::jobs::{JobKind, JobResult, JobSpec, RoleColor};
use crate::pager::HistoryPage;
use crate::platform::ItemKind;
use crate::utils::validation::parse_hex_color;

const TARGET_FIELD: &str = "targetCollectionId";

fn required<T>(field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| GuildForgeError::Validation(format!("{} is required", field)))
}

impl AppState {
    fn pacing(&self, override_ms: Option<u64>) -> Duration {
        override_ms.map(Duration::from_millis).unwrap_or(self.pacing_delay)
    }

    /// Register, run and unregister one bulk job.
    ///
    /// The job runs on its own task, so a dropped request does not abandon it
    /// half-registered; it runs on until it completes or is stopped.
    async fn run_job(&self, spec: JobSpec) -> Result<JobResult> {
        spec.validate()?;
        let handle = self.registry.start_bulk_job(&spec).await;

        let runner = self.runner.clone();
        let registry = self.registry.clone();
        let job = tokio::spawn(async move {
            let outcome = runner.run(&spec, &handle).await;
            registry.finish_bulk_job(&handle).await;
            outcome
        });

        job.await?
    }
}

pub async fn root() -> &'static str {
    "✅ GuildForge bot is running"
}

pub async fn create_channels(
    State(state): State<AppState>,
    Json(body): Json<CreateChannelsRequest>,
) -> Result<Json<CreateChannelsResponse>> {
    let guild_id = require_id(TARGET_FIELD, body.target_collection_id.as_ref())?;
    let spec = JobSpec::create(
        JobKind::CreateChannels,
        guild_id,
        required("count", body.count)?,
        required("nameTemplate", body.name_template)?,
    )
    .with_pacing(state.pacing(body.pacing_delay_ms))
    .delete_existing_first(body.delete_existing_first);

    let result = state.run_job(spec).await?;

    let mut spam_started = false;
    if let Some(message) = body.spam_message.filter(|m| !m.trim().is_empty()) {
        if !result.created_ids.is_empty() {
            state
                .registry
                .start_spam(&state.spam, message, result.created_ids.clone(), state.spam_interval)
                .await?;
            spam_started = true;
        }
    }

    Ok(Json(CreateChannelsResponse {
        result,
        spam_started,
    }))
}

pub async fn delete_all_channels(
    State(state): State<AppState>,
    Json(body): Json<SweepRequest>,
) -> Result<Json<JobResult>> {
    sweep(state, JobKind::DeleteChannels, body).await
}

pub async fn create_roles(
    State(state): State<AppState>,
    Json(body): Json<CreateRolesRequest>,
) -> Result<Json<JobResult>> {
    let guild_id = require_id(TARGET_FIELD, body.target_collection_id.as_ref())?;
    let color = match body.color_mode.unwrap_or(ColorMode::Random) {
        ColorMode::Random => RoleColor::Random,
        ColorMode::Custom => {
            let hex = required("customColor", body.custom_color.as_deref())?;
            RoleColor::Custom(parse_hex_color(hex)?)
        }
    };

    let spec = JobSpec::create(
        JobKind::CreateRoles,
        guild_id,
        required("count", body.count)?,
        required("nameTemplate", body.name_template)?,
    )
    .with_pacing(state.pacing(body.pacing_delay_ms))
    .delete_existing_first(body.delete_existing_first)
    .with_role_color(color);

    Ok(Json(state.run_job(spec).await?))
}

pub async fn delete_all_roles(
    State(state): State<AppState>,
    Json(body): Json<SweepRequest>,
) -> Result<Json<JobResult>> {
    sweep(state, JobKind::DeleteRoles, body).await
}

pub async fn ban_all(
    State(state): State<AppState>,
    Json(body): Json<SweepRequest>,
) -> Result<Json<JobResult>> {
    sweep(state, JobKind::BanAllMembers, body).await
}

async fn sweep(state: AppState, kind: JobKind, body: SweepRequest) -> Result<Json<JobResult>> {
    let guild_id = require_id(TARGET_FIELD, body.target_collection_id.as_ref())?;
    let spec = JobSpec::sweep(kind, guild_id).with_pacing(state.pacing(body.pacing_delay_ms));
    Ok(Json(state.run_job(spec).await?))
}

pub async fn start_spam(
    State(state): State<AppState>,
    Json(body): Json<SpamRequest>,
) -> Result<Json<SpamStarted>> {
    let guild_id = require_id(TARGET_FIELD, body.target_collection_id.as_ref())?;
    let message = required("message", body.message)?;

    let targets = match body.channel_ids {
        Some(ids) => ids
            .iter()
            .map(|id| require_id("channelIds", Some(id)))
            .collect::<Result<Vec<u64>>>()?,
        None => state
            .platform
            .list_items(guild_id, ItemKind::Channel)
            .await?
            .into_iter()
            .filter(|channel| channel.actionable && channel.accepts_messages)
            .map(|channel| channel.id)
            .collect(),
    };

    let interval = body
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or(state.spam_interval);
    let count = targets.len();
    state
        .registry
        .start_spam(&state.spam, message, targets, interval)
        .await?;

    Ok(Json(SpamStarted {
        started: true,
        targets: count,
    }))
}

pub async fn stop(State(state): State<AppState>) -> Json<StopResponse> {
    let stopped = state.registry.stop_all().await;
    if !stopped.is_empty() {
        info!("Stop requested from panel");
    }
    Json(StopResponse { stopped: true })
}

pub async fn status(State(state): State<AppState>) -> Json<crate::jobs::RegistryStatus> {
    Json(state.registry.status().await)
}

pub async fn history_page(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryPage>> {
    let source = query.source_id.map(IdInput::Text);
    let source_id = require_id("sourceId", source.as_ref())?;
    let cursor = query.cursor.filter(|c| !c.is_empty());

    let page = state
        .pager
        .fetch_page(source_id, cursor.as_deref(), query.page_size)
        .await?;
    Ok(Json(page))
}
