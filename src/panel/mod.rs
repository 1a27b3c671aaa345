//! Admin HTTP panel.
//!
//! JSON endpoints that start bulk jobs, start and stop the spam loop, and page
//! through channel history. HTML rendering and sessions live elsewhere.

pub mod dto;
mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::error::Result;
use crate::jobs::{BulkJobRunner, SpamLoop, TaskRegistry};
use crate::pager::CursorPager;
use crate::platform::PlatformClient;

/// Shared state of every panel handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub registry: TaskRegistry,
    pub runner: BulkJobRunner,
    pub spam: SpamLoop,
    pub platform: Arc<dyn PlatformClient>,
    pub pager: CursorPager,
    /// Pacing used when a request does not set `pacingDelayMs`
    pub pacing_delay: Duration,
    /// Sweep interval used when a request does not set `intervalMs`
    pub spam_interval: Duration,
}

impl AppState {
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        registry: TaskRegistry,
        pager: CursorPager,
        pacing_delay: Duration,
        spam_interval: Duration,
    ) -> Self {
        Self {
            registry,
            runner: BulkJobRunner::new(platform.clone()),
            spam: SpamLoop::new(platform.clone()),
            platform,
            pager,
            pacing_delay,
            spam_interval,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/bulk/channels", post(handlers::create_channels))
        .route("/bulk/channels/delete-all", post(handlers::delete_all_channels))
        .route("/bulk/roles", post(handlers::create_roles))
        .route("/bulk/roles/delete-all", post(handlers::delete_all_roles))
        .route("/bulk/ban-all", post(handlers::ban_all))
        .route("/bulk/spam", post(handlers::start_spam))
        .route("/bulk/stop", post(handlers::stop))
        .route("/bulk/status", get(handlers::status))
        .route("/history/page", get(handlers::history_page))
        .with_state(state)
}

/// Bind `address` and serve the panel until the process exits.
pub async fn serve(state: AppState, address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("🌐 Admin panel listening on {}", address);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
