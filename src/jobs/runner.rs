use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::{JobHandle, JobResult, JobSpec};
use crate::error::Result;
use crate::platform::{ItemAttributes, ItemKind, PlatformClient, PlatformItem, PlatformResult};
use crate::utils::validation::render_name;

/// Counters of one paced pass over a list of units.
#[derive(Debug, Default)]
struct PassTally {
    succeeded: usize,
    failed: usize,
    stopped: bool,
    created: Vec<u64>,
}

impl PassTally {
    /// Number of platform calls the pass made.
    fn issued(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Apply `op` to every unit in order, sleeping `pacing` between calls.
///
/// The handle is re-read before every call; a failed unit is logged and counted.
async fn run_paced<T, F, Fut>(
    handle: &JobHandle,
    pacing: Duration,
    units: Vec<T>,
    mut op: F,
) -> PassTally
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = PlatformResult<Option<u64>>>,
{
    let mut tally = PassTally::default();

    for (position, unit) in units.into_iter().enumerate() {
        if position > 0 && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
        if !handle.is_running() {
            tally.stopped = true;
            break;
        }

        match op(unit).await {
            Ok(created) => {
                tally.succeeded += 1;
                tally.created.extend(created);
            }
            Err(e) => {
                tally.failed += 1;
                warn!(job_id = handle.id(), index = position + 1, "Bulk unit failed: {}", e);
            }
        }
    }

    tally
}

/// Sequential, paced executor of bulk create/delete/ban jobs.
#[derive(Clone)]
pub struct BulkJobRunner {
    platform: Arc<dyn PlatformClient>,
}

/// Snapshot of a guild collection split by eligibility.
struct Snapshot {
    enumerated: usize,
    eligible: Vec<PlatformItem>,
}

impl BulkJobRunner {
    pub fn new(platform: Arc<dyn PlatformClient>) -> Self {
        Self { platform }
    }

    /// Run `spec` to completion or until `handle` is stopped.
    ///
    /// # Errors
    ///
    /// Fails only when the job cannot start: an invalid spec or a failed
    /// enumeration of the target guild. Individual unit failures are counted.
    pub async fn run(&self, spec: &JobSpec, handle: &JobHandle) -> Result<JobResult> {
        spec.validate()?;
        info!(
            job_id = handle.id(),
            guild_id = spec.target_collection_id,
            kind = %spec.kind,
            "Starting bulk job"
        );

        let result = if spec.kind.is_create() {
            self.run_create(spec, handle).await?
        } else {
            self.run_sweep(spec, handle).await?
        };

        info!(
            job_id = handle.id(),
            kind = %spec.kind,
            requested = result.requested,
            succeeded = result.succeeded,
            failed = result.failed,
            skipped = result.skipped_not_eligible,
            stopped = result.stopped,
            "Bulk job finished"
        );
        Ok(result)
    }

    async fn run_create(&self, spec: &JobSpec, handle: &JobHandle) -> Result<JobResult> {
        let guild_id = spec.target_collection_id;
        let kind = spec.kind.item_kind();

        // Enumerating up front also proves the guild exists before anything is created.
        let snapshot = self.snapshot(guild_id, kind).await?;

        let mut result = JobResult {
            requested: spec.count as usize,
            ..JobResult::default()
        };

        if spec.delete_existing_first {
            let pass = self.delete_items(guild_id, kind, snapshot.eligible, spec.pacing_delay, handle).await;
            result.deleted_beforehand = Some(pass.succeeded);

            // The create pass continues the same paced sequence.
            if pass.issued() > 0 && !spec.pacing_delay.is_zero() && handle.is_running() {
                tokio::time::sleep(spec.pacing_delay).await;
            }
        }

        let platform = self.platform.as_ref();
        let units: Vec<u32> = (1..=spec.count).collect();
        let pass = run_paced(handle, spec.pacing_delay, units, |index| {
            let name = render_name(&spec.name_template, index);
            let attributes = ItemAttributes {
                color: spec.role_color.map(|color| color.pick()),
            };
            async move {
                platform
                    .create_item(guild_id, kind, &name, &attributes)
                    .await
                    .map(Some)
            }
        })
        .await;

        result.succeeded = pass.succeeded;
        result.failed = pass.failed;
        result.stopped = pass.stopped;
        result.created_ids = pass.created;
        Ok(result)
    }

    async fn run_sweep(&self, spec: &JobSpec, handle: &JobHandle) -> Result<JobResult> {
        let guild_id = spec.target_collection_id;
        let kind = spec.kind.item_kind();

        let snapshot = self.snapshot(guild_id, kind).await?;
        let skipped = snapshot.enumerated - snapshot.eligible.len();
        let pass = self.delete_items(guild_id, kind, snapshot.eligible, spec.pacing_delay, handle).await;

        Ok(JobResult {
            requested: snapshot.enumerated,
            succeeded: pass.succeeded,
            failed: pass.failed,
            skipped_not_eligible: skipped,
            deleted_beforehand: None,
            stopped: pass.stopped,
            created_ids: Vec::new(),
        })
    }

    /// Enumerate the collection once and keep the items the bot may act on.
    async fn snapshot(&self, guild_id: u64, kind: ItemKind) -> Result<Snapshot> {
        let items = self.platform.list_items(guild_id, kind).await?;
        let enumerated = items.len();

        let eligible: Vec<PlatformItem> = match kind {
            ItemKind::Role => {
                let top = self.platform.bot_top_role_position(guild_id).await?;
                items
                    .into_iter()
                    .filter(|role| role.actionable && role.position.is_some_and(|p| p < top))
                    .collect()
            }
            ItemKind::Channel | ItemKind::Member => {
                items.into_iter().filter(|item| item.actionable).collect()
            }
        };

        Ok(Snapshot { enumerated, eligible })
    }

    async fn delete_items(
        &self,
        guild_id: u64,
        kind: ItemKind,
        items: Vec<PlatformItem>,
        pacing: Duration,
        handle: &JobHandle,
    ) -> PassTally {
        let platform = self.platform.as_ref();
        run_paced(handle, pacing, items, |item| async move {
            platform
                .delete_item(guild_id, kind, item.id)
                .await
                .map(|_| None)
        })
        .await
    }
}
