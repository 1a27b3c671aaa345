use std::fmt;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;

use crate::error::{GuildForgeError, Result};
use crate::platform::ItemKind;
use crate::utils::validation::{validate_count, validate_name_template};

/// Bulk operation requested from the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    CreateChannels,
    DeleteChannels,
    CreateRoles,
    DeleteRoles,
    BanAllMembers,
}

impl JobKind {
    /// Kind of guild item the job operates on.
    pub fn item_kind(self) -> ItemKind {
        match self {
            Self::CreateChannels | Self::DeleteChannels => ItemKind::Channel,
            Self::CreateRoles | Self::DeleteRoles => ItemKind::Role,
            Self::BanAllMembers => ItemKind::Member,
        }
    }

    pub fn is_create(self) -> bool {
        matches!(self, Self::CreateChannels | Self::CreateRoles)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CreateChannels => "create-channels",
            Self::DeleteChannels => "delete-channels",
            Self::CreateRoles => "create-roles",
            Self::DeleteRoles => "delete-roles",
            Self::BanAllMembers => "ban-all-members",
        };
        f.write_str(label)
    }
}

/// Colour given to each role of a create-roles job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleColor {
    /// A fresh random RGB colour per role
    Random,
    Custom(u32),
}

impl RoleColor {
    pub fn pick(self) -> u32 {
        match self {
            Self::Random => rand::rng().random_range(0..=0xFF_FFFF),
            Self::Custom(color) => color,
        }
    }
}

/// Immutable description of one bulk operation.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub kind: JobKind,
    pub target_collection_id: u64,
    /// Number of items to create; ignored by delete and ban jobs.
    pub count: u32,
    pub name_template: String,
    pub pacing_delay: Duration,
    pub delete_existing_first: bool,
    pub role_color: Option<RoleColor>,
}

impl JobSpec {
    pub fn create(kind: JobKind, target_collection_id: u64, count: u32, name_template: impl Into<String>) -> Self {
        Self {
            kind,
            target_collection_id,
            count,
            name_template: name_template.into(),
            pacing_delay: Duration::ZERO,
            delete_existing_first: false,
            role_color: None,
        }
    }

    /// Delete-all or ban-all job over the current contents of the guild.
    pub fn sweep(kind: JobKind, target_collection_id: u64) -> Self {
        Self::create(kind, target_collection_id, 0, "")
    }

    pub fn with_pacing(mut self, pacing_delay: Duration) -> Self {
        self.pacing_delay = pacing_delay;
        self
    }

    pub fn delete_existing_first(mut self, enabled: bool) -> Self {
        self.delete_existing_first = enabled;
        self
    }

    pub fn with_role_color(mut self, color: RoleColor) -> Self {
        self.role_color = Some(color);
        self
    }

    /// Reject specs that cannot start.
    pub fn validate(&self) -> Result<()> {
        if self.target_collection_id == 0 {
            return Err(GuildForgeError::Validation(
                "targetCollectionId is required".to_string(),
            ));
        }
        if self.kind.is_create() {
            validate_count(self.count)?;
            validate_name_template(&self.name_template)?;
        }
        Ok(())
    }
}

/// Outcome of a bulk job, published once when the loop ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_not_eligible: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_beforehand: Option<usize>,
    /// True when the job was stopped before it went through every unit.
    pub stopped: bool,
    #[serde(skip)]
    pub created_ids: Vec<u64>,
}
