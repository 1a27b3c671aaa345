//! Chat platform boundary.
//!
//! Bulk jobs and the spam loop only see the [`PlatformClient`] trait; the
//! production implementation is [`SerenityPlatform`], tests use an in-memory fake.

mod discord;

#[cfg(test)]
pub(crate) mod memory;

pub use self::discord::SerenityPlatform;

use std::fmt;

use async_trait::async_trait;

/// Kind of item held by a guild that a bulk job can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Channel,
    Role,
    Member,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel => write!(f, "channel"),
            Self::Role => write!(f, "role"),
            Self::Member => write!(f, "member"),
        }
    }
}

/// One channel, role or member as enumerated from a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformItem {
    pub id: u64,
    pub name: String,
    /// Hierarchy position; only meaningful for roles.
    pub position: Option<u16>,
    /// Whether the bot is allowed to act on this item at all.
    pub actionable: bool,
    /// Text channel that messages can be posted to.
    pub accepts_messages: bool,
}

/// Extra attributes applied when creating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemAttributes {
    /// RGB colour for roles.
    pub color: Option<u32>,
}

/// Errors reported by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Guild, channel, role or member does not exist
    NotFound(String),
    /// The platform refused the request (permissions, rate limit, validation)
    Rejected(String),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "not found: {}", msg),
            Self::Rejected(msg) => write!(f, "rejected: {}", msg),
        }
    }
}

impl std::error::Error for PlatformError {}

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Operations the bulk engine needs from the chat platform.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Enumerate all items of `kind` in the guild, in platform order.
    async fn list_items(&self, guild_id: u64, kind: ItemKind) -> PlatformResult<Vec<PlatformItem>>;

    /// Position of the highest role held by the bot in the guild.
    async fn bot_top_role_position(&self, guild_id: u64) -> PlatformResult<u16>;

    /// Create a channel or role and return its id. Members cannot be created.
    async fn create_item(
        &self,
        guild_id: u64,
        kind: ItemKind,
        name: &str,
        attributes: &ItemAttributes,
    ) -> PlatformResult<u64>;

    /// Delete a channel or role; for members this bans them.
    async fn delete_item(&self, guild_id: u64, kind: ItemKind, id: u64) -> PlatformResult<()>;

    async fn send_message(&self, channel_id: u64, text: &str) -> PlatformResult<()>;
}
