//! [`PlatformClient`] over the serenity HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::debug;

use super::{ItemAttributes, ItemKind, PlatformClient, PlatformError, PlatformItem, PlatformResult};

/// Discord caps member listing at 1000 per request.
const MEMBER_PAGE_SIZE: u64 = 1000;

/// Discord-backed platform client.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<serenity::Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }

    fn http(&self) -> &serenity::Http {
        &self.http
    }

    async fn list_channels(&self, guild: serenity::GuildId) -> PlatformResult<Vec<PlatformItem>> {
        let mut channels: Vec<_> = guild
            .channels(self.http())
            .await
            .map_err(map_error)?
            .into_values()
            .collect();
        channels.sort_by_key(|c| (c.position, c.id));

        Ok(channels
            .into_iter()
            .map(|c| PlatformItem {
                id: c.id.get(),
                name: c.name,
                position: Some(c.position),
                actionable: true,
                accepts_messages: c.kind == serenity::ChannelType::Text,
            })
            .collect())
    }

    async fn list_roles(&self, guild: serenity::GuildId) -> PlatformResult<Vec<PlatformItem>> {
        let mut roles: Vec<_> = guild
            .roles(self.http())
            .await
            .map_err(map_error)?
            .into_values()
            .collect();
        roles.sort_by_key(|r| (r.position, r.id));

        Ok(roles
            .into_iter()
            .map(|r| PlatformItem {
                id: r.id.get(),
                // @everyone shares the guild id and can never be deleted
                actionable: !r.managed && r.id.get() != guild.get(),
                name: r.name,
                position: Some(r.position),
                accepts_messages: false,
            })
            .collect())
    }

    async fn list_members(&self, guild: serenity::GuildId) -> PlatformResult<Vec<PlatformItem>> {
        let owner_id = guild
            .to_partial_guild(self.http())
            .await
            .map_err(map_error)?
            .owner_id;
        let bot_id = self.http().get_current_user().await.map_err(map_error)?.id;

        let mut members = Vec::new();
        let mut after: Option<serenity::UserId> = None;
        loop {
            let page = guild
                .members(self.http(), Some(MEMBER_PAGE_SIZE), after)
                .await
                .map_err(map_error)?;
            let fetched = page.len();
            after = page.last().map(|m| m.user.id);

            members.extend(page.into_iter().map(|m| PlatformItem {
                id: m.user.id.get(),
                actionable: m.user.id != owner_id && m.user.id != bot_id,
                name: m.user.name,
                position: None,
                accepts_messages: false,
            }));

            if (fetched as u64) < MEMBER_PAGE_SIZE {
                break;
            }
        }

        debug!(guild_id = guild.get(), count = members.len(), "Enumerated members");
        Ok(members)
    }
}

fn map_error(err: serenity::Error) -> PlatformError {
    if let serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response)) = &err {
        if response.status_code.as_u16() == 404 {
            return PlatformError::NotFound(response.error.message.clone());
        }
    }
    PlatformError::Rejected(err.to_string())
}

#[async_trait]
impl PlatformClient for SerenityPlatform {
    async fn list_items(&self, guild_id: u64, kind: ItemKind) -> PlatformResult<Vec<PlatformItem>> {
        let guild = serenity::GuildId::new(guild_id);
        match kind {
            ItemKind::Channel => self.list_channels(guild).await,
            ItemKind::Role => self.list_roles(guild).await,
            ItemKind::Member => self.list_members(guild).await,
        }
    }

    async fn bot_top_role_position(&self, guild_id: u64) -> PlatformResult<u16> {
        let guild = serenity::GuildId::new(guild_id);
        let bot_id = self.http().get_current_user().await.map_err(map_error)?.id;
        let member = guild.member(self.http(), bot_id).await.map_err(map_error)?;
        let roles = guild.roles(self.http()).await.map_err(map_error)?;

        Ok(member
            .roles
            .iter()
            .filter_map(|id| roles.get(id))
            .map(|role| role.position)
            .max()
            .unwrap_or(0))
    }

    async fn create_item(
        &self,
        guild_id: u64,
        kind: ItemKind,
        name: &str,
        attributes: &ItemAttributes,
    ) -> PlatformResult<u64> {
        let guild = serenity::GuildId::new(guild_id);
        match kind {
            ItemKind::Channel => {
                let builder = serenity::CreateChannel::new(name).kind(serenity::ChannelType::Text);
                let channel = guild
                    .create_channel(self.http(), builder)
                    .await
                    .map_err(map_error)?;
                Ok(channel.id.get())
            }
            ItemKind::Role => {
                let mut builder = serenity::EditRole::new().name(name);
                if let Some(color) = attributes.color {
                    builder = builder.colour(color);
                }
                let role = guild
                    .create_role(self.http(), builder)
                    .await
                    .map_err(map_error)?;
                Ok(role.id.get())
            }
            ItemKind::Member => Err(PlatformError::Rejected(
                "Members cannot be created".to_string(),
            )),
        }
    }

    async fn delete_item(&self, guild_id: u64, kind: ItemKind, id: u64) -> PlatformResult<()> {
        let guild = serenity::GuildId::new(guild_id);
        match kind {
            ItemKind::Channel => {
                serenity::ChannelId::new(id)
                    .delete(self.http())
                    .await
                    .map_err(map_error)?;
            }
            ItemKind::Role => {
                guild
                    .delete_role(self.http(), serenity::RoleId::new(id))
                    .await
                    .map_err(map_error)?;
            }
            ItemKind::Member => {
                guild
                    .ban(self.http(), serenity::UserId::new(id), 0)
                    .await
                    .map_err(map_error)?;
            }
        }
        Ok(())
    }

    async fn send_message(&self, channel_id: u64, text: &str) -> PlatformResult<()> {
        serenity::ChannelId::new(channel_id)
            .say(self.http(), text)
            .await
            .map_err(map_error)?;
        Ok(())
    }
}
