//! Type definitions and aliases for the bot.
//!
//! This module contains shared types used throughout the application.

use crate::remote::RemoteCallClient;

/// Bot application data shared across all commands.
///
/// This data is accessible in all command handlers through the context.
pub struct Data {
    /// Retrying client for the game-server API
    pub remote: RemoteCallClient,
    /// Player list endpoint of the game server
    pub player_api_url: String,
}

/// Error type for bot commands (maintains compatibility with poise).
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Command context type alias for easier usage.
pub type Context<'a> = poise::Context<'a, Data, Error>;
