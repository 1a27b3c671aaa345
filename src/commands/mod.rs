//! Discord bot commands.
//!
//! This module contains all available slash commands.

pub mod ping;
pub mod search;

pub use ping::ping;
pub use search::search;
