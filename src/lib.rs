//! GuildForge library.
//!
//! This library provides the core functionality for the GuildForge Discord bot:
//! the bulk task engine behind the admin panel, the retrying remote client used
//! for every data-API call, and cursor-paginated channel history.

pub mod error;
pub mod config;
pub mod remote;
pub mod pager;
pub mod players;
pub mod platform;
pub mod jobs;
pub mod panel;
pub mod utils;
pub mod bot;

mod commands;
mod types;

pub use error::{GuildForgeError, Result};
pub use config::Config;
