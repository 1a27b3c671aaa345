//! Game-server player API integration.
//!
//! This module fetches the online player list of the game server and turns it
//! into the report shown by the `/search` command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::remote::{RemoteCallClient, RemoteFailure, RemoteRequest};

/// One online player as reported by the game-server API.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Player {
    /// In-game server id
    pub id: i64,
    /// Display name
    #[serde(default = "unknown_name", deserialize_with = "name_or_unknown")]
    pub name: String,
    /// Latency in milliseconds
    #[serde(default, deserialize_with = "null_as_default")]
    pub ping: u32,
    /// When the player joined the server
    #[serde(default, rename = "joinedAt")]
    pub joined_at: Option<DateTime<Utc>>,
}

fn unknown_name() -> String {
    "Unknown".to_string()
}

/// The API sends `null` or `""` for players without a name.
fn name_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|name| !name.is_empty())
        .unwrap_or_else(unknown_name))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fetch the list of online players.
///
/// # Arguments
///
/// * `client` - Retrying remote client to use for the request
/// * `url` - Player list endpoint of the game server
///
/// # Errors
///
/// Returns the classified failure if the server cannot be reached, answers
/// with an error status, or returns something that is not a player list.
///
/// # Examples
///
/// ```no_run
/// use guildforge::players::fetch_players;
/// use guildforge::remote::{RemoteCallClient, RetryPolicy};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RemoteCallClient::new(reqwest::Client::new(), RetryPolicy::default());
/// let players = fetch_players(&client, "https://example.com/players").await?;
/// println!("{} players online", players.len());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_players(client: &RemoteCallClient, url: &str) -> Result<Vec<Player>, RemoteFailure> {
    client.call_json(&RemoteRequest::get(url)).await
}

/// Connection quality bucket of a ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingQuality {
    Excellent,
    Good,
    Poor,
}

impl PingQuality {
    pub fn classify(ping: u32) -> Self {
        if ping < 50 {
            Self::Excellent
        } else if ping < 100 {
            Self::Good
        } else {
            Self::Poor
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Excellent => "🟢",
            Self::Good => "🟡",
            Self::Poor => "🔴",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Poor => "Poor",
        }
    }
}

fn plural(count: i64, unit: &str) -> String {
    format!("{} {}{} ago", count, unit, if count > 1 { "s" } else { "" })
}

/// Human readable time since `joined_at`.
pub fn describe_joined(joined_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let elapsed = now - joined_at.unwrap_or(now);

    if elapsed.num_days() > 0 {
        plural(elapsed.num_days(), "day")
    } else if elapsed.num_hours() > 0 {
        plural(elapsed.num_hours(), "hour")
    } else if elapsed.num_minutes() > 0 {
        plural(elapsed.num_minutes(), "minute")
    } else {
        "Just now".to_string()
    }
}

/// Result of looking one player up in the online list.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerReport {
    /// Nobody is online at all
    ServerEmpty,
    /// The id is not in the online list
    NotOnline { id: i64 },
    Found {
        player: Player,
        total_online: usize,
        /// Exact mean ping of everyone online; rounded only for display
        average_ping: f64,
    },
}

impl PlayerReport {
    pub fn build(players: &[Player], id: i64) -> Self {
        if players.is_empty() {
            return Self::ServerEmpty;
        }

        let Some(player) = players.iter().find(|p| p.id == id) else {
            return Self::NotOnline { id };
        };

        let total: u64 = players.iter().map(|p| p.ping as u64).sum();
        let average_ping = total as f64 / players.len() as f64;

        Self::Found {
            player: player.clone(),
            total_online: players.len(),
            average_ping,
        }
    }

    /// Text reply for the `/search` command.
    pub fn render(&self, now: DateTime<Utc>) -> String {
        match self {
            Self::ServerEmpty => "🔍 No players currently online on the server.".to_string(),
            Self::NotOnline { id } => format!(
                "🔍 Player with ID `{}` is not currently online.\n**Status:** Player is offline or not in server",
                id
            ),
            Self::Found {
                player,
                total_online,
                average_ping,
            } => {
                let quality = PingQuality::classify(player.ping);
                let ping = f64::from(player.ping);
                let shown = average_ping.round() as u32;
                let comparison = if ping < *average_ping {
                    format!("Better than average ({}ms)", shown)
                } else if ping > *average_ping {
                    format!("Worse than average ({}ms)", shown)
                } else {
                    "Same as average".to_string()
                };

                format!(
                    "🔍 **Player Search Result**\n\
                    **Status:** Online ✅ ({} players)\n\
                    **Player ID:** `{}`\n\
                    **Name:** `{}`\n\
                    **Ping:** {} `{}ms` ({})\n\
                    **Joined:** `{}`\n\
                    **Comparison:** {}",
                    total_online,
                    player.id,
                    player.name,
                    quality.emoji(),
                    player.ping,
                    quality.label(),
                    describe_joined(player.joined_at, now),
                    comparison
                )
            }
        }
    }
}
