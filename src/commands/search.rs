//! Player search command.
//!
//! Looks a player up by in-game id in the game server's online list.

use chrono::Utc;
use tracing::error;

use crate::players::{fetch_players, PlayerReport};
use crate::types::{Context, Error};

/// Search for a specific player on the game server.
///
/// The lookup goes through the retrying remote client, so a slow API gets one
/// more chance before the user sees an error.
#[poise::command(slash_command)]
pub async fn search(
    context: Context<'_>,
    #[description = "Player ID to search for"]
    id: i64,
) -> Result<(), Error> {
    // Reply is deferred since the API may need a retry
    context.defer_ephemeral().await?;

    let data = context.data();
    match fetch_players(&data.remote, &data.player_api_url).await {
        Ok(players) => {
            let report = PlayerReport::build(&players, id);
            context.say(report.render(Utc::now())).await?;
        }
        Err(e) => {
            error!(player_id = id, "Player lookup failed: {}", e);
            context
                .say("❌ An error occurred while fetching server data. Please try again later.")
                .await?;
        }
    }

    Ok(())
}
