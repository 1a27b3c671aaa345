//! Ping command for bot health check.

use crate::types::{Context, Error};

/// Check that the bot is responsive and report gateway latency.
#[poise::command(slash_command)]
pub async fn ping(context: Context<'_>) -> Result<(), Error> {
    let latency = context.ping().await;
    context
        .say(format!("Pong! 🏓 `{}ms`", latency.as_millis()))
        .await?;
    Ok(())
}
