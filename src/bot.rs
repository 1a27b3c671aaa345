//! Bot startup.
//!
//! Builds the poise framework, hands the serenity HTTP client to the admin
//! panel and runs the gateway connection until shutdown.

use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::commands::{ping, search};
use crate::config::Config;
use crate::error::Result;
use crate::jobs::TaskRegistry;
use crate::pager::CursorPager;
use crate::panel::{self, AppState};
use crate::platform::SerenityPlatform;
use crate::remote::RemoteCallClient;
use crate::types::Data;

pub async fn run(config: Config) -> Result<()> {
    // GUILD_MEMBERS is privileged and must be enabled in the developer portal for ban-all
    let intents = serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::GUILD_MEMBERS;

    let remote = RemoteCallClient::new(reqwest::Client::new(), config.retry_policy);

    let command_remote = remote.clone();
    let player_api_url = config.player_api_url.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![ping(), search()],
            ..Default::default()
        })
        .setup(move |context, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(context, &framework.options().commands).await?;
                info!("{} has connected to Discord!", ready.user.name);
                Ok(Data {
                    remote: command_remote,
                    player_api_url,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    let platform = Arc::new(SerenityPlatform::new(client.http.clone()));
    let pager = CursorPager::new(remote, &config.discord_api_base, &config.discord_token);
    let state = AppState::new(
        platform,
        TaskRegistry::new(),
        pager,
        config.pacing_delay,
        config.spam_interval,
    );

    let address = config.panel_address.clone();
    tokio::spawn(async move {
        if let Err(e) = panel::serve(state, &address).await {
            error!("Admin panel stopped: {}", e);
        }
    });

    info!("Starting Discord bot...");
    client.start().await?;

    Ok(())
}
