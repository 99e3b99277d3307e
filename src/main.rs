//! Joust Lobby Server
//!
//! Runs one lobby session behind the WebSocket controller gateway.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use joust::{
    game::HeadlessWorld,
    lobby::{SessionController, TracingDisplay},
    network::{spawn_session, ChannelGateway, GameServer},
    AppConfig, VERSION,
};

#[cfg(feature = "debug-tracing")]
const DEFAULT_FILTER: &str = "debug";
#[cfg(not(feature = "debug-tracing"))]
const DEFAULT_FILTER: &str = "info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env().context("loading configuration")?;

    info!("Joust Lobby Server v{}", VERSION);
    info!(
        "Teams: {}, countdown: {}s",
        config.session.num_teams, config.session.countdown_time
    );

    let controller = SessionController::new(
        config.session.clone(),
        ChannelGateway::new(),
        TracingDisplay,
        HeadlessWorld::new(),
    );
    let (session, session_task) = spawn_session(controller);
    info!("Session {} open", session.session_id());

    let server = GameServer::new(config.server.clone(), session.clone());

    tokio::select! {
        result = server.run() => {
            result.context("controller gateway failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            server.shutdown();
        }
    }

    let _ = session.shutdown().await;
    let controller = session_task.await.context("session task panicked")?;
    info!(
        "Session {} closed in phase {:?} with {} players",
        controller.id(),
        controller.phase(),
        controller.registry().count()
    );

    Ok(())
}
