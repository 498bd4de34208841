//! Handshot demo
//!
//! Runs the hand-tracking and scene-reconstruction pipeline headless against
//! a scripted sensor session and reports what ended up in the scene.
//!
//! Usage:
//!   handshot-demo                        # Default script, default config
//!   handshot-demo --shots 8 --max-live 3 # Cap live projectiles
//!   handshot-demo --provider-failure     # End with a provider error

mod script;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use handshot_config::AppConfig;
use handshot_core::session::ChannelSession;
use handshot_core::{ImmersiveSession, ShellSignal, TriangleMeshGenerator};
use handshot_spatial::translation;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn};

use crate::script::ScriptOptions;

#[derive(Parser, Debug)]
#[command(name = "handshot-demo", about = "Scripted headless run of the handshot pipeline")]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter; RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    /// Trigger poses to play
    #[arg(long, default_value_t = 4)]
    shots: usize,

    /// Override the live projectile budget
    #[arg(long)]
    max_live: Option<usize>,

    /// Finish the script with a failing data provider
    #[arg(long)]
    provider_failure: bool,

    /// Pretend the device lacks the required providers
    #[arg(long)]
    unsupported: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(max_live) = cli.max_live {
        config.projectile.max_live = Some(max_live);
    }
    config.validate().context("validating configuration")?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .init();

    info!("handshot-demo v{} starting", env!("CARGO_PKG_VERSION"));

    let (shell_tx, mut shell_rx) = unbounded_channel();
    let shell = tokio::spawn(async move {
        let mut received = Vec::new();
        while let Some(signal) = shell_rx.recv().await {
            match signal {
                ShellSignal::DismissImmersiveSpace => info!("Shell: dismissing immersive space"),
                ShellSignal::OpenErrorWindow => warn!("Shell: opening error window"),
            }
            received.push(signal);
        }
        received
    });

    let immersive =
        ImmersiveSession::new(&config, Arc::new(TriangleMeshGenerator::new()), shell_tx);
    let (sensor, feed) = ChannelSession::new();
    let mut sensor = sensor.with_supported(!cli.unsupported);

    script::play(
        &feed,
        &ScriptOptions {
            shots: cli.shots,
            provider_failure: cli.provider_failure,
        },
    );
    drop(feed);

    let outcome = immersive.launch(&mut sensor).await;
    let signals = shell.await.context("shell task")?;

    let context = match outcome {
        Ok(context) => context,
        Err(e) => {
            warn!("Immersive session did not start: {}", e);
            info!("Shell received {:?}", signals);
            return Ok(());
        }
    };

    let scene = context.scene();
    info!(
        "Scene holds {} mesh entities and {} projectiles",
        context.meshes.len(),
        context.spawner.live_count()
    );
    for id in context.spawner.live() {
        if let Some(entity) = scene.entity(id) {
            let position = translation(&entity.transform);
            info!(
                "Projectile {} at ({:.2}, {:.2}, {:.2})",
                id, position.x, position.y, position.z
            );
        }
    }
    if context.error_state.is_raised() {
        warn!("Session finished in error state");
    }
    info!("Shell received {:?}", signals);

    Ok(())
}
