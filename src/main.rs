use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use voxlink::{Config, SessionController, SessionState};

/// Realtime full-duplex voice conversation client
#[derive(Parser, Debug)]
#[command(name = "voxlink", version)]
struct Args {
    /// Path to the config file (without extension)
    #[arg(short, long, default_value = "config/voxlink")]
    config: String,

    /// Agent WebSocket URL (overrides the config file)
    #[arg(long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("no config loaded from {} ({}), using defaults", args.config, e);
            Config::default()
        }
    };

    let mut session_config = cfg.session_config();
    if let Some(url) = args.url {
        session_config.agent_url = url;
    }

    info!("voxlink v0.1.0");
    info!("agent: {} ({})", session_config.agent_url, session_config.model);
    info!("session: {}", session_config.session_id);

    let mut controller = SessionController::new(session_config);
    controller.start().await?;

    info!("session running, press Ctrl-C to stop");
    let final_state = controller
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    for turn in controller.transcript() {
        println!("{:?}: {}", turn.channel, turn.text);
    }

    let stats = controller.stats();
    info!(
        "session ended: {:?} ({:.1}s, {} frames sent, {} segments played, {} turns)",
        final_state, stats.duration_secs, stats.frames_sent, stats.segments_played, stats.turns_count
    );

    if final_state == SessionState::Error {
        anyhow::bail!(
            "session failed: {}",
            controller.last_error().unwrap_or("unknown error")
        );
    }

    Ok(())
}
