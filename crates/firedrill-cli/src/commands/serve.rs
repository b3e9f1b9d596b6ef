//! `serve`: run the gateway in the foreground.

use anyhow::Result;
use colored::Colorize;
use firedrill_config::Config;
use firedrill_gateway::GatewayServer;
use firedrill_runtime::IncidentRuntime;
use firedrill_runtime::config_bridge::{build_narrator, to_runtime_config};

use crate::theme::Theme;

/// Serve until Ctrl-C.
pub(crate) async fn run(mut config: Config, port: Option<u16>, seed: Option<u64>) -> Result<()> {
    if let Some(port) = port {
        config.gateway.port = port;
    }
    if seed.is_some() {
        config.simulation.seed = seed;
    }

    let narrator = build_narrator(&config)?;
    let narration = format!(
        "Narration: {} ({})",
        narrator.provider_name(),
        config.model.model
    );
    let runtime = IncidentRuntime::new(to_runtime_config(&config), narrator);
    let server = GatewayServer::start(runtime, &config.gateway).await?;

    println!(
        "{}",
        format!("Firedrill gateway listening on {}", server.url())
            .cyan()
            .bold()
    );
    println!("{}", Theme::dimmed(&narration));
    if let Some(seed) = config.simulation.seed {
        println!("{}", Theme::dimmed(&format!("Seed: {seed}")));
    }
    println!(
        "{}",
        Theme::dimmed(&format!("Join with: firedrill play --url {}", server.url()))
    );

    tokio::signal::ctrl_c().await?;
    println!("\n{}", "Shutting down gateway...".yellow());

    server.stop().await?;
    println!("{}", Theme::success("Gateway stopped"));
    Ok(())
}
