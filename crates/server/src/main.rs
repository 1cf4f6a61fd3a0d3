mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use spar::Relay;

use config::ServerConfig;

#[derive(Parser)]
#[command(name = "spar-server")]
#[command(about = "Spar match relay")]
struct Args {
    #[arg(short, long, help = "Address to bind")]
    bind: Option<String>,

    #[arg(short, long, help = "Port to listen on")]
    port: Option<u16>,

    #[arg(short, long, help = "Path to a TOML config file")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };

    let bind = args.bind.unwrap_or(config.bind);
    let port = args.port.unwrap_or(config.port);

    let mut relay = Relay::bind(format!("{bind}:{port}"))?;
    log::info!("relay listening on {}", relay.local_addr()?);

    relay.run();
    log::info!("relay shutting down");

    Ok(())
}
