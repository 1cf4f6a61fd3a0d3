mod config;
mod engine;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use spar::{
    CharacterConfig, CharacterControl, Direction, GameApp, IntentEvent, Lifecycle, Rig,
    SessionPhase,
};

use config::ClientConfig;
use engine::HeadlessEngine;

#[derive(Parser)]
#[command(name = "spar")]
#[command(about = "Spar game client")]
struct Args {
    #[arg(short, long, help = "Server address (e.g., 127.0.0.1:27101)")]
    server: Option<String>,

    #[arg(short, long, help = "Path to a TOML config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Simulation ticks per second")]
    tick_rate: Option<u32>,

    #[arg(long, help = "Stop after this many ticks (runs until killed by default)")]
    ticks: Option<u64>,

    #[arg(long, help = "Hold forward once the match starts")]
    autowalk: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };

    let server = args.server.unwrap_or_else(|| config.server.clone());
    let server_addr: SocketAddr = server
        .parse()
        .with_context(|| format!("invalid server address '{server}'"))?;
    let tick_rate = args.tick_rate.unwrap_or(config.tick_rate);

    let rig = Rig::new(&HeadlessEngine::channels(), config.animations.clone())?;
    let control = CharacterControl::new(rig, CharacterConfig::default());
    let mut app = GameApp::new(control, HeadlessEngine::new(), server_addr);

    app.on_start()?;

    let tick = Duration::from_secs_f64(1.0 / tick_rate as f64);
    let dt = tick.as_secs_f32();
    let mut walking = false;
    let mut count: u64 = 0;

    loop {
        let frame = Instant::now();
        app.on_tick(dt);

        if args.autowalk && !walking && app.phase() == SessionPhase::Play {
            app.handle_input(IntentEvent::Move {
                direction: Direction::Forward,
                pressed: true,
            });
            walking = true;
        }

        count += 1;
        if args.ticks.is_some_and(|limit| count >= limit) {
            break;
        }

        if let Some(rest) = tick.checked_sub(frame.elapsed()) {
            thread::sleep(rest);
        }
    }

    app.on_shutdown();
    log::info!("client exiting after {count} ticks");

    Ok(())
}
