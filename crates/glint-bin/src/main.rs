//! Glint entrypoint.
//!
//! Wires the studio core to a headless host: argument parsing, logging
//! bootstrap, config discovery, cart loading with section injection, and a
//! fixed-rate tick loop. A real platform frontend replaces the null host
//! and presents the framebuffer; everything else stays the same.

use anyhow::{Context, Result};
use clap::Parser;
use glint_cart::{Cartridge, chunk};
use glint_gfx::Framebuffer;
use glint_host::{HostSystem, NullHost, NullSound};
use glint_input::InputFrame;
use glint_studio::{Config, Studio};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_micros(1_000_000 / 60);

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "glint", version, about = "Glint fantasy-console studio")]
struct Args {
    /// Cart to load at startup.
    pub cart: Option<PathBuf>,
    /// Inject a code section into the loaded cart.
    #[arg(long = "code")]
    pub code: Option<PathBuf>,
    /// Inject a sprite-sheet section (raw 4bpp bytes) into the loaded cart.
    #[arg(long = "sprites")]
    pub sprites: Option<PathBuf>,
    /// Inject a map section into the loaded cart.
    #[arg(long = "map")]
    pub map: Option<PathBuf>,
    /// Open the file browser at startup.
    #[arg(long)]
    pub surf: bool,
    /// Start fullscreen.
    #[arg(long)]
    pub fullscreen: bool,
    /// Window scale factor.
    #[arg(long)]
    pub scale: Option<u32>,
    /// Configuration file override.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Run a bounded number of frames then exit (headless driving).
    #[arg(long)]
    pub frames: Option<u64>,
}

fn app_folder() -> PathBuf {
    std::env::var_os("GLINT_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".glint"))
}

fn configure_logging(folder: &std::path::Path, directive: &str) -> Option<WorkerGuard> {
    let _ = std::fs::create_dir_all(folder);
    let appender = tracing_appender::rolling::never(folder, "glint.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn load_cart(args: &Args) -> Result<(Cartridge, Option<PathBuf>)> {
    let (mut cart, path) = match &args.cart {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("reading cart {}", path.display()))?;
            (chunk::load(&bytes)?, Some(path.clone()))
        }
        None => (Cartridge::default(), None),
    };
    if path.is_none() {
        cart.palette = glint_gfx::theme::default_palette();
    }

    if let Some(code) = &args.code {
        let text = std::fs::read_to_string(code)
            .with_context(|| format!("reading code section {}", code.display()))?;
        cart.code.load_text(&text);
    }
    if let Some(sprites) = &args.sprites {
        let bytes = std::fs::read(sprites)
            .with_context(|| format!("reading sprite section {}", sprites.display()))?;
        cart.tiles.load_bytes(&bytes);
    }
    if let Some(map) = &args.map {
        let bytes = std::fs::read(map)
            .with_context(|| format!("reading map section {}", map.display()))?;
        cart.map.load_bytes(&bytes);
    }
    Ok((cart, path))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let folder = app_folder();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| Studio::config_path(&folder));
    let config = Config::load_from(&config_path).unwrap_or_else(|err| {
        eprintln!("config error: {err:#}");
        Config::default()
    });

    let _log_guard = configure_logging(&folder, &config.log);
    info!(target: "runtime", "startup");

    let (cart, cart_path) = load_cart(&args)?;

    let mut studio = Studio::new(folder, config, Cartridge::default());
    studio.rom_loaded(cart, cart_path);

    let mut host = NullHost::new();
    let mut sound = NullSound::new();
    let mut fb = Framebuffer::default();

    host.set_window_title("Glint");
    if args.fullscreen || studio.config().fullscreen {
        host.fullscreen_toggle();
    }
    if let Some(scale) = args.scale {
        info!(target: "runtime", scale, "scale override");
    }
    if args.surf {
        warn!(target: "runtime", "surf mode requested; no file browser in the headless host");
    }

    let mut ticks: u64 = 0;
    loop {
        let started = Instant::now();
        studio.tick(&InputFrame::default(), &mut fb, &mut sound, &mut host);
        sound.advance();
        host.advance();

        ticks += 1;
        if let Some(limit) = args.frames {
            if ticks >= limit {
                break;
            }
        }
        if studio.should_exit() {
            break;
        }
        if let Some(remaining) = FRAME.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    info!(target: "runtime", ticks, "shutdown");
    Ok(())
}
