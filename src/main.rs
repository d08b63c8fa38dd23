use memory_tunnel::cli::Args;
use memory_tunnel::config::{self, PathConfig, TunnelConfig};
use memory_tunnel::core::{DiskFetcher, FrameSequence, FrameTemplate, Workers};
use memory_tunnel::render::post::render_cpu;
use memory_tunnel::render::{ShaderParams, ShaderState};
use memory_tunnel::shell;
use memory_tunnel::ui::{self, TunnelApp};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use eframe::egui;
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for loading frames before a headless snapshot
const SNAPSHOT_LOAD_TIMEOUT: Duration = Duration::from_secs(120);

fn main() -> Result<()> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());

    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    if let Some(log_path) = shell::init_logger(args.verbosity, args.log_file.as_ref(), &path_config)? {
        info!("Logging to file: {}", log_path.display());
    }

    info!("Memory Tunnel starting...");
    debug!("Command-line args: {:?}", args);
    info!(
        "Config path: {}",
        config::config_file(config::CONFIG_FILE, &path_config).display()
    );

    let mut tunnel = TunnelConfig::load(args.config_file.as_deref(), &path_config)?;
    args.apply(&mut tunnel);
    tunnel.validate()?;

    if let Some(out) = &args.snapshot {
        return snapshot(&tunnel, &args, out);
    }

    let audio = ui::open_audio(tunnel.bell_path.clone(), tunnel.music_path.clone());

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("Memory Tunnel v{}", env!("CARGO_PKG_VERSION")))
            .with_inner_size([1280.0, 800.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "Memory Tunnel",
        native_options,
        Box::new(move |cc| Ok(Box::new(TunnelApp::new(cc, tunnel, audio)?))),
    )
    .map_err(|e| anyhow!("Window error: {}", e))
}

/// Load the sequence, resolve one progress value and render it on the CPU
fn snapshot(config: &TunnelConfig, args: &Args, out: &Path) -> Result<()> {
    let workers = Workers::new(Workers::default_threads()).context("Failed to start worker threads")?;
    let template = FrameTemplate::new(&config.frames_path, &config.frame_ext);
    let mut frames = FrameSequence::new(config.total_frames, template)?;

    frames.begin_load(&workers, Arc::new(DiskFetcher), |summary| {
        info!("Snapshot: {}/{} frames ready", summary.ready, summary.total);
    });
    if !frames.wait_settled(SNAPSHOT_LOAD_TIMEOUT) {
        warn!("Snapshot: frames still loading, rendering what is available");
    }

    let (width, height) = args.snapshot_size();
    let mut state = ShaderState::new(ShaderParams::from_config(config));
    state.resize(width as f32, height as f32);
    state.set_elapsed(args.time);
    if !state.set_active(frames.resolve(args.progress)) {
        warn!("No frame available at progress {}, output is black", args.progress);
    }

    render_cpu(&state, width, height)
        .save(out)
        .with_context(|| format!("Failed to write snapshot: {}", out.display()))?;

    println!("Snapshot written: {} ({}x{})", out.display(), width, height);
    Ok(())
}
