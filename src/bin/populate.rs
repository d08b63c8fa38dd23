//! Builds the numbered frame folder the tunnel plays from.

use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use memory_tunnel::config::PathConfig;
use memory_tunnel::populate::{self, PopulateOptions};
use memory_tunnel::shell;

/// Duplicate source photos into a 1..N numbered frame sequence
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder with the source photos
    #[arg(short = 's', long = "source", value_name = "DIR", default_value = "assets/family-photos")]
    source: PathBuf,

    /// Output folder for 1.ext .. N.ext
    #[arg(short = 't', long = "target", value_name = "DIR", default_value = "Family Photos")]
    target: PathBuf,

    /// Number of frames to write
    #[arg(short = 'n', long = "frames", value_name = "N", default_value_t = 190)]
    frames: usize,

    /// Source and output extension
    #[arg(short = 'e', long = "ext", value_name = "EXT", default_value = "png")]
    ext: String,

    /// Increase logging verbosity (default: info for this tool)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbosity: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    shell::init_logger(shell::info_by_default(args.verbosity), None, &PathConfig::default())?;

    let options = PopulateOptions {
        source: args.source,
        target: args.target,
        total_frames: args.frames,
        ext: args.ext,
    };
    let written = populate::run(&options)?;
    info!("Wrote {} frames", written);
    println!("Tunnel sequence populated: {} frames in {}", written, options.target.display());
    Ok(())
}
