#![forbid(unsafe_code)]

//! wavedeck — appliance control daemon entry point.

use std::path::PathBuf;

use clap::Parser;

use wavedeck::core::config::Config;
use wavedeck::core::errors::Result;

#[derive(Parser, Debug)]
#[command(version, about = "Control core for the wavedeck audio recorder appliance")]
struct Cli {
    /// Configuration file (defaults to /etc/wavedeck/config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the recording directory
    #[arg(long)]
    record_dir: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    check_config: bool,
}

fn main() {
    let args = Cli::parse();
    if let Err(e) = run(&args) {
        eprintln!("wavedeck: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Cli) -> Result<()> {
    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(dir) = &args.record_dir {
        cfg.paths.record_dir = dir.clone();
    }
    if args.check_config {
        println!("configuration OK");
        return Ok(());
    }
    wavedeck::app::runtime::run(cfg)
}
