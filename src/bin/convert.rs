use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use edfconv::{run_job, JobConfig};

#[derive(Parser)]
#[command(name = "edfconv", about = "Convert a multi-block biosignal recording to EDF")]
struct Args {
    /// Job configuration (JSON)
    config: PathBuf,

    /// Log chunk-level progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let cfg = JobConfig::from_json_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    std::fs::create_dir_all(&cfg.save_path)
        .with_context(|| format!("creating {}", cfg.save_path.display()))?;

    println!(
        "Converting {} (subject {}): {} channels, {} Hz -> {} Hz",
        cfg.source_path().display(),
        cfg.subject,
        cfg.ch_list.len(),
        cfg.fs,
        cfg.new_fs
    );

    let outcomes = run_job(&cfg)?;

    let converted = outcomes.iter().filter(|o| o.is_converted()).count();
    let skipped = outcomes.len() - converted;
    println!(
        "Done: {converted} block(s) converted, {skipped} skipped -> {}",
        cfg.save_path.display()
    );

    Ok(())
}
