//! Verify a set of gram artifacts.
//!
//! Usage: cargo run --release --bin check_gram -- [--dir DIR] [--samples N]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use gram2bin::artifact::ArtifactPaths;
use gram2bin::check::check_artifacts;

#[derive(Parser, Debug)]
#[clap(name = "check_gram", about = "Checks id, weight and bigram table invariants")]
struct Cli {
    /// Directory holding unigram.idx, unigram.bin and bigram.bin.
    #[clap(short, long, default_value = ".")]
    dir: PathBuf,

    /// Random terms to look up end to end.
    #[clap(long, default_value_t = 1000)]
    samples: usize,

    /// Seed for the sampled lookups.
    #[clap(long, default_value_t = 1)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let paths = ArtifactPaths::in_dir(&cli.dir);
    let report = check_artifacts(&paths, cli.samples, cli.seed)
        .with_context(|| format!("load artifacts in {}", cli.dir.display()))?;

    println!(
        "{} terms, {} bigram pairs, {} sampled lookups",
        report.terms, report.bigram_pairs, report.sampled
    );
    for failure in &report.failures {
        println!("FAIL: {failure}");
    }
    if !report.is_ok() {
        anyhow::bail!("{} checks failed", report.failures.len());
    }
    println!("OK: all checks passed.");
    Ok(())
}
