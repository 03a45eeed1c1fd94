//! Look words up in built gram artifacts.
//!
//! Usage: cargo run --release --bin lookup_gram -- [--dir DIR] WORD...

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use gram2bin::GramModel;

#[derive(Parser, Debug)]
#[clap(name = "lookup_gram", about = "Prints unigram and bigram costs for words")]
struct Cli {
    /// Directory holding unigram.idx, unigram.bin and bigram.bin.
    #[clap(short, long, default_value = ".")]
    dir: PathBuf,

    /// List indexed terms starting with this prefix instead.
    #[clap(long)]
    prefix: Option<String>,

    /// Words to look up; adjacent pairs are looked up as bigrams.
    words: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let model = GramModel::open_dir(&cli.dir)
        .with_context(|| format!("open artifacts in {}", cli.dir.display()))?;
    println!(
        "{} terms, {} bigram pairs",
        model.index.len(),
        model.bigrams.len()
    );

    if let Some(prefix) = &cli.prefix {
        for (term, id) in model.index.with_prefix(prefix).iter().take(20) {
            let cost = model.weights.get(*id).unwrap_or(f32::NAN);
            println!("{prefix}*: {term} id={id} cost={cost:.4}");
        }
    }

    for word in &cli.words {
        match model.unigram_cost(word) {
            Some(cost) => println!("{word}: id={} cost={cost:.4}", model.id(word)),
            None => println!("{word}: (not found)"),
        }
    }

    for pair in cli.words.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        match model.bigram_cost(left, right) {
            Some(cost) => println!("{left} {right}: cost={cost:.4}"),
            None => println!("{left} {right}: (no bigram)"),
        }
    }

    Ok(())
}
