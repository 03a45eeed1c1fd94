use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;

use gram2bin::corpus::CorpusOptions;
use gram2bin::{dict, gram, GramConfig};

#[derive(Parser, Debug)]
#[clap(name = "gram2bin", version, about = "Builds binary unigram/bigram cost files")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Builds unigram.idx, unigram.bin and bigram.bin from count corpora.
    Gram(GramArgs),

    /// Builds a standalone term index from `term value` lines.
    Dict(DictArgs),
}

#[derive(Args, Debug)]
struct GramArgs {
    /// Unigram counts, one `term count` per line (.gz accepted).
    unigram: PathBuf,

    /// Bigram counts, one `left right count` per line (.gz accepted).
    bigram: PathBuf,

    /// Directory the artifacts are written to.
    #[clap(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Normalize terms to Unicode NFC.
    #[clap(long)]
    nfc: bool,

    /// Also write a JSON build summary to this file.
    #[clap(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DictArgs {
    /// Input file with `term value` lines.
    input: PathBuf,

    /// Output index file.
    output: PathBuf,

    /// Normalize terms to Unicode NFC.
    #[clap(long)]
    nfc: bool,
}

fn run_gram(args: GramArgs) -> Result<()> {
    let config = GramConfig {
        out_dir: args.out_dir,
        corpus: CorpusOptions { nfc: args.nfc },
    };
    let summary = gram::make_gram(&args.unigram, &args.bigram, &config)
        .context("gram build failed")?;

    if let Some(report) = &args.report {
        gram::write_report(&summary, report)
            .with_context(|| format!("write report {}", report.display()))?;
    }

    println!(
        "✓ {} unigram entries -> {}, {}",
        summary.unigram_entries,
        summary.index_path.display(),
        summary.weights_path.display()
    );
    println!(
        "✓ {} of {} bigram entries -> {}",
        summary.bigram_retained,
        summary.bigram_entries,
        summary.bigram_path.display()
    );
    println!("Success!");
    Ok(())
}

fn run_dict(args: DictArgs) -> Result<()> {
    let options = CorpusOptions { nfc: args.nfc };
    let summary = dict::make_dict(&args.input, &args.output, &options)
        .with_context(|| format!("dict build from {} failed", args.input.display()))?;
    println!("save {} words.", summary.words);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Gram(args) => run_gram(args),
        Command::Dict(args) => run_dict(args),
    }
}
