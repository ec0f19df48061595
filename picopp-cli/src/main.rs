use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use picopp_core::{
    BatchOptions, DefinedSymbols, FailurePolicy, FenceMatching, PreprocessOptions, Preprocessor,
    ViolationPolicy, preprocess_path,
};
use tracing::Level;

/// Apply preprocessor directives to Lua sources, rewriting them in place.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// File or directory containing the sources to preprocess
    path: PathBuf,

    #[arg(
        long,
        num_args = 0..,
        value_name = "SYMBOL",
        help = "Symbols to define, e.g. 'debug'"
    )]
    symbols: Vec<String>,

    #[arg(long, help = "Log structural violations and continue instead of aborting the file")]
    lenient: bool,

    #[arg(long, help = "Accept any fence width when closing a target-only block")]
    any_fence_width: bool,

    #[arg(
        long,
        value_name = "TAG",
        default_value = picopp_core::directive::DEFAULT_TARGET_TAG,
        help = "Tag of target-only blocks"
    )]
    target_tag: String,

    #[arg(long, help = "Drop whitespace-only lines")]
    strip_blank_lines: bool,

    #[arg(
        long,
        value_name = "EXT",
        default_value = picopp_core::driver::DEFAULT_EXTENSION,
        help = "Extension of the files to preprocess in a directory"
    )]
    extension: String,

    #[arg(long, help = "Skip failing files instead of stopping at the first one")]
    keep_going: bool,

    #[arg(long, help = "Follow symbolic links while walking a directory")]
    follow_links: bool,

    #[arg(short, long, conflicts_with = "quiet", help = "Log each processed file")]
    verbose: bool,

    #[arg(short, long, help = "Only log errors")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    execute(cli)
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    let symbols: DefinedSymbols = cli.symbols.iter().cloned().collect();
    let preprocessor = Preprocessor::new(PreprocessOptions {
        policy: if cli.lenient {
            ViolationPolicy::Lenient
        } else {
            ViolationPolicy::Strict
        },
        fence_matching: if cli.any_fence_width {
            FenceMatching::Any
        } else {
            FenceMatching::Exact
        },
        target_tag: cli.target_tag.clone(),
        strip_blank_lines: cli.strip_blank_lines,
        ..PreprocessOptions::default()
    });
    let options = BatchOptions {
        extension: cli.extension.clone(),
        on_failure: if cli.keep_going {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Halt
        },
        follow_links: cli.follow_links,
    };

    let report = preprocess_path(&cli.path, &symbols, &preprocessor, &options)
        .with_context(|| format!("failed to preprocess {}", cli.path.display()))?;

    if !report.is_success() {
        return Err(anyhow::anyhow!(
            "{} file(s) failed to preprocess under {}",
            report.failed.len(),
            cli.path.display()
        ));
    }

    println!(
        "Preprocessed all files in {} with symbols {}.",
        cli.path.display(),
        symbols
    );
    Ok(())
}
