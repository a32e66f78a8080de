use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ragmd_chunker::{Chunk, Chunker, ChunkingStats};
use ragmd_loader::{discover_markdown, parse_markdown_file};
use serde::Serialize;

use crate::flags::TokenizerFlag;
use crate::settings::Overrides;

mod flags;
mod settings;

#[derive(Parser)]
#[command(name = "ragmd")]
#[command(about = "Structure-aware markdown chunking for retrieval", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML file with chunker settings (flags take precedence)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Token counter
    #[arg(long, global = true, value_enum, conflicts_with = "hf_tokenizer")]
    tokenizer: Option<TokenizerFlag>,

    /// HuggingFace tokenizer.json to count tokens with
    #[arg(long, global = true)]
    hf_tokenizer: Option<PathBuf>,

    /// Minimum chunk size in tokens
    #[arg(long, global = true)]
    min: Option<usize>,

    /// Maximum chunk size in tokens
    #[arg(long, global = true)]
    max: Option<usize>,

    /// Tokens repeated between consecutive chunks (0 disables overlap)
    #[arg(long, global = true)]
    overlap: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk markdown files and print one JSON object per chunk
    Chunk(ChunkArgs),

    /// Print chunk count and token statistics
    Stats(StatsArgs),
}

#[derive(Args)]
struct ChunkArgs {
    /// Markdown file or docs folder
    path: PathBuf,

    /// Chunk only this file (overrides the folder scan)
    #[arg(long)]
    only: Option<PathBuf>,

    /// Limit number of files (0 = no limit)
    #[arg(long, default_value_t = 0)]
    max_files: usize,

    /// Chunk sections on all cores
    #[arg(long)]
    parallel: bool,
}

#[derive(Args)]
struct StatsArgs {
    /// Markdown file or docs folder
    path: PathBuf,

    /// Limit number of files (0 = no limit)
    #[arg(long, default_value_t = 0)]
    max_files: usize,

    /// Emit JSON instead of a summary line
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct StatsReport {
    files: usize,
    sections: usize,
    #[serde(flatten)]
    stats: ChunkingStats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let overrides = Overrides {
        tokenizer: cli.tokenizer,
        hf_tokenizer: cli.hf_tokenizer.clone(),
        min: cli.min,
        max: cli.max,
        overlap: cli.overlap,
    };
    let config = settings::resolve(cli.config.as_deref(), &overrides)?;
    let chunker = Chunker::new(config).context("Failed to build chunker")?;

    match cli.command {
        Commands::Chunk(args) => run_chunk(&chunker, args),
        Commands::Stats(args) => run_stats(&chunker, args),
    }
}

fn collect_files(path: &Path, only: Option<&Path>, max_files: usize) -> Result<Vec<PathBuf>> {
    if let Some(only) = only {
        return Ok(vec![only.to_path_buf()]);
    }
    discover_markdown(path, max_files)
        .with_context(|| format!("Docs path not found: {}", path.display()))
}

fn chunk_file(chunker: &Chunker, path: &Path, parallel: bool) -> Result<(usize, Vec<Chunk>)> {
    let (sections, _front_matter) = parse_markdown_file(path)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let chunks = if parallel {
        chunker.chunk_sections_parallel(&sections)
    } else {
        chunker.chunk_sections(&sections)
    }
    .with_context(|| format!("Failed to chunk {}", path.display()))?;
    Ok((sections.len(), chunks))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn run_chunk(chunker: &Chunker, args: ChunkArgs) -> Result<()> {
    let files = collect_files(&args.path, args.only.as_deref(), args.max_files)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut total_chunks = 0;

    for path in &files {
        let (_, chunks) = chunk_file(chunker, path, args.parallel)?;
        log::info!("{}: {} chunks", file_label(path), chunks.len());
        total_chunks += chunks.len();
        for chunk in &chunks {
            serde_json::to_writer(&mut out, chunk)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()?;

    log::info!("Chunked {} files into {total_chunks} chunks", files.len());
    Ok(())
}

fn run_stats(chunker: &Chunker, args: StatsArgs) -> Result<()> {
    let files = collect_files(&args.path, None, args.max_files)?;

    let mut sections = 0;
    let mut chunks = Vec::new();
    for path in &files {
        let (file_sections, file_chunks) = chunk_file(chunker, path, false)?;
        log::debug!("{}: {} chunks", file_label(path), file_chunks.len());
        sections += file_sections;
        chunks.extend(file_chunks);
    }

    let report = StatsReport {
        files: files.len(),
        sections,
        stats: Chunker::get_stats(&chunks),
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Files: {} | Sections: {} | {}",
            report.files, report.sections, report.stats
        );
    }
    Ok(())
}
