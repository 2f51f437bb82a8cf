//! treewalk - Iterative depth-first directory walker.
//!
//! Usage:
//!   treewalk [PATH]                          Walk PATH, printing every event
//!   treewalk [PATH] --max-depth 2            Expand directories above depth 2
//!   treewalk [PATH] --follow-links           Report link targets
//!   treewalk [PATH] --sandbox DIR            Deny reads outside DIR
//!   treewalk [PATH] --format json            One JSON object per event

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{self, Context, Result};
use tracing_subscriber::EnvFilter;

use treewalk_walk::{
    Event, FsProvider, SandboxPolicy, SandboxedFs, StdFs, TreeWalker, WalkConfig, WalkStats,
};

#[derive(Parser)]
#[command(
    name = "treewalk",
    version,
    about = "Walk a directory tree depth-first",
    long_about = "treewalk enumerates every entry reachable from a directory exactly \
                  once, classifying each as a file, directory or symbolic link."
)]
struct Cli {
    /// Directory to walk (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Only expand directories less than this many levels below the root
    #[arg(short = 'd', long)]
    max_depth: Option<usize>,

    /// Follow symbolic links to their targets
    #[arg(short = 'L', long)]
    follow_links: bool,

    /// Skip paths refused by the sandbox instead of aborting
    #[arg(long)]
    ignore_access_errors: bool,

    /// Cache attributes to avoid repeated lookups
    #[arg(long)]
    use_attribute_cache: bool,

    /// Only allow reads below this directory (repeatable)
    #[arg(long = "sandbox", value_name = "DIR")]
    sandbox: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = WalkConfig::builder()
        .max_depth(cli.max_depth)
        .follow_links(cli.follow_links)
        .ignore_access_errors(cli.ignore_access_errors)
        .use_attribute_cache(cli.use_attribute_cache)
        .build()?;

    if cli.sandbox.is_empty() {
        run_walk(TreeWalker::new(config), &cli.path, cli.format)
    } else {
        let mut policy = SandboxPolicy::new();
        for dir in &cli.sandbox {
            if !dir.is_dir() {
                eyre::bail!("Invalid sandbox directory {}", dir.display());
            }
            policy = policy.allow_read(dir);
        }
        let provider = SandboxedFs::new(StdFs, policy);
        run_walk(TreeWalker::with_provider(config, provider), &cli.path, cli.format)
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("treewalk=debug,treewalk_walk=debug,warn")
    } else {
        EnvFilter::new("treewalk=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Walk `path` and print each event, then a summary.
fn run_walk<P: FsProvider>(walker: TreeWalker<P>, path: &Path, format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut walk = walker.walk(path);
    for event in walk.by_ref() {
        let event = event.context("Walk failed")?;
        match format {
            OutputFormat::Text => writeln!(out, "{}", format_event(&event))?,
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&event)?)?,
        }
    }

    tracing::debug!(root = %path.display(), stats = ?walk.stats(), "walk complete");

    if let OutputFormat::Text = format {
        print_summary(&mut out, walk.stats())?;
    }

    Ok(())
}

/// Format one event as a text line.
fn format_event(event: &Event) -> String {
    let label = event.event_type().label();
    let mut line = format!("{:<6} {}", label, event.path().display());
    if let Some(target) = event.target() {
        line.push_str(&format!(" -> {}", target.display()));
    }
    if let Some(err) = event.error() {
        line = format!("{line}  ! {err}");
    }
    line
}

fn print_summary(out: &mut impl Write, stats: &WalkStats) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "─".repeat(60))?;
    writeln!(
        out,
        " {} entries, {} directories expanded, {} links",
        stats.entries, stats.directories_expanded, stats.links
    )?;
    writeln!(out, " {} in regular files", format_size(stats.total_size))?;
    if stats.failed + stats.unclassified + stats.denied > 0 {
        writeln!(
            out,
            " {} failed, {} unclassified, {} denied",
            stats.failed, stats.unclassified, stats.denied
        )?;
    }
    writeln!(out, "{}", "─".repeat(60))?;
    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
