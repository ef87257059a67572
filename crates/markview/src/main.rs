//! MarkView CLI - Markdown live preview.
//!
//! Provides commands for:
//! - `render`: Render a markdown file to HTML
//! - `watch`: Re-render whenever the file or its configuration changes
//! - `copy`: Copy a code block of a file to the system clipboard
//! - `themes`: List the available highlighting themes

mod commands;
mod debouncer;
mod error;
mod output;
mod preview;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CopyArgs, RenderArgs, WatchArgs};
use output::Output;

/// MarkView - Markdown live preview.
#[derive(Parser)]
#[command(name = "markview", version, about)]
struct Cli {
    /// Enable verbose output (highlighter warnings and render timing).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file to HTML.
    Render(RenderArgs),
    /// Re-render a markdown file whenever it or the configuration changes.
    Watch(WatchArgs),
    /// Copy a code block of a markdown file to the system clipboard.
    Copy(CopyArgs),
    /// List the available highlighting themes.
    Themes,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Watch(args) => args.execute(),
        Commands::Copy(args) => args.execute(),
        Commands::Themes => commands::themes::execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
