mod commands;
mod script;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{palette, replay, PaletteArgs, ReplayArgs};

/// procflow CLI - replay process diagram edits
#[derive(Parser, Debug)]
#[command(name = "procflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a JSON script of edits and print the resulting document
    Replay(ReplayArgs),

    /// List palette entries
    Palette(PaletteArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Replay(args) => replay(args, &cwd),
        Command::Palette(args) => palette(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
