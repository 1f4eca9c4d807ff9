mod commands;
mod config;
mod progress;
mod render;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::render::Theme;

#[derive(Parser)]
#[command(
    name = "cftrack",
    version,
    about = "Track Codeforces rating and rank changes"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.config/cftrack/cftrack.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;
    let theme = if cli.no_color {
        Theme::plain()
    } else {
        Theme::colored()
    };

    match cli.command {
        commands::Command::Track(args) => commands::track::run(args, &config, &theme).await,
        commands::Command::Export(args) => commands::export::run(args, &config).await,
        commands::Command::History(args) => commands::history::run(args, &config, &theme).await,
        commands::Command::Handles(args) => commands::handles::run(args, &config).await,
    }
}
