use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod build;
mod commands;
mod config;
mod util;

#[derive(Parser)]
#[command(version, about = "Build and serve a Markdown/MDX blog")]
struct Args {
    /// The command to execute
    #[command(subcommand)]
    command: BlogCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(long)]
    create: bool,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file (defaults to blogsmith.yaml)
    #[arg(short, long)]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct ServeArgs {
    /// The address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// The port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Open the blog in the default browser
    #[arg(short, long)]
    open: bool,

    /// The path to the configuration file (defaults to blogsmith.yaml)
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Watch for changes and rebuild automatically
    #[arg(short, long)]
    watch: bool,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file (defaults to blogsmith.yaml)
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Print what would be deleted without deleting it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum BlogCommand {
    /// Create a config file and a sample post
    Init(InitArgs),

    /// Build every post into the output directory
    Build(BuildArgs),

    /// Build, then serve the blog on a local port
    Serve(ServeArgs),

    /// Delete the output directory
    Clean(CleanArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    // RUST_LOG wins, otherwise info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command {
        BlogCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
        BlogCommand::Build(args) => {
            commands::build::run(&args).await?;
        }
        BlogCommand::Serve(args) => {
            commands::serve::run(&args).await?;
        }
        BlogCommand::Clean(args) => {
            commands::clean::run(&args).await?;
        }
    }

    Ok(())
}
