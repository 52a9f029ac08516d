//! # inkpress CLI
//!
//! Command-line interface for the inkpress static site generator.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inkpress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file [default: inkpress.yml, if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Defaults to a clean build when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new inkpress project
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Build the static site
    Build {
        /// Keep the existing output directory instead of wiping it first
        #[arg(long)]
        no_clean: bool,

        /// Render pages with the live-reload hook enabled
        #[arg(long)]
        refresh: bool,
    },

    /// Serve static assets and push live-reload notifications
    Dev {
        /// Static file server port
        #[arg(long)]
        port: Option<u16>,

        /// Live-reload websocket port
        #[arg(long)]
        reload_port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let command = cli.command.unwrap_or(Commands::Build {
        no_clean: false,
        refresh: false,
    });

    match command {
        Commands::Init { path } => commands::init_project(path.as_deref()),
        Commands::Build { no_clean, refresh } => {
            commands::build_site(cli.config.as_deref(), !no_clean, refresh).await
        }
        Commands::Dev { port, reload_port } => {
            commands::dev_server(cli.config.as_deref(), port, reload_port).await
        }
    }
}
