//! Discord Media Tool CLI
//!
//! A command-line tool for shrinking videos and audio to fit Discord's upload limits.

use clap::Parser;
use discord_media_tool::cli::{
    args::{Cli, Commands},
    commands::{check, convert, encode, gif, probe},
};
use discord_media_tool::models::config::{self, Config};
use discord_media_tool::preflight;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config = config::load_config(cli.config.as_deref())?;

    // Run the appropriate command
    match cli.command {
        Commands::Check => {
            check::check(&config).await?;
        }

        Commands::Probe { file, kind, json } => {
            if !cli.skip_preflight {
                run_preflight_checks(&config).await?;
            }
            probe::probe(&config, &file, kind.into(), json).await?;
        }

        Commands::Encode {
            file,
            codec,
            size,
            bitrate,
            conservative,
            size_limit,
        } => {
            if !cli.skip_preflight {
                run_preflight_checks(&config).await?;
            }
            encode::encode(
                &config,
                &file,
                codec.into(),
                size,
                bitrate,
                conservative,
                size_limit,
            )
            .await?;
        }

        Commands::Convert {
            file,
            codec,
            bitrate,
            size,
            conservative,
        } => {
            if !cli.skip_preflight {
                run_preflight_checks(&config).await?;
            }
            convert::convert(&config, &file, codec.into(), bitrate, size, conservative).await?;
        }

        Commands::Gif { file } => {
            if !cli.skip_preflight {
                run_preflight_checks(&config).await?;
            }
            gif::gif(&config, &file).await?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("discord_media_tool=debug")
    } else {
        EnvFilter::new("discord_media_tool=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

/// Run preflight checks and exit if any fail.
///
/// A missing ffmpeg or ffprobe is fatal: nothing else can work without them.
async fn run_preflight_checks(config: &Config) -> anyhow::Result<()> {
    let results = preflight::run_preflight_checks(&config.tools).await;

    if !preflight::all_passed(&results) {
        preflight::print_results(&results);
        println!();
        preflight::ensure_passed(&results)?;
    }

    Ok(())
}
