//! CLI for the MQD media queue downloader.

mod commands;
mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mqd_core::config::MqdConfig;
use std::path::PathBuf;

use commands::{run_control, run_get, run_history, run_info, GetArgs};
use mqd_core::control::ControlCommand;

/// Top-level CLI for the MQD media queue downloader.
#[derive(Debug, Parser)]
#[command(name = "mqd")]
#[command(about = "MQD: media queue downloader driving yt-dlp workers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Queue URLs, fetch their metadata and download them.
    Get {
        /// Media page URLs.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Output directory (overrides `out_dir` from config).
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Route every download through this proxy (overrides `[proxy]` from config).
        #[arg(long, value_name = "URL")]
        proxy: Option<String>,

        /// Fetch and record metadata only; do not download.
        #[arg(long)]
        info_only: bool,
    },

    /// Fetch metadata for a URL and print it as JSON.
    Info {
        /// Media page URL.
        url: String,
    },

    /// List recently fetched media.
    History {
        /// Maximum number of entries (default: `history_limit` from config).
        #[arg(long, value_name = "N")]
        limit: Option<u32>,
    },

    /// Stop one download of a running `mqd get` by its task index.
    Stop {
        /// Task index as printed by `mqd get`.
        index: usize,
    },

    /// Restart a stopped download of a running `mqd get`.
    Start {
        /// Task index as printed by `mqd get`.
        index: usize,
    },

    /// Stop every download of a running `mqd get`.
    StopAll,
}

impl CliCommand {
    pub async fn run_from_args(cfg: &MqdConfig) -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Get {
                urls,
                out_dir,
                proxy,
                info_only,
            } => {
                let args = GetArgs {
                    urls,
                    out_dir,
                    proxy,
                    info_only,
                };
                run_get(cfg, args).await?;
            }
            CliCommand::Info { url } => run_info(cfg, &url).await?,
            CliCommand::History { limit } => {
                run_history(limit.unwrap_or(cfg.history_limit)).await?
            }
            CliCommand::Stop { index } => run_control(ControlCommand::Stop(index)).await?,
            CliCommand::Start { index } => run_control(ControlCommand::Start(index)).await?,
            CliCommand::StopAll => run_control(ControlCommand::StopAll).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
