//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crier_core::domain::{ContentType, Platform, PublishStatus};

#[derive(Debug, Parser)]
#[command(name = "crier", author, version, about = "Publish one post to many platforms", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./crier.toml when present)
    #[arg(short, long, global = true, env = "CRIER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Ledger file
    #[arg(long, global = true, env = "CRIER_LEDGER")]
    pub ledger: Option<PathBuf>,

    /// Sync bridge base URL
    #[arg(long, global = true, env = "CRIER_BRIDGE_URL")]
    pub bridge_url: Option<String>,

    /// Use scripted adapters and an in-memory ledger; nothing leaves the machine
    #[arg(long, global = true, env = "CRIER_DRY_RUN")]
    pub dry_run: bool,
}

/// Where the post body comes from.
#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
pub struct BodySource {
    /// Markdown body inline
    #[arg(long)]
    pub body: Option<String>,

    /// Markdown file holding the body
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Publish content to one or more platforms
    Publish {
        #[arg(short, long)]
        title: String,

        #[command(flatten)]
        source: BodySource,

        /// Target platform; repeat or comma-separate
        #[arg(short, long = "platform", value_delimiter = ',', required = true)]
        platforms: Vec<Platform>,

        #[arg(long, default_value = "article")]
        content_type: ContentType,

        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        cover: Option<String>,

        /// Video file for video content
        #[arg(long)]
        video: Option<String>,

        /// Save as draft instead of publishing
        #[arg(long)]
        draft: bool,
    },
    /// Show the aggregated state of a task
    Status { task_id: String },
    /// Publish a task's failed platforms again
    Retry {
        task_id: String,

        /// Only this platform
        #[arg(short, long)]
        platform: Option<Platform>,

        /// Title of the post, as first published
        #[arg(short, long)]
        title: String,

        /// Markdown file holding the body, as first published
        #[arg(long)]
        file: PathBuf,
    },
    /// List every platform with its live login state
    Targets {
        /// Show the account states recorded by the last probe instead
        #[arg(long)]
        cached: bool,
    },
    /// Browse publish records, newest first
    History {
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = 20)]
        size: usize,

        #[arg(short, long)]
        platform: Option<Platform>,

        #[arg(short, long)]
        status: Option<PublishStatus>,
    },
}
