//! Subcommand execution.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use serde::Serialize;
use tracing::info;

use crier_core::domain::{HistoryQuery, PublishRequest, TaskId};
use crier_core::impls::{BridgeAdapter, InMemoryLedger, JsonFileLedger, ScriptedAdapter};
use crier_core::ports::{ContentLedger, PlatformAdapter};
use crier_core::{Dispatcher, DispatcherBuilder};

use crate::cli::{BodySource, Cli, Command};
use crate::config::CrierConfig;

pub async fn run(cli: Cli, config: CrierConfig) -> anyhow::Result<()> {
    let config = config.with_overrides(cli.ledger, cli.bridge_url);
    let dispatcher = build_dispatcher(&config, cli.dry_run).await?;

    match cli.command {
        Command::Publish {
            title,
            source,
            platforms,
            content_type,
            tags,
            cover,
            video,
            draft,
        } => {
            let body = read_body(&source).await?;
            let mut request =
                PublishRequest::new(title, body, platforms).with_content_type(content_type);
            request.tags = tags;
            request.cover_url = cover;
            request.video_path = video;
            request.draft_only = draft;

            let result = dispatcher.submit(request).await?;
            print_json(&result)
        }
        Command::Status { task_id } => {
            let task_id = TaskId::new(task_id);
            match dispatcher.status(&task_id).await? {
                Some(status) => print_json(&status),
                None => bail!("task {task_id} not found"),
            }
        }
        Command::Retry {
            task_id,
            platform,
            title,
            file,
        } => {
            let task_id = TaskId::new(task_id);
            let body = read_file(&file).await?;
            let request = PublishRequest::new(title, body, platform);
            match dispatcher.retry_with(&task_id, platform, request).await? {
                Some(result) => print_json(&result),
                None => {
                    info!(%task_id, "nothing to retry");
                    print_json(&serde_json::Value::Null)
                }
            }
        }
        Command::Targets { cached } => {
            if cached {
                print_json(&dispatcher.accounts().await?)
            } else {
                print_json(&dispatcher.list_targets().await)
            }
        }
        Command::History {
            page,
            size,
            platform,
            status,
        } => {
            let mut query = HistoryQuery::new(page, size);
            query.platform = platform;
            query.status = status;
            print_json(&dispatcher.history(&query).await?)
        }
    }
}

async fn build_dispatcher(config: &CrierConfig, dry_run: bool) -> anyhow::Result<Dispatcher> {
    let (adapter, ledger): (Arc<dyn PlatformAdapter>, Arc<dyn ContentLedger>) = if dry_run {
        info!("dry run: scripted adapters, in-memory ledger");
        (
            Arc::new(ScriptedAdapter::new()),
            Arc::new(InMemoryLedger::new()),
        )
    } else {
        let adapter = BridgeAdapter::new(config.bridge_config()).context("creating bridge client")?;
        let ledger = JsonFileLedger::open(&config.ledger.path)
            .await
            .with_context(|| format!("opening ledger {}", config.ledger.path.display()))?;
        (Arc::new(adapter), Arc::new(ledger))
    };

    let dispatcher = DispatcherBuilder::new()
        .register(adapter)?
        .ledger(ledger)
        .probe_timeout(config.probe_timeout())
        .build()?;
    Ok(dispatcher)
}

async fn read_body(source: &BodySource) -> anyhow::Result<String> {
    match (&source.body, &source.file) {
        (Some(body), _) => Ok(body.clone()),
        (None, Some(path)) => read_file(path).await,
        (None, None) => bail!("either --body or --file is required"),
    }
}

async fn read_file(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn dry_run_publish_succeeds() {
        let cli = Cli::try_parse_from([
            "crier", "--dry-run", "publish", "-t", "Hello", "--body", "World", "-p", "zhihu,csdn",
        ])
        .unwrap();
        run(cli, CrierConfig::default()).await.unwrap();
    }

    #[tokio::test]
    async fn dry_run_status_of_unknown_task_is_an_error() {
        let cli = Cli::try_parse_from(["crier", "--dry-run", "status", "nope"]).unwrap();
        let err = run(cli, CrierConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn body_is_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        std::fs::write(&path, "# Hello\n\nfrom a file").unwrap();

        let source = BodySource {
            body: None,
            file: Some(path),
        };
        assert_eq!(read_body(&source).await.unwrap(), "# Hello\n\nfrom a file");
    }

    #[tokio::test]
    async fn retry_needs_a_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.md");
        let cli = Cli::try_parse_from([
            "crier",
            "--dry-run",
            "retry",
            "abcdefghjkmn",
            "-t",
            "Hello",
            "--file",
            missing.to_str().unwrap(),
        ])
        .unwrap();

        let err = run(cli, CrierConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("reading"));
    }

    #[tokio::test]
    async fn retry_of_unknown_task_prints_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        std::fs::write(&path, "World").unwrap();
        let cli = Cli::try_parse_from([
            "crier",
            "--dry-run",
            "retry",
            "abcdefghjkmn",
            "-t",
            "Hello",
            "--file",
            path.to_str().unwrap(),
        ])
        .unwrap();

        run(cli, CrierConfig::default()).await.unwrap();
    }

    #[tokio::test]
    async fn history_uses_the_configured_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let config = CrierConfig::default().with_overrides(Some(dir.path().join("l.json")), None);

        let cli = Cli::try_parse_from(["crier", "history", "--size", "5"]).unwrap();
        run(cli, config).await.unwrap();
    }
}
