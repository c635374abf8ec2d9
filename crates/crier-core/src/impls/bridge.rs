//! Sync-bridge adapter.
//!
//! Talks to a local bridge process that relays to a browser extension logged
//! in to the article platforms. Every call is `POST {url}/request` with
//! `{"method": ..., "params": ...}`; the reply carries either `result` or
//! `error`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::{AdapterError, Platform, PlatformResult, PublishMethod, PublishRequest};
use crate::ports::PlatformAdapter;

pub const DEFAULT_BRIDGE_URL: &str = "http://localhost:9528";
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(15);

/// Characters of an unrecognised reply quoted in the error.
const UNKNOWN_RESULT_EXCERPT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub url: String,
    pub publish_timeout: Duration,
    pub list_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BRIDGE_URL.to_string(),
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            list_timeout: DEFAULT_LIST_TIMEOUT,
        }
    }
}

pub struct BridgeAdapter {
    client: reqwest::Client,
    config: BridgeConfig,
}

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct BridgePlatform {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "isAuthenticated")]
    is_authenticated: bool,
}

impl BridgeAdapter {
    pub fn new(config: BridgeConfig) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AdapterError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    async fn call(&self, method: &str, params: Value, timeout: Duration) -> Result<Value, AdapterError> {
        let url = format!("{}/request", self.config.url.trim_end_matches('/'));
        debug!(%url, method, "bridge request");

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&BridgeRequest { method, params })
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let parsed: BridgeResponse = serde_json::from_str(&text)
            .map_err(|e| AdapterError::Protocol(format!("unreadable bridge reply: {e}")))?;

        if let Some(error) = parsed.error {
            let message = match error {
                Value::String(s) => s,
                other => other.to_string(),
            };
            return Err(AdapterError::Protocol(format!("bridge error: {message}")));
        }
        Ok(parsed.result.unwrap_or_else(|| json!({})))
    }
}

#[async_trait]
impl PlatformAdapter for BridgeAdapter {
    async fn publish(
        &self,
        request: &PublishRequest,
        platform: Platform,
    ) -> Result<PlatformResult, AdapterError> {
        let Some(name) = bridge_name(platform) else {
            return Ok(PlatformResult::failed(
                platform,
                format!("platform {platform} is not served by the sync bridge"),
            ));
        };

        let params = json!({
            "platforms": [name],
            "article": {
                "title": request.title,
                "markdown": request.body,
                "content": request.body,
            },
        });

        match self
            .call("syncArticle", params, self.config.publish_timeout)
            .await
        {
            Ok(result) => Ok(parse_sync_result(platform, &result)),
            Err(AdapterError::Timeout(after)) => Ok(PlatformResult::failed(
                platform,
                format!("sync bridge timed out after {}s", after.as_secs()),
            )),
            Err(err) => Err(err),
        }
    }

    async fn check_auth(&self, platform: Platform) -> Result<bool, AdapterError> {
        let Some(name) = bridge_name(platform) else {
            return Ok(false);
        };
        let listed = self
            .call(
                "listPlatforms",
                json!({ "forceRefresh": true }),
                self.config.list_timeout,
            )
            .await?;
        Ok(is_authenticated(&listed, name))
    }

    fn supported_targets(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| p.method() == PublishMethod::SyncBridge)
            .collect()
    }
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> AdapterError {
    if err.is_timeout() {
        AdapterError::Timeout(timeout)
    } else {
        AdapterError::Transport(err.to_string())
    }
}

/// Name the bridge uses for `platform`, if the bridge serves it.
pub fn bridge_name(platform: Platform) -> Option<&'static str> {
    match platform {
        Platform::BilibiliArticle => Some("bilibili"),
        p if p.method() == PublishMethod::SyncBridge => Some(p.as_str()),
        _ => None,
    }
}

/// Interpret a `syncArticle` result for one platform.
///
/// The first entry of `results` decides; without one, any mention of
/// "success" counts as published and the first URL in the reply is taken.
fn parse_sync_result(platform: Platform, result: &Value) -> PlatformResult {
    let entries = match result {
        Value::Array(entries) => Some(entries),
        Value::Object(map) => map.get("results").and_then(Value::as_array),
        _ => None,
    };

    if let Some(entry) = entries.and_then(|e| e.first()) {
        let success = entry
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if success {
            let published = PlatformResult::published(platform);
            return match entry.get("postUrl").and_then(Value::as_str) {
                Some(url) => published.with_url(url),
                None => published,
            };
        }
        let error = match entry.get("error") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "sync failed".to_string(),
            Some(other) => other.to_string(),
        };
        return PlatformResult::failed(platform, error);
    }

    let text = match result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.to_lowercase().contains("success") {
        let published = PlatformResult::published(platform);
        return match extract_url(&text) {
            Some(url) => published.with_url(url),
            None => published,
        };
    }

    let excerpt: String = text.chars().take(UNKNOWN_RESULT_EXCERPT).collect();
    PlatformResult::failed(platform, format!("unknown bridge result: {excerpt}"))
}

fn is_authenticated(listed: &Value, name: &str) -> bool {
    let Some(entries) = listed.as_array() else {
        return false;
    };
    entries
        .iter()
        .filter_map(|e| serde_json::from_value::<BridgePlatform>(e.clone()).ok())
        .find(|p| p.id.as_deref() == Some(name) || p.name.as_deref() == Some(name))
        .is_some_and(|p| p.is_authenticated)
}

/// First `http://` or `https://` URL in `text`.
fn extract_url(text: &str) -> Option<String> {
    let start = ["http://", "https://"]
        .iter()
        .filter_map(|scheme| {
            text.match_indices(scheme)
                .find(|(i, scheme)| url_end(&text[i + scheme.len()..]) > 0)
                .map(|(i, _)| i)
        })
        .min()?;
    let rest = &text[start..];
    let scheme_len = if rest.starts_with("https://") { 8 } else { 7 };
    let end = scheme_len + url_end(&rest[scheme_len..]);
    Some(rest[..end].to_string())
}

/// Byte length of the URL body at the start of `s`.
fn url_end(s: &str) -> usize {
    s.find(|c: char| c.is_whitespace() || matches!(c, ')' | '"' | '\''))
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PublishStatus;

    #[test]
    fn bridge_names_follow_catalogue() {
        assert_eq!(bridge_name(Platform::Zhihu), Some("zhihu"));
        assert_eq!(bridge_name(Platform::BilibiliArticle), Some("bilibili"));
        assert_eq!(bridge_name(Platform::Twitter), None);
        assert_eq!(bridge_name(Platform::Douyin), None);
    }

    #[test]
    fn adapter_serves_bridge_platforms_only() {
        let adapter = BridgeAdapter::new(BridgeConfig::default()).unwrap();
        let targets = adapter.supported_targets();
        assert_eq!(targets.len(), 9);
        assert!(targets.contains(&Platform::Yuque));
        assert!(!targets.contains(&Platform::WechatMp));
    }

    #[test]
    fn successful_entry_is_published_with_url() {
        let result = parse_sync_result(
            Platform::Juejin,
            &json!({ "results": [{ "success": true, "postUrl": "https://juejin.cn/post/1" }] }),
        );
        assert_eq!(result.status, PublishStatus::Published);
        assert_eq!(result.post_url.as_deref(), Some("https://juejin.cn/post/1"));
    }

    #[test]
    fn failed_entry_keeps_bridge_error() {
        let result = parse_sync_result(
            Platform::Csdn,
            &json!([{ "success": false, "error": "not logged in" }]),
        );
        assert_eq!(result.status, PublishStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("not logged in"));

        let result = parse_sync_result(Platform::Csdn, &json!({ "results": [{ "success": false }] }));
        assert_eq!(result.error.as_deref(), Some("sync failed"));
    }

    #[test]
    fn textual_success_falls_back_to_first_url() {
        let result = parse_sync_result(
            Platform::Zhihu,
            &json!("Success! see https://zhuanlan.zhihu.com/p/42 (draft)"),
        );
        assert_eq!(result.status, PublishStatus::Published);
        assert_eq!(result.post_url.as_deref(), Some("https://zhuanlan.zhihu.com/p/42"));
    }

    #[test]
    fn unrecognised_reply_fails() {
        let result = parse_sync_result(Platform::Zhihu, &json!({ "state": "queued" }));
        assert_eq!(result.status, PublishStatus::Failed);
        assert!(result.error.unwrap().starts_with("unknown bridge result"));
    }

    #[test]
    fn auth_matches_id_or_name() {
        let listed = json!([
            { "id": "zhihu", "isAuthenticated": true },
            { "name": "bilibili", "isAuthenticated": true },
            { "id": "csdn" },
        ]);
        assert!(is_authenticated(&listed, "zhihu"));
        assert!(is_authenticated(&listed, "bilibili"));
        assert!(!is_authenticated(&listed, "csdn"));
        assert!(!is_authenticated(&listed, "juejin"));
        assert!(!is_authenticated(&json!({}), "zhihu"));
    }

    #[test]
    fn url_extraction() {
        assert_eq!(
            extract_url(r#"{"msg":"success","link":"http://a.example/x?y=1"}"#).as_deref(),
            Some("http://a.example/x?y=1")
        );
        assert_eq!(extract_url("no links here"), None);
        assert_eq!(extract_url("https:// then http://b.example").as_deref(), Some("http://b.example"));
    }

    #[tokio::test]
    async fn unreachable_bridge_is_a_fault() {
        let adapter = BridgeAdapter::new(BridgeConfig {
            url: "http://127.0.0.1:1".into(),
            ..BridgeConfig::default()
        })
        .unwrap();

        let request = PublishRequest::new("T", "B", [Platform::Zhihu]);
        let err = adapter.publish(&request, Platform::Zhihu).await.unwrap_err();
        assert!(matches!(err, AdapterError::Transport(_)));
        assert!(adapter.check_auth(Platform::Zhihu).await.is_err());
    }

    #[tokio::test]
    async fn foreign_platform_fails_without_calling_bridge() {
        let adapter = BridgeAdapter::new(BridgeConfig {
            url: "http://127.0.0.1:1".into(),
            ..BridgeConfig::default()
        })
        .unwrap();

        let request = PublishRequest::new("T", "B", [Platform::Twitter]);
        let result = adapter.publish(&request, Platform::Twitter).await.unwrap();
        assert_eq!(result.status, PublishStatus::Failed);
        assert!(!adapter.check_auth(Platform::Twitter).await.unwrap());
    }
}
