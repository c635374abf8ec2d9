//! Platform catalogue: every publish target the engine knows about, how it is
//! reached, and which kinds of content it accepts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// A publish target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    // official HTTP APIs
    WechatMp,
    Twitter,

    // sync bridge
    Zhihu,
    Juejin,
    Csdn,
    Toutiao,
    Jianshu,
    Weibo,
    BilibiliArticle,
    Wordpress,
    Yuque,

    // browser automation
    Xiaohongshu,
    Douyin,
    BilibiliVideo,
    Youtube,
    Tiktok,
    Kuaishou,
}

impl Platform {
    /// Every platform, in catalogue order.
    pub const ALL: [Platform; 17] = [
        Platform::WechatMp,
        Platform::Twitter,
        Platform::Zhihu,
        Platform::Juejin,
        Platform::Csdn,
        Platform::Toutiao,
        Platform::Jianshu,
        Platform::Weibo,
        Platform::BilibiliArticle,
        Platform::Wordpress,
        Platform::Yuque,
        Platform::Xiaohongshu,
        Platform::Douyin,
        Platform::BilibiliVideo,
        Platform::Youtube,
        Platform::Tiktok,
        Platform::Kuaishou,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::WechatMp => "wechat_mp",
            Platform::Twitter => "twitter",
            Platform::Zhihu => "zhihu",
            Platform::Juejin => "juejin",
            Platform::Csdn => "csdn",
            Platform::Toutiao => "toutiao",
            Platform::Jianshu => "jianshu",
            Platform::Weibo => "weibo",
            Platform::BilibiliArticle => "bilibili_article",
            Platform::Wordpress => "wordpress",
            Platform::Yuque => "yuque",
            Platform::Xiaohongshu => "xiaohongshu",
            Platform::Douyin => "douyin",
            Platform::BilibiliVideo => "bilibili_video",
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Kuaishou => "kuaishou",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::WechatMp => "WeChat Official Account",
            Platform::Twitter => "Twitter/X",
            Platform::Zhihu => "Zhihu",
            Platform::Juejin => "Juejin",
            Platform::Csdn => "CSDN",
            Platform::Toutiao => "Toutiao",
            Platform::Jianshu => "Jianshu",
            Platform::Weibo => "Weibo",
            Platform::BilibiliArticle => "Bilibili Articles",
            Platform::Wordpress => "WordPress",
            Platform::Yuque => "Yuque",
            Platform::Xiaohongshu => "Xiaohongshu",
            Platform::Douyin => "Douyin",
            Platform::BilibiliVideo => "Bilibili Video",
            Platform::Youtube => "YouTube",
            Platform::Tiktok => "TikTok",
            Platform::Kuaishou => "Kuaishou",
        }
    }

    /// How content reaches this platform.
    pub fn method(self) -> PublishMethod {
        match self {
            Platform::WechatMp | Platform::Twitter => PublishMethod::OfficialApi,
            Platform::Zhihu
            | Platform::Juejin
            | Platform::Csdn
            | Platform::Toutiao
            | Platform::Jianshu
            | Platform::Weibo
            | Platform::BilibiliArticle
            | Platform::Wordpress
            | Platform::Yuque => PublishMethod::SyncBridge,
            Platform::Xiaohongshu
            | Platform::Douyin
            | Platform::BilibiliVideo
            | Platform::Youtube
            | Platform::Tiktok
            | Platform::Kuaishou => PublishMethod::BrowserAutomation,
        }
    }

    /// Content types the platform accepts.
    pub fn content_types(self) -> &'static [ContentType] {
        match self {
            Platform::Douyin
            | Platform::BilibiliVideo
            | Platform::Youtube
            | Platform::Tiktok
            | Platform::Kuaishou => &[ContentType::Video],
            Platform::Xiaohongshu => &[
                ContentType::Article,
                ContentType::Video,
                ContentType::ShortPost,
            ],
            Platform::Twitter | Platform::Weibo => &[ContentType::ShortPost, ContentType::Article],
            _ => &[ContentType::Article],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownPlatform(s.to_string()))
    }
}

/// Transport family used to reach a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishMethod {
    OfficialApi,
    SyncBridge,
    BrowserAutomation,
}

impl PublishMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PublishMethod::OfficialApi => "official_api",
            PublishMethod::SyncBridge => "sync_bridge",
            PublishMethod::BrowserAutomation => "browser_automation",
        }
    }
}

impl fmt::Display for PublishMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of content carried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Article,
    ShortPost,
    Video,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::ShortPost => "short_post",
            ContentType::Video => "video",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(ContentType::Article),
            "short_post" => Ok(ContentType::ShortPost),
            "video" => Ok(ContentType::Video),
            other => Err(ValidationError::UnknownContentType(other.to_string())),
        }
    }
}
