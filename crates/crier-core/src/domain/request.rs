//! Publish request: the immutable input of one submission.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;
use super::fingerprint::ContentFingerprint;
use super::platform::{ContentType, Platform};

pub const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub title: String,

    /// Markdown body.
    pub body: String,

    pub platforms: Vec<Platform>,

    #[serde(default)]
    pub content_type: ContentType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,

    /// Save as draft on the platform instead of publishing.
    #[serde(default)]
    pub draft_only: bool,
}

impl PublishRequest {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        platforms: impl IntoIterator<Item = Platform>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            platforms: platforms.into_iter().collect(),
            content_type: ContentType::default(),
            tags: Vec::new(),
            cover_url: None,
            video_path: None,
            draft_only: false,
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_cover(mut self, url: impl Into<String>) -> Self {
        self.cover_url = Some(url.into());
        self
    }

    pub fn with_video(mut self, path: impl Into<String>) -> Self {
        self.video_path = Some(path.into());
        self
    }

    pub fn draft_only(mut self) -> Self {
        self.draft_only = true;
        self
    }

    pub fn fingerprint(&self) -> ContentFingerprint {
        ContentFingerprint::compute(&self.title, &self.body)
    }

    /// Check the request before any task is created for it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_content()?;
        if self.platforms.is_empty() {
            return Err(ValidationError::NoPlatforms);
        }
        let mut seen = HashSet::new();
        for platform in &self.platforms {
            if !seen.insert(*platform) {
                return Err(ValidationError::DuplicatePlatform(platform.to_string()));
            }
        }
        Ok(())
    }

    /// Everything `validate` checks except the platform list.
    pub fn validate_content(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let title_chars = self.title.chars().count();
        if title_chars > MAX_TITLE_CHARS {
            return Err(ValidationError::TitleTooLong(title_chars));
        }
        if self.body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        if self.content_type == ContentType::Video && self.video_path.is_none() {
            return Err(ValidationError::MissingVideo);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> PublishRequest {
        PublishRequest::new("T", "B", [Platform::Zhihu, Platform::Juejin])
    }

    #[test]
    fn valid_request_passes() {
        assert_eq!(article().validate(), Ok(()));
    }

    #[test]
    fn fingerprint_ignores_platforms_and_tags() {
        let a = article();
        let b = PublishRequest::new("T", "B", [Platform::Csdn]).with_tag("rust");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn empty_fields_are_rejected() {
        let mut r = article();
        r.title = "  ".into();
        assert_eq!(r.validate(), Err(ValidationError::EmptyTitle));

        let mut r = article();
        r.body = String::new();
        assert_eq!(r.validate(), Err(ValidationError::EmptyBody));

        let r = PublishRequest::new("T", "B", []);
        assert_eq!(r.validate(), Err(ValidationError::NoPlatforms));
    }

    #[test]
    fn content_check_ignores_platforms() {
        let r = PublishRequest::new("T", "B", []);
        assert_eq!(r.validate_content(), Ok(()));
        assert_eq!(r.validate(), Err(ValidationError::NoPlatforms));
    }

    #[test]
    fn duplicated_platform_is_rejected() {
        let r = PublishRequest::new("T", "B", [Platform::Csdn, Platform::Csdn]);
        assert_eq!(
            r.validate(),
            Err(ValidationError::DuplicatePlatform("csdn".into()))
        );
    }

    #[test]
    fn long_title_is_rejected() {
        let r = PublishRequest::new("t".repeat(MAX_TITLE_CHARS + 1), "B", [Platform::Csdn]);
        assert_eq!(
            r.validate(),
            Err(ValidationError::TitleTooLong(MAX_TITLE_CHARS + 1))
        );
    }

    #[test]
    fn video_needs_a_video_reference() {
        let r = PublishRequest::new("T", "B", [Platform::Douyin]).with_content_type(ContentType::Video);
        assert_eq!(r.validate(), Err(ValidationError::MissingVideo));
        assert_eq!(r.with_video("/tmp/clip.mp4").validate(), Ok(()));
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let json = r#"{ "title": "T", "body": "B", "platforms": ["zhihu"] }"#;
        let r: PublishRequest = serde_json::from_str(json).unwrap();
        assert_eq!(r.content_type, ContentType::Article);
        assert!(r.tags.is_empty());
        assert!(!r.draft_only);
    }
}
