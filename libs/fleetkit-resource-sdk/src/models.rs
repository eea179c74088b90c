//! Domain types handed to callers, decoupled from the wire messages.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::proto;

/// URL expiry used when the caller does not ask for one, in seconds.
pub const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Access information for one file of a batch.
///
/// On failure only `error` is set; every other field is zero-valued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUrlInfo {
    pub url: String,
    pub variant_urls: HashMap<String, String>,
    pub is_public: bool,
    pub expires_in: i64,
    pub filename: String,
    pub size: i64,
    pub content_type: String,
    pub success: bool,
    pub error: Option<String>,
}

impl FileUrlInfo {
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

impl From<proto::FileUrlInfo> for FileUrlInfo {
    fn from(info: proto::FileUrlInfo) -> Self {
        if !info.success {
            let error = if info.error.is_empty() {
                "unknown error".to_owned()
            } else {
                info.error
            };
            return Self::failed(error);
        }

        Self {
            url: info.url,
            variant_urls: info.variant_urls,
            is_public: info.is_public,
            expires_in: info.expires_in,
            filename: info.filename,
            size: info.size,
            content_type: info.content_type,
            success: true,
            error: None,
        }
    }
}

/// Stored file metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileObject {
    pub id: String,
    pub filename: String,
    pub size: i64,
    pub content_type: String,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub uploader_id: u32,
    pub category: String,
    pub metadata: HashMap<String, String>,
}

impl From<proto::FileObject> for FileObject {
    fn from(file: proto::FileObject) -> Self {
        let created_at = file.created_at.and_then(|ts| {
            let nanos = u32::try_from(ts.nanos).ok()?;
            DateTime::from_timestamp(ts.seconds, nanos)
        });

        Self {
            id: file.id,
            filename: file.filename,
            size: file.size,
            content_type: file.content_type,
            status: file.status,
            created_at,
            uploader_id: file.uploader_id,
            category: file.category,
            metadata: file.metadata,
        }
    }
}

/// Options for a batch URL lookup.
///
/// Unset `include_variants` means `true`; unset or non-positive
/// `expires_in` means [`DEFAULT_EXPIRES_IN`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchGetFileUrlsRequest {
    pub file_ids: Vec<String>,
    pub include_variants: Option<bool>,
    pub expires_in: Option<i64>,
}

impl BatchGetFileUrlsRequest {
    #[must_use]
    pub fn new<I, S>(file_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            file_ids: file_ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_variants(mut self, include: bool) -> Self {
        self.include_variants = Some(include);
        self
    }

    #[must_use]
    pub fn with_expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    pub(crate) fn into_wire(self) -> proto::BatchGetFileUrlsRequest {
        proto::BatchGetFileUrlsRequest {
            file_ids: self.file_ids,
            include_variants: self.include_variants.unwrap_or(true),
            expires_in: self
                .expires_in
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_EXPIRES_IN),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_apply() {
        let wire = BatchGetFileUrlsRequest::new(["a", "b"]).into_wire();
        assert_eq!(wire.file_ids, vec!["a".to_owned(), "b".to_owned()]);
        assert!(wire.include_variants);
        assert_eq!(wire.expires_in, 3600);
    }

    #[test]
    fn explicit_options_are_kept_unless_non_positive() {
        let wire = BatchGetFileUrlsRequest::new(["a"])
            .with_variants(false)
            .with_expires_in(120)
            .into_wire();
        assert!(!wire.include_variants);
        assert_eq!(wire.expires_in, 120);

        let wire = BatchGetFileUrlsRequest::new(["a"])
            .with_expires_in(-5)
            .into_wire();
        assert_eq!(wire.expires_in, 3600);
    }

    #[test]
    fn failed_item_drops_payload_fields() {
        let info = FileUrlInfo::from(proto::FileUrlInfo {
            url: "https://cdn/leaked".to_owned(),
            size: 99,
            success: false,
            error: "not found".to_owned(),
            ..Default::default()
        });
        assert_eq!(info, FileUrlInfo::failed("not found"));
        assert!(info.url.is_empty());
    }

    #[test]
    fn file_object_converts_timestamp() {
        let file = FileObject::from(proto::FileObject {
            id: "f1".to_owned(),
            created_at: Some(prost_types::Timestamp {
                seconds: 1_700_000_000,
                nanos: 0,
            }),
            ..Default::default()
        });
        assert_eq!(
            file.created_at.map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }
}
