use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{PaymentId, UserId};

/// Object storage buckets used by the school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Receipts,
    EventPhotos,
    Documents,
    Attachments,
}

impl Bucket {
    pub const fn name(self) -> &'static str {
        match self {
            Bucket::Receipts => "receipts",
            Bucket::EventPhotos => "event-photos",
            Bucket::Documents => "documents",
            Bucket::Attachments => "attachments",
        }
    }

    pub const ALL: [Bucket; 4] = [
        Bucket::Receipts,
        Bucket::EventPhotos,
        Bucket::Documents,
        Bucket::Attachments,
    ];

    pub fn from_name(name: &str) -> Option<Bucket> {
        Self::ALL.into_iter().find(|bucket| bucket.name() == name)
    }

    /// Admission documents are only handed out as short-lived signed URLs.
    pub const fn is_public(self) -> bool {
        !matches!(self, Bucket::Documents)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub bucket: Bucket,
    pub path: String,
    pub size: usize,
    pub content_type: String,
}

/// File payload as received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Storage abstraction over the hosted bucket service.
pub trait ObjectStore: Send + Sync {
    /// Uploads never overwrite an existing object.
    fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        upload: Upload,
    ) -> Result<StoredObject, StorageError>;

    /// Public URL, or a signed URL for private buckets.
    fn url(&self, bucket: Bucket, path: &str) -> Result<String, StorageError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("object {bucket}/{path} already exists")]
    AlreadyExists { bucket: Bucket, path: String },
    #[error("object {bucket}/{path} not found")]
    NotFound { bucket: Bucket, path: String },
    #[error("upload is empty")]
    EmptyUpload,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub(crate) fn extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => "bin".to_string(),
    }
}

pub(crate) fn receipt_path(
    user: &UserId,
    payment: &PaymentId,
    millis: i64,
    file_name: &str,
) -> String {
    format!("{user}/{payment}_{millis}.{}", extension(file_name))
}

pub(crate) fn event_photo_path(user: &UserId, millis: i64, index: usize, file_name: &str) -> String {
    format!("{user}/{millis}_{index}.{}", extension(file_name))
}

pub(crate) fn document_path(user: &UserId, doc_key: &str, millis: i64, file_name: &str) -> String {
    let doc_key: String = doc_key
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{user}/{doc_key}_{millis}.{}", extension(file_name))
}

pub(crate) fn attachment_path(user: &UserId, millis: i64, file_name: &str) -> String {
    format!("{user}/{millis}.{}", extension(file_name))
}
