//! Files uploaded alongside a message.

use std::path::{Path, PathBuf};
use tribune_error::{DiscordError, DiscordErrorKind, DiscordResult};
use reqwest::Body;
use reqwest::multipart::Part;
use tracing::debug;

/// A file to upload with a message.
///
/// Either bytes already in memory or a path read from disk right before the
/// request is built. Both carry the file name the service will show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// In-memory contents
    Bytes {
        /// Name shown in the channel
        file_name: String,
        /// File contents
        data: Vec<u8>,
    },
    /// Contents read from disk at send time
    Path {
        /// Name shown in the channel
        file_name: String,
        /// Location on disk
        path: PathBuf,
    },
}

impl Attachment {
    /// In-memory attachment.
    pub fn bytes(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// On-disk attachment with an explicit display name.
    pub fn path(file_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Path {
            file_name: file_name.into(),
            path: path.into(),
        }
    }

    /// On-disk attachment named after the file itself.
    ///
    /// # Errors
    ///
    /// Fails when the path has no final component to use as a name.
    ///
    /// # Example
    ///
    /// ```
    /// use tribune_discord::Attachment;
    ///
    /// let attachment = Attachment::from_path("/tmp/meta/app_2024-01-01_42.json").unwrap();
    /// assert_eq!(attachment.file_name(), "app_2024-01-01_42.json");
    /// assert!(Attachment::from_path("/").is_err());
    /// ```
    #[track_caller]
    pub fn from_path(path: impl AsRef<Path>) -> DiscordResult<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                DiscordError::new(DiscordErrorKind::InvalidAttachment(format!(
                    "{} has no file name",
                    path.display()
                )))
            })?;
        Ok(Self::path(file_name, path))
    }

    /// Name the service will show for this file.
    pub fn file_name(&self) -> &str {
        match self {
            Self::Bytes { file_name, .. } | Self::Path { file_name, .. } => file_name,
        }
    }

    /// Turn the attachment into a multipart file part.
    ///
    /// Runs before any request is sent, so a bad descriptor never reaches the
    /// network. Path attachments are opened here and streamed from disk when
    /// the request body is written.
    pub(crate) async fn part(&self) -> DiscordResult<Part> {
        if self.file_name().trim().is_empty() {
            return Err(DiscordError::new(DiscordErrorKind::InvalidAttachment(
                "attachment file name is empty".to_string(),
            )));
        }

        match self {
            Self::Bytes { file_name, data } => {
                Ok(Part::bytes(data.clone()).file_name(file_name.clone()))
            }
            Self::Path { file_name, path } => {
                let unreadable = |e: std::io::Error| {
                    DiscordError::new(DiscordErrorKind::InvalidAttachment(format!(
                        "failed to read {}: {}",
                        path.display(),
                        e
                    )))
                };
                let file = tokio::fs::File::open(path).await.map_err(unreadable)?;
                let length = file.metadata().await.map_err(unreadable)?.len();
                debug!(path = %path.display(), length, "Streaming attachment from disk");
                Ok(Part::stream_with_length(Body::from(file), length)
                    .file_name(file_name.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bytes_attachment_becomes_a_part() {
        let attachment = Attachment::bytes("notes.txt", b"hello".to_vec());
        assert!(attachment.part().await.is_ok());
    }

    #[tokio::test]
    async fn test_path_attachment_opens_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        std::fs::write(&path, "{}").unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.file_name(), "meta.json");
        assert!(attachment.part().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_is_invalid_attachment() {
        let attachment = Attachment::path("gone.json", "/definitely/not/here/gone.json");
        let err = attachment.part().await.unwrap_err();
        assert!(matches!(err.kind(), DiscordErrorKind::InvalidAttachment(_)));
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let attachment = Attachment::bytes("  ", Vec::new());
        let err = attachment.part().await.unwrap_err();
        assert!(matches!(err.kind(), DiscordErrorKind::InvalidAttachment(_)));
    }
}
