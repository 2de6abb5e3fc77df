//! File-backed source fetcher.
//!
//! Reads `users.json`, `complaints.json` and `feedback.json` from a
//! directory, e.g. exports taken from the campus API.

use super::{extract_records, SourceFetcher};
use crate::error::SourceFailure;
use crate::models::{RawRecord, SourceKind};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Fetcher reading one JSON document per source from a directory.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    dir: PathBuf,
}

impl FileFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the document for a source.
    pub fn path_for(&self, kind: SourceKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.as_str()))
    }
}

#[async_trait]
impl SourceFetcher for FileFetcher {
    async fn fetch(&self, kind: SourceKind) -> Result<Vec<RawRecord>, SourceFailure> {
        let path = self.path_for(kind);
        debug!("Reading {} from {}", kind, path.display());

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SourceFailure::Unreachable {
                source_kind: kind,
                message: format!("{}: {}", path.display(), e),
            })?;

        let document = serde_json::from_str(&content).map_err(|e| SourceFailure::Payload {
            source_kind: kind,
            message: format!("{}: {}", path.display(), e),
        })?;

        extract_records(document, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_wrapped_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("feedback.json"),
            r#"{"feedback": [{"id": 1, "rating": 4}, {"id": 2, "rating": 5}]}"#,
        )
        .unwrap();

        let fetcher = FileFetcher::new(dir.path());
        let records = fetcher.fetch(SourceKind::Feedback).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FileFetcher::new(dir.path());

        let err = fetcher.fetch(SourceKind::Users).await.unwrap_err();
        assert!(matches!(
            err,
            SourceFailure::Unreachable {
                source_kind: SourceKind::Users,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_json_is_payload_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("complaints.json"), "{not json").unwrap();

        let fetcher = FileFetcher::new(dir.path());
        let result = tokio_test::block_on(fetcher.fetch(SourceKind::Complaints));
        assert!(matches!(result, Err(SourceFailure::Payload { .. })));
    }
}
