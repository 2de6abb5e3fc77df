//! Source fetchers.
//!
//! A fetcher performs one logical fetch per source and returns either the
//! raw records or a [`SourceFailure`]. Retries and backoff belong here,
//! never in the dashboard core.

pub mod file;
pub mod http;

pub use file::FileFetcher;
pub use http::HttpFetcher;

use crate::error::SourceFailure;
use crate::models::{RawRecord, SourceKind};
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

/// Keys a fetched document may wrap its record array under, besides the source name.
const ENVELOPE_KEYS: [&str; 3] = ["data", "items", "results"];

/// One fetch per source kind.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, kind: SourceKind) -> Result<Vec<RawRecord>, SourceFailure>;
}

/// Pull the record list out of a fetched JSON document.
///
/// Accepts a bare array, an object wrapping the array under the source
/// name or a generic envelope key, or a single object (one record).
pub fn extract_records(document: Value, kind: SourceKind) -> Result<Vec<RawRecord>, SourceFailure> {
    match document {
        Value::Array(items) => Ok(objects_only(items, kind)),
        Value::Object(mut map) => {
            let wrapped = std::iter::once(kind.as_str())
                .chain(ENVELOPE_KEYS)
                .find(|key| matches!(map.get(*key), Some(Value::Array(_))))
                .map(str::to_string);

            match wrapped.and_then(|key| map.remove(&key)) {
                Some(Value::Array(items)) => Ok(objects_only(items, kind)),
                _ => Ok(vec![map]),
            }
        }
        other => Err(SourceFailure::Payload {
            source_kind: kind,
            message: format!("expected an array or object, got {}", type_name(&other)),
        }),
    }
}

fn objects_only(items: Vec<Value>, kind: SourceKind) -> Vec<RawRecord> {
    let total = items.len();
    let records: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    if records.len() < total {
        warn!(
            "Dropped {} non-object entries from {} payload",
            total - records.len(),
            kind
        );
    }

    records
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array() {
        let records =
            extract_records(json!([{"id": 1}, {"id": 2}]), SourceKind::Complaints).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_named_envelope() {
        let doc = json!({"complaints": [{"id": 1}], "total": 1});
        let records = extract_records(doc, SourceKind::Complaints).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], json!(1));
    }

    #[test]
    fn test_generic_envelope() {
        let doc = json!({"data": [{"id": 1}, {"id": 2}, {"id": 3}]});
        let records = extract_records(doc, SourceKind::Feedback).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_single_object_is_one_record() {
        let doc = json!({"total_users": 12, "students": 9, "faculty": 2, "admins": 1});
        let records = extract_records(doc, SourceKind::Users).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["total_users"], json!(12));
    }

    #[test]
    fn test_non_object_entries_are_dropped() {
        let records =
            extract_records(json!([{"id": 1}, 42, "x", null]), SourceKind::Feedback).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_scalar_document_is_a_failure() {
        let err = extract_records(json!("oops"), SourceKind::Users).unwrap_err();
        assert!(matches!(
            err,
            SourceFailure::Payload {
                source_kind: SourceKind::Users,
                ..
            }
        ));
        assert!(err.to_string().contains("string"));
    }
}
