use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dao::document_store::{CollectionPath, DocumentPath};

use super::error::{CouchDaoError, CouchResult};

pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// A stored document: CouchDB bookkeeping fields next to the application body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl CouchDocument {
    /// Wrap an application document, carrying over the revision being replaced.
    pub fn new(path: &DocumentPath, rev: Option<String>, data: Value) -> CouchResult<Self> {
        let Value::Object(body) = data else {
            return Err(CouchDaoError::NotAnObject {
                path: path.to_string(),
            });
        };

        Ok(Self {
            id: doc_id(path),
            rev,
            body,
        })
    }

    /// Drop the CouchDB fields and return the application body.
    pub fn into_body(self) -> Value {
        Value::Object(self.body)
    }
}

/// Documents are keyed by their full slash separated path.
pub fn doc_id(path: &DocumentPath) -> String {
    path.to_string()
}

/// `_all_docs` key prefix covering the direct children of a collection.
pub fn collection_prefix(path: &CollectionPath) -> String {
    format!("{}/", path)
}

/// Whether `doc_id` is a direct child of the collection behind `prefix`.
pub fn is_direct_child(prefix: &str, doc_id: &str) -> bool {
    doc_id
        .strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_serialises_with_couch_fields() {
        let path = CollectionPath::new(["a", "b"]).document("c");
        let doc = CouchDocument::new(&path, Some("1-x".into()), json!({"score": 3})).unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value, json!({"_id": "a/b/c", "_rev": "1-x", "score": 3}));

        let parsed: CouchDocument = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.into_body(), json!({"score": 3}));
    }

    #[test]
    fn non_object_documents_are_rejected() {
        let path = CollectionPath::new(["a"]).document("b");
        assert!(CouchDocument::new(&path, None, json!([1, 2])).is_err());
    }

    #[test]
    fn only_direct_children_match_prefix() {
        let prefix = collection_prefix(&CollectionPath::new(["artifacts", "app", "highScores"]));
        assert!(is_direct_child(&prefix, "artifacts/app/highScores/u1_track"));
        assert!(!is_direct_child(&prefix, "artifacts/app/highScores/u1/nested"));
        assert!(!is_direct_child(&prefix, "artifacts/app/highScores/"));
        assert!(!is_direct_child(&prefix, "artifacts/app/other/u1"));
    }
}
