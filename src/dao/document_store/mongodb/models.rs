use mongodb::bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::document_store::{CollectionPath, DocumentPath, FieldFilter};

/// Every application document lives in one Mongo collection, keyed by its full path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoDocumentRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub collection: String,
    pub data: Value,
}

impl MongoDocumentRecord {
    pub fn new(path: &DocumentPath, data: Value) -> Self {
        Self {
            id: path.to_string(),
            collection: path.collection().to_string(),
            data,
        }
    }
}

pub fn doc_id(path: &DocumentPath) -> Document {
    doc! { "_id": path.to_string() }
}

/// Filter selecting the documents of `collection` whose body field equals the filter value.
pub fn collection_filter(collection: &CollectionPath, filter: &FieldFilter) -> Document {
    let mut query = Document::new();
    query.insert("collection", collection.to_string());
    query.insert(format!("data.{}", filter.field), json_to_bson(&filter.value));
    query
}

fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(flag) => Bson::Boolean(*flag),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Bson::Int64(int)
            } else {
                Bson::Double(number.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(text) => Bson::String(text.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => {
            let mut document = Document::new();
            for (key, item) in map {
                document.insert(key.clone(), json_to_bson(item));
            }
            Bson::Document(document)
        }
    }
}
