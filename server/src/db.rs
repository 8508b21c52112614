//! In-memory collection database backing the mock API
//!
//! Collections are named lists of JSON objects keyed by a numeric `id`.
//! New ids are one past the largest id in the collection, or 1 when empty.

use parking_lot::RwLock;
use recipebook_core::{RecipebookError, RecipebookResult, RecordId};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// One stored record
pub type Document = Map<String, Value>;

/// Mock database
pub struct MockDb {
    collections: RwLock<BTreeMap<String, Vec<Document>>>,
}

impl MockDb {
    /// Database without any collections
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
        }
    }

    /// Database filled with the built-in seed
    pub fn seeded() -> Self {
        // the built-in seed is always well formed
        Self::from_seed(default_seed()).unwrap_or_else(|_| Self::new())
    }

    /// Build from a seed object: `{ "<collection>": [ {"id": 1, ...}, ... ] }`
    pub fn from_seed(seed: Value) -> RecipebookResult<Self> {
        let Value::Object(seed) = seed else {
            return Err(RecipebookError::InvalidRecord(
                "seed must be an object of collections".into(),
            ));
        };

        let mut collections = BTreeMap::new();
        for (name, docs) in seed {
            let Value::Array(docs) = docs else {
                return Err(RecipebookError::InvalidRecord(format!(
                    "collection {} must be an array",
                    name
                )));
            };

            let mut stored: Vec<Document> = Vec::with_capacity(docs.len());
            for doc in docs {
                let doc = as_document(doc)?;
                let id = id_of(&doc)?.ok_or_else(|| {
                    RecipebookError::InvalidRecord(format!("seed record in {} has no id", name))
                })?;
                if stored.iter().any(|d| matches!(id_of(d), Ok(Some(existing)) if existing == id)) {
                    return Err(RecipebookError::Conflict(format!(
                        "duplicate id {} in {}",
                        id, name
                    )));
                }
                stored.push(doc);
            }
            collections.insert(name, stored);
        }

        Ok(Self {
            collections: RwLock::new(collections),
        })
    }

    pub fn from_json(json: &str) -> RecipebookResult<Self> {
        Self::from_seed(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> RecipebookResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Collection names
    pub fn collections(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }

    /// All records of a collection, in insertion order
    pub fn list(&self, collection: &str) -> RecipebookResult<Vec<Value>> {
        let collections = self.collections.read();
        let docs = lookup(&collections, collection)?;
        Ok(docs.iter().cloned().map(Value::Object).collect())
    }

    pub fn get(&self, collection: &str, id: RecordId) -> RecipebookResult<Value> {
        let collections = self.collections.read();
        let docs = lookup(&collections, collection)?;
        docs.iter()
            .find(|d| has_id(d, id))
            .cloned()
            .map(Value::Object)
            .ok_or_else(|| not_found(collection, id))
    }

    /// Insert a record. A body without an id gets the next free one; a body
    /// carrying an id already in use is a conflict.
    pub fn insert(&self, collection: &str, body: Value) -> RecipebookResult<Value> {
        let mut doc = as_document(body)?;
        let mut collections = self.collections.write();
        let docs = lookup_mut(&mut collections, collection)?;

        let id = match id_of(&doc)? {
            Some(id) if docs.iter().any(|d| has_id(d, id)) => {
                return Err(RecipebookError::Conflict(format!(
                    "record {} already exists in {}",
                    id, collection
                )));
            }
            Some(id) => id,
            None => next_id(docs).ok_or_else(|| {
                RecipebookError::Conflict(format!("no free id left in {}", collection))
            })?,
        };

        doc.insert("id".into(), json!(id.as_u64()));
        docs.push(doc.clone());
        debug!("Inserted record {} into {}", id, collection);

        Ok(Value::Object(doc))
    }

    /// Replace a record wholesale. The path id wins over any id in the body.
    pub fn update(&self, collection: &str, id: RecordId, body: Value) -> RecipebookResult<Value> {
        let mut doc = as_document(body)?;
        doc.insert("id".into(), json!(id.as_u64()));

        let mut collections = self.collections.write();
        let docs = lookup_mut(&mut collections, collection)?;
        let slot = docs
            .iter_mut()
            .find(|d| has_id(d, id))
            .ok_or_else(|| not_found(collection, id))?;
        *slot = doc.clone();
        debug!("Updated record {} in {}", id, collection);

        Ok(Value::Object(doc))
    }

    /// Remove a record. Removing an absent id is not an error.
    pub fn remove(&self, collection: &str, id: RecordId) -> RecipebookResult<bool> {
        let mut collections = self.collections.write();
        let docs = lookup_mut(&mut collections, collection)?;
        let before = docs.len();
        docs.retain(|d| !has_id(d, id));
        let removed = docs.len() != before;
        if removed {
            debug!("Removed record {} from {}", id, collection);
        }
        Ok(removed)
    }

    /// Current contents as a seed object
    pub fn dump(&self) -> Value {
        let collections = self.collections.read();
        let map: Map<String, Value> = collections
            .iter()
            .map(|(name, docs)| {
                let docs = docs.iter().cloned().map(Value::Object).collect();
                (name.clone(), Value::Array(docs))
            })
            .collect();
        Value::Object(map)
    }
}

impl Default for MockDb {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared mock database
pub type SharedMockDb = Arc<MockDb>;

/// Built-in seed: `recipes` and `users`
pub fn default_seed() -> Value {
    let names = ["Windstorm", "Bombasto", "Magneta", "Tornado"];
    let docs: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({"id": i + 1, "recipe": name}))
        .collect();

    json!({
        "recipes": docs.clone(),
        "users": docs,
    })
}

/// One past the largest id held, or 1 for an empty collection.
///
/// `None` when the largest id is already `u64::MAX`.
pub fn next_id(docs: &[Document]) -> Option<RecordId> {
    let max = docs
        .iter()
        .filter_map(|d| d.get("id").and_then(Value::as_u64))
        .max();

    match max {
        Some(max) => RecordId(max).next(),
        None => Some(RecordId(1)),
    }
}

fn as_document(value: Value) -> RecipebookResult<Document> {
    match value {
        Value::Object(doc) => Ok(doc),
        other => Err(RecipebookError::InvalidRecord(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

fn id_of(doc: &Document) -> RecipebookResult<Option<RecordId>> {
    match doc.get("id") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|id| Some(RecordId(id)))
            .ok_or_else(|| RecipebookError::InvalidRecord(format!("bad id {}", value))),
    }
}

fn has_id(doc: &Document, id: RecordId) -> bool {
    doc.get("id").and_then(Value::as_u64) == Some(id.as_u64())
}

fn not_found(collection: &str, id: RecordId) -> RecipebookError {
    RecipebookError::NotFound(format!("record {} in {}", id, collection))
}

fn lookup<'a>(
    collections: &'a BTreeMap<String, Vec<Document>>,
    collection: &str,
) -> RecipebookResult<&'a Vec<Document>> {
    collections
        .get(collection)
        .ok_or_else(|| RecipebookError::NotFound(format!("collection {}", collection)))
}

fn lookup_mut<'a>(
    collections: &'a mut BTreeMap<String, Vec<Document>>,
    collection: &str,
) -> RecipebookResult<&'a mut Vec<Document>> {
    collections
        .get_mut(collection)
        .ok_or_else(|| RecipebookError::NotFound(format!("collection {}", collection)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_collections() {
        let db = MockDb::seeded();
        assert_eq!(db.collections(), vec!["recipes", "users"]);

        let recipes = db.list("recipes").unwrap();
        assert_eq!(recipes.len(), 4);
        assert_eq!(recipes[0], json!({"id": 1, "recipe": "Windstorm"}));
        assert_eq!(recipes[3], json!({"id": 4, "recipe": "Tornado"}));
    }

    #[test]
    fn test_insert_assigns_max_plus_one() {
        let db = MockDb::seeded();
        let created = db.insert("recipes", json!({"recipe": "new recipe"})).unwrap();
        assert_eq!(created, json!({"id": 5, "recipe": "new recipe"}));

        db.remove("recipes", RecordId(2)).unwrap();
        let created = db.insert("recipes", json!({"recipe": "another"})).unwrap();
        assert_eq!(created["id"], 6);
    }

    #[test]
    fn test_insert_into_empty_collection_starts_at_one() {
        let db = MockDb::from_seed(json!({"recipes": []})).unwrap();
        let created = db.insert("recipes", json!({"recipe": "first"})).unwrap();
        assert_eq!(created["id"], 1);
    }

    #[test]
    fn test_insert_after_max_id_conflicts() {
        let db = MockDb::from_seed(json!({"recipes": []})).unwrap();
        db.insert("recipes", json!({"id": u64::MAX, "recipe": "last"})).unwrap();

        let err = db.insert("recipes", json!({"recipe": "next"})).unwrap_err();
        assert!(matches!(err, RecipebookError::Conflict(_)));
        assert_eq!(db.list("recipes").unwrap().len(), 1);
    }

    #[test]
    fn test_insert_with_taken_id_conflicts() {
        let db = MockDb::seeded();
        let err = db.insert("recipes", json!({"id": 1, "recipe": "dup"})).unwrap_err();
        assert!(matches!(err, RecipebookError::Conflict(_)));

        let created = db.insert("recipes", json!({"id": 40, "recipe": "explicit"})).unwrap();
        assert_eq!(created["id"], 40);
    }

    #[test]
    fn test_update_and_missing_records() {
        let db = MockDb::seeded();
        let updated = db
            .update("recipes", RecordId(2), json!({"id": 99, "recipe": "B2"}))
            .unwrap();
        assert_eq!(updated, json!({"id": 2, "recipe": "B2"}));
        assert_eq!(db.list("recipes").unwrap()[1], updated);

        let err = db.update("recipes", RecordId(42), json!({"recipe": "x"})).unwrap_err();
        assert!(matches!(err, RecipebookError::NotFound(_)));

        let err = db.get("recipes", RecordId(42)).unwrap_err();
        assert!(matches!(err, RecipebookError::NotFound(_)));

        let err = db.list("pizzas").unwrap_err();
        assert!(matches!(err, RecipebookError::NotFound(_)));
    }

    #[test]
    fn test_remove_absent_is_ok() {
        let db = MockDb::seeded();
        assert!(db.remove("recipes", RecordId(1)).unwrap());
        assert!(!db.remove("recipes", RecordId(1)).unwrap());
        assert_eq!(db.list("recipes").unwrap().len(), 3);
    }

    #[test]
    fn test_bad_seed_rejected() {
        assert!(MockDb::from_seed(json!([1, 2])).is_err());
        assert!(MockDb::from_seed(json!({"recipes": [{"recipe": "no id"}]})).is_err());
        assert!(MockDb::from_seed(json!({"recipes": [{"id": 1}, {"id": 1}]})).is_err());
        assert!(MockDb::from_json("{oops").is_err());
    }

    #[test]
    fn test_dump_round_trips_through_seed() {
        let db = MockDb::seeded();
        db.insert("recipes", json!({"recipe": "extra"})).unwrap();

        let copy = MockDb::from_seed(db.dump()).unwrap();
        assert_eq!(copy.list("recipes").unwrap(), db.list("recipes").unwrap());
    }
}
