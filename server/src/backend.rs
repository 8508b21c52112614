//! In-process transport answering requests straight from a [`MockDb`]
//!
//! Lets a store run against the mock backend without opening a socket.
//! Paths and status codes match the HTTP API.

use async_trait::async_trait;
use recipebook_core::{Method, RecordId, Transport, TransportError, TransportResult};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::api::status_for;
use crate::db::{MockDb, SharedMockDb};

/// Mock backend exposed as a [`Transport`]
pub struct InMemoryBackend {
    db: SharedMockDb,
    api_root: String,
    delay: Option<Duration>,
}

impl InMemoryBackend {
    pub fn new(db: SharedMockDb) -> Self {
        Self {
            db,
            api_root: "api".to_string(),
            delay: None,
        }
    }

    /// Backend over the built-in seed
    pub fn seeded() -> Self {
        Self::new(Arc::new(MockDb::seeded()))
    }

    pub fn api_root(mut self, root: &str) -> Self {
        self.api_root = root.trim_matches('/').to_string();
        self
    }

    /// Simulated latency applied to every request
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn db(&self) -> &SharedMockDb {
        &self.db
    }

    fn route<'p>(&self, path: &'p str) -> Result<(&'p str, Option<RecordId>), TransportError> {
        let mut segments = path.trim_matches('/').split('/');
        let root = segments.next().unwrap_or_default();
        let collection = segments.next().filter(|c| !c.is_empty());
        let id = segments.next();

        let collection = match collection {
            Some(c) if root == self.api_root && segments.next().is_none() => c,
            _ => return Err(TransportError::server(Some(404), format!("no route for {}", path))),
        };

        let id = match id {
            Some(raw) => Some(raw.parse::<RecordId>().map_err(|_| {
                TransportError::server(Some(400), format!("Invalid id: {}", raw))
            })?),
            None => None,
        };

        Ok((collection, id))
    }
}

#[async_trait]
impl Transport for InMemoryBackend {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> TransportResult {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let (collection, id) = self.route(path)?;
        let body = body.unwrap_or(Value::Null);

        let result = match (method, id) {
            (Method::Get, None) => self.db.list(collection).map(Value::Array),
            (Method::Get, Some(id)) => self.db.get(collection, id),
            (Method::Post, None) => self.db.insert(collection, body),
            (Method::Put, Some(id)) => self.db.update(collection, id, body),
            (Method::Delete, Some(id)) => self.db.remove(collection, id).map(|_| Value::Null),
            _ => {
                return Err(TransportError::server(
                    Some(405),
                    format!("{} not allowed on {}", method, path),
                ))
            }
        };

        result.map_err(|e| TransportError::server(Some(status_for(&e).as_u16()), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_crud_through_transport() {
        let backend = InMemoryBackend::seeded();

        let all = backend.request(Method::Get, "/api/recipes", None).await.unwrap();
        assert_eq!(all.as_array().unwrap().len(), 4);

        let created = backend
            .request(Method::Post, "/api/recipes", Some(json!({"recipe": "X"})))
            .await
            .unwrap();
        assert_eq!(created, json!({"id": 5, "recipe": "X"}));

        let deleted = backend.request(Method::Delete, "/api/recipes/5", None).await.unwrap();
        assert!(deleted.is_null());
    }

    #[tokio::test]
    async fn test_failures_carry_status() {
        let backend = InMemoryBackend::seeded();

        let err = backend.request(Method::Get, "/api/recipes/9", None).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Server-side error: 404 Not found: record 9 in recipes");

        let err = backend.request(Method::Delete, "/api/recipes", None).await.unwrap_err();
        assert_eq!(err.status(), Some(405));

        let err = backend.request(Method::Get, "/other/recipes", None).await.unwrap_err();
        assert_eq!(err.status(), Some(404));

        let err = backend.request(Method::Get, "/api/recipes/x", None).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }
}
