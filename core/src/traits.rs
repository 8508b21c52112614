//! Core traits defining Recipebook interfaces
//!
//! The store never talks HTTP directly; it hands a method, a path and an
//! optional JSON body to a [`Transport`] and gets decoded JSON back.

use crate::error::TransportError;
use crate::types::RecordId;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Result type for Recipebook operations
pub type RecipebookResult<T> = Result<T, crate::error::RecipebookError>;

/// Result type returned by transports
pub type TransportResult = Result<Value, TransportError>;

/// Record payload carried by a store
pub trait Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Request method understood by a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performs one request and resolves with the decoded payload.
///
/// A response without a body resolves to `Value::Null`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> TransportResult;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> TransportResult {
        (**self).request(method, path, body).await
    }
}

/// Path of a single record under a collection base path
pub fn record_path(base: &str, id: RecordId) -> String {
    format!("{}/{}", base.trim_end_matches('/'), id)
}
