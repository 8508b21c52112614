//! Recipebook client: HTTP transport for the collection store.

mod transport;

pub use transport::*;
