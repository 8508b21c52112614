//! Recipebook State Management
//!
//! A reactive store that mirrors a remote record collection, tracks
//! loading and error status, and notifies observers on every change.

pub mod state;
pub mod observer;
pub mod store;

#[cfg(test)]
mod mock;

pub use state::StoreState;
pub use observer::*;
pub use store::*;
