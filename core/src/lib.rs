//! Recipebook Core Library
//! 
//! Record types, the transport contract, error types and configuration
//! shared by the store, the mock backend and the CLI.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;
