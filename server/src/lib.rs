//! Recipebook Mock Backend
//! 
//! A small REST backend for exercising the collection store:
//! - In-memory collection database with max+1 id assignment
//! - HTTP API (axum)
//! - In-process transport over the same database

mod api;
mod backend;
mod db;
mod server;

pub use api::*;
pub use backend::*;
pub use db::*;
pub use server::*;
