// src/lib.rs

pub mod api;
pub mod assignment;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod view;

// Re-export specific items for convenience if needed
pub use api::{HttpSync, RemoteSync};
pub use error::AdminError;
