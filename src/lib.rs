// Blockpress - page/block/field content engine

// Core types and primitives
pub mod core;

// Content model
pub mod models;

// Persistence, caching and media lookup
pub mod infrastructure;

// Schema, document and read-path services
pub mod services;

// HTTP surface
pub mod app_state;
pub mod cms_interface;
pub mod config;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult, FieldErrors};
