//! Error types for the catalog.

use thiserror::Error;

/// Errors raised by the catalog store, ingestor and search engine.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Database error. A failed ingestion transaction surfaces here after
    /// rollback.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The manifest cannot be ingested as published.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// The manifest publishes an intent uid already owned by another service.
    #[error("intent {intent_uid} belongs to another service")]
    IntentConflict { intent_uid: String },

    /// Search parameters failed validation.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A stored parameter schema could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
