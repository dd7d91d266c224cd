//! Error types for contact search.
//!
//! This module defines custom error types using `thiserror` for precise error handling.

use thiserror::Error;

/// Errors raised by a contact store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying database rejected a statement
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored row could not be decoded into a model
    #[error("Corrupt row in {table}: {reason}")]
    Corrupt { table: String, reason: String },

    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Generic store error with context
    #[error("Store error: {0}")]
    Other(String),
}

/// Errors raised by a cache backend.
///
/// These never fail a search: callers log them and treat the lookup as a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache backend could not be reached
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during a contact search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The store query failed; no partial result is returned
    #[error("Store query failed: {0}")]
    Store(#[from] StoreError),

    /// Generic search error
    #[error("Search error: {0}")]
    Other(String),
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Convenience type alias for Results with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience type alias for Results with CacheError
pub type CacheResult<T> = Result<T, CacheError>;

/// Convenience type alias for Results with SearchError
pub type SearchOutcome<T> = Result<T, SearchError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
