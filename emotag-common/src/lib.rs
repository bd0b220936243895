//! # Emotag Common Library
//!
//! Shared code for the emotag services including:
//! - Database pool initialization and schema
//! - Sentence result cache (shared across worker processes)
//! - Cross-process initialization lock
//! - Sentence normalization
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod normalize;

pub use error::{Error, Result};
pub use normalize::normalise_sentence;
