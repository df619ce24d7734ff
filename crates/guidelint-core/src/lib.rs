//! Core types, configuration, and error handling for guidelint.
//!
//! This crate provides the shared foundation used by the other crates:
//! - [`GuidelintError`]: unified error type using `thiserror`
//! - [`GuidelintConfig`]: configuration loaded from `.guidelint.toml`
//! - Shared types: [`ChangedFile`], [`ContextWindow`], [`Batch`],
//!   [`ReviewComment`], [`ReviewResponse`], [`ComparisonMode`], [`SeverityStyle`]

mod config;
mod error;
mod types;

pub use config::{GuidelintConfig, LlmConfig, ReviewConfig};
pub use error::GuidelintError;
pub use types::{
    Batch, ChangedFile, ComparisonMode, ContextWindow, Language, OutputFormat, ReviewComment,
    ReviewResponse, SeverityStyle,
};

/// A convenience `Result` type for guidelint operations.
pub type Result<T> = std::result::Result<T, GuidelintError>;
