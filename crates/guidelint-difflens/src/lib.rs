//! Change enumeration, filtering, batching and context windows.
//!
//! Shells out to `git` for the changed files of a repository, keeps the
//! TypeScript/JavaScript sources worth reviewing, groups them under a
//! changed-line budget and renders source windows around added lines.

pub mod batch;
pub mod context;
pub mod filter;
pub mod git;
pub mod parser;
pub mod syntax;
