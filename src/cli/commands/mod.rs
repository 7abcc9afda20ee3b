//! CLI commands for nanobanana.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic.

/// Shell completion script generation.
pub mod completions;

/// Configuration viewing and management.
pub mod config;

/// Interactive journal session.
pub mod journal;

/// Write a single reflection.
pub mod write;
