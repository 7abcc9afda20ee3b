//! Command-line interface for nanobanana.
//!
//! Provides the commands for writing reflections, running an interactive
//! journal session, and managing configuration.

/// Individual CLI command implementations.
pub mod commands;

/// Output format selection and renderers.
pub mod format;

pub use format::OutputFormat;
