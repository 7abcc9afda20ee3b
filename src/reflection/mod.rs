//! Reflection generation.
//!
//! Turns a short note into a titled, illustrated [`Reflection`]. When a
//! Gemini API key is configured the title, body, and image come from the
//! generative service; otherwise, or when the service fails, they come from
//! a deterministic local fallback. Generation never fails from the caller's
//! point of view.
//!
//! # Usage
//!
//! Build a [`ReflectionGenerator`] from a [`GeneratorConfig`] (usually via
//! [`resolve_config`]) and call [`ReflectionGenerator::generate`] or
//! [`ReflectionGenerator::text_only`].

pub mod fallback;
pub mod generator;
pub mod models;
pub mod prompt;
pub mod provider;

use std::env;
use std::time::Duration;

use crate::config::Config;

pub use generator::{credential_available, FallbackReason, Outcome, ReflectionGenerator};
pub use models::{
    Clock, DateStamp, FixedClock, GeneratedContent, InputError, Provenance, Reflection,
    ReflectionInput, SystemClock,
};
pub use provider::{GeminiBackend, GeminiSettings, GenerativeBackend, ImagePart, ImageResponse};

/// Aspect ratio requested for illustrations.
pub const DEFAULT_ASPECT_RATIO: &str = "4:5";

/// Simulated latency of the offline fallback (2 seconds).
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(2000);

/// Timeout for each upstream request (120 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Resolved generator configuration from the config file and environment.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// API key, if any was found. May still be unusable; see
    /// [`credential_available`].
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub aspect_ratio: String,
    pub fallback_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: provider::DEFAULT_BASE_URL.to_string(),
            text_model: provider::DEFAULT_TEXT_MODEL.to_string(),
            image_model: provider::DEFAULT_IMAGE_MODEL.to_string(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Resolves generator configuration from the config file and environment.
///
/// Environment variables take precedence over config file values:
/// - `NANOBANANA_API_KEY`, then `API_KEY`, override `api_key`
/// - `NANOBANANA_TEXT_MODEL` overrides `text_model`
/// - `NANOBANANA_IMAGE_MODEL` overrides `image_model`
/// - `NANOBANANA_API_BASE_URL` overrides `api_base_url`
pub fn resolve_config(config: &Config) -> GeneratorConfig {
    resolve_with(config, |key| env::var(key).ok())
}

/// Resolves configuration using the given variable lookup.
pub fn resolve_with<F>(config: &Config, lookup: F) -> GeneratorConfig
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = GeneratorConfig::default();

    let api_key = lookup("NANOBANANA_API_KEY")
        .or_else(|| lookup("API_KEY"))
        .or_else(|| config.api_key.clone());

    GeneratorConfig {
        api_key,
        base_url: lookup("NANOBANANA_API_BASE_URL")
            .or_else(|| config.api_base_url.clone())
            .unwrap_or(defaults.base_url),
        text_model: lookup("NANOBANANA_TEXT_MODEL")
            .or_else(|| config.text_model.clone())
            .unwrap_or(defaults.text_model),
        image_model: lookup("NANOBANANA_IMAGE_MODEL")
            .or_else(|| config.image_model.clone())
            .unwrap_or(defaults.image_model),
        aspect_ratio: config.aspect_ratio.clone().unwrap_or(defaults.aspect_ratio),
        fallback_delay: config
            .fallback_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.fallback_delay),
        request_timeout: config
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout),
    }
}

/// Errors that can occur while talking to the generative service.
///
/// These never reach callers of [`ReflectionGenerator::generate`]; they are
/// logged and converted into fallback content.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Network or connection error when calling the service.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The service returned a non-success HTTP status code.
    #[error("HTTP error ({status}): {body}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The service returned an error object in its JSON response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// Error code reported by the service.
        status: u16,
        /// Error message from the service.
        message: String,
    },

    /// Failed to parse the service response envelope.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The request did not complete in time.
    #[error("Request timed out: {0}")]
    Timeout(String),
}
