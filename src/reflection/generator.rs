//! The reflection generator.
//!
//! Generation is two independent steps. The attempt step talks to the
//! generative backend and yields an [`Outcome`]; inside it, the text payload
//! is parsed into its own tagged result so a bad payload only swaps in the
//! substitute title and body. The fallback step runs only when the whole
//! attempt is unavailable or fails.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use super::fallback::{fallback_content, placeholder_image_url};
use super::models::{
    Clock, DateStamp, GeneratedContent, Provenance, Reflection, ReflectionInput, SystemClock,
};
use super::prompt::{self, TextOutcome};
use super::provider::{GeminiBackend, GeminiSettings, GenerativeBackend};
use super::{GenerateError, GeneratorConfig, DEFAULT_ASPECT_RATIO, DEFAULT_FALLBACK_DELAY};

/// Title of a text-only entry when no source label was given.
const TEXT_ONLY_TITLE: &str = "오늘의 기록";

/// Value some environments substitute for an unset variable.
const UNSET_PLACEHOLDER: &str = "undefined";

/// Returns true if the credential is present, non-empty, and not the unset
/// placeholder.
pub fn credential_available(api_key: Option<&str>) -> bool {
    matches!(api_key, Some(key) if !key.is_empty() && key != UNSET_PLACEHOLDER)
}

/// Why generation fell back to local content.
#[derive(Debug)]
pub enum FallbackReason {
    /// No usable credential; the service was never contacted.
    NotConfigured,
    /// The service was contacted and failed.
    Failed(GenerateError),
}

impl FallbackReason {
    fn provenance(&self) -> Provenance {
        match self {
            FallbackReason::NotConfigured => Provenance::Offline,
            FallbackReason::Failed(_) => Provenance::Fallback,
        }
    }
}

/// Result of the generation attempt.
#[derive(Debug)]
pub enum Outcome {
    Generated(GeneratedContent),
    Fallback { reason: FallbackReason },
}

/// Produces [`Reflection`] records from user input.
pub struct ReflectionGenerator {
    backend: Option<Box<dyn GenerativeBackend>>,
    clock: Box<dyn Clock>,
    rng: Mutex<StdRng>,
    last_id: AtomicI64,
    aspect_ratio: String,
    fallback_delay: Duration,
}

impl ReflectionGenerator {
    /// Creates a generator around an optional backend, using the system
    /// clock and an entropy-seeded random source.
    pub fn new(backend: Option<Box<dyn GenerativeBackend>>) -> Self {
        Self {
            backend,
            clock: Box::new(SystemClock),
            rng: Mutex::new(StdRng::from_entropy()),
            last_id: AtomicI64::new(0),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            fallback_delay: DEFAULT_FALLBACK_DELAY,
        }
    }

    /// Builds a generator from resolved configuration.
    ///
    /// A Gemini backend is attached only when the credential is usable. If
    /// the HTTP client cannot be built the generator runs offline.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let backend: Option<Box<dyn GenerativeBackend>> =
            match config.api_key.as_deref().filter(|k| credential_available(Some(*k))) {
                Some(api_key) => match GeminiBackend::new(GeminiSettings {
                    api_key: api_key.to_string(),
                    base_url: config.base_url.clone(),
                    text_model: config.text_model.clone(),
                    image_model: config.image_model.clone(),
                    request_timeout: config.request_timeout,
                }) {
                    Ok(backend) => Some(Box::new(backend) as Box<dyn GenerativeBackend>),
                    Err(e) => {
                        error!("Could not set up the generative backend: {e}");
                        None
                    }
                },
                None => None,
            };

        Self::new(backend)
            .with_aspect_ratio(config.aspect_ratio.clone())
            .with_fallback_delay(config.fallback_delay)
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the random source, e.g. with a seeded one for reproducible
    /// titles.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    /// Returns true if a backend is attached.
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Builds a text-only reflection: the note verbatim, no image, no
    /// external calls.
    pub fn text_only(&self, input: &ReflectionInput) -> Reflection {
        let content = GeneratedContent {
            title: input
                .source
                .clone()
                .unwrap_or_else(|| TEXT_ONLY_TITLE.to_string()),
            content_lines: vec![input.text().to_string()],
            image: String::new(),
        };
        self.assemble(input, content, Provenance::TextOnly)
    }

    /// Generates a reflection for the input.
    ///
    /// Inputs flagged `skip_image` take the text-only path. Otherwise the
    /// backend is asked for text and an image; if no backend is attached or
    /// any upstream step fails, local fallback content is used instead.
    pub async fn generate(&self, input: &ReflectionInput) -> Reflection {
        if input.skip_image {
            return self.text_only(input);
        }

        let invoked_at = self.clock.now().timestamp_millis();

        let (content, provenance) = match self.attempt(input, invoked_at).await {
            Outcome::Generated(content) => (content, Provenance::Generated),
            Outcome::Fallback { reason } => {
                match &reason {
                    FallbackReason::NotConfigured => {
                        warn!("No API key configured; generating the reflection offline")
                    }
                    FallbackReason::Failed(e) => {
                        error!("Generation failed, falling back to offline content: {e}")
                    }
                }
                (self.fallback(input.text()).await, reason.provenance())
            }
        };

        self.assemble(input, content, provenance)
    }

    /// Runs the backend sequence, or reports why it could not run.
    pub async fn attempt(&self, input: &ReflectionInput, invoked_at: i64) -> Outcome {
        let Some(backend) = self.backend.as_deref() else {
            return Outcome::Fallback {
                reason: FallbackReason::NotConfigured,
            };
        };

        match self.generate_with(backend, input, invoked_at).await {
            Ok(content) => Outcome::Generated(content),
            Err(e) => Outcome::Fallback {
                reason: FallbackReason::Failed(e),
            },
        }
    }

    async fn generate_with(
        &self,
        backend: &dyn GenerativeBackend,
        input: &ReflectionInput,
        invoked_at: i64,
    ) -> Result<GeneratedContent, GenerateError> {
        let text_prompt = prompt::text_prompt(input.text(), input.bible_verse.as_deref());
        let payload = backend.generate_text(&text_prompt).await?;

        let text = prompt::parse_text_payload(payload.as_deref());
        if let TextOutcome::Substituted { reason } = &text {
            debug!("Text payload unusable ({reason}); using the substitute title and body");
        }

        let image_prompt = prompt::image_prompt(input.text());
        let response = backend
            .generate_image(&image_prompt, &self.aspect_ratio)
            .await?;

        let image = match response.first_inline_image() {
            Some(inline) => inline.data_uri(),
            None => {
                debug!("Image response had no inline data; using a placeholder");
                placeholder_image_url(invoked_at)
            }
        };

        let (title, content_lines) = text.into_parts();
        info!(title = %title, "Generated reflection content");

        Ok(GeneratedContent {
            title,
            content_lines,
            image,
        })
    }

    async fn fallback(&self, text: &str) -> GeneratedContent {
        if !self.fallback_delay.is_zero() {
            tokio::time::sleep(self.fallback_delay).await;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        fallback_content(text, &mut *rng)
    }

    /// Stamps content with the current date and the caller's labels.
    fn assemble(
        &self,
        input: &ReflectionInput,
        content: GeneratedContent,
        provenance: Provenance,
    ) -> Reflection {
        let now = self.clock.now();
        let id = self.next_id(now.timestamp_millis());
        let stamp = DateStamp::from_datetime(&now);

        Reflection {
            id: id.to_string(),
            date: stamp.date,
            month: stamp.month,
            day_name: stamp.day_name,
            day_num: stamp.day_num,
            sub_day_num: "1".to_string(),
            image: content.image,
            title: content.title,
            content_lines: content.content_lines,
            source: input
                .source
                .clone()
                .unwrap_or_else(|| provenance.default_source().to_string()),
            author: input
                .author
                .clone()
                .unwrap_or_else(|| provenance.default_author().to_string()),
            tags: provenance.tags(),
            music: input.music.clone(),
            bible_verse: input.bible_verse.clone(),
            created_at: now,
            provenance,
        }
    }

    /// Returns a strictly increasing id no earlier than `now_ms`.
    fn next_id(&self, now_ms: i64) -> i64 {
        let previous = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now_ms.max(prev + 1))
            })
            .unwrap_or_else(|prev| prev);
        now_ms.max(previous + 1)
    }
}
