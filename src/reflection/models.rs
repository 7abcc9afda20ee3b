//! Core data models for reflections
//!
//! A [`Reflection`] is one journal entry: the user's note turned into a
//! titled, illustrated record. Records are built once by the generator and
//! never modified afterwards.

use chrono::{DateTime, Datelike, FixedOffset, Local};
use serde::{Deserialize, Serialize};

/// A single journal entry.
///
/// Field names serialize in camelCase (`contentLines`, `dayName`, ...) so the
/// JSON output matches the record shape consumed by the journal views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    /// Unique identifier: the millisecond clock reading at creation
    pub id: String,

    /// Display date in Korean, e.g. "10월 16일"
    pub date: String,

    /// Uppercase English month name, e.g. "OCTOBER"
    pub month: String,

    /// Uppercase short English weekday, e.g. "FRI"
    pub day_name: String,

    /// Day of the month without padding
    pub day_num: String,

    /// Secondary numeric label shown next to the day number
    pub sub_day_num: String,

    /// Image URL or data URI; empty only for text-only entries
    pub image: String,

    pub title: String,

    /// Body lines, never empty
    pub content_lines: Vec<String>,

    pub source: String,

    pub author: String,

    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<String>,

    /// Verse text and reference in the form `"<text> (<reference>)"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bible_verse: Option<String>,

    /// The clock reading this record was stamped with
    pub created_at: DateTime<FixedOffset>,

    /// Which path produced the content
    pub provenance: Provenance,
}

impl Reflection {
    /// Returns true if this entry was stored without any generated content.
    pub fn is_text_only(&self) -> bool {
        self.provenance == Provenance::TextOnly
    }
}

/// Where the title, body, and image of a reflection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// The raw note, stored without generation.
    TextOnly,
    /// Content produced by the generative service.
    Generated,
    /// Local content because no credential is configured.
    Offline,
    /// Local content after the generative service failed.
    Fallback,
}

impl Provenance {
    /// Source label used when the caller did not supply one.
    pub fn default_source(self) -> &'static str {
        match self {
            Provenance::TextOnly => "나의 기록",
            Provenance::Generated | Provenance::Offline => "나의 마음 한 조각",
            Provenance::Fallback => "마음의 기록 (Demo)",
        }
    }

    /// Author label used when the caller did not supply one.
    pub fn default_author(self) -> &'static str {
        match self {
            Provenance::TextOnly => "나",
            Provenance::Generated | Provenance::Offline | Provenance::Fallback => "나노바나나",
        }
    }

    /// The fixed tag set attached to records of this provenance.
    pub fn tags(self) -> Vec<String> {
        let tags: [&str; 2] = match self {
            Provenance::TextOnly => ["#텍스트", "#성찰"],
            Provenance::Generated | Provenance::Offline => ["#기록", "#성장"],
            Provenance::Fallback => ["#데모", "#성장"],
        };
        tags.iter().map(|t| t.to_string()).collect()
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::TextOnly => write!(f, "text-only"),
            Provenance::Generated => write!(f, "generated"),
            Provenance::Offline => write!(f, "offline"),
            Provenance::Fallback => write!(f, "fallback"),
        }
    }
}

/// Title, body, and image produced by either the generative service or the
/// local fallback, before it is stamped into a [`Reflection`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedContent {
    pub title: String,
    pub content_lines: Vec<String>,
    pub image: String,
}

/// What the user submitted.
///
/// The note text is validated on construction; the optional labels are
/// independent of each other and empty strings are treated as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionInput {
    text: String,
    pub source: Option<String>,
    pub author: Option<String>,
    pub music: Option<String>,
    pub bible_verse: Option<String>,
    /// Store the note as-is without requesting any generation
    pub skip_image: bool,
}

impl ReflectionInput {
    /// Creates an input for the given note.
    ///
    /// Returns `EmptyText` if the note is empty or only whitespace.
    pub fn new(text: impl Into<String>) -> Result<Self, InputError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(InputError::EmptyText);
        }
        Ok(Self {
            text,
            source: None,
            author: None,
            music: None,
            bible_verse: None,
            skip_image: false,
        })
    }

    /// The note exactly as entered.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = non_empty(source);
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = non_empty(author);
        self
    }

    pub fn with_music(mut self, music: Option<String>) -> Self {
        self.music = non_empty(music);
        self
    }

    pub fn with_bible_verse(mut self, verse: Option<String>) -> Self {
        self.bible_verse = non_empty(verse);
        self
    }

    pub fn text_only(mut self, skip_image: bool) -> Self {
        self.skip_image = skip_image;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Errors raised while building a [`ReflectionInput`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("A reflection needs some text to start from")]
    EmptyText,
}

/// The display fields derived from a single clock reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateStamp {
    pub date: String,
    pub month: String,
    pub day_name: String,
    pub day_num: String,
}

impl DateStamp {
    pub fn from_datetime(at: &DateTime<FixedOffset>) -> Self {
        Self {
            date: format!("{}월 {}일", at.month(), at.day()),
            month: at.format("%B").to_string().to_uppercase(),
            day_name: at.format("%a").to_string().to_uppercase(),
            day_num: at.day().to_string(),
        }
    }
}

/// Source of wall-clock readings.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
