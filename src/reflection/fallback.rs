//! Offline content generation.
//!
//! Used whenever the generative service is unconfigured or fails. The body
//! and image are pure functions of the note; only the title prefix is drawn
//! from the supplied random source.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::Rng;

use super::models::GeneratedContent;

/// Characters escaped in the seed: everything except ASCII alphanumerics
/// and `-_.!~*'()`, matching `encodeURIComponent`.
const SEED_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Candidate title prefixes.
pub const FALLBACK_TITLES: [&str; 5] = [
    "고요한 발견",
    "성장의 궤적",
    "마음의 정원",
    "오늘의 조각",
    "빛의 기록",
];

/// Notes longer than this many characters are sliced instead of wrapped.
const SLICE_THRESHOLD: usize = 20;

/// Characters of the note used to seed the placeholder image.
const SEED_CHARS: usize = 10;

/// Characters of the note echoed in the title.
const TITLE_CHARS: usize = 5;

/// Builds the complete offline content for a note.
pub fn fallback_content<R: Rng + ?Sized>(text: &str, rng: &mut R) -> GeneratedContent {
    let prefix = FALLBACK_TITLES[rng.gen_range(0..FALLBACK_TITLES.len())];

    GeneratedContent {
        title: format!("{prefix}: {}...", char_slice(text, 0, TITLE_CHARS)),
        content_lines: fallback_lines(text),
        image: fallback_image_url(text),
    }
}

/// Splits or wraps the note into three body lines.
pub fn fallback_lines(text: &str) -> Vec<String> {
    if text.chars().count() > SLICE_THRESHOLD {
        vec![
            char_slice(text, 0, 15),
            char_slice(text, 15, 30),
            "그 너머의 진실".to_string(),
        ]
    } else {
        vec![
            text.to_string(),
            "깊은 성찰 끝에".to_string(),
            "피어난 작은 평온".to_string(),
        ]
    }
}

/// The seed string for the placeholder image: the URL-escaped first ten
/// characters of the note.
pub fn image_seed(text: &str) -> String {
    utf8_percent_encode(&char_slice(text, 0, SEED_CHARS), SEED_ESCAPE).to_string()
}

/// Placeholder image derived from the note, stable for identical prefixes.
pub fn fallback_image_url(text: &str) -> String {
    format!(
        "https://picsum.photos/seed/{}/800/1000?blur=1",
        image_seed(text)
    )
}

/// Placeholder image used when the image model returned no inline data.
pub fn placeholder_image_url(timestamp_ms: i64) -> String {
    format!("https://picsum.photos/seed/{timestamp_ms}/800/1000")
}

/// Returns characters `start..end` of `text`, clamped to its length.
fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}
