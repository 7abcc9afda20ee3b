//! Prompt construction and response parsing for reflection generation.
//!
//! The text model is asked for a JSON object with a short title and a few
//! body lines. Its answer is parsed defensively: anything that does not
//! match the expected shape is replaced by a fixed substitute rather than
//! treated as a failure.

use serde::Deserialize;

/// Title used when the text payload cannot be used.
pub const SUBSTITUTE_TITLE: &str = "오늘의 발견";

/// Body used when the text payload cannot be used.
pub const SUBSTITUTE_LINES: [&str; 2] = ["기록되지 않은 시간은", "망각의 숲으로 사라집니다."];

/// Builds the prompt for the title/body request.
///
/// The verse sentence is only included when a verse was attached.
pub fn text_prompt(text: &str, bible_verse: Option<&str>) -> String {
    let mut prompt = format!("당신의 오늘 묵상: \"{text}\". ");
    if let Some(verse) = bible_verse {
        prompt.push_str(&format!("말씀: \"{verse}\". "));
    }
    prompt.push_str(
        "이 내용을 바탕으로 1) 아주 짧고 시적인 제목, 2) 3~4줄 정도의 감성적인 문구(원문 변형 가능)를 \
         JSON 형식으로 작성해줘. { \"title\": \"...\", \"contentLines\": [\"...\", \"...\"] } 형식이어야 해.",
    );
    prompt
}

/// Builds the prompt for the illustration request.
pub fn image_prompt(text: &str) -> String {
    format!(
        "A surreal, artistic, minimalist and ethereal digital artifact called a 'Nano-Banana', \
         inspired by the theme of faith and: \"{text}\". Abstract, high quality, soft lighting, \
         pastel or aesthetic colors, clean background."
    )
}

/// Expected shape of the text model's JSON answer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextPayload {
    title: String,
    content_lines: Vec<String>,
}

/// Result of interpreting the text model's answer.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOutcome {
    /// The payload had the expected shape.
    Parsed {
        title: String,
        content_lines: Vec<String>,
    },
    /// The payload was unusable; the fixed substitute applies.
    Substituted { reason: String },
}

impl TextOutcome {
    /// Returns the title and body, using the substitute when needed.
    pub fn into_parts(self) -> (String, Vec<String>) {
        match self {
            TextOutcome::Parsed {
                title,
                content_lines,
            } => (title, content_lines),
            TextOutcome::Substituted { .. } => (
                SUBSTITUTE_TITLE.to_string(),
                SUBSTITUTE_LINES.iter().map(|l| l.to_string()).collect(),
            ),
        }
    }
}

/// Parses the text model's payload.
///
/// Never fails: a missing payload, invalid JSON, a missing field, a blank
/// title, or an empty body all yield [`TextOutcome::Substituted`].
pub fn parse_text_payload(payload: Option<&str>) -> TextOutcome {
    let Some(raw) = payload.map(strip_code_fence).filter(|p| !p.is_empty()) else {
        return TextOutcome::Substituted {
            reason: "empty payload".to_string(),
        };
    };

    let parsed: TextPayload = match serde_json::from_str(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            return TextOutcome::Substituted {
                reason: e.to_string(),
            }
        }
    };

    let content_lines: Vec<String> = parsed
        .content_lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if parsed.title.trim().is_empty() {
        return TextOutcome::Substituted {
            reason: "blank title".to_string(),
        };
    }
    if content_lines.is_empty() {
        return TextOutcome::Substituted {
            reason: "no content lines".to_string(),
        };
    }

    TextOutcome::Parsed {
        title: parsed.title,
        content_lines,
    }
}

/// Removes a surrounding Markdown code fence, which some models add even
/// when asked for raw JSON.
fn strip_code_fence(payload: &str) -> &str {
    let trimmed = payload.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
