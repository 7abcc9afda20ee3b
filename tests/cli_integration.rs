//! Integration tests for the nanobanana library and CLI
//!
//! Library tests drive the generator and journal against a mock generative
//! service. CLI tests run the binary with an isolated config file and no API
//! key in the environment.

use std::fs;
use std::time::Duration;

use assert_cmd::Command;
use chrono::{FixedOffset, TimeZone};
use mockito::{Matcher, Server, ServerGuard};
use nanobanana_cli::journal::{Journal, View};
use nanobanana_cli::reflection::{
    FixedClock, GeminiBackend, GeminiSettings, GenerativeBackend, Provenance, ReflectionGenerator,
    ReflectionInput,
};
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

// =============================================================================
// Test Helpers
// =============================================================================

const TEXT_PATH: &str = "/v1beta/models/text-model:generateContent";
const IMAGE_PATH: &str = "/v1beta/models/image-model:generateContent";

fn generator_for(server: &ServerGuard) -> ReflectionGenerator {
    let backend = GeminiBackend::new(GeminiSettings {
        api_key: "integration-key".to_string(),
        base_url: server.url(),
        text_model: "text-model".to_string(),
        image_model: "image-model".to_string(),
        request_timeout: Duration::from_secs(5),
    })
    .expect("Failed to build backend");

    let now = FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 10, 16, 9, 30, 0)
        .unwrap();

    ReflectionGenerator::new(Some(Box::new(backend) as Box<dyn GenerativeBackend>))
        .with_clock(FixedClock(now))
        .with_fallback_delay(Duration::ZERO)
}

fn text_body(payload: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": payload }], "role": "model" } }]
    })
    .to_string()
}

fn image_body() -> String {
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "Here is the illustration" },
                    { "inlineData": { "mimeType": "image/png", "data": "iVBORw0K" } }
                ]
            }
        }]
    })
    .to_string()
}

/// Runs the binary with its config isolated in `dir` and no API key set.
fn nanobanana(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nanobanana").expect("binary should build");
    cmd.env("NANOBANANA_CONFIG", dir.path().join("config.yaml"))
        .env_remove("NANOBANANA_API_KEY")
        .env_remove("API_KEY")
        .env_remove("NANOBANANA_API_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) {
    fs::write(dir.path().join("config.yaml"), yaml).expect("Failed to write config");
}

fn parse_json(stdout: &[u8]) -> serde_json::Value {
    serde_json::from_slice(stdout).expect("stdout should be JSON")
}

// =============================================================================
// Generation Against a Mock Service
// =============================================================================

#[tokio::test]
async fn test_generated_reflection_end_to_end() {
    let mut server = Server::new_async().await;
    let text = server
        .mock("POST", TEXT_PATH)
        .match_header("x-goog-api-key", "integration-key")
        .match_body(Matcher::Regex("시편 23:1".to_string()))
        .with_status(200)
        .with_body(text_body(
            r#"{"title": "고요한 아침", "contentLines": ["햇살이 머문 자리", "숨을 고르고", "다시 걷는다"]}"#,
        ))
        .create_async()
        .await;
    let image = server
        .mock("POST", IMAGE_PATH)
        .match_body(Matcher::PartialJson(serde_json::json!({
            "generationConfig": { "imageConfig": { "aspectRatio": "4:5" } }
        })))
        .with_status(200)
        .with_body(image_body())
        .create_async()
        .await;

    let generator = generator_for(&server);
    let input = ReflectionInput::new("오늘은 평온했다")
        .unwrap()
        .with_bible_verse(Some("여호와는 나의 목자시니 (시편 23:1)".to_string()));
    let reflection = generator.generate(&input).await;

    text.assert_async().await;
    image.assert_async().await;

    assert_eq!(reflection.provenance, Provenance::Generated);
    assert_eq!(reflection.title, "고요한 아침");
    assert_eq!(reflection.content_lines.len(), 3);
    assert_eq!(reflection.image, "data:image/png;base64,iVBORw0K");
    assert_eq!(reflection.date, "10월 16일");
    assert_eq!(reflection.month, "OCTOBER");
    assert_eq!(reflection.day_name, "FRI");
    assert_eq!(reflection.source, "나의 마음 한 조각");
    assert_eq!(reflection.author, "나노바나나");
    assert_eq!(reflection.tags, vec!["#기록", "#성장"]);
}

#[tokio::test]
async fn test_unparseable_text_keeps_generated_image() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", TEXT_PATH)
        .with_status(200)
        .with_body(text_body("not json at all"))
        .create_async()
        .await;
    server
        .mock("POST", IMAGE_PATH)
        .with_status(200)
        .with_body(image_body())
        .create_async()
        .await;

    let reflection = generator_for(&server)
        .generate(&ReflectionInput::new("짧은 메모").unwrap())
        .await;

    assert_eq!(reflection.provenance, Provenance::Generated);
    assert_eq!(reflection.title, "오늘의 발견");
    assert!(reflection.image.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_image_failure_falls_back_to_demo_content() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", TEXT_PATH)
        .with_status(200)
        .with_body(text_body(r#"{"title": "t", "contentLines": ["a"]}"#))
        .create_async()
        .await;
    server
        .mock("POST", IMAGE_PATH)
        .with_status(500)
        .with_body(r#"{"error": {"code": 500, "message": "internal"}}"#)
        .create_async()
        .await;

    let input = ReflectionInput::new("오늘은 정말 길고도 긴 하루였고 많은 생각이 들었다")
        .unwrap()
        .with_author(Some("민지".to_string()));
    let reflection = generator_for(&server).generate(&input).await;

    assert_eq!(reflection.provenance, Provenance::Fallback);
    assert_eq!(reflection.source, "마음의 기록 (Demo)");
    assert_eq!(reflection.author, "민지");
    assert_eq!(reflection.tags, vec!["#데모", "#성장"]);
    assert_eq!(reflection.content_lines.len(), 3);
    assert_eq!(reflection.content_lines[2], "그 너머의 진실");
    assert!(reflection
        .image
        .starts_with("https://picsum.photos/seed/"));
    assert!(reflection.image.ends_with("/800/1000?blur=1"));
}

#[tokio::test]
async fn test_journal_session_with_mock_service() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", TEXT_PATH)
        .with_status(200)
        .with_body(text_body(r#"{"title": "빛", "contentLines": ["하나"]}"#))
        .expect(2)
        .create_async()
        .await;
    server
        .mock("POST", IMAGE_PATH)
        .with_status(200)
        .with_body(image_body())
        .expect(2)
        .create_async()
        .await;

    let mut journal = Journal::new(generator_for(&server));

    journal
        .submit(ReflectionInput::new("first").unwrap())
        .await;
    assert_eq!(journal.view(), View::Reveal);
    journal.save();

    journal
        .submit(ReflectionInput::new("just text").unwrap().text_only(true))
        .await;
    assert_eq!(journal.view(), View::Archive);

    journal
        .submit(ReflectionInput::new("second").unwrap())
        .await;

    let provenance: Vec<Provenance> = journal.history().iter().map(|r| r.provenance).collect();
    assert_eq!(
        provenance,
        vec![Provenance::Generated, Provenance::TextOnly, Provenance::Generated]
    );
    assert_eq!(journal.current().map(|r| r.content_lines[0].as_str()), Some("하나"));

    let daily = nanobanana_cli::archive::daily(journal.history());
    assert_eq!(daily.len(), 3);
    let weekly = nanobanana_cli::archive::weekly(journal.history());
    assert_eq!(weekly.len(), 1);
    assert_eq!(weekly[0].count, 3);
    assert_eq!(weekly[0].images.len(), 2);
}

// =============================================================================
// CLI: write
// =============================================================================

#[test]
fn test_cli_write_text_only_json() {
    let dir = tempdir().unwrap();
    let output = nanobanana(&dir)
        .args(["write", "그냥 적어두는 말", "--text-only", "--source", "일기", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = parse_json(&output.stdout);
    assert_eq!(json["title"], "일기");
    assert_eq!(json["contentLines"][0], "그냥 적어두는 말");
    assert_eq!(json["image"], "");
    assert_eq!(json["author"], "나");
    assert_eq!(json["provenance"], "text_only");
    assert!(json.get("music").is_none());
}

#[test]
fn test_cli_write_offline_without_api_key() {
    let dir = tempdir().unwrap();
    write_config(&dir, "fallback_delay_ms: 0\n");

    let output = nanobanana(&dir)
        .args(["write", "오늘은 평온했다", "--music", "Clair de Lune", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = parse_json(&output.stdout);
    assert_eq!(json["provenance"], "offline");
    assert_eq!(json["source"], "나의 마음 한 조각");
    assert_eq!(json["music"], "Clair de Lune");
    assert!(json["title"].as_str().unwrap().ends_with(": 오늘은 평..."));
    assert_eq!(json["contentLines"][0], "오늘은 평온했다");
    assert_eq!(json["contentLines"][1], "깊은 성찰 끝에");
    assert_eq!(json["contentLines"][2], "피어난 작은 평온");
}

#[test]
fn test_cli_write_rejects_blank_note() {
    let dir = tempdir().unwrap();
    nanobanana(&dir)
        .args(["write", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs some text"));
}

#[test]
fn test_cli_write_markdown() {
    let dir = tempdir().unwrap();
    nanobanana(&dir)
        .args(["write", "바람이 불었다", "--text-only", "-f", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("## 오늘의 기록"))
        .stdout(predicate::str::contains("> 바람이 불었다"));
}

// =============================================================================
// CLI: journal
// =============================================================================

#[test]
fn test_cli_journal_session() {
    let dir = tempdir().unwrap();
    write_config(&dir, "fallback_delay_ms: 0\n");

    nanobanana(&dir)
        .args(["journal", "--author", "민지"])
        .write_stdin(":text 첫 기록\n:verse 주의 말씀은 (시편 119:105)\n두 번째 기록\n:archive weekly\n:q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("첫 기록"))
        .stdout(predicate::str::contains("두 번째 기록"))
        .stdout(predicate::str::contains("WEEKLY REPORT"))
        .stdout(predicate::str::contains("2 reflections"))
        .stderr(predicate::str::contains("Verse attached"));
}

#[test]
fn test_cli_journal_unknown_command() {
    let dir = tempdir().unwrap();
    nanobanana(&dir)
        .arg("journal")
        .write_stdin(":dance\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown command"));
}

// =============================================================================
// CLI: config
// =============================================================================

#[test]
fn test_cli_config_set_and_get() {
    let dir = tempdir().unwrap();

    nanobanana(&dir)
        .args(["config", "set", "text_model", "my-text-model"])
        .assert()
        .success();
    nanobanana(&dir)
        .args(["config", "get", "text_model"])
        .assert()
        .success()
        .stdout(predicate::str::contains("my-text-model"));

    let saved = fs::read_to_string(dir.path().join("config.yaml")).unwrap();
    assert!(saved.contains("my-text-model"));
}

#[test]
fn test_cli_config_masks_api_key() {
    let dir = tempdir().unwrap();
    nanobanana(&dir)
        .args(["config", "set", "api_key", "secret-abcd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("secret").not());

    nanobanana(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("*******abcd"))
        .stdout(predicate::str::contains("generative service enabled"));
}

#[test]
fn test_cli_config_unknown_key() {
    let dir = tempdir().unwrap();
    nanobanana(&dir)
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_cli_config_path() {
    let dir = tempdir().unwrap();
    let expected = dir.path().join("config.yaml");
    nanobanana(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

// =============================================================================
// CLI: completions
// =============================================================================

#[test]
fn test_cli_completions_bash() {
    let dir = tempdir().unwrap();
    nanobanana(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nanobanana"))
        .stdout(predicate::str::contains("journal"))
        .stdout(predicate::str::contains("--text-only"));
}
