//! Output formatting utilities for CLI commands.
//!
//! Provides a unified `OutputFormat` enum and the renderers that turn
//! reflections and archive groupings into terminal text or Markdown.

use clap::ValueEnum;
use colored::Colorize;

use nanobanana_cli::archive::{DailyEntry, Verse, WeeklyBucket, YearlySummary};
use nanobanana_cli::reflection::Reflection;

/// Output format options for CLI commands.
///
/// - `Text` for human-readable terminal output (default)
/// - `Json` for machine-readable output and scripting
/// - `Markdown` for pasting into notes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default).
    #[default]
    Text,
    /// Machine-readable JSON output.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

/// Longest image reference printed in full; data URIs are abbreviated.
const MAX_IMAGE_DISPLAY: usize = 80;

/// Renders a reflection in the requested format.
pub fn render_reflection(reflection: &Reflection, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Text => render_text(reflection),
        OutputFormat::Json => serde_json::to_string_pretty(reflection)?,
        OutputFormat::Markdown => render_markdown(reflection),
    })
}

fn render_text(r: &Reflection) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} {}  {}\n",
        r.month.dimmed(),
        r.day_num.bold(),
        r.day_name.dimmed(),
        r.date.dimmed()
    ));
    out.push('\n');
    out.push_str(&format!("{}\n", r.title.bold()));
    for line in &r.content_lines {
        out.push_str(&format!("  {}\n", line.italic()));
    }

    if let Some(verse) = r.bible_verse.as_deref().filter(|_| !r.image.is_empty()) {
        let verse = Verse::parse(verse);
        out.push('\n');
        out.push_str(&format!("  \"{}\"\n", verse.text.replace('\n', " ")));
        if let Some(reference) = verse.reference {
            out.push_str(&format!("  {}\n", reference.dimmed()));
        }
    }

    out.push('\n');
    if let Some(music) = &r.music {
        out.push_str(&format!("  {} {}\n", "♪".dimmed(), music));
    }
    out.push_str(&format!("  — {} · {}\n", r.author, r.source.dimmed()));
    out.push_str(&format!("  {}\n", r.tags.join(" ").cyan()));
    if !r.image.is_empty() {
        out.push_str(&format!("  {} {}\n", "image:".dimmed(), display_image(&r.image)));
    }
    out.push_str(&format!("  {} {}\n", "via".dimmed(), r.provenance.to_string().dimmed()));
    out
}

fn render_markdown(r: &Reflection) -> String {
    let mut out = format!("## {}\n\n", r.title);
    out.push_str(&format!("*{} · {} {}*\n\n", r.date, r.month, r.day_name));
    if !r.image.is_empty() && !r.image.starts_with("data:") {
        out.push_str(&format!("![{}]({})\n\n", r.title, r.image));
    }
    for line in &r.content_lines {
        out.push_str(&format!("> {line}\n"));
    }
    out.push('\n');
    if let Some(verse) = &r.bible_verse {
        let verse = Verse::parse(verse);
        out.push_str(&format!("**{}**", verse.text.replace('\n', " ")));
        if let Some(reference) = verse.reference {
            out.push_str(&format!(" ({reference})"));
        }
        out.push_str("\n\n");
    }
    if let Some(music) = &r.music {
        out.push_str(&format!("Music: {music}\n\n"));
    }
    out.push_str(&format!("— {}, {}\n\n", r.author, r.source));
    out.push_str(&r.tags.join(" "));
    out.push('\n');
    out
}

/// Shortens data URIs for terminal display.
fn display_image(image: &str) -> String {
    if image.len() <= MAX_IMAGE_DISPLAY || !image.is_char_boundary(MAX_IMAGE_DISPLAY) {
        return image.to_string();
    }
    format!("{}... ({} bytes)", &image[..MAX_IMAGE_DISPLAY], image.len())
}

/// Renders the daily timeline.
pub fn render_daily(entries: &[DailyEntry<'_>]) -> String {
    if entries.is_empty() {
        return format!("{}\n", "첫 기록을 남겨보세요".dimmed());
    }
    let mut out = String::new();
    for entry in entries {
        let r = entry.reflection;
        out.push_str(&format!("{}  {}\n", r.date.dimmed(), r.title.bold()));
        for line in &r.content_lines {
            out.push_str(&format!("    {}\n", line.italic()));
        }
        if let Some(verse) = entry.verse {
            out.push_str(&format!(
                "    \"{}\" {}\n",
                verse.text.replace('\n', " "),
                verse.reference.unwrap_or_default().dimmed()
            ));
        }
        if let Some(music) = &r.music {
            out.push_str(&format!("    ♪ {music}\n"));
        }
        out.push_str(&format!("    — {}\n", r.author.dimmed()));
    }
    out
}

/// Renders weekly buckets.
pub fn render_weekly(buckets: &[WeeklyBucket]) -> String {
    if buckets.is_empty() {
        return format!("{}\n", "No reflections yet".dimmed());
    }
    let mut out = String::new();
    for bucket in buckets {
        out.push_str(&format!(
            "{} {}  {}\n",
            format!("{}-W{:02}", bucket.year, bucket.week).bold(),
            "WEEKLY REPORT".dimmed(),
            format!("{} reflections", bucket.count).cyan()
        ));
        for image in &bucket.images {
            out.push_str(&format!("    {}\n", display_image(image)));
        }
    }
    out
}

/// Renders the yearly summary.
pub fn render_yearly(summary: &YearlySummary) -> String {
    let mut out = format!("{}  {}\n", summary.year.to_string().bold(), "ANNUAL GARDEN".dimmed());
    out.push_str(&format!(
        "  {} total · {} active months\n\n",
        summary.total, summary.active_months
    ));
    for month in &summary.months {
        let marker = if month.hero_image.is_some() {
            "●".green()
        } else if month.count > 0 {
            "○".normal()
        } else {
            "·".dimmed()
        };
        out.push_str(&format!("  {} {} {}\n", marker, month.short_name, month.count));
    }
    out
}
