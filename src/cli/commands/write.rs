//! Write command - turn one note into a reflection.
//!
//! Generates a titled, illustrated reflection from the note (or stores it
//! as-is with --text-only) and prints it. Without an API key the reflection
//! is generated offline.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::format::render_reflection;
use crate::cli::OutputFormat;
use nanobanana_cli::config::Config;
use nanobanana_cli::reflection::provider::decode_data_uri;
use nanobanana_cli::reflection::{
    resolve_config, Reflection, ReflectionGenerator, ReflectionInput,
};

/// Arguments for the write command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    nanobanana write \"오늘은 평온했다\"                  Generate a reflection\n    \
    nanobanana write \"...\" --verse \"말씀 (시편 23:1)\"   Attach a verse\n    \
    nanobanana write \"...\" --text-only                Store the note as-is\n    \
    nanobanana write \"...\" -f json                    Output as JSON")]
pub struct Args {
    /// The note to reflect on
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Where the note came from (book, calendar, sermon...)
    #[arg(long)]
    pub source: Option<String>,

    /// Who wrote the quoted material
    #[arg(long)]
    pub author: Option<String>,

    /// Music listened to while writing
    #[arg(long)]
    pub music: Option<String>,

    /// Verse to attach, as "<text> (<reference>)"
    #[arg(long)]
    pub verse: Option<String>,

    /// Store the note without generating a title or image
    #[arg(long)]
    #[arg(long_help = "Skip generation entirely. The note becomes the body,\n\
        the source label (if any) becomes the title, and no image is\n\
        attached. No network request is made.")]
    pub text_only: bool,

    /// Output format: text (default), json, or markdown
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the generated image to this file
    #[arg(long, value_name = "PATH")]
    #[arg(long_help = "Save the generated image bytes to PATH. Only images\n\
        returned inline by the generative service can be saved; placeholder\n\
        URLs are reported and skipped.")]
    pub save_image: Option<PathBuf>,
}

/// Executes the write command.
pub fn run(args: Args) -> Result<()> {
    let input = ReflectionInput::new(args.text)?
        .with_source(args.source)
        .with_author(args.author)
        .with_music(args.music)
        .with_bible_verse(args.verse)
        .text_only(args.text_only);

    let config = Config::load()?;
    let generator = ReflectionGenerator::from_config(&resolve_config(&config));

    let reflection = if input.skip_image {
        generator.text_only(&input)
    } else {
        if args.format == OutputFormat::Text {
            eprintln!("{}", "Generating your reflection...".dimmed());
        }
        let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
        rt.block_on(generator.generate(&input))
    };

    println!("{}", render_reflection(&reflection, args.format)?);

    if let Some(path) = args.save_image {
        save_image(&reflection, &path)?;
    }

    Ok(())
}

/// Writes an inline image to disk.
fn save_image(reflection: &Reflection, path: &Path) -> Result<()> {
    match decode_data_uri(&reflection.image) {
        Some((mime, bytes)) => {
            fs::write(path, &bytes)
                .with_context(|| format!("Failed to write image to {}", path.display()))?;
            eprintln!(
                "{} {} ({mime}, {} bytes)",
                "Saved image to".green(),
                path.display(),
                bytes.len()
            );
        }
        None if reflection.image.is_empty() => {
            eprintln!("{}", "No image to save for a text-only reflection.".yellow());
        }
        None => {
            eprintln!(
                "{} {}",
                "Image is not inline; nothing saved. It is available at".yellow(),
                reflection.image
            );
        }
    }
    Ok(())
}
