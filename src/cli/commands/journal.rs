//! Journal command - an interactive reflection session.
//!
//! Reads notes from standard input, one per line, and keeps every
//! reflection in memory for the length of the session. Lines starting with
//! `:` are commands.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use colored::Colorize;

use crate::cli::format::{render_daily, render_reflection, render_weekly, render_yearly};
use crate::cli::OutputFormat;
use nanobanana_cli::archive;
use nanobanana_cli::config::Config;
use nanobanana_cli::journal::{Journal, View};
use nanobanana_cli::reflection::{resolve_config, ReflectionGenerator, ReflectionInput};

/// Arguments for the journal command.
#[derive(clap::Args)]
#[command(after_help = "SESSION COMMANDS:\n    \
    <note>                       Generate a reflection from the note\n    \
    :text <note>                 Store the note without generation\n    \
    :verse <text (reference)>    Attach a verse to following notes\n    \
    :archive [daily|weekly|yearly]  Browse this session's reflections\n    \
    :quit                        End the session")]
pub struct Args {
    /// Author label applied to every note in the session
    #[arg(long)]
    pub author: Option<String>,

    /// Output format for each reflection
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// A parsed session line.
#[derive(Debug, PartialEq, Eq)]
enum SessionCommand<'a> {
    Note(&'a str),
    TextOnly(&'a str),
    Verse(Option<&'a str>),
    Archive(ArchiveTab),
    Quit,
    Unknown(&'a str),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveTab {
    Daily,
    Weekly,
    Yearly,
}

fn parse_line(line: &str) -> SessionCommand<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return SessionCommand::Empty;
    }
    let Some(command) = line.strip_prefix(':') else {
        return SessionCommand::Note(line);
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(n, r)| (n, r.trim()))
        .unwrap_or((command, ""));

    match name {
        "text" | "t" if !rest.is_empty() => SessionCommand::TextOnly(rest),
        "verse" | "v" => SessionCommand::Verse((!rest.is_empty()).then_some(rest)),
        "archive" | "a" => match rest {
            "" | "daily" => SessionCommand::Archive(ArchiveTab::Daily),
            "weekly" => SessionCommand::Archive(ArchiveTab::Weekly),
            "yearly" => SessionCommand::Archive(ArchiveTab::Yearly),
            _ => SessionCommand::Unknown(line),
        },
        "quit" | "q" | "exit" => SessionCommand::Quit,
        _ => SessionCommand::Unknown(line),
    }
}

/// Executes the journal command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let generator = ReflectionGenerator::from_config(&resolve_config(&config));
    if !generator.is_available() {
        eprintln!(
            "{}",
            "No API key configured; reflections will be generated offline.".yellow()
        );
    }

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let mut journal = Journal::new(generator);
    let mut verse: Option<String> = None;

    let stdin = io::stdin();
    prompt(&journal)?;

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;

        match parse_line(&line) {
            SessionCommand::Empty => {}
            SessionCommand::Quit => break,
            SessionCommand::Unknown(text) => {
                eprintln!("{} {text}", "Unknown command:".red());
            }
            SessionCommand::Verse(text) => {
                verse = text.map(String::from);
                match &verse {
                    Some(v) => eprintln!("{} {v}", "Verse attached:".green()),
                    None => eprintln!("{}", "Verse cleared".dimmed()),
                }
            }
            SessionCommand::Archive(tab) => {
                journal.set_view(View::Archive);
                let history = journal.history();
                let rendered = match tab {
                    ArchiveTab::Daily => render_daily(&archive::daily(history)),
                    ArchiveTab::Weekly => render_weekly(&archive::weekly(history)),
                    ArchiveTab::Yearly => {
                        render_yearly(&archive::yearly(history, Local::now().year()))
                    }
                };
                print!("{rendered}");
            }
            SessionCommand::Note(text) => {
                submit(&rt, &mut journal, &args, text, verse.clone(), false)?;
            }
            SessionCommand::TextOnly(text) => {
                submit(&rt, &mut journal, &args, text, verse.clone(), true)?;
            }
        }

        prompt(&journal)?;
    }

    eprintln!(
        "{}",
        format!("{} reflections this session", journal.history().len()).dimmed()
    );
    Ok(())
}

/// Records one note and prints the resulting reflection.
fn submit(
    rt: &tokio::runtime::Runtime,
    journal: &mut Journal,
    args: &Args,
    text: &str,
    verse: Option<String>,
    text_only: bool,
) -> Result<()> {
    let input = ReflectionInput::new(text)?
        .with_author(args.author.clone())
        .with_bible_verse(verse)
        .text_only(text_only);

    if !text_only && args.format == OutputFormat::Text {
        eprintln!("{}", "Generating your reflection...".dimmed());
    }

    let reflection = rt.block_on(journal.submit(input));
    println!("{}", render_reflection(reflection, args.format)?);

    if journal.view() == View::Reveal {
        journal.save();
    }
    Ok(())
}

/// Shows the session prompt with the active view.
fn prompt(journal: &Journal) -> Result<()> {
    eprint!("{} ", format!("[{}]>", journal.view()).cyan());
    io::stderr().flush().context("Failed to flush prompt")?;
    Ok(())
}
