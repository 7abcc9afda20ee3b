use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "nanobanana")]
#[command(version)]
#[command(about = "Turn short journal notes into illustrated reflections")]
#[command(long_about = "Nanobanana turns a short note into a dated reflection with a title,\n\
    a few poetic lines and an illustration.\n\n\
    With an API key it uses a Gemini-compatible generative service. Without\n\
    one, or when the service fails, it produces an offline reflection\n\
    instead, so every note still gets an entry.")]
#[command(after_help = "EXAMPLES:\n    \
    nanobanana write \"오늘은 평온했다\"       Generate a reflection\n    \
    nanobanana write \"...\" --text-only     Store a note without generation\n    \
    nanobanana journal                      Start an interactive session\n    \
    nanobanana config set api_key <KEY>     Configure the generative service\n\n\
    For more information about a command, run 'nanobanana <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Turn one note into a reflection
    #[command(long_about = "Generates a titled, illustrated reflection from a note and prints it.\n\
        \n\
        Supports multiple output formats:\n\
        - text: colored terminal output (default)\n\
        - json: machine-readable structured output\n\
        - markdown: formatted for notes")]
    Write(commands::write::Args),

    /// Start an interactive journal session
    #[command(long_about = "Reads notes from standard input, one per line, and keeps the\n\
        session's reflections in memory. The archive can be browsed by day,\n\
        by ISO week, or by month of the current year.")]
    Journal(commands::journal::Args),

    /// View and manage configuration settings
    #[command(long_about = "Provides subcommands to show, get, and set configuration values.\n\
        Configuration is stored in ~/.nanobanana/config.yaml, or in the file\n\
        named by NANOBANANA_CONFIG.")]
    Config(commands::config::Args),

    /// Generate shell completion scripts
    Completions(commands::completions::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "nanobanana=debug,nanobanana_cli=debug"
    } else {
        "nanobanana=info,nanobanana_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Write(args) => commands::write::run(args),
        Commands::Journal(args) => commands::journal::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Completions(args) => {
            commands::completions::generate_completions(&mut Cli::command(), args.shell);
            Ok(())
        }
    }
}
