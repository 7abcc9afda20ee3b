//! Completions command - tab completion for nanobanana.
//!
//! The script completes the `write`, `journal`, `config` and `completions`
//! subcommands, their flags, and the values of `--format`.

use clap::Command;
use clap_complete::{generate, Shell};
use std::io;

/// Arguments for the completions command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    nanobanana completions bash > ~/.local/share/bash-completion/completions/nanobanana\n    \
    nanobanana completions zsh > ~/.zfunc/_nanobanana\n    \
    nanobanana completions fish > ~/.config/fish/completions/nanobanana.fish")]
pub struct Args {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Prints the `shell` completion script for the nanobanana command tree.
pub fn generate_completions(cmd: &mut Command, shell: Shell) {
    generate(shell, cmd, "nanobanana", &mut io::stdout());
}
