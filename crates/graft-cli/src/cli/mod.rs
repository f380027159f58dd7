//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums. No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

pub mod global;
pub use global::GlobalArgs;

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "graft",
    bin_name = "graft",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Add integrations to an existing SolidStart project",
    long_about = "Graft edits the source files of a SolidStart project to wire in \
                  addons (formatter, CSS framework, i18n, auth, ...). Existing code \
                  is extended, never replaced, and running an addon twice changes \
                  nothing.",
    after_help = "EXAMPLES:\n\
        \x20 graft add tailwindcss prettier\n\
        \x20 graft add paraglide --option paraglide.availableLanguageTags=en,de --yes\n\
        \x20 graft list\n\
        \x20 graft completions bash > /usr/share/bash-completion/completions/graft",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply addons to a project.
    #[command(
        visible_alias = "a",
        about = "Add addons to a project",
        after_help = "EXAMPLES:\n\
            \x20 graft add prettier\n\
            \x20 graft add tailwindcss --option tailwindcss.plugins=typography,forms\n\
            \x20 graft add lucia --cwd apps/web --dry-run"
    )]
    Add(AddArgs),

    /// List available addons.
    #[command(
        visible_alias = "ls",
        about = "List available addons",
        after_help = "EXAMPLES:\n\
            \x20 graft list\n\
            \x20 graft list --format json"
    )]
    List(ListArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 graft completions bash > ~/.local/share/bash-completion/completions/graft\n\
            \x20 graft completions zsh  > ~/.zfunc/_graft\n\
            \x20 graft completions fish > ~/.config/fish/completions/graft.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the graft configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 graft config get output.no_color\n\
            \x20 graft config list\n\
            \x20 graft config path"
    )]
    Config(ConfigCommands),
}

// ── add ───────────────────────────────────────────────────────────────────────

/// Arguments for `graft add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Addons to apply, e.g. `prettier tailwindcss`.
    #[arg(value_name = "ADDON", required = true, num_args = 1.., help = "Addons to apply")]
    pub addons: Vec<String>,

    /// Project directory.
    #[arg(
        long = "cwd",
        value_name = "DIR",
        default_value = ".",
        help = "Project directory (default: current directory)"
    )]
    pub cwd: PathBuf,

    /// Addon option as `addon.key=value`; repeatable.
    #[arg(
        short = 'o',
        long = "option",
        value_name = "ADDON.KEY=VALUE",
        help = "Set an addon option, e.g. paraglide.availableLanguageTags=en,de"
    )]
    pub options: Vec<String>,

    /// Report what would change without writing any file.
    #[arg(long = "dry-run", help = "Show what would change without writing")]
    pub dry_run: bool,

    /// Use defaults for every option that was not given.
    #[arg(short = 'y', long = "yes", help = "Skip prompts and use default options")]
    pub yes: bool,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `graft list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output format; falls back to `output.format` from the configuration.
    #[arg(long = "format", value_enum, help = "Output format")]
    pub format: Option<ListFormat>,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// One id per line.
    List,
    /// JSON array with option schemas.
    Json,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `graft completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: clap_complete::Shell,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `graft config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `workspace.tsconfig_search`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
