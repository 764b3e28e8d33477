use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pairchat", about = "One-to-one chat client with a line-driven shell")]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Start the interactive chat shell
    Run,
    /// Create an account and sign in
    Signup,
    /// Sign in to an existing account
    Login,
    /// Sign out of the current account
    Logout,
    /// List other users, optionally filtered by name or nickname
    Users { query: Option<String> },
    /// List saved messages, newest first
    Saved,
    /// Change your display name, nickname or avatar color
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        nickname: Option<String>,
        /// Avatar color as #rrggbb
        #[arg(long)]
        color: Option<String>,
    },
}

impl Cli {
    pub fn command_or_default(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}
