//! Command-line configuration

use clap::Parser;
use std::env;
use std::path::PathBuf;

/// Fallback when neither `--user` nor `$USER` is set
pub const DEFAULT_USER: &str = "user";

/// Interactive shell over a CSV-backed virtual filesystem.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "vfs-shell", version)]
#[command(about = "Shell emulator over an in-memory filesystem loaded from CSV")]
pub struct Args {
    /// CSV file to load as the filesystem at startup
    #[arg(long, value_name = "CSV")]
    pub vfs_path: Option<PathBuf>,

    /// Script of shell commands to run before the prompt appears
    #[arg(long, value_name = "FILE")]
    pub start_script: Option<PathBuf>,

    /// User name reported by `whoami` (defaults to $USER)
    #[arg(long)]
    pub user: Option<String>,
}

/// Resolved shell configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub vfs_path: Option<PathBuf>,
    pub start_script: Option<PathBuf>,
    pub user: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            vfs_path: None,
            start_script: None,
            user: user_from_env(),
        }
    }
}

impl From<Args> for ShellConfig {
    fn from(args: Args) -> Self {
        Self {
            vfs_path: args.vfs_path,
            start_script: args.start_script,
            user: args
                .user
                .filter(|u| !u.is_empty())
                .unwrap_or_else(user_from_env),
        }
    }
}

fn user_from_env() -> String {
    env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_USER.to_string())
}
