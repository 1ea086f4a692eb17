//! Built-in shell commands
//!
//! Each command takes its already-tokenized arguments and the shell state,
//! calls into the VFS, and returns text to display. Failures are typed;
//! the executor renders them.

use super::clock::{format_uptime, Clock};
use crate::vfs::{format_size, LoadReport, VfsError, VirtualFileSystem};
use thiserror::Error;

/// Result of executing a built-in command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinResult {
    /// Command succeeded, output to display
    Success(String),
    /// Command succeeded, no output
    Ok,
    /// Request to exit the shell with given code
    Exit(i32),
}

/// Why a command failed
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Vfs(#[from] VfsError),
    #[error("{command}: usage: {usage}")]
    Usage {
        command: &'static str,
        usage: &'static str,
    },
    #[error("{0}: command not found")]
    UnknownCommand(String),
}

impl CommandError {
    /// Exit status reported for this failure
    pub fn code(&self) -> i32 {
        match self {
            Self::Vfs(_) => 1,
            Self::Usage { .. } => 2,
            Self::UnknownCommand(_) => 127,
        }
    }
}

pub type CommandResult = Result<BuiltinResult, CommandError>;

/// A command the shell can run
pub type CommandFn = fn(&[String], &mut ShellState) -> CommandResult;

/// Shell state accessible to built-in commands
pub struct ShellState {
    /// The filesystem every command works on
    pub vfs: VirtualFileSystem,
    /// Source for `uptime`
    pub clock: Box<dyn Clock>,
}

impl ShellState {
    pub fn new(vfs: VirtualFileSystem, clock: Box<dyn Clock>) -> Self {
        Self { vfs, clock }
    }
}

fn usage(command: &'static str, usage: &'static str) -> CommandError {
    CommandError::Usage { command, usage }
}

/// ls - list directory contents
pub fn cmd_ls(args: &[String], state: &mut ShellState) -> CommandResult {
    if args.len() > 1 {
        return Err(usage("ls", "ls [path]"));
    }
    let names = state.vfs.list_directory(args.first().map(String::as_str))?;
    if names.is_empty() {
        return Ok(BuiltinResult::Success("Directory is empty".into()));
    }
    Ok(BuiltinResult::Success(names.join("  ")))
}

/// cd - change directory
pub fn cmd_cd(args: &[String], state: &mut ShellState) -> CommandResult {
    if args.len() > 1 {
        return Err(usage("cd", "cd [path|..|~]"));
    }
    state.vfs.change_directory(args.first().map(String::as_str))?;
    Ok(BuiltinResult::Ok)
}

/// pwd - print working directory
pub fn cmd_pwd(_args: &[String], state: &mut ShellState) -> CommandResult {
    Ok(BuiltinResult::Success(state.vfs.cwd().to_string()))
}

/// whoami - print the configured user
pub fn cmd_whoami(_args: &[String], state: &mut ShellState) -> CommandResult {
    Ok(BuiltinResult::Success(state.vfs.current_user().to_string()))
}

/// uptime - time since the shell started
pub fn cmd_uptime(_args: &[String], state: &mut ShellState) -> CommandResult {
    Ok(BuiltinResult::Success(format_uptime(state.clock.elapsed())))
}

/// du - disk usage of a file or directory tree
pub fn cmd_du(args: &[String], state: &mut ShellState) -> CommandResult {
    if args.len() > 1 {
        return Err(usage("du", "du [path]"));
    }
    let target = match args.first() {
        Some(raw) => state.vfs.resolve(raw),
        None => state.vfs.cwd().to_string(),
    };
    let size = state.vfs.calculate_size(&target)?;
    Ok(BuiltinResult::Success(format!("{}\t{}", format_size(size), target)))
}

/// echo - print arguments
pub fn cmd_echo(args: &[String], _state: &mut ShellState) -> CommandResult {
    Ok(BuiltinResult::Success(args.join(" ")))
}

/// chmod - replace a node's permission string
pub fn cmd_chmod(args: &[String], state: &mut ShellState) -> CommandResult {
    let [permissions, path] = args else {
        return Err(usage("chmod", "chmod <permissions> <path>"));
    };
    state.vfs.change_permissions(path, permissions)?;
    Ok(BuiltinResult::Ok)
}

/// cp - copy a file or directory tree
pub fn cmd_cp(args: &[String], state: &mut ShellState) -> CommandResult {
    let [source, dest] = args else {
        return Err(usage("cp", "cp <source> <dest>"));
    };
    state.vfs.copy(source, dest)?;
    Ok(BuiltinResult::Ok)
}

/// vfs-load - replace the filesystem with a CSV file from the host
pub fn cmd_vfs_load(args: &[String], state: &mut ShellState) -> CommandResult {
    let [source] = args else {
        return Err(usage("vfs-load", "vfs-load <csv-path>"));
    };
    let report = state.vfs.load(source)?;
    Ok(BuiltinResult::Success(describe_load(report)))
}

/// Summary of a finished load, one line per warning or orphan
pub fn describe_load(report: &LoadReport) -> String {
    let mut lines = vec![format!(
        "VFS loaded from {}: {} nodes",
        report.source, report.nodes
    )];
    lines.extend(report.warnings.iter().map(|w| format!("Warning: {}", w)));
    lines.extend(
        report
            .orphans
            .iter()
            .map(|p| format!("Warning: {} is unreachable (parent missing or not a directory)", p)),
    );
    lines.join("\n")
}

/// cat - print a file's content
pub fn cmd_cat(args: &[String], state: &mut ShellState) -> CommandResult {
    let [path] = args else {
        return Err(usage("cat", "cat <file>"));
    };
    Ok(BuiltinResult::Success(state.vfs.read_file(path)?.to_string()))
}

/// tree - show a directory tree
pub fn cmd_tree(args: &[String], state: &mut ShellState) -> CommandResult {
    if args.len() > 1 {
        return Err(usage("tree", "tree [path]"));
    }
    Ok(BuiltinResult::Success(
        state.vfs.tree(args.first().map(String::as_str))?,
    ))
}

/// vfs-info - load state and diagnostics
pub fn cmd_vfs_info(_args: &[String], state: &mut ShellState) -> CommandResult {
    let vfs = &state.vfs;
    if !vfs.is_loaded() {
        return Ok(BuiltinResult::Success("VFS: not loaded".into()));
    }

    let mut lines = Vec::new();
    if let Some(report) = vfs.last_report() {
        lines.push(format!("source: {}", report.source));
    }
    lines.push(format!("nodes: {}", vfs.node_count()));
    lines.push(format!("cwd: {}", vfs.cwd()));
    let orphans = vfs.orphans();
    if orphans.is_empty() {
        lines.push("orphans: none".into());
    } else {
        lines.push(format!("orphans: {}", orphans.len()));
        lines.extend(orphans.iter().map(|p| format!("  {}", p)));
    }
    Ok(BuiltinResult::Success(lines.join("\n")))
}

/// exit - exit the shell
pub fn cmd_exit(args: &[String], _state: &mut ShellState) -> CommandResult {
    match args {
        [] => Ok(BuiltinResult::Exit(0)),
        [code] => code
            .parse::<i32>()
            .map(BuiltinResult::Exit)
            .map_err(|_| usage("exit", "exit [code]")),
        _ => Err(usage("exit", "exit [code]")),
    }
}

/// help - show available commands
pub fn cmd_help(_args: &[String], _state: &mut ShellState) -> CommandResult {
    Ok(BuiltinResult::Success(
        "Navigation:
  ls [path]                List directory contents
  cd [path|..|~]           Change directory
  pwd                      Print working directory
  tree [path]              Show directory tree

Files:
  cat <file>               Print file contents
  du [path]                Show disk usage
  chmod <perms> <path>     Set permissions (755 or rwxr-xr-x)
  cp <source> <dest>       Copy file or directory

Filesystem:
  vfs-load <csv>           Replace the VFS with a CSV file
  vfs-info                 Show load diagnostics

Other:
  echo [args]              Print arguments
  whoami                   Print current user
  uptime                   Show time since start
  help                     Show this help
  exit [code]              Exit the shell"
            .to_string(),
    ))
}
