//! vfs-shell - interactive entry point
//!
//! Usage:
//!   vfs-shell --vfs-path fs.csv                  # load and start the REPL
//!   vfs-shell --vfs-path fs.csv --start-script s # replay s first
//!
//! Logging goes to stderr and honors RUST_LOG (default: warn).

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vfs_shell::config::{Args, ShellConfig};
use vfs_shell::shell::builtins::describe_load;
use vfs_shell::shell::{ExecResult, Executor, PROMPT};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = ShellConfig::from(Args::parse());

    match run(config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: ShellConfig) -> Result<ExitCode> {
    println!("=== Emulator Started ===");
    println!("VFS path: {}", describe_path(config.vfs_path.as_deref()));
    println!("Start script: {}", describe_path(config.start_script.as_deref()));
    println!("User: {}", config.user);
    println!("Type 'help' for available commands.\n");

    let mut shell = Executor::new(config.user.clone());

    if let Some(path) = &config.vfs_path {
        match shell.vfs_mut().load(path) {
            Ok(report) => println!("{}", describe_load(report)),
            // The shell still starts; `vfs-load` can retry
            Err(e) => println!("Error: {}", e),
        }
    }

    if let Some(path) = &config.start_script {
        let steps = shell
            .run_script(path)
            .with_context(|| format!("Script file '{}' not found or unreadable", path.display()));
        match steps {
            Ok(steps) => {
                for step in steps {
                    println!("{}{}", PROMPT, step.line);
                    if let Some(code) = print_result(&step.result) {
                        return Ok(exit_code(code));
                    }
                }
            }
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }

    repl(&mut shell)
}

/// Read-eval-print until `exit` or end of input
fn repl(shell: &mut Executor) -> Result<ExitCode> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", PROMPT);
        stdout.flush().context("flushing prompt")?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("reading input")? == 0 {
            // EOF
            println!();
            return Ok(ExitCode::SUCCESS);
        }

        let result = shell.execute_line(line.trim());
        if let Some(code) = print_result(&result) {
            return Ok(exit_code(code));
        }
    }
}

/// Print a command's result; returns the exit code if the shell should stop
fn print_result(result: &ExecResult) -> Option<i32> {
    if result.should_exit {
        println!("Goodbye!");
        return Some(result.code);
    }
    let text = result.render();
    if !text.is_empty() {
        println!("{}", text);
    }
    None
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn describe_path(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "(none)".to_string(),
    }
}
