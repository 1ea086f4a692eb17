//! Shell - Command-line interpreter over the virtual filesystem
//!
//! - Command parsing with quotes and `$NAME` expansion
//! - Built-in commands (ls, cd, du, chmod, cp, vfs-load, ...)
//! - Start scripts replayed like typed input
//!
//! The executor owns its VFS; there is no process-wide instance.

pub mod builtins;
pub mod clock;
pub mod executor;
pub mod parser;
pub mod script;

pub use builtins::{BuiltinResult, CommandError, ShellState};
pub use clock::{Clock, FixedClock, ProcessClock};
pub use executor::{ExecResult, Executor, ProgramRegistry, ScriptStep};
pub use parser::{parse, ParseError, SimpleCommand};

/// Prompt shown before each command
pub const PROMPT: &str = "[vfs] $ ";
