//! Shell command executor
//!
//! Turns a line of input into an `ExecResult` by:
//! 1. Parsing it, with `$NAME` expansion from the environment
//! 2. Looking the program up in the registry
//! 3. Running it against the shell state and rendering any error

use super::builtins::{self, BuiltinResult, CommandError, CommandFn, ShellState};
use super::clock::{Clock, ProcessClock};
use super::parser::{self, SimpleCommand};
use super::script;
use crate::vfs::VirtualFileSystem;
use std::collections::HashMap;
use std::env;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Result of executing one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Exit code (0 = success)
    pub code: i32,
    /// Normal output
    pub output: String,
    /// Rendered error, empty on success
    pub error: String,
    /// Should the shell exit?
    pub should_exit: bool,
}

impl ExecResult {
    pub fn success() -> Self {
        Self {
            code: 0,
            output: String::new(),
            error: String::new(),
            should_exit: false,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self.code = 1;
        self
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    pub fn exit(code: i32) -> Self {
        Self {
            code,
            should_exit: true,
            ..Self::success()
        }
    }

    /// Output and error joined the way the REPL prints them
    pub fn render(&self) -> String {
        match (self.output.is_empty(), self.error.is_empty()) {
            (_, true) => self.output.clone(),
            (true, false) => self.error.clone(),
            (false, false) => format!("{}\n{}", self.output, self.error),
        }
    }
}

/// Registry of available commands
pub struct ProgramRegistry {
    programs: HashMap<String, CommandFn>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            programs: HashMap::new(),
        };

        reg.register("ls", builtins::cmd_ls);
        reg.register("cd", builtins::cmd_cd);
        reg.register("pwd", builtins::cmd_pwd);
        reg.register("whoami", builtins::cmd_whoami);
        reg.register("uptime", builtins::cmd_uptime);
        reg.register("du", builtins::cmd_du);
        reg.register("echo", builtins::cmd_echo);
        reg.register("chmod", builtins::cmd_chmod);
        reg.register("cp", builtins::cmd_cp);
        reg.register("vfs-load", builtins::cmd_vfs_load);
        reg.register("cat", builtins::cmd_cat);
        reg.register("tree", builtins::cmd_tree);
        reg.register("vfs-info", builtins::cmd_vfs_info);
        reg.register("help", builtins::cmd_help);
        reg.register("exit", builtins::cmd_exit);

        reg
    }

    pub fn register(&mut self, name: &str, func: CommandFn) {
        self.programs.insert(name.to_string(), func);
    }

    pub fn get(&self, name: &str) -> Option<CommandFn> {
        self.programs.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }
}

impl Default for ProgramRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment lookup used for `$NAME` expansion
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

/// One replayed script line and what it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    pub line: String,
    pub result: ExecResult,
}

/// The shell executor
pub struct Executor {
    pub state: ShellState,
    pub registry: ProgramRegistry,
    env: EnvLookup,
}

impl Executor {
    /// An executor over an unloaded VFS, reading the process environment
    pub fn new(user: impl Into<String>) -> Self {
        Self::with_parts(VirtualFileSystem::new(user), Box::new(ProcessClock::start()))
    }

    pub fn with_parts(vfs: VirtualFileSystem, clock: Box<dyn Clock>) -> Self {
        Self {
            state: ShellState::new(vfs, clock),
            registry: ProgramRegistry::new(),
            env: Box::new(|name| env::var(name).ok()),
        }
    }

    /// Replace the environment used for variable expansion
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    pub fn vfs(&self) -> &VirtualFileSystem {
        &self.state.vfs
    }

    pub fn vfs_mut(&mut self) -> &mut VirtualFileSystem {
        &mut self.state.vfs
    }

    /// Execute a line of input
    pub fn execute_line(&mut self, line: &str) -> ExecResult {
        let cmd = match parser::parse(line, &*self.env) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return ExecResult::success(),
            Err(e) => return ExecResult::success().with_error(format!("Error: {}", e)).with_code(2),
        };
        self.execute(&cmd)
    }

    /// Execute an already parsed command
    pub fn execute(&mut self, cmd: &SimpleCommand) -> ExecResult {
        debug!(program = %cmd.program, args = ?cmd.args, "execute");

        let result = match self.registry.get(&cmd.program) {
            Some(func) => func(&cmd.args, &mut self.state),
            None => Err(CommandError::UnknownCommand(cmd.program.clone())),
        };

        match result {
            Ok(BuiltinResult::Success(output)) => ExecResult::success().with_output(output),
            Ok(BuiltinResult::Ok) => ExecResult::success(),
            Ok(BuiltinResult::Exit(code)) => ExecResult::exit(code),
            Err(e) => {
                debug!(program = %cmd.program, error = %e, "command failed");
                ExecResult::success()
                    .with_error(format!("Error: {}", e))
                    .with_code(e.code())
            }
        }
    }

    /// Replay a script file line by line, stopping after `exit`
    pub fn run_script(&mut self, path: &Path) -> io::Result<Vec<ScriptStep>> {
        let lines = script::read_script(path)?;
        info!(script = %path.display(), lines = lines.len(), "running start script");
        Ok(self.run_lines(lines))
    }

    /// Replay already prepared command lines, stopping after `exit`
    pub fn run_lines(&mut self, lines: impl IntoIterator<Item = String>) -> Vec<ScriptStep> {
        let mut steps = Vec::new();
        for line in lines {
            let result = self.execute_line(&line);
            let stop = result.should_exit;
            steps.push(ScriptStep { line, result });
            if stop {
                break;
            }
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::clock::FixedClock;
    use std::time::Duration;

    const FIXTURE: &str = "\
type,path,name,content,encoding,permissions
directory,/,root,,text,rwxr-xr-x
directory,/home,home,,text,rwxr-xr-x
directory,/home/user,user,,text,rwxr-xr-x
file,/home/user/a.txt,a.txt,hi,text,rw-r--r--
";

    fn make_executor() -> Executor {
        let mut vfs = VirtualFileSystem::new("user");
        vfs.load_reader(FIXTURE.as_bytes(), "fixture").unwrap();
        Executor::with_parts(vfs, Box::new(FixedClock(Duration::from_secs(61))))
            .with_env(|name| (name == "HOME").then(|| "/home/user".to_string()))
    }

    // ============ ExecResult ============

    #[test]
    fn test_render() {
        assert_eq!(ExecResult::success().render(), "");
        assert_eq!(ExecResult::success().with_output("a").render(), "a");
        assert_eq!(ExecResult::success().with_error("e").render(), "e");
        assert_eq!(
            ExecResult::success().with_output("a").with_error("e").render(),
            "a\ne"
        );
    }

    #[test]
    fn test_registry_contains_commands() {
        let reg = ProgramRegistry::new();
        assert!(reg.contains("vfs-load"));
        assert!(!reg.contains("rm"));
        assert!(reg.get("cd").is_some());
    }

    // ============ Execution ============

    #[test]
    fn test_blank_line() {
        let mut exec = make_executor();
        assert_eq!(exec.execute_line("   "), ExecResult::success());
    }

    #[test]
    fn test_pwd() {
        let mut exec = make_executor();
        let result = exec.execute_line("pwd");
        assert_eq!(result.code, 0);
        assert_eq!(result.output, "/");
    }

    #[test]
    fn test_cd_via_variable() {
        let mut exec = make_executor();
        let result = exec.execute_line("cd $HOME");
        assert_eq!(result.code, 0);
        assert_eq!(result.output, "");
        assert_eq!(exec.vfs().cwd(), "/home/user");
    }

    #[test]
    fn test_unknown_command() {
        let mut exec = make_executor();
        let result = exec.execute_line("frobnicate now");
        assert_eq!(result.code, 127);
        assert_eq!(result.error, "Error: frobnicate: command not found");
    }

    #[test]
    fn test_vfs_error_rendered() {
        let mut exec = make_executor();
        let result = exec.execute_line("cd /nope");
        assert_eq!(result.code, 1);
        assert_eq!(result.error, "Error: '/nope' not found");
        assert_eq!(exec.vfs().cwd(), "/");
    }

    #[test]
    fn test_usage_error_code() {
        let mut exec = make_executor();
        let result = exec.execute_line("cp onlyone");
        assert_eq!(result.code, 2);
        assert!(result.error.starts_with("Error: cp: usage:"));
    }

    #[test]
    fn test_parse_error() {
        let mut exec = make_executor();
        let result = exec.execute_line("echo \"open");
        assert_eq!(result.code, 2);
        assert_eq!(result.error, "Error: unterminated \" quote");
    }

    #[test]
    fn test_exit() {
        let mut exec = make_executor();
        let result = exec.execute_line("exit 4");
        assert!(result.should_exit);
        assert_eq!(result.code, 4);
    }

    #[test]
    fn test_uptime_uses_clock() {
        let mut exec = make_executor();
        assert_eq!(
            exec.execute_line("uptime").output,
            "0 hours, 1 minutes, 1 seconds"
        );
    }

    // ============ Scripts ============

    #[test]
    fn test_run_lines_stops_at_exit() {
        let mut exec = make_executor();
        let lines = ["cd /home", "pwd", "exit", "cd /home/user"]
            .map(String::from);
        let steps = exec.run_lines(lines);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1].result.output, "/home");
        assert!(steps[2].result.should_exit);
        assert_eq!(exec.vfs().cwd(), "/home");
    }

    #[test]
    fn test_run_lines_continues_after_error() {
        let mut exec = make_executor();
        let steps = exec.run_lines(["cd /nope", "pwd"].map(String::from));
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].result.code, 1);
        assert_eq!(steps[1].result.output, "/");
    }

    #[test]
    fn test_run_missing_script() {
        let mut exec = make_executor();
        assert!(exec.run_script(Path::new("/no/such/script")).is_err());
    }
}
