//! # Monitor
//!
//! The interactive shell: read a line, tokenize it, dispatch the first token
//! to a registered [`Command`], repeat until a command asks to exit or the
//! console runs dry.
//!
//! ```text
//! Reading --line--> Dispatching --Continue--> Reading
//!                   Dispatching --Exit-----> done
//! Reading --end of input--> done
//! ```
//!
//! Nothing a command does is fatal to the loop. Errors are printed as their
//! message and the next line is read.

mod builtins;
mod command;
mod tokenize;

use std::io::{self, BufRead, Write};

use tracing::{debug, info, warn};

pub use builtins::{Backtrace, Help, KernInfo};
pub use command::{Command, CommandContext, CommandRegistry, CommandStatus, FnCommand, MonitorEnv};
pub use tokenize::{tokenize, Args, MAXARGS, WHITESPACE};

use crate::error::{MonitorError, MonitorResult};
use crate::types::TrapFrame;

/// Text the monitor greets and prompts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig
{
    /// Printed once on entry, followed by a newline.
    pub banner: String,
    /// Printed before every line read.
    pub prompt: String,
}

impl Default for MonitorConfig
{
    fn default() -> Self
    {
        Self {
            banner: "Welcome to the kernel monitor!\nType 'help' for a list of commands.".to_string(),
            prompt: "K> ".to_string(),
        }
    }
}

/// Line-oriented console the monitor talks to.
pub trait Console
{
    /// Show `prompt` and read one line.
    ///
    /// Returns `Ok(None)` at end of input. The line terminator is not part of
    /// the returned string. Bytes that are not UTF-8 must not fail the read.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Sink for everything the monitor and its commands print.
    fn output(&mut self) -> &mut dyn Write;
}

/// [`Console`] over any buffered reader and writer.
///
/// ```rust
/// use kmon_core::monitor::{Console, StdConsole};
///
/// let mut console = StdConsole::new("help\n".as_bytes(), Vec::new());
/// assert_eq!(console.read_line("K> ").unwrap().as_deref(), Some("help"));
/// assert_eq!(console.read_line("K> ").unwrap(), None);
/// ```
#[derive(Debug)]
pub struct StdConsole<R, W>
{
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> StdConsole<R, W>
{
    pub fn new(input: R, output: W) -> Self
    {
        Self { input, output }
    }

    /// Give back the reader and writer.
    pub fn into_inner(self) -> (R, W)
    {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> Console for StdConsole<R, W>
{
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>
    {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;

        let mut bytes = Vec::new();
        if self.input.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(None);
        }
        while let Some(b'\r' | b'\n') = bytes.last() {
            bytes.pop();
        }
        let line = match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(err) => {
                debug!("Console line is not valid UTF-8, replacing invalid bytes");
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };
        Ok(Some(line))
    }

    fn output(&mut self) -> &mut dyn Write
    {
        &mut self.output
    }
}

/// The kernel monitor: a registry, the collaborators its commands use, and
/// the REPL that drives them.
///
/// ## Example
///
/// ```rust
/// use kmon_core::monitor::{CommandRegistry, Monitor, MonitorEnv};
///
/// let registry = CommandRegistry::builtin();
/// let monitor = Monitor::new(&registry, MonitorEnv::default());
///
/// let mut out = Vec::new();
/// monitor.run_command("help", None, &mut out).unwrap();
/// assert!(String::from_utf8(out).unwrap().starts_with("help - "));
/// ```
#[derive(Debug)]
pub struct Monitor<'a>
{
    registry: &'a CommandRegistry,
    env: MonitorEnv<'a>,
    config: MonitorConfig,
}

impl<'a> Monitor<'a>
{
    pub fn new(registry: &'a CommandRegistry, env: MonitorEnv<'a>) -> Self
    {
        Self {
            registry,
            env,
            config: MonitorConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: MonitorConfig) -> Self
    {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &'a CommandRegistry
    {
        self.registry
    }

    pub fn config(&self) -> &MonitorConfig
    {
        &self.config
    }

    /// Tokenize and dispatch one line.
    ///
    /// Blank lines do nothing and return [`CommandStatus::Continue`].
    ///
    /// ## Errors
    ///
    /// - [`MonitorError::TooManyArguments`] when the line has too many tokens
    /// - [`MonitorError::UnknownCommand`] when no command has the first token's name
    /// - Whatever the command itself returns
    pub fn run_command(
        &self,
        line: &str,
        trap_frame: Option<&TrapFrame>,
        out: &mut dyn Write,
    ) -> MonitorResult<CommandStatus>
    {
        let args = tokenize(line)?;
        let Some(&name) = args.first() else {
            return Ok(CommandStatus::Continue);
        };

        let command = self
            .registry
            .find(name)
            .ok_or_else(|| MonitorError::UnknownCommand(name.to_string()))?;
        debug!(command = name, argc = args.len(), "Dispatching command");

        let mut ctx = CommandContext {
            out,
            registry: self.registry,
            env: self.env,
            trap_frame,
        };
        command.execute(&args, &mut ctx)
    }

    /// Run the REPL on `console` until a command exits or input ends.
    ///
    /// Command errors are printed and the loop keeps going.
    ///
    /// ## Errors
    ///
    /// Only I/O errors on the console itself end the loop with an error.
    pub fn run(&self, console: &mut dyn Console, trap_frame: Option<&TrapFrame>) -> MonitorResult<()>
    {
        info!(commands = self.registry.len(), "Entering monitor");
        writeln!(console.output(), "{}", self.config.banner)?;

        while let Some(line) = console.read_line(&self.config.prompt)? {
            match self.run_command(&line, trap_frame, console.output()) {
                Ok(CommandStatus::Continue) => {}
                Ok(CommandStatus::Exit) => {
                    info!("Command requested monitor exit");
                    return Ok(());
                }
                Err(MonitorError::Io(err)) => return Err(MonitorError::Io(err)),
                Err(err) => {
                    warn!(error = %err, "Command failed");
                    writeln!(console.output(), "{err}")?;
                }
            }
        }

        info!("End of input, leaving monitor");
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn run_script(registry: &CommandRegistry, script: &str) -> String
    {
        let monitor = Monitor::new(registry, MonitorEnv::default());
        let mut console = StdConsole::new(script.as_bytes(), Vec::new());
        monitor.run(&mut console, None).unwrap();
        String::from_utf8(console.into_inner().1).unwrap()
    }

    #[test]
    fn test_blank_line_is_noop()
    {
        let registry = CommandRegistry::builtin();
        let monitor = Monitor::new(&registry, MonitorEnv::default());
        let mut out = Vec::new();
        let status = monitor.run_command(" \t ", None, &mut out).unwrap();
        assert_eq!(status, CommandStatus::Continue);
        assert!(out.is_empty());
    }

    #[test]
    fn test_unknown_command()
    {
        let registry = CommandRegistry::builtin();
        let monitor = Monitor::new(&registry, MonitorEnv::default());
        let err = monitor.run_command("frobnicate now", None, &mut io::sink()).unwrap_err();
        assert_eq!(err.to_string(), "Unknown command 'frobnicate'");
    }

    #[test]
    fn test_handler_receives_all_tokens()
    {
        let registry = CommandRegistry::new(vec![Box::new(FnCommand::new("echo", "Echo arguments", |args, ctx| {
            writeln!(ctx.out, "{}", args.join("|"))?;
            Ok(CommandStatus::Continue)
        }))]);
        let monitor = Monitor::new(&registry, MonitorEnv::default());
        let mut out = Vec::new();
        monitor.run_command("  echo a\tb  ", None, &mut out).unwrap();
        assert_eq!(out, b"echo|a|b\n");
    }

    #[test]
    fn test_run_prints_banner_and_prompts()
    {
        let out = run_script(&CommandRegistry::builtin(), "\n");
        assert_eq!(
            out,
            "Welcome to the kernel monitor!\nType 'help' for a list of commands.\nK> K> "
        );
    }

    #[test]
    fn test_run_reports_errors_and_continues()
    {
        let out = run_script(&CommandRegistry::builtin(), "bogus\nhelp\n");
        assert!(out.contains("K> Unknown command 'bogus'\nK> help - Display this list of commands\n"));
    }

    #[test]
    fn test_exit_stops_reading()
    {
        let registry = CommandRegistry::new(vec![
            Box::new(FnCommand::new("quit", "Leave", |_, _| Ok(CommandStatus::from_code(-1)))),
            Box::new(Help),
        ]);
        let out = run_script(&registry, "quit\nhelp\n");
        assert!(!out.contains("help - "));
        assert!(out.ends_with("K> "));
    }

    #[test]
    fn test_read_line_replaces_invalid_utf8()
    {
        let mut console = StdConsole::new(&b"\xff\xfe\r\nhelp\n"[..], Vec::new());
        assert_eq!(console.read_line("").unwrap().as_deref(), Some("\u{fffd}\u{fffd}"));
        assert_eq!(console.read_line("").unwrap().as_deref(), Some("help"));
        assert_eq!(console.read_line("").unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_run()
    {
        let registry = CommandRegistry::builtin();
        let monitor = Monitor::new(&registry, MonitorEnv::default());
        let mut console = StdConsole::new(&b"\xff\xfe\nhelp\n"[..], Vec::new());
        monitor.run(&mut console, None).unwrap();

        let out = String::from_utf8(console.into_inner().1).unwrap();
        assert!(out.contains("K> Unknown command '\u{fffd}\u{fffd}'\n"));
        assert!(out.contains("K> help - Display this list of commands\n"));
    }

    #[test]
    fn test_custom_config()
    {
        let registry = CommandRegistry::builtin();
        let monitor = Monitor::new(&registry, MonitorEnv::default()).with_config(MonitorConfig {
            banner: "hi".to_string(),
            prompt: "> ".to_string(),
        });
        let mut console = StdConsole::new("".as_bytes(), Vec::new());
        monitor.run(&mut console, None).unwrap();
        assert_eq!(console.into_inner().1, b"hi\n> ");
    }
}
