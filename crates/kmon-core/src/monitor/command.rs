//! Commands, the registry that holds them, and what they can see.

use std::fmt;
use std::io::Write;

use crate::error::MonitorResult;
use crate::layout::KernelLayout;
use crate::symbols::SymbolResolver;
use crate::types::TrapFrame;
use crate::unwind::StackMemory;

/// What the REPL should do after a command returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus
{
    /// Read the next line.
    Continue,
    /// Leave the monitor.
    Exit,
}

impl CommandStatus
{
    /// Map a classic integer handler result: negative means exit.
    ///
    /// ```rust
    /// use kmon_core::monitor::CommandStatus;
    ///
    /// assert_eq!(CommandStatus::from_code(-1), CommandStatus::Exit);
    /// assert_eq!(CommandStatus::from_code(0), CommandStatus::Continue);
    /// ```
    pub const fn from_code(code: i32) -> Self
    {
        if code < 0 {
            CommandStatus::Exit
        } else {
            CommandStatus::Continue
        }
    }
}

/// Collaborators the monitor was started with.
///
/// Every field is optional; a command whose collaborator is missing reports
/// that instead of failing the monitor.
#[derive(Clone, Copy, Default)]
pub struct MonitorEnv<'a>
{
    /// Stack the `backtrace` command walks.
    pub stack: Option<&'a dyn StackMemory>,
    /// Resolver for return addresses.
    pub symbols: Option<&'a dyn SymbolResolver>,
    /// Layout printed by `kerninfo`.
    pub layout: Option<&'a KernelLayout>,
}

impl fmt::Debug for MonitorEnv<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("MonitorEnv")
            .field("stack", &self.stack.map(|stack| stack.bounds()))
            .field("symbols", &self.symbols.is_some())
            .field("layout", &self.layout)
            .finish()
    }
}

/// Everything a command receives besides its arguments.
pub struct CommandContext<'a>
{
    /// Console output.
    pub out: &'a mut dyn Write,
    /// The registry the command was found in, read-only.
    pub registry: &'a CommandRegistry,
    /// Stack, symbols and layout the monitor was set up with.
    pub env: MonitorEnv<'a>,
    /// Context that entered the monitor, if it was entered from a trap.
    pub trap_frame: Option<&'a TrapFrame>,
}

/// A monitor command.
pub trait Command
{
    /// Name typed to invoke the command.
    fn name(&self) -> &str;

    /// One-line description shown by `help`.
    fn description(&self) -> &str;

    /// Run the command. `args[0]` is the command name.
    fn execute(&self, args: &[&str], ctx: &mut CommandContext<'_>) -> MonitorResult<CommandStatus>;
}

/// A command backed by a closure.
///
/// ```rust
/// use kmon_core::monitor::{CommandStatus, FnCommand};
///
/// let quit = FnCommand::new("quit", "Leave the monitor", |_, _| Ok(CommandStatus::Exit));
/// ```
pub struct FnCommand<F>
{
    name: String,
    description: String,
    handler: F,
}

impl<F> FnCommand<F>
where
    F: Fn(&[&str], &mut CommandContext<'_>) -> MonitorResult<CommandStatus>,
{
    pub fn new(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    {
        Self {
            name: name.into(),
            description: description.into(),
            handler,
        }
    }
}

impl<F> Command for FnCommand<F>
where
    F: Fn(&[&str], &mut CommandContext<'_>) -> MonitorResult<CommandStatus>,
{
    fn name(&self) -> &str
    {
        &self.name
    }

    fn description(&self) -> &str
    {
        &self.description
    }

    fn execute(&self, args: &[&str], ctx: &mut CommandContext<'_>) -> MonitorResult<CommandStatus>
    {
        (self.handler)(args, ctx)
    }
}

/// Ordered, immutable set of commands.
///
/// Built once before the monitor starts and shared by reference afterwards.
/// Lookup is an exact, case-sensitive match on the name; when two commands
/// share a name the one registered first wins.
pub struct CommandRegistry
{
    commands: Vec<Box<dyn Command>>,
}

impl CommandRegistry
{
    pub fn new(commands: Vec<Box<dyn Command>>) -> Self
    {
        Self { commands }
    }

    /// `help`, `kerninfo` and `backtrace`, in that order.
    pub fn builtin() -> Self
    {
        use super::builtins::{Backtrace, Help, KernInfo};

        Self::new(vec![Box::new(Help), Box::new(KernInfo), Box::new(Backtrace)])
    }

    pub fn find(&self, name: &str) -> Option<&dyn Command>
    {
        self.commands
            .iter()
            .find(|command| command.name() == name)
            .map(AsRef::as_ref)
    }

    /// Commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Command>
    {
        self.commands.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize
    {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandRegistry
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_list().entries(self.iter().map(Command::name)).finish()
    }
}
