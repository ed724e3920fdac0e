//! Tests for command dispatch and the REPL loop

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

use kmon_core::monitor::{
    tokenize, Command, CommandContext, CommandRegistry, CommandStatus, FnCommand, Help, Monitor, MonitorEnv,
    StdConsole, MAXARGS,
};
use kmon_core::types::{Address, Architecture, TrapFrame};
use kmon_core::{MonitorError, MonitorResult};

const BANNER: &str = "Welcome to the kernel monitor!\nType 'help' for a list of commands.\n";

fn session(registry: &CommandRegistry, script: &str) -> String
{
    let monitor = Monitor::new(registry, MonitorEnv::default());
    let mut console = StdConsole::new(script.as_bytes(), Vec::new());
    monitor.run(&mut console, None).unwrap();
    String::from_utf8(console.into_inner().1).unwrap()
}

/// Counts its invocations.
struct Probe
{
    calls: Rc<Cell<usize>>,
}

impl Command for Probe
{
    fn name(&self) -> &str
    {
        "probe"
    }

    fn description(&self) -> &str
    {
        "Count invocations"
    }

    fn execute(&self, _args: &[&str], _ctx: &mut CommandContext<'_>) -> MonitorResult<CommandStatus>
    {
        self.calls.set(self.calls.get() + 1);
        Ok(CommandStatus::Continue)
    }
}

#[test]
fn test_help_session()
{
    let out = session(&CommandRegistry::builtin(), "help\n");
    let expected = format!(
        "{BANNER}K> help - Display this list of commands\n\
         kerninfo - Display information about the kernel\n\
         backtrace - Display stack backtrace\n\
         K> "
    );
    assert_eq!(out, expected);
}

#[test]
fn test_help_follows_registration_order()
{
    let registry = CommandRegistry::new(vec![
        Box::new(FnCommand::new("zeta", "Last letter", |_, _| Ok(CommandStatus::Continue))),
        Box::new(Help),
        Box::new(FnCommand::new("alpha", "First letter", |_, _| Ok(CommandStatus::Continue))),
    ]);
    let out = session(&registry, "help\n");
    assert!(out.contains("zeta - Last letter\nhelp - Display this list of commands\nalpha - First letter\n"));
}

#[test]
fn test_blank_lines_are_silent()
{
    let out = session(&CommandRegistry::builtin(), "\n   \n\t\r\n");
    assert_eq!(out, format!("{BANNER}K> K> K> K> "));
}

#[test]
fn test_too_many_arguments_invokes_nothing()
{
    let calls = Rc::new(Cell::new(0));
    let registry = CommandRegistry::new(vec![Box::new(Probe { calls: Rc::clone(&calls) })]);

    let line = std::iter::once("probe")
        .chain(std::iter::repeat("x").take(MAXARGS - 1))
        .collect::<Vec<_>>()
        .join(" ");
    let out = session(&registry, &format!("{line}\n"));

    assert_eq!(calls.get(), 0);
    assert!(out.contains("K> Too many arguments (max 16)\n"));
}

#[test]
fn test_fifteen_arguments_dispatch()
{
    let calls = Rc::new(Cell::new(0));
    let registry = CommandRegistry::new(vec![Box::new(Probe { calls: Rc::clone(&calls) })]);

    let line = std::iter::once("probe")
        .chain(std::iter::repeat("x").take(MAXARGS - 2))
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(tokenize(&line).unwrap().len(), MAXARGS - 1);
    session(&registry, &format!("{line}\n"));

    assert_eq!(calls.get(), 1);
}

#[test]
fn test_unknown_command_session()
{
    let calls = Rc::new(Cell::new(0));
    let registry = CommandRegistry::new(vec![Box::new(Probe { calls: Rc::clone(&calls) })]);

    let out = session(&registry, "Probe\nprobe\n");
    assert!(out.contains("K> Unknown command 'Probe'\n"));
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_exit_ends_session()
{
    let calls = Rc::new(Cell::new(0));
    let registry = CommandRegistry::new(vec![
        Box::new(FnCommand::new("exit", "Leave the monitor", |_, _| Ok(CommandStatus::Exit))),
        Box::new(Probe { calls: Rc::clone(&calls) }),
    ]);

    let out = session(&registry, "probe\nexit\nprobe\n");
    assert_eq!(calls.get(), 1);
    assert_eq!(out, format!("{BANNER}K> K> "));
}

#[test]
fn test_end_of_input_ends_session()
{
    let out = session(&CommandRegistry::builtin(), "");
    assert_eq!(out, format!("{BANNER}K> "));
}

#[test]
fn test_trap_frame_reaches_commands()
{
    let registry = CommandRegistry::new(vec![Box::new(FnCommand::new(
        "tf",
        "Print the trap frame pc",
        |_, ctx| {
            match ctx.trap_frame {
                Some(tf) => writeln!(ctx.out, "pc {:08x}", tf.pc)?,
                None => writeln!(ctx.out, "no trap frame")?,
            }
            Ok(CommandStatus::Continue)
        },
    ))]);
    let monitor = Monitor::new(&registry, MonitorEnv::default());
    let tf = TrapFrame::new(Architecture::X86).with_pc(Address::new(0xf010_0040));

    let mut out = Vec::new();
    monitor.run_command("tf", Some(&tf), &mut out).unwrap();
    monitor.run_command("tf", None, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "pc f0100040\nno trap frame\n");
}

#[test]
fn test_handler_errors_are_printed()
{
    let registry = CommandRegistry::new(vec![Box::new(FnCommand::new("fail", "Always fails", |_, _| {
        Err(MonitorError::Unsupported("nothing to do".to_string()))
    }))]);
    let out = session(&registry, "fail\n");
    assert!(out.contains("K> unsupported: nothing to do\nK> "));
}

#[test]
fn test_run_command_errors()
{
    let registry = CommandRegistry::builtin();
    let monitor = Monitor::new(&registry, MonitorEnv::default());
    let mut sink = std::io::sink();

    assert!(matches!(
        monitor.run_command("nope", None, &mut sink),
        Err(MonitorError::UnknownCommand(name)) if name == "nope"
    ));
    assert!(matches!(
        monitor.run_command(&"a ".repeat(MAXARGS), None, &mut sink),
        Err(MonitorError::TooManyArguments { max: MAXARGS })
    ));
}
