//! The built-in commands: `help`, `kerninfo` and `backtrace`.

use std::io::Write;

use tracing::debug;

use super::command::{Command, CommandContext, CommandStatus};
use crate::error::{MonitorError, MonitorResult};
use crate::format::FrameFormatter;
use crate::unwind::{read_frame_pointer, StackWalker};

/// `help`: one `name - description` line per registered command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Help;

impl Command for Help
{
    fn name(&self) -> &str
    {
        "help"
    }

    fn description(&self) -> &str
    {
        "Display this list of commands"
    }

    fn execute(&self, _args: &[&str], ctx: &mut CommandContext<'_>) -> MonitorResult<CommandStatus>
    {
        for command in ctx.registry.iter() {
            writeln!(ctx.out, "{} - {}", command.name(), command.description())?;
        }
        Ok(CommandStatus::Continue)
    }
}

/// `kerninfo`: special symbols and the memory footprint of the image.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernInfo;

impl Command for KernInfo
{
    fn name(&self) -> &str
    {
        "kerninfo"
    }

    fn description(&self) -> &str
    {
        "Display information about the kernel"
    }

    fn execute(&self, _args: &[&str], ctx: &mut CommandContext<'_>) -> MonitorResult<CommandStatus>
    {
        match ctx.env.layout {
            Some(layout) => layout.write_to(ctx.out)?,
            None => writeln!(ctx.out, "Kernel layout unavailable")?,
        }
        Ok(CommandStatus::Continue)
    }
}

/// `backtrace`: walk the frame-pointer chain and print every frame.
///
/// Against a live stack the walk starts at this command's own frame, so the
/// first frame printed is `backtrace` itself. Frames are printed as they are
/// walked; a corrupted link ends the walk with
/// [`MonitorError::CorruptStack`] after the good frames are already out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Backtrace;

impl Command for Backtrace
{
    fn name(&self) -> &str
    {
        "backtrace"
    }

    fn description(&self) -> &str
    {
        "Display stack backtrace"
    }

    #[inline(never)]
    fn execute(&self, _args: &[&str], ctx: &mut CommandContext<'_>) -> MonitorResult<CommandStatus>
    {
        let stack = ctx
            .env
            .stack
            .ok_or_else(|| MonitorError::Unsupported("no stack accessor configured".to_string()))?;

        // Read here, not in a helper, so the chain starts at a live frame.
        let start = match stack.snapshot_frame_pointer() {
            Some(fp) => fp,
            None => read_frame_pointer()
                .ok_or_else(|| MonitorError::Unsupported("cannot read the frame pointer".to_string()))?,
        };
        debug!(start = %start, bounds = %stack.bounds(), "Starting backtrace");

        let formatter = FrameFormatter::new(stack.architecture());
        for frame in StackWalker::new(stack).walk(start) {
            let frame = frame?;
            for line in formatter.format_resolved(&frame, ctx.env.symbols) {
                writeln!(ctx.out, "{line}")?;
            }
        }
        Ok(CommandStatus::Continue)
    }
}
