//! Common module for library exports

pub use crate::error::{MonitorError, MonitorResult, StackError, StackResult};
pub use crate::format::FrameFormatter;
pub use crate::layout::KernelLayout;
pub use crate::monitor::{
    Command, CommandContext, CommandRegistry, CommandStatus, Console, FnCommand, Monitor, MonitorConfig, MonitorEnv,
    StdConsole,
};
pub use crate::symbols::{ElfImage, SymbolEntry, SymbolResolver, SymbolTable};
pub use crate::types::{Address, Architecture, Frame, StackBounds, SymbolInfo, TrapFrame};
pub use crate::unwind::{LiveStack, StackImage, StackImageBuilder, StackMemory, StackWalker};
