//! # kmon-core
//!
//! Backtrace engine and command monitor for kmon.
//!
//! This crate provides the pieces of a small kernel-style diagnostic shell:
//! - Frame-pointer stack walking over a bounds-checked memory accessor
//! - Symbol resolution of return addresses from ELF debug information
//! - Frame formatting in the classic kernel monitor layout
//! - A command registry, tokenizer and line-oriented REPL
//!
//! ## Platform Support
//!
//! - **x86 / x86_64 / AArch64**: live backtraces through the frame-pointer register
//! - **Linux**: stack bounds from `/proc/self/maps`
//! - Everything else still works against recorded stacks ([`unwind::StackImage`])
//!
//! ## Why unsafe code is needed
//!
//! Reading the frame-pointer register takes inline assembly, and a live
//! backtrace reads words off the running thread's stack. Both are confined to
//! [`unwind::LiveStack`], which only touches addresses its bounds check accepted.

#![allow(unsafe_code)] // Required for frame-pointer reads and live stack access

pub mod error;
pub mod format;
pub mod layout;
pub mod monitor;
pub mod prelude;
pub mod symbols;
pub mod types;
pub mod unwind;

// Re-export commonly used types
pub use error::{MonitorError, MonitorResult, StackError, StackResult};
pub use format::FrameFormatter;
pub use layout::KernelLayout;
pub use monitor::{Command, CommandRegistry, CommandStatus, Monitor, MonitorConfig};
pub use symbols::SymbolResolver;
pub use types::{Address, Architecture, Frame, StackBounds, SymbolInfo, TrapFrame};
pub use unwind::{StackMemory, StackWalker};
