//! # Error Types
//!
//! General error handling for the monitor.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages. Two layers exist:
//!
//! - [`StackError`]: failures of the bounds-checked stack accessor. These are
//!   what a corrupted frame-pointer chain turns into.
//! - [`MonitorError`]: everything a command or the REPL can report.
//!
//! None of these are fatal to the monitor; the REPL prints them and keeps
//! reading lines.

use thiserror::Error;

use crate::types::{Address, StackBounds};

/// Failure of a single stack read.
///
/// The walker never dereferences an address the accessor has not vetted, so a
/// corrupted chain surfaces as one of these instead of undefined behaviour.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError
{
    /// The read `[address, address + len)` is not inside the stack.
    #[error("address {address} (+{len} bytes) outside stack {bounds}")]
    OutOfRange
    {
        /// First byte of the rejected read
        address: Address,
        /// Width of the read in bytes
        len: u64,
        /// Range the accessor knows to be valid
        bounds: StackBounds,
    },

    /// The address is not aligned to the machine word size.
    #[error("address {address} is not aligned to {align} bytes")]
    Misaligned
    {
        /// Rejected address
        address: Address,
        /// Required alignment
        align: u64,
    },

    /// Computing the end of the read wrapped around the address space.
    #[error("address {0} overflows the address space")]
    Overflow(Address),
}

/// Main error type for monitor operations
///
/// The `Display` strings of [`MonitorError::TooManyArguments`] and
/// [`MonitorError::UnknownCommand`] are printed verbatim on the console.
///
/// ## Error Categories
///
/// 1. **Input errors**: TooManyArguments, UnknownCommand
/// 2. **Stack errors**: CorruptStack
/// 3. **Collaborator errors**: Symbols, Unsupported
/// 4. **I/O errors**: Io (console read/write)
#[derive(Error, Debug)]
pub enum MonitorError
{
    /// The input line had more tokens than the tokenizer accepts
    #[error("Too many arguments (max {max})")]
    TooManyArguments
    {
        /// Maximum token count, including the terminator slot
        max: usize,
    },

    /// The first token matched no registered command
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    /// The frame-pointer chain left the known stack
    ///
    /// Frames walked before the corruption have already been printed when
    /// this is reported.
    #[error("corrupt stack: {0}")]
    CorruptStack(#[from] StackError),

    /// Loading or parsing debug information failed
    #[error("symbol loading failed: {0}")]
    Symbols(String),

    /// The running platform lacks a facility the monitor needs
    ///
    /// Examples:
    /// - Reading the frame-pointer register on an unsupported architecture
    /// - Locating the stack without `/proc/self/maps`
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// I/O error on the console
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, MonitorError>`
///
/// ```rust
/// use kmon_core::error::MonitorResult;
/// fn foo() -> MonitorResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type MonitorResult<T> = std::result::Result<T, MonitorError>;

/// Result of a single bounds-checked stack read.
pub type StackResult<T> = std::result::Result<T, StackError>;
