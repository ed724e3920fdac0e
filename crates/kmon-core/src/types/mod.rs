//! # Types
//!
//! Platform-agnostic types shared by the walker, the formatter and the
//! command layer.

pub mod address;
pub mod arch;
pub mod region;
pub mod registers;
pub mod stack;
pub mod symbols;

// Re-export all public types
pub use address::Address;
pub use arch::Architecture;
pub use region::{parse_maps, MemoryRegion, RegionParseError};
pub use registers::TrapFrame;
pub use stack::{Frame, StackBounds, ARGUMENT_WINDOW};
pub use symbols::SymbolInfo;
