//! # Symbols
//!
//! Mapping code addresses back to functions and source lines.
//!
//! The backtrace only needs one question answered per frame: which function
//! contains this return address, where does it start, and which file/line
//! does the address belong to. [`SymbolResolver`] is that question; the
//! monitor never parses debug information itself.
//!
//! Two resolvers ship with the crate:
//!
//! - [`SymbolTable`]: an explicit, sorted list of functions.
//! - [`ElfImage`]: function symbols from an ELF file plus DWARF line tables
//!   through `addr2line`.

mod demangle;
mod image;
mod table;

pub use image::ElfImage;
pub use table::{SymbolEntry, SymbolTable};

use crate::types::{Address, SymbolInfo};

/// Lookup service from instruction address to debug metadata.
///
/// A failed lookup is not an error; the backtrace simply omits the symbol
/// line for that frame.
pub trait SymbolResolver
{
    fn resolve(&self, address: Address) -> Option<SymbolInfo>;
}

impl<R: SymbolResolver + ?Sized> SymbolResolver for &R
{
    fn resolve(&self, address: Address) -> Option<SymbolInfo>
    {
        (**self).resolve(address)
    }
}
