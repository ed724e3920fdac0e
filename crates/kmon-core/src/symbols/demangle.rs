//! Symbol demangling utilities.
//!
//! Rust symbols come out of the object file mangled (`_ZN...E` legacy or
//! `_R...` v0). Backtraces print the demangled path without the trailing
//! hash; anything `rustc_demangle` does not recognise (C symbols, C++) is
//! printed as-is.

use rustc_demangle::try_demangle;

/// Human-readable form of a raw linkage name.
///
/// ```rust,ignore
/// assert_eq!(display_name("_ZN4kmon4main17h0123456789abcdefE"), "kmon::main");
/// assert_eq!(display_name("i386_init"), "i386_init");
/// ```
pub(crate) fn display_name(raw: &str) -> String
{
    match try_demangle(raw) {
        Ok(demangled) => format!("{demangled:#}"),
        Err(_) => raw.to_string(),
    }
}

/// Map a gimli DWARF error to a `MonitorError` with context.
pub(crate) fn map_dwarf_error(context: &str, err: gimli::Error) -> crate::error::MonitorError
{
    crate::error::MonitorError::Symbols(format!("{context}: {err}"))
}
