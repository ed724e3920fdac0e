//! Symbol lookup result.

use std::fmt;

use super::Address;

/// Debug metadata for a single code address.
///
/// Produced fresh by every lookup; nothing keeps it across frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo
{
    /// Source file containing the address.
    pub file: String,
    /// Line within `file`.
    pub line: u32,
    /// Name of the enclosing function.
    pub function_name: String,
    /// First instruction of the enclosing function.
    pub function_start: Address,
}

impl SymbolInfo
{
    pub fn new(file: impl Into<String>, line: u32, function_name: impl Into<String>, function_start: Address) -> Self
    {
        Self {
            file: file.into(),
            line,
            function_name: function_name.into(),
            function_start,
        }
    }

    /// Byte offset of `address` from the function start.
    pub fn offset_of(&self, address: Address) -> i64
    {
        address.offset_from(self.function_start)
    }
}

impl fmt::Display for SymbolInfo
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}:{}: {}", self.file, self.line, self.function_name)
    }
}
