//! In-memory function table.

use crate::symbols::SymbolResolver;
use crate::types::{Address, SymbolInfo};

/// One function known to a [`SymbolTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry
{
    pub name: String,
    pub start: Address,
    /// Size in bytes; 0 means "up to the next entry". An unsized last entry
    /// covers nothing, since nothing bounds it.
    pub size: u64,
    pub file: String,
    pub line: u32,
}

impl SymbolEntry
{
    pub fn new(name: impl Into<String>, start: Address, size: u64) -> Self
    {
        Self {
            name: name.into(),
            start,
            size,
            file: "<unknown>".to_string(),
            line: 0,
        }
    }

    /// Attach a source location.
    #[must_use]
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self
    {
        self.file = file.into();
        self.line = line;
        self
    }

    /// `next_start` is where the following entry begins, if there is one.
    fn covers(&self, address: Address, next_start: Option<Address>) -> bool
    {
        if address < self.start {
            return false;
        }
        match (self.size, next_start) {
            (0, Some(next)) => address < next,
            (0, None) => false,
            (size, _) => address.value() - self.start.value() < size,
        }
    }
}

/// Sorted table of functions, resolving an address to the function containing it
///
/// ## Example
///
/// ```rust
/// use kmon_core::symbols::{SymbolEntry, SymbolResolver, SymbolTable};
/// use kmon_core::types::Address;
///
/// let table = SymbolTable::new(vec![
///     SymbolEntry::new("bar", Address::new(0x1000), 0x40).at("foo.c", 42),
/// ]);
/// let info = table.resolve(Address::new(0x1010)).unwrap();
/// assert_eq!(info.function_name, "bar");
/// assert_eq!(info.offset_of(Address::new(0x1010)), 16);
/// assert!(table.resolve(Address::new(0x1040)).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SymbolTable
{
    entries: Vec<SymbolEntry>,
}

impl SymbolTable
{
    /// Build a table; when two entries share a start address the first wins.
    pub fn new(mut entries: Vec<SymbolEntry>) -> Self
    {
        entries.sort_by_key(|entry| entry.start);
        entries.dedup_by_key(|entry| entry.start);
        Self { entries }
    }

    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[SymbolEntry]
    {
        &self.entries
    }

    /// Entry whose range covers `address`.
    pub fn lookup(&self, address: Address) -> Option<&SymbolEntry>
    {
        let index = self.entries.partition_point(|entry| entry.start <= address);
        let entry = self.entries.get(index.checked_sub(1)?)?;
        let next_start = self.entries.get(index).map(|next| next.start);
        entry.covers(address, next_start).then_some(entry)
    }
}

impl FromIterator<SymbolEntry> for SymbolTable
{
    fn from_iter<I: IntoIterator<Item = SymbolEntry>>(iter: I) -> Self
    {
        Self::new(iter.into_iter().collect())
    }
}

impl SymbolResolver for SymbolTable
{
    fn resolve(&self, address: Address) -> Option<SymbolInfo>
    {
        self.lookup(address)
            .map(|entry| SymbolInfo::new(entry.file.clone(), entry.line, entry.name.clone(), entry.start))
    }
}
