//! Mapped memory regions of the running process.

use std::str::FromStr;

use thiserror::Error;

use super::{Address, StackBounds};

/// One mapping from a `/proc/<pid>/maps` style listing
///
/// ## Example
///
/// ```rust
/// use kmon_core::types::{Address, MemoryRegion};
///
/// let line = "7ffc4a6d1000-7ffc4a6f2000 rw-p 00000000 00:00 0                          [stack]";
/// let region: MemoryRegion = line.parse().unwrap();
/// assert_eq!(region.start, Address::new(0x7ffc_4a6d_1000));
/// assert_eq!(region.name.as_deref(), Some("[stack]"));
/// assert!(region.is_writable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion
{
    /// Start address of the region (inclusive)
    pub start: Address,
    /// End address of the region (exclusive)
    pub end: Address,
    /// Permission string, e.g. `"rw-p"` or `"r-xp"`
    pub permissions: String,
    /// Offset of the mapping into the backing file
    pub offset: u64,
    /// Backing path or pseudo name (`[stack]`, `[heap]`), if any
    pub name: Option<String>,
}

impl MemoryRegion
{
    pub fn new(start: Address, end: Address, permissions: impl Into<String>, offset: u64, name: Option<String>) -> Self
    {
        Self {
            start,
            end,
            permissions: permissions.into(),
            offset,
            name,
        }
    }

    /// Size of the region in bytes (0 when `end <= start`).
    pub fn size(&self) -> u64
    {
        self.end.value().saturating_sub(self.start.value())
    }

    pub fn is_readable(&self) -> bool
    {
        self.permissions.starts_with('r')
    }

    pub fn is_writable(&self) -> bool
    {
        self.permissions.chars().nth(1) == Some('w')
    }

    pub fn contains(&self, address: Address) -> bool
    {
        address >= self.start && address < self.end
    }

    /// The region as a stack range.
    pub fn bounds(&self) -> StackBounds
    {
        StackBounds::new(self.start, self.end)
    }
}

/// Reason a maps line could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed maps line: {0}")]
pub struct RegionParseError(pub String);

impl FromStr for MemoryRegion
{
    type Err = RegionParseError;

    // start-end perms offset dev inode [name]
    fn from_str(line: &str) -> Result<Self, Self::Err>
    {
        let malformed = || RegionParseError(line.to_string());
        let mut fields = line.split_whitespace();

        let range = fields.next().ok_or_else(malformed)?;
        let (start, end) = range.split_once('-').ok_or_else(malformed)?;
        let start = u64::from_str_radix(start, 16).map_err(|_| malformed())?;
        let end = u64::from_str_radix(end, 16).map_err(|_| malformed())?;

        let permissions = fields.next().ok_or_else(malformed)?;
        let offset = fields
            .next()
            .and_then(|value| u64::from_str_radix(value, 16).ok())
            .ok_or_else(malformed)?;
        let _device = fields.next().ok_or_else(malformed)?;
        let _inode = fields.next().ok_or_else(malformed)?;

        let name: Vec<&str> = fields.collect();
        let name = if name.is_empty() { None } else { Some(name.join(" ")) };

        Ok(MemoryRegion::new(Address::new(start), Address::new(end), permissions, offset, name))
    }
}

/// Parse a whole maps listing, skipping lines that do not parse.
pub fn parse_maps(listing: &str) -> Vec<MemoryRegion>
{
    listing.lines().filter_map(|line| line.parse().ok()).collect()
}
