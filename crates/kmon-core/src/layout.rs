//! Kernel memory layout facts reported by `kerninfo`.

use std::io::{self, Write};

use crate::types::Address;

/// Addresses of the special linker symbols bounding the kernel image.
///
/// Virtual addresses are what the symbols resolve to; physical addresses are
/// derived by subtracting `kernbase`, the virtual address the kernel maps
/// physical memory at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KernelLayout
{
    /// `_start`, the boot entry before paging is enabled (already physical).
    pub start: Option<Address>,
    /// Entry point of the image.
    pub entry: Option<Address>,
    /// End of the text segment.
    pub etext: Option<Address>,
    /// End of initialized data.
    pub edata: Option<Address>,
    /// End of the image (end of bss).
    pub end: Option<Address>,
    pub kernbase: Address,
}

impl KernelLayout
{
    fn physical(&self, virt: Address) -> Address
    {
        Address::new(virt.value().wrapping_sub(self.kernbase.value()))
    }

    /// Size of the loaded image in KiB, rounded up.
    ///
    /// ```rust
    /// use kmon_core::layout::KernelLayout;
    /// use kmon_core::types::Address;
    ///
    /// let layout = KernelLayout {
    ///     entry: Some(Address::new(0xf010_000c)),
    ///     end: Some(Address::new(0xf011_1a50)),
    ///     ..KernelLayout::default()
    /// };
    /// assert_eq!(layout.footprint_kib(), Some(71));
    /// ```
    pub fn footprint_kib(&self) -> Option<u64>
    {
        let (entry, end) = (self.entry?, self.end?);
        Some(end.value().saturating_sub(entry.value()).div_ceil(1024))
    }

    /// Print the layout the way the `kerninfo` command shows it.
    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()>
    {
        writeln!(out, "Special kernel symbols:")?;
        match self.start {
            Some(start) => writeln!(out, "  _start                  {start:08x} (phys)")?,
            None => writeln!(out, "  _start                  unknown")?,
        }
        for (label, symbol) in [
            ("entry", self.entry),
            ("etext", self.etext),
            ("edata", self.edata),
            ("end", self.end),
        ] {
            match symbol {
                Some(virt) => writeln!(
                    out,
                    "  {label:<6} {virt:08x} (virt)  {:08x} (phys)",
                    self.physical(virt)
                )?,
                None => writeln!(out, "  {label:<6} unknown")?,
            }
        }
        match self.footprint_kib() {
            Some(kib) => writeln!(out, "Kernel executable memory footprint: {kib}KB")?,
            None => writeln!(out, "Kernel executable memory footprint: unknown")?,
        }
        Ok(())
    }
}
