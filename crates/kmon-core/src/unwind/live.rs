//! The running thread's own stack.
//!
//! This is the only place the crate touches raw memory. Reads are volatile
//! loads issued only after [`StackBounds::check`] accepted the address, so a
//! corrupted frame pointer is reported instead of dereferenced.

use std::fs;

use tracing::debug;

use crate::error::{MonitorError, MonitorResult, StackResult};
use crate::types::{parse_maps, Address, Architecture, StackBounds};
use crate::unwind::StackMemory;

/// Read the frame-pointer register of the calling function.
///
/// Always inlined, so the value is the frame pointer of whichever function
/// calls this. Returns `None` on architectures without a supported frame
/// pointer register.
#[inline(always)]
pub fn read_frame_pointer() -> Option<Address>
{
    #[cfg(target_arch = "x86_64")]
    {
        let fp: u64;
        // SAFETY: copies rbp into a general register; no memory is touched.
        unsafe {
            std::arch::asm!("mov {}, rbp", out(reg) fp, options(nomem, nostack, preserves_flags));
        }
        Some(Address::new(fp))
    }
    #[cfg(target_arch = "x86")]
    {
        let fp: u32;
        // SAFETY: copies ebp into a general register; no memory is touched.
        unsafe {
            std::arch::asm!("mov {}, ebp", out(reg) fp, options(nomem, nostack, preserves_flags));
        }
        Some(Address::new(u64::from(fp)))
    }
    #[cfg(target_arch = "aarch64")]
    {
        let fp: u64;
        // SAFETY: copies x29 into a general register; no memory is touched.
        unsafe {
            std::arch::asm!("mov {}, x29", out(reg) fp, options(nomem, nostack, preserves_flags));
        }
        Some(Address::new(fp))
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")))]
    {
        None
    }
}

/// Accessor for the stack of the thread that created it.
///
/// Only valid on that thread: the walker assumes nothing else mutates the
/// frames it has already visited.
#[derive(Debug, Clone, Copy)]
pub struct LiveStack
{
    architecture: Architecture,
    bounds: StackBounds,
}

impl LiveStack
{
    /// Locate the current thread's stack.
    ///
    /// Reads the frame pointer, then finds the mapping containing it in
    /// `/proc/self/maps`.
    ///
    /// ## Errors
    ///
    /// - [`MonitorError::Unsupported`] when the architecture has no frame
    ///   pointer register support or no mapping contains the frame pointer
    /// - [`MonitorError::Io`] when the memory map cannot be read
    #[inline(never)]
    pub fn for_current_thread() -> MonitorResult<Self>
    {
        let architecture = Architecture::current()
            .ok_or_else(|| MonitorError::Unsupported(format!("live stacks on {}", std::env::consts::ARCH)))?;
        let fp = read_frame_pointer()
            .ok_or_else(|| MonitorError::Unsupported("reading the frame-pointer register".to_string()))?;

        let maps = fs::read_to_string("/proc/self/maps")?;
        let region = parse_maps(&maps)
            .into_iter()
            .find(|region| region.contains(fp))
            .ok_or_else(|| MonitorError::Unsupported(format!("no memory mapping contains frame pointer {fp}")))?;

        debug!(
            fp = %fp,
            start = %region.start,
            end = %region.end,
            name = region.name.as_deref().unwrap_or(""),
            "located live stack"
        );

        Ok(Self {
            architecture,
            bounds: region.bounds(),
        })
    }

    /// Accessor over a stack range the caller already knows.
    ///
    /// Kernels that allocate their boot stack statically know its range and
    /// do not need the memory map.
    ///
    /// # Safety
    ///
    /// Every word-aligned address in `bounds` must be mapped and readable for
    /// as long as the accessor is used.
    pub unsafe fn from_bounds(architecture: Architecture, bounds: StackBounds) -> Self
    {
        Self { architecture, bounds }
    }
}

impl StackMemory for LiveStack
{
    fn architecture(&self) -> Architecture
    {
        self.architecture
    }

    fn bounds(&self) -> StackBounds
    {
        self.bounds
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read_word(&self, address: Address) -> StackResult<u64>
    {
        let word = self.architecture.word_size();
        self.bounds.check(address, word)?;

        let pointer = address.value() as usize;
        // SAFETY: `check` proved the word lies inside the mapped stack range and
        // is aligned to its size.
        let value = unsafe {
            if word == 4 {
                u64::from(std::ptr::read_volatile(pointer as *const u32))
            } else {
                std::ptr::read_volatile(pointer as *const u64)
            }
        };
        Ok(value)
    }
}
