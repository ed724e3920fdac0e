//! Stack range and frame types.

use std::fmt;

use super::Address;
use crate::error::{StackError, StackResult};

/// Number of words read past a frame's argument base.
///
/// The walker has no way to learn a callee's real arity from a frame pointer,
/// so it always copies this many slots. Slots beyond the true argument count
/// hold whatever the caller left there. On ABIs that pass arguments in
/// registers (x86-64 SysV, AArch64) none of the slots are arguments.
pub const ARGUMENT_WINDOW: usize = 5;

/// Half-open range `[low, high)` of memory known to belong to a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackBounds
{
    /// Lowest valid address.
    pub low: Address,
    /// One past the highest valid address.
    pub high: Address,
}

impl StackBounds
{
    pub const fn new(low: Address, high: Address) -> Self
    {
        Self { low, high }
    }

    /// Size of the range in bytes (0 when `high <= low`).
    pub fn size(&self) -> u64
    {
        self.high.value().saturating_sub(self.low.value())
    }

    pub fn contains(&self, address: Address) -> bool
    {
        address >= self.low && address < self.high
    }

    /// Vet a read of `len` bytes at `address`.
    ///
    /// The read must be aligned to `len`, must not wrap, and must lie entirely
    /// inside the range.
    ///
    /// ```rust
    /// use kmon_core::types::{Address, StackBounds};
    ///
    /// let bounds = StackBounds::new(Address::new(0x1000), Address::new(0x2000));
    /// assert!(bounds.check(Address::new(0x1ff8), 8).is_ok());
    /// assert!(bounds.check(Address::new(0x1ffc), 8).is_err());
    /// assert!(bounds.check(Address::new(0x0ff8), 8).is_err());
    /// ```
    pub fn check(&self, address: Address, len: u64) -> StackResult<()>
    {
        if !address.is_aligned(len) {
            return Err(StackError::Misaligned { address, align: len });
        }
        let end = address.checked_add(len).ok_or(StackError::Overflow(address))?;
        if address < self.low || end > self.high {
            return Err(StackError::OutOfRange {
                address,
                len,
                bounds: *self,
            });
        }
        Ok(())
    }
}

impl fmt::Display for StackBounds
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "[{}, {})", self.low, self.high)
    }
}

/// One frame recovered from a frame-pointer chain.
///
/// A frame is a copy of the three things a single frame pointer reveals; it
/// holds no reference into the stack it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame
{
    /// Value of the frame pointer for this frame.
    pub frame_pointer: Address,
    /// Saved return address, one word above the frame pointer.
    pub return_address: Address,
    /// Raw words starting two words above the frame pointer.
    pub arguments: [u64; ARGUMENT_WINDOW],
}
