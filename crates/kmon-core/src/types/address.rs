//! Memory address type.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed memory address
///
/// Wraps a `u64` so stack slots, return addresses and symbol starts cannot be
/// mixed up with sizes or raw words read off the stack. Addresses are always
/// carried as 64-bit values, even when the monitored architecture uses 32-bit
/// words; the formatter narrows them for display.
///
/// ## Example
///
/// ```rust
/// use kmon_core::types::Address;
///
/// let fp = Address::from(0xf010_ff58);
/// let return_slot = fp + 4;
/// assert_eq!(return_slot.value(), 0xf010_ff5c);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address, also the sentinel that ends a frame-pointer chain.
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value in const contexts.
    ///
    /// ```rust
    /// use kmon_core::types::Address;
    ///
    /// const KERNBASE: Address = Address::new(0xf000_0000);
    /// assert_eq!(KERNBASE.value(), 0xf000_0000);
    /// ```
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Raw `u64` value of this address.
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the zero sentinel.
    pub const fn is_zero(self) -> bool
    {
        self.0 == 0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use kmon_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Subtract an offset from this address, checking for underflow
    pub fn checked_sub(self, offset: u64) -> Option<Self>
    {
        self.0.checked_sub(offset).map(Address)
    }

    /// Whether the address is a multiple of `align` (a power of two).
    pub const fn is_aligned(self, align: u64) -> bool
    {
        align == 0 || self.0 & (align - 1) == 0
    }

    /// Signed byte distance from `origin` to `self`.
    ///
    /// Used for `function+offset` rendering, where a return address normally
    /// lies after the function start but a bogus symbol could place it before.
    ///
    /// ```rust
    /// use kmon_core::types::Address;
    ///
    /// let start = Address::from(0x1000);
    /// assert_eq!(Address::from(0x1010).offset_from(start), 16);
    /// assert_eq!(Address::from(0x0ff0).offset_from(start), -16);
    /// ```
    #[allow(clippy::cast_possible_wrap)]
    pub const fn offset_from(self, origin: Address) -> i64
    {
        self.0.wrapping_sub(origin.0) as i64
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}
