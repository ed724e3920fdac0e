//! Target architecture description.

use std::fmt;

/// CPU architecture whose stack is being walked
///
/// The architecture decides the machine word size (and therefore every frame
/// offset), the register names printed in a backtrace, and the hex width of
/// printed words.
///
/// | architecture | word | frame pointer | return address |
/// |--------------|------|---------------|----------------|
/// | `X86`        | 4    | `ebp`         | `eip`          |
/// | `X86_64`     | 8    | `rbp`         | `rip`          |
/// | `Arm64`      | 8    | `fp`          | `lr`           |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture
{
    /// 32-bit x86, the layout of the classic teaching kernel.
    X86,
    /// x86-64 with `rbp` frame chains.
    X86_64,
    /// AArch64 with `x29`/`x30` frame records.
    Arm64,
}

impl Architecture
{
    /// Architecture of the running process, if a live walk is supported on it.
    ///
    /// ```rust
    /// use kmon_core::types::Architecture;
    ///
    /// if let Some(arch) = Architecture::current() {
    ///     assert!(arch.word_size() == 4 || arch.word_size() == 8);
    /// }
    /// ```
    pub const fn current() -> Option<Self>
    {
        #[cfg(target_arch = "x86")]
        {
            Some(Architecture::X86)
        }
        #[cfg(target_arch = "x86_64")]
        {
            Some(Architecture::X86_64)
        }
        #[cfg(target_arch = "aarch64")]
        {
            Some(Architecture::Arm64)
        }
        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
        {
            None
        }
    }

    /// Size of a machine word (and of every stack slot) in bytes.
    pub const fn word_size(self) -> u64
    {
        match self {
            Architecture::X86 => 4,
            Architecture::X86_64 | Architecture::Arm64 => 8,
        }
    }

    /// Number of hex digits needed to print one word.
    pub const fn hex_width(self) -> usize
    {
        (self.word_size() * 2) as usize
    }

    /// Label printed in front of the frame pointer.
    pub const fn frame_pointer_label(self) -> &'static str
    {
        match self {
            Architecture::X86 => "ebp",
            Architecture::X86_64 => "rbp",
            Architecture::Arm64 => "fp",
        }
    }

    /// Label printed in front of the return address.
    pub const fn return_address_label(self) -> &'static str
    {
        match self {
            Architecture::X86 => "eip",
            Architecture::X86_64 => "rip",
            Architecture::Arm64 => "lr",
        }
    }

    /// Mask a raw slot value down to the word size.
    pub const fn truncate(self, value: u64) -> u64
    {
        match self {
            Architecture::X86 => value & 0xffff_ffff,
            Architecture::X86_64 | Architecture::Arm64 => value,
        }
    }
}

impl fmt::Display for Architecture
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            Architecture::X86 => "x86",
            Architecture::X86_64 => "x86_64",
            Architecture::Arm64 => "arm64",
        };
        write!(f, "{label}")
    }
}
