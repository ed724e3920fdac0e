//! Trap frame handed to monitor commands.

use super::{Address, Architecture};

/// Register snapshot of the context that entered the monitor
///
/// When the monitor is entered from a trap, the trap handler passes the
/// interrupted context here. Commands may inspect it; the dispatcher never
/// does.
///
/// ## Example
///
/// ```rust
/// use kmon_core::types::{Address, Architecture, TrapFrame};
///
/// let tf = TrapFrame::new(Architecture::X86)
///     .with_pc(Address::new(0xf010_0040))
///     .with_fp(Address::new(0xf011_0ff8));
/// assert_eq!(tf.fp.value(), 0xf011_0ff8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapFrame
{
    /// Program counter at the time of the trap
    pub pc: Address,
    /// Stack pointer at the time of the trap
    pub sp: Address,
    /// Frame pointer at the time of the trap
    pub fp: Address,
    /// Architecture of the trapped context
    pub architecture: Architecture,
}

impl TrapFrame
{
    /// Create a zeroed trap frame for the given architecture.
    pub const fn new(architecture: Architecture) -> Self
    {
        Self {
            pc: Address::ZERO,
            sp: Address::ZERO,
            fp: Address::ZERO,
            architecture,
        }
    }

    #[must_use]
    pub const fn with_pc(mut self, pc: Address) -> Self
    {
        self.pc = pc;
        self
    }

    #[must_use]
    pub const fn with_sp(mut self, sp: Address) -> Self
    {
        self.sp = sp;
        self
    }

    #[must_use]
    pub const fn with_fp(mut self, fp: Address) -> Self
    {
        self.fp = fp;
        self
    }
}
