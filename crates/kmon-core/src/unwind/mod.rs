//! # Stack Walking
//!
//! Frame-pointer based stack unwinding over a bounds-checked memory accessor.
//!
//! Every function compiled with frame pointers starts with the same prologue:
//! push the caller's frame pointer, then point the frame pointer at that saved
//! slot. The stack therefore carries a linked list:
//!
//! ```text
//!   fp + 2w .. fp + 7w   argument window (ARGUMENT_WINDOW words)
//!   fp + 1w              return address into the caller
//!   fp + 0               caller's frame pointer  ──► next record
//! ```
//!
//! The outermost record holds a zero link, which ends the walk.
//!
//! Unlike a raw pointer chase, every slot is read through [`StackMemory`],
//! which rejects addresses outside the known stack range. A corrupted link
//! therefore ends the walk with a [`StackError`] instead of faulting.
//!
//! There is no cycle detection: a chain that loops inside the stack range
//! yields frames forever. Callers that need a bound can `take(n)` the iterator.

mod image;
mod live;

use std::iter::FusedIterator;

pub use image::{StackImage, StackImageBuilder};
pub use live::{read_frame_pointer, LiveStack};
use tracing::{debug, warn};

use crate::error::{StackError, StackResult};
use crate::types::{Address, Architecture, Frame, StackBounds, ARGUMENT_WINDOW};

/// Bounds-checked access to the memory of one stack.
///
/// Implementations must vet every read against [`StackMemory::bounds`] (for
/// example with [`StackBounds::check`]) before touching memory.
pub trait StackMemory
{
    /// Architecture that decides the word size of every read.
    fn architecture(&self) -> Architecture;

    /// Range of addresses that may be read.
    fn bounds(&self) -> StackBounds;

    /// Read one machine word at `address`.
    ///
    /// Words narrower than 64 bits are zero-extended.
    fn read_word(&self, address: Address) -> StackResult<u64>;

    /// Frame pointer recorded when the memory was captured.
    ///
    /// Snapshots return the frame pointer they were taken at. Live accessors
    /// return `None`; the caller then reads the frame-pointer register itself.
    fn snapshot_frame_pointer(&self) -> Option<Address>
    {
        None
    }
}

/// Walks frame-pointer chains in a [`StackMemory`].
///
/// ## Example
///
/// ```rust
/// use kmon_core::types::{Address, Architecture};
/// use kmon_core::unwind::{StackImageBuilder, StackMemory, StackWalker};
///
/// let stack = StackImageBuilder::new(Architecture::X86, Address::new(0xf011_0000))
///     .frame(Address::new(0xf010_0a62), &[1, 2, 3, 4, 5])
///     .frame(Address::new(0xf010_00d4), &[])
///     .build();
///
/// let start = stack.snapshot_frame_pointer().unwrap();
/// let frames: Vec<_> = StackWalker::new(&stack).walk(start).collect::<Result<_, _>>().unwrap();
/// assert_eq!(frames.len(), 2);
/// assert_eq!(frames[0].arguments, [1, 2, 3, 4, 5]);
/// ```
pub struct StackWalker<'a, M: ?Sized>
{
    memory: &'a M,
}

impl<'a, M: StackMemory + ?Sized> StackWalker<'a, M>
{
    pub fn new(memory: &'a M) -> Self
    {
        Self { memory }
    }

    /// Start a fresh traversal at `start`.
    ///
    /// The returned iterator is lazy: nothing is read until it is advanced.
    pub fn walk(&self, start: Address) -> Frames<'a, M>
    {
        debug!(start = %start, bounds = %self.memory.bounds(), "starting frame-pointer walk");
        Frames {
            memory: self.memory,
            next: Some(start),
            depth: 0,
        }
    }
}

/// Lazy iterator over the frames of one walk.
///
/// Yields `Ok(frame)` per record, at most one `Err` when a record cannot be
/// read, and then nothing.
pub struct Frames<'a, M: ?Sized>
{
    memory: &'a M,
    next: Option<Address>,
    depth: usize,
}

impl<M: StackMemory + ?Sized> Iterator for Frames<'_, M>
{
    type Item = StackResult<Frame>;

    fn next(&mut self) -> Option<Self::Item>
    {
        let fp = self.next.take()?;
        if fp.is_zero() {
            debug!(depth = self.depth, "reached sentinel frame pointer");
            return None;
        }

        match read_frame(self.memory, fp) {
            Ok((frame, caller)) => {
                debug!(
                    depth = self.depth,
                    fp = %frame.frame_pointer,
                    ret = %frame.return_address,
                    "walked frame"
                );
                self.depth += 1;
                self.next = Some(caller);
                Some(Ok(frame))
            }
            Err(err) => {
                warn!(depth = self.depth, fp = %fp, error = %err, "frame-pointer chain left the stack");
                Some(Err(err))
            }
        }
    }
}

impl<M: StackMemory + ?Sized> FusedIterator for Frames<'_, M> {}

/// Read the record at `fp`, returning the frame and the caller's frame pointer.
fn read_frame<M: StackMemory + ?Sized>(memory: &M, fp: Address) -> StackResult<(Frame, Address)>
{
    let word = memory.architecture().word_size();
    let slot = |index: u64| -> StackResult<u64> {
        let address = fp.checked_add(index * word).ok_or(StackError::Overflow(fp))?;
        memory.read_word(address)
    };

    let caller = Address::new(slot(0)?);
    let return_address = Address::new(slot(1)?);

    let mut arguments = [0u64; ARGUMENT_WINDOW];
    for (index, argument) in (2u64..).zip(arguments.iter_mut()) {
        *argument = slot(index)?;
    }

    Ok((
        Frame {
            frame_pointer: fp,
            return_address,
            arguments,
        },
        caller,
    ))
}
