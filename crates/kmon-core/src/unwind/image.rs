//! Owned stack snapshots.

use crate::error::{StackError, StackResult};
use crate::types::{Address, Architecture, StackBounds, ARGUMENT_WINDOW};
use crate::unwind::StackMemory;

/// A copy of a stack region together with the frame pointer it was taken at
///
/// Used to replay a backtrace over memory captured elsewhere (a trap dump, a
/// test fixture). Words are little-endian, as on every supported
/// architecture.
#[derive(Debug, Clone)]
pub struct StackImage
{
    architecture: Architecture,
    base: Address,
    bytes: Vec<u8>,
    frame_pointer: Option<Address>,
}

impl StackImage
{
    /// Wrap `bytes` as the memory starting at `base`.
    pub fn new(architecture: Architecture, base: Address, bytes: Vec<u8>) -> Self
    {
        Self {
            architecture,
            base,
            bytes,
            frame_pointer: None,
        }
    }

    /// Record the frame pointer the snapshot was taken at.
    #[must_use]
    pub fn with_frame_pointer(mut self, frame_pointer: Address) -> Self
    {
        self.frame_pointer = Some(frame_pointer);
        self
    }

    /// Overwrite one word, e.g. to patch a link in a captured chain.
    pub fn write_word(&mut self, address: Address, value: u64) -> StackResult<()>
    {
        let word = self.architecture.word_size();
        self.bounds().check(address, word)?;
        let offset = self.offset_of(address)?;
        let bytes = value.to_le_bytes();
        self.bytes[offset..offset + word as usize].copy_from_slice(&bytes[..word as usize]);
        Ok(())
    }

    fn offset_of(&self, address: Address) -> StackResult<usize>
    {
        let offset = address.offset_from(self.base);
        usize::try_from(offset).map_err(|_| StackError::Overflow(address))
    }
}

impl StackMemory for StackImage
{
    fn architecture(&self) -> Architecture
    {
        self.architecture
    }

    fn bounds(&self) -> StackBounds
    {
        StackBounds::new(self.base, self.base + self.bytes.len() as u64)
    }

    fn read_word(&self, address: Address) -> StackResult<u64>
    {
        let word = self.architecture.word_size() as usize;
        self.bounds().check(address, word as u64)?;
        let offset = self.offset_of(address)?;

        let mut buf = [0u8; 8];
        buf[..word].copy_from_slice(&self.bytes[offset..offset + word]);
        Ok(u64::from_le_bytes(buf))
    }

    fn snapshot_frame_pointer(&self) -> Option<Address>
    {
        self.frame_pointer
    }
}

/// Lays out a synthetic frame-pointer chain below a stack top.
///
/// Frames are added innermost first. Each occupies one record (saved link,
/// return address, argument window) and the outermost record links to zero
/// unless [`StackImageBuilder::outermost_link`] says otherwise.
///
/// ```text
///   top ─► ┌──────────────┐
///          │ args[0..5]   │  outermost frame
///          │ return addr  │
///          │ 0            │ ◄─ fp[n-1]
///          ├──────────────┤
///          │      ...     │
///          ├──────────────┤
///          │ args[0..5]   │  innermost frame
///          │ return addr  │
///          │ fp[1]        │ ◄─ fp[0] = snapshot frame pointer
///   base ─►└──────────────┘
/// ```
#[derive(Debug, Clone)]
pub struct StackImageBuilder
{
    architecture: Architecture,
    top: Address,
    frames: Vec<(Address, [u64; ARGUMENT_WINDOW])>,
    outermost_link: Address,
}

impl StackImageBuilder
{
    /// Words in one synthetic record.
    pub const RECORD_WORDS: u64 = 2 + ARGUMENT_WINDOW as u64;

    pub fn new(architecture: Architecture, top: Address) -> Self
    {
        Self {
            architecture,
            top,
            frames: Vec::new(),
            outermost_link: Address::ZERO,
        }
    }

    /// Append the next caller. Missing argument words are zero.
    #[must_use]
    pub fn frame(mut self, return_address: Address, arguments: &[u64]) -> Self
    {
        let mut window = [0u64; ARGUMENT_WINDOW];
        for (slot, value) in window.iter_mut().zip(arguments) {
            *slot = self.architecture.truncate(*value);
        }
        self.frames.push((return_address, window));
        self
    }

    /// Link stored in the outermost record instead of the zero sentinel.
    #[must_use]
    pub fn outermost_link(mut self, link: Address) -> Self
    {
        self.outermost_link = link;
        self
    }

    /// Frame pointer the `index`-th frame (0 = innermost) will get.
    ///
    /// Only meaningful once every frame has been added.
    pub fn frame_pointer(&self, index: usize) -> Address
    {
        let record = Self::RECORD_WORDS * self.architecture.word_size();
        self.base() + index as u64 * record
    }

    fn base(&self) -> Address
    {
        let record = Self::RECORD_WORDS * self.architecture.word_size();
        self.top - self.frames.len() as u64 * record
    }

    pub fn build(self) -> StackImage
    {
        let word = self.architecture.word_size();
        let base = self.base();
        let mut words = Vec::with_capacity(self.frames.len() * Self::RECORD_WORDS as usize);

        for (index, (return_address, arguments)) in self.frames.iter().enumerate() {
            let link = if index + 1 == self.frames.len() {
                self.outermost_link
            } else {
                self.frame_pointer(index + 1)
            };
            words.push(link.value());
            words.push(return_address.value());
            words.extend_from_slice(arguments);
        }

        let bytes = words
            .iter()
            .flat_map(|value| value.to_le_bytes().into_iter().take(word as usize))
            .collect();

        let image = StackImage::new(self.architecture, base, bytes);
        if self.frames.is_empty() {
            image.with_frame_pointer(Address::ZERO)
        } else {
            image.with_frame_pointer(base)
        }
    }
}
