//! Rendering of walked frames.
//!
//! Output is part of the monitor's interface: tools parse it, so the layout
//! follows the classic kernel monitor exactly. On 32-bit x86:
//!
//! ```text
//! ebp f0109e58 eip f0100a62 args 00000001 f0109e80 f0109e98 f0100ed2 00000031 
//! kern/monitor.c:143: monitor+106
//! ```
//!
//! Note the space after every argument word, including the last.

use crate::symbols::SymbolResolver;
use crate::types::{Architecture, Frame, SymbolInfo};

/// Formats frames for one architecture.
#[derive(Debug, Clone, Copy)]
pub struct FrameFormatter
{
    architecture: Architecture,
}

impl FrameFormatter
{
    pub const fn new(architecture: Architecture) -> Self
    {
        Self { architecture }
    }

    /// Raw line: frame pointer, return address and the argument window.
    pub fn frame_line(&self, frame: &Frame) -> String
    {
        let arch = self.architecture;
        let width = arch.hex_width();
        let arguments: String = frame
            .arguments
            .iter()
            .map(|argument| format!("{:0width$x} ", arch.truncate(*argument)))
            .collect();
        format!(
            "{} {:0width$x} {} {:0width$x} args {arguments}",
            arch.frame_pointer_label(),
            arch.truncate(frame.frame_pointer.value()),
            arch.return_address_label(),
            arch.truncate(frame.return_address.value()),
        )
    }

    /// Symbol line: `<file>:<line>: <function>+<offset>`.
    pub fn symbol_line(&self, frame: &Frame, symbol: &SymbolInfo) -> String
    {
        format!(
            "{}:{}: {}+{}",
            symbol.file,
            symbol.line,
            symbol.function_name,
            symbol.offset_of(frame.return_address)
        )
    }

    /// Both lines for a frame; the symbol line only when `symbol` is known.
    pub fn format(&self, frame: &Frame, symbol: Option<&SymbolInfo>) -> Vec<String>
    {
        let mut lines = vec![self.frame_line(frame)];
        if let Some(symbol) = symbol {
            lines.push(self.symbol_line(frame, symbol));
        }
        lines
    }

    /// Resolve the frame's return address with `resolver`, then [`Self::format`].
    pub fn format_resolved<R: SymbolResolver + ?Sized>(&self, frame: &Frame, resolver: Option<&R>) -> Vec<String>
    {
        let symbol = resolver.and_then(|resolver| resolver.resolve(frame.return_address));
        self.format(frame, symbol.as_ref())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::symbols::{SymbolEntry, SymbolTable};
    use crate::types::Address;

    fn jos_frame() -> Frame
    {
        Frame {
            frame_pointer: Address::new(0xf010_9e58),
            return_address: Address::new(0xf010_0a62),
            arguments: [0x1, 0xf010_9e80, 0xf010_9e98, 0xf010_0ed2, 0x31],
        }
    }

    #[test]
    fn test_frame_line_x86()
    {
        let line = FrameFormatter::new(Architecture::X86).frame_line(&jos_frame());
        assert_eq!(
            line,
            "ebp f0109e58 eip f0100a62 args 00000001 f0109e80 f0109e98 f0100ed2 00000031 "
        );
    }

    #[test]
    fn test_frame_line_x86_64_width()
    {
        let line = FrameFormatter::new(Architecture::X86_64).frame_line(&jos_frame());
        assert!(line.starts_with("rbp 00000000f0109e58 rip 00000000f0100a62 args 0000000000000001 "));
    }

    #[test]
    fn test_frame_line_arm64_labels()
    {
        let line = FrameFormatter::new(Architecture::Arm64).frame_line(&jos_frame());
        assert!(line.starts_with("fp 00000000f0109e58 lr "));
    }

    #[test]
    fn test_symbol_line()
    {
        let start = Address::new(0x1000);
        let frame = Frame {
            frame_pointer: Address::new(0x8000),
            return_address: start + 16,
            arguments: [0; 5],
        };
        let symbol = SymbolInfo::new("foo.c", 42, "bar", start);
        let lines = FrameFormatter::new(Architecture::X86).format(&frame, Some(&symbol));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "foo.c:42: bar+16");
    }

    #[test]
    fn test_unresolved_frame_is_one_line()
    {
        let table = SymbolTable::new(vec![SymbolEntry::new("elsewhere", Address::new(0x10), 4)]);
        let lines = FrameFormatter::new(Architecture::X86).format_resolved(&jos_frame(), Some(&table));
        assert_eq!(lines.len(), 1);

        let lines = FrameFormatter::new(Architecture::X86).format_resolved::<SymbolTable>(&jos_frame(), None);
        assert_eq!(lines.len(), 1);
    }
}
