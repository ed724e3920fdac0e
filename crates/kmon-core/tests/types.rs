//! Tests for platform-agnostic types

use kmon_core::types::{parse_maps, Address, Architecture, MemoryRegion, StackBounds, SymbolInfo, TrapFrame};

#[test]
fn test_address_from_u64()
{
    let addr = Address::from(0xf010_0000);
    assert_eq!(addr.value(), 0xf010_0000);
    assert_eq!(u64::from(addr), 0xf010_0000);
}

#[test]
fn test_address_display()
{
    assert_eq!(Address::new(0x1234).to_string(), "0x0000000000001234");
    assert_eq!(format!("{:08x}", Address::new(0x1234)), "00001234");
}

#[test]
fn test_address_zero_sentinel()
{
    assert!(Address::ZERO.is_zero());
    assert!(Address::default().is_zero());
    assert!(!Address::new(4).is_zero());
}

#[test]
fn test_architecture_labels()
{
    assert_eq!(Architecture::X86.frame_pointer_label(), "ebp");
    assert_eq!(Architecture::X86.return_address_label(), "eip");
    assert_eq!(Architecture::X86_64.frame_pointer_label(), "rbp");
    assert_eq!(Architecture::X86_64.return_address_label(), "rip");
    assert_eq!(Architecture::Arm64.frame_pointer_label(), "fp");
    assert_eq!(Architecture::Arm64.return_address_label(), "lr");
}

#[test]
fn test_architecture_word_sizes()
{
    assert_eq!(Architecture::X86.word_size(), 4);
    assert_eq!(Architecture::X86.hex_width(), 8);
    assert_eq!(Architecture::X86_64.word_size(), 8);
    assert_eq!(Architecture::Arm64.hex_width(), 16);
    assert_eq!(Architecture::X86.truncate(0x1_2345_6789), 0x2345_6789);
}

#[test]
fn test_stack_bounds_contains()
{
    let bounds = StackBounds::new(Address::new(0x1000), Address::new(0x2000));
    assert_eq!(bounds.size(), 0x1000);
    assert!(bounds.contains(Address::new(0x1000)));
    assert!(bounds.contains(Address::new(0x1fff)));
    assert!(!bounds.contains(Address::new(0x2000)));
}

#[test]
fn test_trap_frame_builder()
{
    let tf = TrapFrame::new(Architecture::X86_64)
        .with_pc(Address::new(0x40_1000))
        .with_sp(Address::new(0x7fff_0000))
        .with_fp(Address::new(0x7fff_0010));
    assert_eq!(tf.pc, Address::new(0x40_1000));
    assert_eq!(tf.sp, Address::new(0x7fff_0000));
    assert_eq!(tf.fp, Address::new(0x7fff_0010));
    assert_eq!(tf.architecture, Architecture::X86_64);
}

#[test]
fn test_symbol_info_offset()
{
    let info = SymbolInfo::new("foo.c", 42, "bar", Address::new(0x1000));
    assert_eq!(info.offset_of(Address::new(0x1010)), 16);
}

#[test]
fn test_memory_region_parse()
{
    let region: MemoryRegion = "7ffc4a6d1000-7ffc4a6f2000 rw-p 00000000 00:00 0 [stack]".parse().unwrap();
    assert_eq!(region.start, Address::new(0x7ffc_4a6d_1000));
    assert_eq!(region.end, Address::new(0x7ffc_4a6f_2000));
    assert_eq!(region.size(), 0x21000);
    assert!(region.is_readable());
    assert!(region.is_writable());
    assert_eq!(region.name.as_deref(), Some("[stack]"));
}

#[test]
fn test_memory_region_path_with_spaces()
{
    let region: MemoryRegion = "00400000-00452000 r-xp 00001000 08:02 173521 /opt/my tools/kmon"
        .parse()
        .unwrap();
    assert_eq!(region.offset, 0x1000);
    assert!(!region.is_writable());
    assert_eq!(region.name.as_deref(), Some("/opt/my tools/kmon"));
}

#[test]
fn test_memory_region_malformed()
{
    assert!("not a mapping".parse::<MemoryRegion>().is_err());
    assert!("1000-zz r--p 0 00:00 0".parse::<MemoryRegion>().is_err());
}

#[test]
fn test_parse_maps_skips_bad_lines()
{
    let listing = "\
00400000-00452000 r-xp 00000000 08:02 173521 /usr/bin/kmon
garbage
7ffc4a6d1000-7ffc4a6f2000 rw-p 00000000 00:00 0 [stack]
";
    let regions = parse_maps(listing);
    assert_eq!(regions.len(), 2);
    assert!(regions[1].contains(Address::new(0x7ffc_4a6d_2000)));
    assert_eq!(regions[1].bounds().high, Address::new(0x7ffc_4a6f_2000));
}

#[test]
fn test_memory_region_equality()
{
    let a = MemoryRegion::new(Address::new(0x1000), Address::new(0x2000), "rw-p", 0, None);
    let b = a.clone();
    assert_eq!(a, b);
}
