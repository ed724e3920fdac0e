//! ELF image parsing and DWARF line lookup.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use addr2line::Context;
use gimli::{Dwarf, EndianArcSlice, RunTimeEndian, SectionId};
use object::{Object, ObjectSection, ObjectSegment, ObjectSymbol, SymbolKind};
use once_cell::unsync::OnceCell;
use tracing::{debug, info};

use super::demangle::{display_name, map_dwarf_error};
use super::table::{SymbolEntry, SymbolTable};
use super::SymbolResolver;
use crate::error::{MonitorError, MonitorResult};
use crate::layout::KernelLayout;
use crate::types::{parse_maps, Address, SymbolInfo};

type OwnedReader = EndianArcSlice<RunTimeEndian>;

/// Linker symbols reported by `kerninfo`, with the aliases tried for each.
const LAYOUT_SYMBOLS: &[(&str, &[&str])] = &[
    ("_start", &["_start"]),
    ("etext", &["etext", "_etext", "__etext"]),
    ("edata", &["edata", "_edata"]),
    ("end", &["end", "_end"]),
];

/// An executable image loaded for symbolication.
///
/// Function names and start addresses come from the ELF symbol tables; file
/// and line come from the DWARF line program, parsed on first use.
pub struct ElfImage
{
    path: PathBuf,
    endian: RunTimeEndian,
    slide: i64,
    entry: u64,
    functions: SymbolTable,
    layout_symbols: HashMap<&'static str, u64>,
    debug_sections: HashMap<String, Arc<[u8]>>,
    context_cache: OnceCell<Context<OwnedReader>>,
}

impl ElfImage
{
    /// Parse the image at `path`.
    ///
    /// `load_address` is where the lowest loadable segment is mapped at run
    /// time; `None` means the image runs at its link addresses.
    ///
    /// ## Errors
    ///
    /// Returns [`MonitorError::Io`] if the file cannot be read and
    /// [`MonitorError::Symbols`] if it is not a parsable object file.
    pub fn load(path: impl Into<PathBuf>, load_address: Option<Address>) -> MonitorResult<Self>
    {
        let path = path.into();
        let bytes = fs::read(&path)?;
        let file = object::File::parse(&*bytes)
            .map_err(|err| MonitorError::Symbols(format!("failed to parse {}: {err}", path.display())))?;

        let endian = if file.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        };

        let link_base = file.segments().map(|segment| segment.address()).min().unwrap_or(0);
        #[allow(clippy::cast_possible_wrap)]
        let slide = load_address.map_or(0, |load| load.value().wrapping_sub(link_base) as i64);

        let mut entries = Vec::new();
        let mut layout_symbols = HashMap::new();
        for symbol in file.symbols().chain(file.dynamic_symbols()) {
            let Ok(raw) = symbol.name() else {
                continue;
            };

            for (key, aliases) in LAYOUT_SYMBOLS {
                if aliases.contains(&raw) {
                    layout_symbols.entry(*key).or_insert(symbol.address());
                }
            }

            if symbol.kind() == SymbolKind::Text && symbol.is_definition() && symbol.address() != 0 {
                // Unsized symbols such as `_init`/`_fini` end with their section.
                let size = match symbol.size() {
                    0 => symbol
                        .section_index()
                        .and_then(|index| file.section_by_index(index).ok())
                        .map_or(0, |section| {
                            section.address().saturating_add(section.size()).saturating_sub(symbol.address())
                        }),
                    size => size,
                };
                if size == 0 {
                    continue;
                }
                entries.push(SymbolEntry::new(display_name(raw), Address::new(symbol.address()), size));
            }
        }

        let mut debug_sections = HashMap::new();
        for section in file.sections() {
            let Ok(name) = section.name() else {
                continue;
            };
            if !name.starts_with(".debug_") {
                continue;
            }
            let data = section
                .uncompressed_data()
                .map_err(|err| MonitorError::Symbols(format!("failed to read {name}: {err}")))?;
            let data: Arc<[u8]> = match data {
                Cow::Borrowed(bytes) => Arc::from(bytes),
                Cow::Owned(vec) => vec.into(),
            };
            debug_sections.insert(name.to_string(), data);
        }

        let functions = SymbolTable::new(entries);
        info!(
            path = %path.display(),
            functions = functions.len(),
            debug_sections = debug_sections.len(),
            slide,
            "loaded symbol image"
        );

        Ok(Self {
            path,
            endian,
            slide,
            entry: file.entry(),
            functions,
            layout_symbols,
            debug_sections,
            context_cache: OnceCell::new(),
        })
    }

    /// Load the running executable, relocated to where it is mapped.
    ///
    /// ## Errors
    ///
    /// Fails when the executable path is unknown or the file cannot be parsed.
    pub fn for_current_exe() -> MonitorResult<Self>
    {
        let path = std::env::current_exe()?;
        let load_address = fs::read_to_string("/proc/self/maps").ok().and_then(|maps| {
            parse_maps(&maps)
                .into_iter()
                .find(|region| region.offset == 0 && region.name.as_deref().map(Path::new) == Some(path.as_path()))
                .map(|region| region.start)
        });
        debug!(path = %path.display(), load_address = ?load_address, "loading symbols for running executable");
        Self::load(path, load_address)
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    /// Number of functions known to the image.
    pub fn function_count(&self) -> usize
    {
        self.functions.len()
    }

    fn to_runtime(&self, link_address: u64) -> Address
    {
        Address::new(link_address.wrapping_add_signed(self.slide))
    }

    fn to_link(&self, address: Address) -> u64
    {
        address.value().wrapping_add_signed(self.slide.wrapping_neg())
    }

    fn section_reader(&self, id: SectionId) -> OwnedReader
    {
        let data = self
            .debug_sections
            .get(id.name())
            .cloned()
            .unwrap_or_else(|| Arc::<[u8]>::from(Vec::new()));
        EndianArcSlice::new(data, self.endian)
    }

    fn symbol_context(&self) -> MonitorResult<&Context<OwnedReader>>
    {
        self.context_cache.get_or_try_init(|| {
            let dwarf = Dwarf::load(|section| Ok::<_, gimli::Error>(self.section_reader(section)))
                .map_err(|err| map_dwarf_error("failed to load DWARF", err))?;
            Context::from_dwarf(dwarf).map_err(|err| map_dwarf_error("failed to build addr2line context", err))
        })
    }

    /// File and line of a link-time address, when the line program covers it.
    fn location(&self, link_address: u64) -> Option<(String, u32)>
    {
        let context = match self.symbol_context() {
            Ok(context) => context,
            Err(err) => {
                debug!(error = %err, "line information unavailable");
                return None;
            }
        };
        let location = context.find_location(link_address).ok()??;
        Some((location.file?.to_string(), location.line.unwrap_or(0)))
    }

    /// Special linker symbols and the entry point, relocated, with `kernbase`.
    pub fn kernel_layout(&self, kernbase: Address) -> KernelLayout
    {
        let symbol = |key: &str| self.layout_symbols.get(key).map(|value| self.to_runtime(*value));
        KernelLayout {
            start: symbol("_start"),
            entry: (self.entry != 0).then(|| self.to_runtime(self.entry)),
            etext: symbol("etext"),
            edata: symbol("edata"),
            end: symbol("end"),
            kernbase,
        }
    }
}

impl SymbolResolver for ElfImage
{
    fn resolve(&self, address: Address) -> Option<SymbolInfo>
    {
        let link_address = self.to_link(address);
        let function = self.functions.lookup(Address::new(link_address))?;
        let (file, line) = self
            .location(link_address)
            .unwrap_or_else(|| ("<unknown>".to_string(), 0));

        Some(SymbolInfo::new(
            file,
            line,
            function.name.clone(),
            self.to_runtime(function.start.value()),
        ))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[inline(never)]
    fn probe_target() -> usize
    {
        std::hint::black_box(7)
    }

    #[test]
    fn test_resolve_own_function()
    {
        let Ok(image) = ElfImage::for_current_exe() else {
            return;
        };
        if image.function_count() == 0 {
            return;
        }

        let address = Address::new(probe_target as usize as u64);
        let info = image.resolve(address).unwrap();
        assert!(info.function_name.contains("probe_target"), "{}", info.function_name);
        assert_eq!(info.function_start, address);
        assert_eq!(info.offset_of(address), 0);
    }

    #[test]
    fn test_resolve_unknown_address()
    {
        let Ok(image) = ElfImage::for_current_exe() else {
            return;
        };
        assert!(image.resolve(Address::new(0x10)).is_none());
    }

    #[test]
    fn test_resolve_outside_image()
    {
        let Ok(image) = ElfImage::for_current_exe() else {
            return;
        };
        // A stack address is never inside the executable's text.
        let local = 0u64;
        let address = Address::new(std::ptr::addr_of!(local) as u64);
        assert!(image.resolve(address).is_none());
        assert!(image.resolve(Address::new(u64::MAX - 0xfff)).is_none());
    }

    #[test]
    fn test_loaded_functions_are_bounded()
    {
        let Ok(image) = ElfImage::for_current_exe() else {
            return;
        };
        assert!(image.functions.entries().iter().all(|entry| entry.size > 0));
    }

    #[test]
    fn test_load_missing_file()
    {
        let result = ElfImage::load("/nonexistent/kmon-image", None);
        assert!(matches!(result, Err(MonitorError::Io(_))));
    }

    #[test]
    fn test_load_rejects_non_object()
    {
        let path = std::env::temp_dir().join(format!("kmon-not-elf-{}", std::process::id()));
        fs::write(&path, b"definitely not an object file").unwrap();
        let result = ElfImage::load(&path, None);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(MonitorError::Symbols(_))));
    }

    #[test]
    fn test_kernel_layout_has_entry()
    {
        let Ok(image) = ElfImage::for_current_exe() else {
            return;
        };
        let layout = image.kernel_layout(Address::ZERO);
        assert!(layout.entry.is_some());
    }
}
