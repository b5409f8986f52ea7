use std::{collections::BTreeMap, fmt::Write, path::PathBuf};

use bitflags::bitflags;
use spin::Mutex;

use crate::error::BoardError;

pub const PAGE_SIZE: usize = 4096;

bitflags! {
    /// Access protection requested for a load. Not enforced by [`SystemMemory`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Prot: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXEC = 1 << 2;
    }
}

bitflags! {
    /// Mapping behaviour requested for a load. Not enforced by [`SystemMemory`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MapFlags: u32 {
        const SHARED = 1 << 0;
        const PRIVATE = 1 << 1;
        const FIXED = 1 << 2;
    }
}

/// Where the bytes of a load came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSource {
    pub path: PathBuf,
    pub offset: u64,
}

/// The physical address space of an emulated machine.
pub trait AddressSpace {
    /// Create a zero-filled RAM block of `size` bytes called `name` and install it at `base`.
    fn mount(&mut self, name: &str, size: u32, base: u32) -> Result<(), BoardError>;

    /// Copy `data` into mounted storage starting at `addr`.
    fn load_bytes(
        &mut self,
        addr: u32,
        data: &[u8],
        prot: Prot,
        flags: MapFlags,
        source: &LoadSource,
    ) -> Result<(), BoardError>;

    fn read_bytes(&self, addr: u32, buf: &mut [u8]) -> Result<(), BoardError>;

    fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<(), BoardError>;
}

/// Anonymous RAM installed at a fixed physical base.
///
/// Pages are only allocated once something writes to them; untouched pages read back as zero.
pub struct RamBlock {
    name: String,
    base: u32,
    size: u32,
    pages: Mutex<BTreeMap<usize, Box<[u8; PAGE_SIZE]>>>,
}

impl RamBlock {
    fn new(name: &str, base: u32, size: u32) -> Self {
        RamBlock {
            name: name.into(),
            base,
            size,
            pages: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Physical address of the last byte of the block
    pub fn end(&self) -> u32 {
        self.base + (self.size - 1)
    }

    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.base && addr - self.base < self.size
    }

    /// Number of pages that have been written to.
    pub fn resident_pages(&self) -> usize {
        self.pages.lock().len()
    }

    /// Bytes between `addr` and the end of the block.
    fn remaining(&self, addr: u32) -> usize {
        (self.size - (addr - self.base)) as usize
    }

    fn read(&self, offset: usize, buf: &mut [u8]) {
        let pages = self.pages.lock();
        let mut done = 0;
        while done < buf.len() {
            let at = offset + done;
            let page_offset = at % PAGE_SIZE;
            let len = (PAGE_SIZE - page_offset).min(buf.len() - done);
            let chunk = &mut buf[done..done + len];
            match pages.get(&(at / PAGE_SIZE)) {
                Some(page) => chunk.copy_from_slice(&page[page_offset..page_offset + len]),
                None => chunk.fill(0),
            }
            done += len;
        }
    }

    fn write(&self, offset: usize, data: &[u8]) {
        let mut pages = self.pages.lock();
        let mut done = 0;
        while done < data.len() {
            let at = offset + done;
            let page_offset = at % PAGE_SIZE;
            let len = (PAGE_SIZE - page_offset).min(data.len() - done);

            log::trace!(
                "{}: page {:#x} off {page_offset:#x} len {len:#x}",
                self.name,
                at / PAGE_SIZE
            );

            let page = pages
                .entry(at / PAGE_SIZE)
                .or_insert_with(|| Box::new([0; PAGE_SIZE]));
            page[page_offset..page_offset + len].copy_from_slice(&data[done..done + len]);
            done += len;
        }
    }
}

impl core::fmt::Debug for RamBlock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RamBlock")
            .field("name", &self.name)
            .field("base", &format_args!("{:#010x}", self.base))
            .field("size", &format_args!("{:#x}", self.size))
            .finish_non_exhaustive()
    }
}

/// In-memory physical address space made of [`RamBlock`]s.
#[derive(Debug, Default)]
pub struct SystemMemory {
    /// Sorted by base address
    blocks: Vec<RamBlock>,
}

impl SystemMemory {
    pub fn new() -> Self {
        SystemMemory { blocks: Vec::new() }
    }

    pub fn regions(&self) -> &[RamBlock] {
        &self.blocks
    }

    pub fn region_at(&self, addr: u32) -> Option<&RamBlock> {
        self.blocks.iter().find(|b| b.contains(addr))
    }

    /// Reads a little-endian word.
    pub fn read_u32(&self, addr: u32) -> Result<u32, BoardError> {
        let mut word = [0u8; 4];
        self.read_bytes(addr, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    /// Text dump of every mounted block, one per line.
    pub fn mtree(&self) -> String {
        let mut out = String::from("address-space: memory\n");
        for b in &self.blocks {
            let _ = writeln!(
                out,
                "  {:016x}-{:016x} (prio 0, ram): {}",
                b.base,
                b.end(),
                b.name
            );
        }
        out
    }

    /// Splits `[addr, addr + len)` into per-block pieces and hands each one to `f` together with
    /// its offset into the block and into the caller's buffer.
    fn for_each_chunk<F>(&self, addr: u32, len: usize, mut f: F) -> Result<(), BoardError>
    where
        F: FnMut(&RamBlock, usize, core::ops::Range<usize>),
    {
        let mut done = 0;
        while done < len {
            let unmapped = || BoardError::Unmapped {
                addr: addr.wrapping_add(done as u32),
                len: len - done,
            };
            let at = u32::try_from(addr as u64 + done as u64).map_err(|_| unmapped())?;
            let block = self.region_at(at).ok_or_else(unmapped)?;
            let chunk = block.remaining(at).min(len - done);
            f(block, (at - block.base) as usize, done..done + chunk);
            done += chunk;
        }
        Ok(())
    }
}

impl AddressSpace for SystemMemory {
    fn mount(&mut self, name: &str, size: u32, base: u32) -> Result<(), BoardError> {
        if size == 0 {
            return Err(BoardError::MalformedRegion {
                name: name.into(),
                reason: "size is zero".into(),
            });
        }
        let end = base.checked_add(size - 1).ok_or_else(|| BoardError::MalformedRegion {
            name: name.into(),
            reason: format!("{size:#x} bytes at {base:#010x} run past the 32-bit address space"),
        })?;

        if let Some(other) = self
            .blocks
            .iter()
            .find(|b| base <= b.end() && b.base <= end)
        {
            return Err(BoardError::RegionOverlap {
                name: name.into(),
                other: other.name.clone(),
                start: base,
                end,
            });
        }

        log::debug!("mount {name} at {base:#010x}..={end:#010x} ({size:#x} bytes)");

        let at = self.blocks.partition_point(|b| b.base < base);
        self.blocks.insert(at, RamBlock::new(name, base, size));
        Ok(())
    }

    fn load_bytes(
        &mut self,
        addr: u32,
        data: &[u8],
        prot: Prot,
        flags: MapFlags,
        source: &LoadSource,
    ) -> Result<(), BoardError> {
        log::debug!(
            "load {:#x} bytes from {}+{:#x} at {addr:#010x} (prot {prot:?}, flags {flags:?})",
            data.len(),
            source.path.display(),
            source.offset
        );
        self.write_bytes(addr, data)
    }

    fn read_bytes(&self, addr: u32, buf: &mut [u8]) -> Result<(), BoardError> {
        let len = buf.len();
        self.for_each_chunk(addr, len, |block, offset, range| {
            block.read(offset, &mut buf[range])
        })
    }

    fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<(), BoardError> {
        // Check the whole range first so a failed write leaves memory untouched
        self.for_each_chunk(addr, data.len(), |_, _, _| ())?;
        self.for_each_chunk(addr, data.len(), |block, offset, range| {
            block.write(offset, &data[range])
        })
    }
}
