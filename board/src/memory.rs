use core::fmt;

use crate::error::BoardError;

/// Describes one region of the board's physical address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    /// Unique within a table. Also names the RAM block backing the region.
    pub name: &'static str,
    /// Physical address of the first byte of the region
    pub start: u32,
    /// Physical address of the last byte of the region
    pub end: u32,
    /// Length in bytes of the region. Always `end - start + 1`.
    pub size: u32,
}

impl MemoryRegion {
    pub fn contains(&self, addr: u32) -> bool {
        (self.start..=self.end).contains(&addr)
    }

    pub fn overlaps(&self, other: &MemoryRegion) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    fn check(&self) -> Result<(), BoardError> {
        let malformed = |reason: String| BoardError::MalformedRegion {
            name: self.name.into(),
            reason,
        };
        if self.size == 0 {
            return Err(malformed("size is zero".into()));
        }
        if self.end < self.start {
            return Err(malformed(format!(
                "end {:#010x} is below start {:#010x}",
                self.end, self.start
            )));
        }
        let span = self.end - self.start;
        if span.checked_add(1) != Some(self.size) {
            return Err(malformed(format!(
                "size is {:#x} but {:#010x}..={:#010x} spans {:#x} bytes",
                self.size,
                self.start,
                self.end,
                span as u64 + 1
            )));
        }
        Ok(())
    }
}

/// An ordered table of [`MemoryRegion`]s, presented low address first.
#[derive(Debug, Clone, Copy)]
pub struct MemoryMap<'a> {
    regions: &'a [MemoryRegion],
}

impl<'a> MemoryMap<'a> {
    pub const fn new(regions: &'a [MemoryRegion]) -> Self {
        MemoryMap { regions }
    }

    pub fn regions(&self) -> &'a [MemoryRegion] {
        self.regions
    }

    pub fn iter(&self) -> core::slice::Iter<'a, MemoryRegion> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&'a MemoryRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Checks the authoring invariants of the table and returns the first violation.
    ///
    /// Every region must be non-empty with `size == end - start + 1`, names must be unique and no
    /// two regions may share an address.
    pub fn validate(&self) -> Result<(), BoardError> {
        for region in self.regions {
            region.check()?;
        }

        for (i, a) in self.regions.iter().enumerate() {
            for b in &self.regions[i + 1..] {
                if a.name == b.name {
                    return Err(BoardError::DuplicateRegion {
                        name: b.name.into(),
                    });
                }
                if a.overlaps(b) {
                    return Err(BoardError::RegionOverlap {
                        name: b.name.into(),
                        other: a.name.into(),
                        start: b.start,
                        end: b.end,
                    });
                }
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &MemoryMap<'a> {
    type Item = &'a MemoryRegion;
    type IntoIter = core::slice::Iter<'a, MemoryRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for MemoryMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in self.regions {
            writeln!(
                f,
                "{:08x}-{:08x} ({:#x}): {}",
                r.start, r.end, r.size, r.name
            )?;
        }
        Ok(())
    }
}

macro_rules! regions {
    ($($name:literal: $start:literal ..= $end:literal, $size:literal;)*) => {
        [$(MemoryRegion {
            name: $name,
            start: $start,
            end: $end,
            size: $size,
        }),*]
    };
}

static TESTBOARD_REGIONS: [MemoryRegion; 15] = regions! {
    "CPU2_DSPR": 0x5000_0000 ..= 0x5001_DFFF, 0x1_E000;
    "CPU2_DCACHE": 0x5001_E000 ..= 0x5001_FFFF, 0x2000;
    "CPU2_PSPR": 0x5010_0000 ..= 0x5010_7FFF, 0x8000;
    "CPU2_PCACHE": 0x5010_8000 ..= 0x5010_BFFF, 0x4000;

    "CPU1_DSPR": 0x6000_0000 ..= 0x6001_DFFF, 0x1_E000;
    "CPU1_DCACHE": 0x6001_E000 ..= 0x6001_FFFF, 0x2000;
    "CPU1_PSPR": 0x6010_0000 ..= 0x6010_7FFF, 0x8000;
    "CPU1_PCACHE": 0x6010_8000 ..= 0x6010_BFFF, 0x4000;

    "CPU0_DSPR": 0x7000_0000 ..= 0x7001_DFFF, 0x1_E000;
    "CPU0_PSPR": 0x7010_0000 ..= 0x7010_5FFF, 0x6000;
    "CPU0_PCACHE": 0x7010_6000 ..= 0x7010_7FFF, 0x2000;

    "PMU0": 0x8000_0000 ..= 0x801F_FFFF, 0x20_0000;
    "PMU1": 0x8020_0000 ..= 0x803F_FFFF, 0x20_0000;

    "DF0": 0xAF00_0000 ..= 0xAF0F_FFFF, 0x10_0000;

    "PERIPHERAL": 0xF000_0000 ..= 0xFFFF_FFFF, 0x1000_0000;
};

/// Physical memory map of the TriCore test board: scratchpads and caches of the three cores,
/// program flash, data flash and the peripheral window.
pub static TESTBOARD_MEMORY_MAP: MemoryMap<'static> = MemoryMap::new(&TESTBOARD_REGIONS);
