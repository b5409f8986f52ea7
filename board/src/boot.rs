use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use crate::{
    error::BoardError,
    space::{AddressSpace, LoadSource, MapFlags, Prot},
};

/// Name of the boot image, resolved relative to the board's boot directory.
pub const SBOOT_FILENAME: &str = "sboot.bin";
/// Physical address the boot image is copied to. Start of `PMU0`.
pub const SBOOT_START: u32 = 0x8000_0000;
/// Number of bytes loaded from the boot image.
pub const SBOOT_SIZE: usize = 0x8000;
/// First instruction executed. The first 0x20 bytes of the image are a reserved header.
pub const ENTRY_POINT: u32 = 0x8000_0020;

/// Where the boot image comes from, where it goes, and where execution starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootContract {
    pub filename: &'static str,
    pub load_addr: u32,
    pub size: usize,
    pub entry: u32,
}

impl BootContract {
    pub const TESTBOARD: BootContract = BootContract {
        filename: SBOOT_FILENAME,
        load_addr: SBOOT_START,
        size: SBOOT_SIZE,
        entry: ENTRY_POINT,
    };
}

impl Default for BootContract {
    fn default() -> Self {
        Self::TESTBOARD
    }
}

/// Describes a boot image that has been copied into the address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootImage {
    pub path: PathBuf,
    pub load_addr: u32,
    pub len: usize,
}

/// Copies the first `contract.size` bytes of `dir/contract.filename` to `contract.load_addr`.
///
/// A file shorter than `contract.size` is an error; anything past it is ignored.
pub fn load_boot_image<S>(
    sysmem: &mut S,
    dir: &Path,
    contract: &BootContract,
) -> Result<BootImage, BoardError>
where
    S: AddressSpace + ?Sized,
{
    let path = dir.join(contract.filename);

    let file = File::open(&path).map_err(|source| BoardError::BootImageOpen {
        path: path.clone(),
        source,
    })?;

    let mut buf = Vec::with_capacity(contract.size);
    file.take(contract.size as u64)
        .read_to_end(&mut buf)
        .map_err(|source| BoardError::BootImageRead {
            path: path.clone(),
            source,
        })?;
    if buf.len() < contract.size {
        return Err(BoardError::ShortBootImage {
            path,
            expected: contract.size,
            actual: buf.len(),
        });
    }

    let source = LoadSource { path, offset: 0 };
    sysmem.load_bytes(
        contract.load_addr,
        &buf,
        Prot::empty(),
        MapFlags::empty(),
        &source,
    )?;

    log::info!(
        "loaded {} ({:#x} bytes) at {:#010x}",
        source.path.display(),
        buf.len(),
        contract.load_addr
    );

    Ok(BootImage {
        path: source.path,
        load_addr: contract.load_addr,
        len: buf.len(),
    })
}
