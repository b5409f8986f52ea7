use std::{io, path::PathBuf};

use thiserror::Error;

/// Everything that can stop a board from coming up.
///
/// None of these are recoverable: the inputs (a static table, a fixed file name) do not
/// change between attempts.
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("unknown CPU type `{name}`")]
    UnknownCpuType { name: String },

    #[error("unknown machine `{name}`")]
    UnknownMachine { name: String },

    #[error("region `{name}` is malformed: {reason}")]
    MalformedRegion { name: String, reason: String },

    #[error("region name `{name}` is used more than once")]
    DuplicateRegion { name: String },

    #[error("region `{name}` ({start:#010x}..={end:#010x}) overlaps region `{other}`")]
    RegionOverlap {
        name: String,
        other: String,
        start: u32,
        end: u32,
    },

    #[error("{len:#x} bytes at {addr:#010x} are not backed by any mounted region")]
    Unmapped { addr: u32, len: usize },

    #[error("failed to open boot image {}", .path.display())]
    BootImageOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read boot image {}", .path.display())]
    BootImageRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("boot image {} is too short: expected {expected:#x} bytes, got {actual:#x}", .path.display())]
    ShortBootImage {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
}
