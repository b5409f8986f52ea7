//! Bring-up of a minimal TriCore board: physical memory map, CPU, boot image and entry point.

pub mod boot;
pub mod cpu;
pub mod error;
pub mod init;
pub mod log;
pub mod machine;
pub mod memory;
pub mod space;

pub use error::BoardError;
pub use init::{tricore_testboard_init, BoardState, BootInfo, InitError, MachineState, TestBoard};
pub use memory::{MemoryMap, MemoryRegion, TESTBOARD_MEMORY_MAP};
pub use space::{AddressSpace, SystemMemory};
