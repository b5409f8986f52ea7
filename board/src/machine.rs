use std::path::PathBuf;

use crate::{
    error::BoardError,
    init::{tricore_testboard_init, InitError, MachineState, TestBoard},
    space::AddressSpace,
};

pub type MachineInitFn = fn(&MachineState, &mut dyn AddressSpace) -> Result<TestBoard, InitError>;

/// A board that can be selected by name.
pub struct MachineClass {
    pub name: &'static str,
    pub desc: &'static str,
    pub default_cpu_type: &'static str,
    pub init: MachineInitFn,
}

impl core::fmt::Debug for MachineClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MachineClass")
            .field("name", &self.name)
            .field("desc", &self.desc)
            .field("default_cpu_type", &self.default_cpu_type)
            .finish_non_exhaustive()
    }
}

impl MachineClass {
    /// Machine configuration with this board's defaults, looking for the boot image in the
    /// working directory.
    pub fn machine_state(&self, ram_size: u64) -> MachineState {
        MachineState {
            cpu_type: self.default_cpu_type.into(),
            ram_size,
            kernel_filename: None,
            boot_dir: PathBuf::from("."),
        }
    }
}

pub static TRICORE_TESTBOARD: MachineClass = MachineClass {
    name: "tricore_testboard",
    desc: "a minimal TriCore board",
    default_cpu_type: "tc27x-tricore-cpu",
    init: tricore_testboard_init,
};

pub static MACHINES: &[&MachineClass] = &[&TRICORE_TESTBOARD];

pub fn find_machine(name: &str) -> Result<&'static MachineClass, BoardError> {
    MACHINES
        .iter()
        .copied()
        .find(|m| m.name == name)
        .ok_or_else(|| BoardError::UnknownMachine { name: name.into() })
}
