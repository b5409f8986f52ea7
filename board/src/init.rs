use std::path::PathBuf;

use thiserror::Error;

use crate::{
    boot::{load_boot_image, BootContract, BootImage},
    cpu::TriCoreCpu,
    error::BoardError,
    memory::{MemoryMap, TESTBOARD_MEMORY_MAP},
    space::AddressSpace,
};

/// Machine configuration handed to a board's init function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    pub cpu_type: String,
    pub ram_size: u64,
    pub kernel_filename: Option<PathBuf>,
    /// Directory the boot image is looked up in
    pub boot_dir: PathBuf,
}

/// Information recorded during bring-up for whatever runs after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootInfo {
    pub ram_size: u64,
    /// Not used by the boot path; `sboot.bin` is always what gets loaded.
    pub kernel_filename: Option<PathBuf>,
}

/// Progress of a board through bring-up. Transitions only go forward.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum BoardState {
    Uninitialized,
    CpuCreated,
    RegionsMounted,
    ImageLoaded,
    /// Ready to run.
    EntrySet,
}

/// Bring-up stopped. Everything done before `state` was reached is left in place.
#[derive(Error, Debug)]
#[error("board initialization failed after reaching {state:?}")]
pub struct InitError {
    pub state: BoardState,
    #[source]
    pub kind: BoardError,
}

/// A board that has completed bring-up.
#[derive(Debug)]
pub struct TestBoard {
    pub cpu: TriCoreCpu,
    pub binfo: BootInfo,
    pub image: BootImage,
    pub state: BoardState,
}

/// Init function of the `tricore_testboard` machine.
pub fn tricore_testboard_init(
    machine: &MachineState,
    sysmem: &mut dyn AddressSpace,
) -> Result<TestBoard, InitError> {
    initialize(
        machine,
        sysmem,
        &TESTBOARD_MEMORY_MAP,
        &BootContract::TESTBOARD,
    )
}

/// Creates the CPU, mounts every region of `map` into `sysmem`, loads the boot image and points
/// the CPU at its entry.
///
/// Running this twice against the same address space is not supported.
pub fn initialize<S>(
    machine: &MachineState,
    sysmem: &mut S,
    map: &MemoryMap<'_>,
    contract: &BootContract,
) -> Result<TestBoard, InitError>
where
    S: AddressSpace + ?Sized,
{
    let mut state = BoardState::Uninitialized;

    let mut cpu = TriCoreCpu::create(&machine.cpu_type).map_err(fail(state))?;
    advance(&mut state, BoardState::CpuCreated);
    log::info!("cpu: {}", cpu.type_name());

    let binfo = BootInfo {
        ram_size: machine.ram_size,
        kernel_filename: machine.kernel_filename.clone(),
    };

    map.validate().map_err(fail(state))?;
    for region in map {
        sysmem
            .mount(region.name, region.size, region.start)
            .map_err(fail(state))?;
    }
    advance(&mut state, BoardState::RegionsMounted);
    log::info!("mounted {} regions", map.len());

    let image = load_boot_image(sysmem, &machine.boot_dir, contract).map_err(fail(state))?;
    advance(&mut state, BoardState::ImageLoaded);

    cpu.set_pc(contract.entry);
    advance(&mut state, BoardState::EntrySet);
    log::info!("entry point {:#010x}", cpu.pc());

    Ok(TestBoard {
        cpu,
        binfo,
        image,
        state,
    })
}

fn advance(state: &mut BoardState, next: BoardState) {
    log::debug!("{:?} -> {next:?}", *state);
    *state = next;
}

fn fail(state: BoardState) -> impl FnOnce(BoardError) -> InitError {
    move |kind| InitError { state, kind }
}
