use argh::FromArgs;
use log::LevelFilter;
use std::path::PathBuf;

#[derive(FromArgs, Debug, Clone)]
/// Bring up an emulated TriCore board and stop at its entry point.
pub struct Args {
    /// machine to bring up (default: tricore_testboard)
    #[argh(option)]
    pub machine: Option<String>,

    /// list the available machines and exit
    #[argh(switch)]
    pub list_machines: bool,

    /// CPU type (default: the machine's default CPU type)
    #[argh(option)]
    pub cpu: Option<String>,

    /// RAM size in MiB, or with a K/M/G/B suffix (default: 128M)
    #[argh(option, short = 'm')]
    pub memory: Option<String>,

    /// kernel image to record in the boot info
    #[argh(option)]
    pub kernel: Option<PathBuf>,

    /// directory holding sboot.bin (default: .)
    #[argh(option)]
    pub boot_dir: Option<PathBuf>,

    /// path to a TOML config file
    #[argh(option)]
    pub config: Option<PathBuf>,

    /// most verbose level written to stderr (default: info)
    #[argh(option, default = "LevelFilter::Info")]
    pub log_level: LevelFilter,

    /// also write the full log to this file
    #[argh(option, short = 'D')]
    pub logfile: Option<PathBuf>,

    /// print the address space once the board is up
    #[argh(switch)]
    pub info_mtree: bool,
}
