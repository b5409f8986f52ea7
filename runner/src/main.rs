use color_eyre::{eyre::WrapErr, Result};
use log::LevelFilter;

mod args;
mod config;
use args::Args;
use board::{log::FileSink, machine, SystemMemory};
use config::Config;

const LOG_CAPACITY: usize = 128;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = argh::from_env();

    if args.list_machines {
        list_machines();
        return Ok(());
    }

    init_logging(&args)?;
    let result = run(&args);
    board::log::flush();
    result
}

fn list_machines() {
    println!("Supported machines are:");
    for m in machine::MACHINES {
        println!("{:<20} {} (default cpu: {})", m.name, m.desc, m.default_cpu_type);
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let file = match &args.logfile {
        Some(path) => Some(FileSink {
            file: std::fs::File::create(path)
                .wrap_err_with(|| format!("Couldn't create log file {}", path.display()))?,
            max_level: LevelFilter::Trace,
        }),
        None => None,
    };
    board::log::init(args.log_level, file, LOG_CAPACITY);
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?.merge_args(args);
    let machine_config = config.machine;

    let class = machine::find_machine(machine_config.machine_name())
        .wrap_err("Use --list-machines to see the available machines")?;
    let state = machine_config.machine_state(class)?;
    log::info!(
        "machine {} ({}), cpu {}, ram {:#x}",
        class.name,
        class.desc,
        state.cpu_type,
        state.ram_size
    );

    let mut sysmem = SystemMemory::new();
    let board = (class.init)(&state, &mut sysmem)
        .wrap_err_with(|| format!("Couldn't initialize machine `{}`", class.name))?;

    if args.info_mtree {
        print!("{}", sysmem.mtree());
    }

    let entry = sysmem
        .read_u32(board.cpu.pc())
        .wrap_err("Entry point is not backed by memory")?;
    println!(
        "{}: ready to run: cpu={} pc={:#010x} [{:08x}] psw={:#010x} ram_size={:#x}",
        class.name,
        board.cpu.type_name(),
        board.cpu.pc(),
        entry,
        board.cpu.registers().psw,
        board.binfo.ram_size
    );

    Ok(())
}
