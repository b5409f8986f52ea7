use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::args::Args;
use board::{machine::MachineClass, MachineState};

pub const DEFAULT_MACHINE: &str = "tricore_testboard";
pub const DEFAULT_RAM_SIZE: &str = "128M";

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub machine: MachineConfig,
}

/// Every key is optional; command-line arguments take precedence.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MachineConfig {
    /// Name of the machine to bring up
    pub name: Option<String>,
    /// CPU type name
    pub cpu: Option<String>,
    /// RAM size, e.g. `"128M"`
    pub memory: Option<String>,
    /// Recorded in the boot info
    pub kernel: Option<PathBuf>,
    /// Directory holding the boot image
    pub boot_dir: Option<PathBuf>,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads the config file at `path`, or returns the defaults if there is none.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Couldn't read config file {}", path.display()))?;
        Config::parse(&text).wrap_err_with(|| format!("Invalid config file {}", path.display()))
    }

    /// Overlays the command-line arguments on top of the file's values.
    pub fn merge_args(mut self, args: &Args) -> Self {
        let m = &mut self.machine;
        if args.machine.is_some() {
            m.name = args.machine.clone();
        }
        if args.cpu.is_some() {
            m.cpu = args.cpu.clone();
        }
        if args.memory.is_some() {
            m.memory = args.memory.clone();
        }
        if args.kernel.is_some() {
            m.kernel = args.kernel.clone();
        }
        if args.boot_dir.is_some() {
            m.boot_dir = args.boot_dir.clone();
        }
        self
    }
}

impl MachineConfig {
    pub fn machine_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_MACHINE)
    }

    /// Fills the gaps with the defaults of `class`.
    pub fn machine_state(&self, class: &MachineClass) -> Result<MachineState> {
        let ram_size = parse_size(self.memory.as_deref().unwrap_or(DEFAULT_RAM_SIZE))?;
        let mut state = class.machine_state(ram_size);
        if let Some(cpu) = &self.cpu {
            state.cpu_type = cpu.clone();
        }
        state.kernel_filename = self.kernel.clone();
        if let Some(dir) = &self.boot_dir {
            state.boot_dir = dir.clone();
        }
        Ok(state)
    }
}

/// Parses a memory size with an optional binary suffix: `64K`, `128M`, `1G`, `4096B`.
/// A bare number without a suffix is taken as mebibytes, matching the way emulators read `-m`.
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim();
    let (digits, shift) = match s.char_indices().last() {
        Some((i, 'k' | 'K')) => (&s[..i], 10),
        Some((i, 'm' | 'M')) => (&s[..i], 20),
        Some((i, 'g' | 'G')) => (&s[..i], 30),
        Some((i, 'b' | 'B')) => (&s[..i], 0),
        Some(_) => (s, 20),
        None => return Err(eyre!("empty size")),
    };
    let n: u64 = digits
        .trim()
        .parse()
        .map_err(|e| eyre!("invalid size `{s}`: {e}"))?;
    n.checked_shl(shift)
        .filter(|v| v >> shift == n)
        .ok_or_else(|| eyre!("size `{s}` is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn sizes() {
        assert_eq!(parse_size("128M").unwrap(), 128 << 20);
        assert_eq!(parse_size("64k").unwrap(), 64 << 10);
        assert_eq!(parse_size("2G").unwrap(), 2 << 30);
        assert_eq!(parse_size("512").unwrap(), 512 << 20);
        assert_eq!(parse_size("4096").unwrap(), 4096 << 20);
        assert_eq!(parse_size("100B").unwrap(), 100);
    }

    #[test]
    fn bare_sizes_grow_with_the_number() {
        let mut last = 0;
        for n in [1u64, 2, 4095, 4096, 4097, 65536] {
            let size = parse_size(&n.to_string()).unwrap();
            assert_eq!(size, n << 20);
            assert!(size > last, "`{n}` gave {size:#x}, less than {last:#x}");
            last = size;
        }
    }

    #[test]
    fn bad_sizes() {
        assert!(parse_size("").is_err());
        assert!(parse_size("M").is_err());
        assert!(parse_size("twelve").is_err());
        assert!(parse_size("-1M").is_err());
        assert!(parse_size("99999999999G").is_err());
    }

    #[test]
    fn parse_config_file() {
        let config = Config::parse(
            r#"
            [machine]
            name = "tricore_testboard"
            cpu = "tc1797"
            memory = "2M"
            boot_dir = "images"
            "#,
        )
        .unwrap();

        let class = board::machine::find_machine(config.machine.machine_name()).unwrap();
        let state = config.machine.machine_state(class).unwrap();
        assert_eq!(state.cpu_type, "tc1797");
        assert_eq!(state.ram_size, 2 << 20);
        assert_eq!(state.boot_dir, PathBuf::from("images"));
        assert_eq!(state.kernel_filename, None);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = TempDir::new("tricore-runner").unwrap();
        let path = dir.path().join("board.toml");
        std::fs::write(&path, "[machine]\ncpu = \"tc37x\"\nkernel = \"vmlinux\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.machine.cpu.as_deref(), Some("tc37x"));
        assert_eq!(config.machine.kernel, Some(PathBuf::from("vmlinux")));

        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn load_reports_missing_and_invalid_files() {
        let dir = TempDir::new("tricore-runner").unwrap();
        let missing = dir.path().join("missing.toml");
        let err = Config::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));

        let invalid = dir.path().join("invalid.toml");
        std::fs::write(&invalid, "[machine]\nsmp = 2\n").unwrap();
        let err = Config::load(Some(&invalid)).unwrap_err();
        assert!(err.to_string().starts_with("Invalid config file"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("[machine]\nsmp = 2\n").is_err());
    }

    #[test]
    fn arguments_override_file() {
        let config = Config::parse("[machine]\ncpu = \"tc1797\"\nmemory = \"2M\"\n").unwrap();
        let args = Args {
            machine: None,
            list_machines: false,
            cpu: Some("tc27x".into()),
            memory: None,
            kernel: Some("vmlinux".into()),
            boot_dir: None,
            config: None,
            log_level: log::LevelFilter::Info,
            logfile: None,
            info_mtree: false,
        };

        let merged = config.merge_args(&args).machine;
        assert_eq!(merged.cpu.as_deref(), Some("tc27x"));
        assert_eq!(merged.memory.as_deref(), Some("2M"));
        assert_eq!(merged.kernel, Some(PathBuf::from("vmlinux")));
        assert_eq!(merged.machine_name(), DEFAULT_MACHINE);

        let state = merged
            .machine_state(&board::machine::TRICORE_TESTBOARD)
            .unwrap();
        assert_eq!(state.boot_dir, PathBuf::from("."));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());

        let state = config
            .machine
            .machine_state(&board::machine::TRICORE_TESTBOARD)
            .unwrap();
        assert_eq!(state.cpu_type, "tc27x-tricore-cpu");
        assert_eq!(state.ram_size, 128 << 20);
    }
}
