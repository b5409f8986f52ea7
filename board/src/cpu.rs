use crate::error::BoardError;

/// Suffix appended to a model name to form its CPU type name, e.g. `tc27x-tricore-cpu`.
pub const TYPE_SUFFIX: &str = "-tricore-cpu";

const PSW_RESET: u32 = 0x0000_0B80;

/// Revision of the TriCore instruction set implemented by a core.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum IsaVersion {
    V13,
    V131,
    V16,
    V161,
    V162,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CpuModel {
    pub name: &'static str,
    pub isa: IsaVersion,
}

pub static CPU_MODELS: &[CpuModel] = &[
    CpuModel {
        name: "tc1796",
        isa: IsaVersion::V13,
    },
    CpuModel {
        name: "tc1797",
        isa: IsaVersion::V131,
    },
    CpuModel {
        name: "tc27x",
        isa: IsaVersion::V161,
    },
    CpuModel {
        name: "tc37x",
        isa: IsaVersion::V162,
    },
];

pub fn cpu_type_name(model: &str) -> String {
    format!("{model}{TYPE_SUFFIX}")
}

/// Looks a model up by its full type name (`tc27x-tricore-cpu`) or its bare name (`tc27x`).
pub fn find_model(cpu_type: &str) -> Option<&'static CpuModel> {
    let name = cpu_type.strip_suffix(TYPE_SUFFIX).unwrap_or(cpu_type);
    CPU_MODELS.iter().find(|m| m.name == name)
}

/// Architectural register file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub pc: u32,
    pub psw: u32,
    pub pcxi: u32,
    /// Data registers D0-D15
    pub d: [u32; 16],
    /// Address registers A0-A15
    pub a: [u32; 16],
}

impl Default for Registers {
    fn default() -> Self {
        Registers {
            pc: 0,
            psw: PSW_RESET,
            pcxi: 0,
            d: [0; 16],
            a: [0; 16],
        }
    }
}

/// One emulated TriCore core. Holds register state only, nothing here executes instructions.
#[derive(Debug)]
pub struct TriCoreCpu {
    model: &'static CpuModel,
    registers: Registers,
}

impl TriCoreCpu {
    pub fn create(cpu_type: &str) -> Result<Self, BoardError> {
        let model = find_model(cpu_type).ok_or_else(|| BoardError::UnknownCpuType {
            name: cpu_type.into(),
        })?;
        log::debug!("created {} core (ISA {:?})", model.name, model.isa);

        Ok(TriCoreCpu {
            model,
            registers: Registers::default(),
        })
    }

    pub fn model(&self) -> &'static CpuModel {
        self.model
    }

    pub fn type_name(&self) -> String {
        cpu_type_name(self.model.name)
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn pc(&self) -> u32 {
        self.registers.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.registers.pc = pc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_and_bare_names_resolve() {
        let full = find_model("tc27x-tricore-cpu").unwrap();
        let bare = find_model("tc27x").unwrap();
        assert_eq!(full, bare);
        assert_eq!(full.isa, IsaVersion::V161);
        assert_eq!(cpu_type_name(full.name), "tc27x-tricore-cpu");
    }

    #[test]
    fn unknown_models_are_rejected() {
        assert!(find_model("tc39x").is_none());
        assert!(find_model("-tricore-cpu").is_none());
        assert!(matches!(
            TriCoreCpu::create("cortex-a53"),
            Err(BoardError::UnknownCpuType { ref name }) if name == "cortex-a53"
        ));
    }

    #[test]
    fn reset_state() {
        let cpu = TriCoreCpu::create("tc1797").unwrap();
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.registers().psw, 0x0B80);
        assert_eq!(cpu.registers().a, [0; 16]);
        assert_eq!(cpu.type_name(), "tc1797-tricore-cpu");
    }
}
