//! Emulator and command-line configuration.

use std::path::PathBuf;

use crate::cartridge::header::HardwareVariant;
use crate::error::ConfigError;

/// What a read from an address nothing is mapped to returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnmappedReads {
    /// The last byte written to IE ($FFFF).
    #[default]
    InterruptEnable,
    Zero,
}

/// Settings that affect emulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// Overrides the variant the cartridge header asks for.
    pub model: Option<HardwareVariant>,
    pub unmapped_reads: UnmappedReads,
}

pub const DEFAULT_SCALE: u32 = 4;

/// Command-line configuration for the windowed emulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rom_path: PathBuf,
    /// Window pixels per LCD pixel: 1, 2, 4 or 8.
    pub scale: u32,
    /// Print every executed instruction.
    pub trace: bool,
    pub emulator: EmulatorConfig,
}

impl Config {
    /// Parse arguments, program name excluded:
    /// `<rom.gb> [--model dmg|pocket|sgb|cgb] [--trace] [--unmapped-zero] [--scale N]`.
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::<String>::into);
        let mut rom_path = None;
        let mut scale = DEFAULT_SCALE;
        let mut trace = false;
        let mut emulator = EmulatorConfig::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--trace" => trace = true,
                "--unmapped-zero" => emulator.unmapped_reads = UnmappedReads::Zero,
                "--model" => {
                    let name = args
                        .next()
                        .ok_or_else(|| ConfigError::MissingValue { flag: arg.clone() })?;
                    let model = HardwareVariant::from_name(&name)
                        .ok_or(ConfigError::UnknownModel(name))?;
                    emulator.model = Some(model);
                }
                "--scale" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::MissingValue { flag: arg.clone() })?;
                    scale = match value.parse::<u32>() {
                        Ok(n @ (1 | 2 | 4 | 8)) => n,
                        _ => return Err(ConfigError::InvalidScale(value)),
                    };
                }
                _ if arg.starts_with("--") => return Err(ConfigError::UnknownFlag(arg)),
                _ => rom_path = Some(PathBuf::from(arg)),
            }
        }

        Ok(Self {
            rom_path: rom_path.ok_or(ConfigError::MissingRom)?,
            scale,
            trace,
            emulator,
        })
    }
}
