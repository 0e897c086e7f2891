//! Error types for loading and running a cartridge.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Failures while reading or validating a ROM image.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ROM image is {len} bytes, too short to hold a header")]
    TooShort { len: usize },
    #[error("header logo does not match; not a valid cartridge image")]
    LogoMismatch,
}

/// Failures raised by the instruction executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("illegal opcode ${opcode:02X} at ${pc:04X}")]
    IllegalOpcode { opcode: u8, pc: u16 },
}

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("no cartridge loaded")]
    NotLoaded,
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
    #[error(transparent)]
    Cpu(#[from] CpuError),
}

/// Bad command-line arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no ROM path given")]
    MissingRom,
    #[error("{flag} expects a value")]
    MissingValue { flag: String },
    #[error("unknown model `{0}` (expected dmg, pocket, sgb or cgb)")]
    UnknownModel(String),
    #[error("invalid scale `{0}` (expected 1, 2, 4 or 8)")]
    InvalidScale(String),
    #[error("unknown option `{0}`")]
    UnknownFlag(String),
}
