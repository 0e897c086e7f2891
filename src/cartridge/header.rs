//! Cartridge header at $0100–$014F.
//!
//! Layout: entry point ($0100–$0103), logo bitmap ($0104–$0133), title ($0134–$0143),
//! CGB flag ($0143), SGB flag ($0146), cartridge type ($0147), ROM/RAM size codes
//! ($0148–$0149), header checksum ($014D), global checksum ($014E–$014F, big-endian).

use std::fmt;

use crate::error::CartridgeError;

/// Smallest image that still contains a complete header.
pub const HEADER_END: usize = 0x0150;

/// Logo bitmap every licensed cartridge carries at $0104–$0133.
pub const LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00, 0x0D,
    0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD, 0xD9, 0x99,
    0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB, 0xB9, 0x33, 0x3E,
];

const LOGO_START: usize = 0x0104;
const TITLE_START: usize = 0x0134;
const CGB_FLAG: usize = 0x0143;
const SGB_FLAG: usize = 0x0146;
const CARTRIDGE_TYPE: usize = 0x0147;
const ROM_SIZE: usize = 0x0148;
const RAM_SIZE: usize = 0x0149;
const HEADER_CHECKSUM: usize = 0x014D;
const GLOBAL_CHECKSUM: usize = 0x014E;

/// Hardware the image targets; selects the CPU power-on register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareVariant {
    /// Original DMG.
    Dmg,
    /// Game Boy Pocket (MGB). Never derived from a header; only selected by configuration.
    Pocket,
    SuperGameBoy,
    /// Game Boy Color running a colour-aware image.
    Color,
}

impl HardwareVariant {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "dmg" => Some(Self::Dmg),
            "pocket" | "mgb" => Some(Self::Pocket),
            "sgb" => Some(Self::SuperGameBoy),
            "cgb" | "color" => Some(Self::Color),
            _ => None,
        }
    }
}

impl fmt::Display for HardwareVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dmg => "DMG",
            Self::Pocket => "MGB",
            Self::SuperGameBoy => "SGB",
            Self::Color => "CGB",
        };
        f.write_str(name)
    }
}

/// Fields extracted from the fixed-offset header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub title: String,
    pub variant: HardwareVariant,
    /// Raw type byte; $00 is ROM only, anything else names a memory controller.
    pub cartridge_type: u8,
    pub rom_size_code: u8,
    pub ram_size_code: u8,
    pub header_checksum: u8,
    pub global_checksum: u16,
    /// Whether `header_checksum` matches the bytes it covers.
    pub header_checksum_ok: bool,
    pub global_checksum_ok: bool,
}

impl Header {
    /// Parse the header of `rom`. Only a short image or a logo mismatch is fatal.
    pub fn parse(rom: &[u8]) -> Result<Self, CartridgeError> {
        if rom.len() < HEADER_END {
            return Err(CartridgeError::TooShort { len: rom.len() });
        }
        if rom[LOGO_START..LOGO_START + LOGO.len()] != LOGO {
            return Err(CartridgeError::LogoMismatch);
        }

        let cgb_flag = rom[CGB_FLAG];
        // Colour-aware images reuse the last title byte as the CGB flag.
        let title_len = if cgb_flag & 0x80 != 0 { 15 } else { 16 };
        let title = parse_title(&rom[TITLE_START..TITLE_START + title_len]);

        let variant = if cgb_flag & 0x80 != 0 {
            HardwareVariant::Color
        } else if rom[SGB_FLAG] == 0x03 {
            HardwareVariant::SuperGameBoy
        } else {
            HardwareVariant::Dmg
        };

        let header_checksum = rom[HEADER_CHECKSUM];
        let global_checksum =
            u16::from_be_bytes([rom[GLOBAL_CHECKSUM], rom[GLOBAL_CHECKSUM + 1]]);

        Ok(Self {
            title,
            variant,
            cartridge_type: rom[CARTRIDGE_TYPE],
            rom_size_code: rom[ROM_SIZE],
            ram_size_code: rom[RAM_SIZE],
            header_checksum,
            global_checksum,
            header_checksum_ok: compute_header_checksum(rom) == header_checksum,
            global_checksum_ok: compute_global_checksum(rom) == global_checksum,
        })
    }

    /// Human-readable name of the cartridge type byte.
    pub fn cartridge_kind(&self) -> &'static str {
        match self.cartridge_type {
            0x00 => "ROM ONLY",
            0x01..=0x03 => "MBC1",
            0x05 | 0x06 => "MBC2",
            0x08 | 0x09 => "ROM+RAM",
            0x0B..=0x0D => "MMM01",
            0x0F..=0x13 => "MBC3",
            0x19..=0x1E => "MBC5",
            0x20 => "MBC6",
            0x22 => "MBC7",
            0xFC => "POCKET CAMERA",
            0xFD => "TAMA5",
            0xFE => "HuC3",
            0xFF => "HuC1",
            _ => "UNKNOWN",
        }
    }

    /// ROM size in bytes declared by the header (32 KiB << code).
    pub fn rom_size(&self) -> usize {
        if self.rom_size_code <= 8 {
            (32 * 1024) << self.rom_size_code
        } else {
            0
        }
    }

    /// External RAM size in bytes declared by the header.
    pub fn ram_size(&self) -> usize {
        match self.ram_size_code {
            0x02 => 8 * 1024,
            0x03 => 32 * 1024,
            0x04 => 128 * 1024,
            0x05 => 64 * 1024,
            _ => 0,
        }
    }
}

fn parse_title(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .filter(|b| b.is_ascii_graphic() || **b == b' ')
        .map(|&b| b as char)
        .collect::<String>()
        .trim()
        .to_string()
}

/// x = x - byte - 1 over $0134–$014C.
pub fn compute_header_checksum(rom: &[u8]) -> u8 {
    rom[TITLE_START..HEADER_CHECKSUM]
        .iter()
        .fold(0u8, |x, &b| x.wrapping_sub(b).wrapping_sub(1))
}

/// Sum of every byte except the two checksum bytes themselves.
pub fn compute_global_checksum(rom: &[u8]) -> u16 {
    rom.iter()
        .enumerate()
        .filter(|(i, _)| *i != GLOBAL_CHECKSUM && *i != GLOBAL_CHECKSUM + 1)
        .fold(0u16, |sum, (_, &b)| sum.wrapping_add(b as u16))
}
