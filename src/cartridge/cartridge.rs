//! Game Boy cartridge loading from raw ROM images (.gb files).
//!
//! The image is mapped flat at $0000–$7FFF. Bank-switching controllers are not emulated;
//! images that declare one still load, with a warning, and only their first 32 KiB are
//! addressable.

use std::fs;
use std::path::Path;

use ansi_term::Colour::Yellow;

use crate::cartridge::header::{HardwareVariant, Header};
use crate::error::CartridgeError;

/// Size of the flat ROM window.
pub const ROM_WINDOW: usize = 0x8000;

/// Cartridge: ROM bytes plus the metadata derived from its header.
pub struct Cartridge {
    rom: Vec<u8>,
    header: Header,
}

impl Cartridge {
    /// Load a cartridge image from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let data = fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Validate the header and take ownership of the image. Checksum mismatches are
    /// logged and otherwise ignored; a logo mismatch aborts the load.
    pub fn from_bytes(mut rom: Vec<u8>) -> Result<Self, CartridgeError> {
        let header = Header::parse(&rom)?;

        if !header.header_checksum_ok {
            eprintln!(
                "{} header checksum mismatch (stored ${:02X}); continuing",
                Yellow.bold().paint("WARN"),
                header.header_checksum
            );
        }
        if !header.global_checksum_ok {
            eprintln!(
                "{} global checksum mismatch (stored ${:04X}); continuing",
                Yellow.bold().paint("WARN"),
                header.global_checksum
            );
        }
        if header.cartridge_type != 0x00 {
            eprintln!(
                "{} cartridge type {} (${:02X}) is mapped flat; bank switching is not emulated",
                Yellow.bold().paint("WARN"),
                header.cartridge_kind(),
                header.cartridge_type
            );
        }

        if header.rom_size() != rom.len() {
            eprintln!(
                "{} header declares {} KiB of ROM, image holds {} KiB",
                Yellow.bold().paint("WARN"),
                header.rom_size() / 1024,
                rom.len() / 1024
            );
        }
        if header.ram_size() != 0 {
            eprintln!(
                "{} {} KiB of cartridge RAM is not emulated",
                Yellow.bold().paint("WARN"),
                header.ram_size() / 1024
            );
        }

        if rom.len() < ROM_WINDOW {
            rom.resize(ROM_WINDOW, 0xFF);
        }

        Ok(Self { rom, header })
    }

    /// Read from the ROM window ($0000–$7FFF).
    pub fn read(&self, addr: u16) -> u8 {
        self.rom[addr as usize % ROM_WINDOW]
    }

    /// Boot-stage write into the ROM image. Outside the boot stage the bus drops ROM writes.
    pub fn write_through(&mut self, addr: u16, data: u8) {
        self.rom[addr as usize % ROM_WINDOW] = data;
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Display-ready game name from the header title.
    pub fn title(&self) -> &str {
        &self.header.title
    }

    pub fn variant(&self) -> HardwareVariant {
        self.header.variant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::header::tests::build_rom;

    #[test]
    fn reads_image_from_address_zero() {
        let mut rom = build_rom("READ");
        rom[0x0000] = 0x3E;
        rom[0x7FFF] = 0x99;
        let cart = Cartridge::from_bytes(rom).unwrap();
        assert_eq!(cart.read(0x0000), 0x3E);
        assert_eq!(cart.read(0x7FFF), 0x99);
        assert_eq!(cart.title(), "READ");
    }

    #[test]
    fn short_image_is_padded_to_rom_window() {
        let mut rom = build_rom("SMALL");
        rom.truncate(0x4000);
        let cart = Cartridge::from_bytes(rom).unwrap();
        assert_eq!(cart.read(0x4000), 0xFF);
    }

    #[test]
    fn write_through_updates_image() {
        let cart_rom = build_rom("BOOT");
        let mut cart = Cartridge::from_bytes(cart_rom).unwrap();
        cart.write_through(0x0050, 0xAB);
        assert_eq!(cart.read(0x0050), 0xAB);
    }

    #[test]
    fn load_reports_missing_file() {
        let result = Cartridge::load("does/not/exist.gb");
        assert!(matches!(result, Err(CartridgeError::Io(_))));
    }
}
