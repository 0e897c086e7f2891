//! gbemu: a Game Boy (DMG) emulator written in Rust.
//!
//! Emulates the Sharp LR35902 CPU, the memory map, LCD mode timing and the joypad, as
//! documented in the [Pan Docs](https://gbdev.io/pandocs/).
//!
//! ## Modules (Pan Docs references)
//!
//! - **bus** – [Memory map](https://gbdev.io/pandocs/Memory_Map.html): ROM, VRAM, WRAM with
//!   echo, OAM, I/O, HRAM, IE; boot stage, OAM DMA
//! - **cartridge** – [Cartridge header](https://gbdev.io/pandocs/The_Cartridge_Header.html):
//!   logo, title, checksums, hardware variant; flat 32 KiB ROM
//! - **clock** – frame clock, 70224 cycles per frame at 4.194304 MHz
//! - **config** – emulator options and command-line parsing
//! - **controller** – [Joypad input](https://gbdev.io/pandocs/Joypad_Input.html): $FF00 rows
//! - **cpu** – [CPU instruction set](https://gbdev.io/pandocs/CPU_Instruction_Set.html):
//!   table-driven decode, $CB set, [interrupts](https://gbdev.io/pandocs/Interrupts.html)
//! - **gameboy** – machine driver, one frame per call
//! - **ppu** – [Rendering](https://gbdev.io/pandocs/Rendering.html): mode timing, LCD
//!   registers, VRAM/OAM, double-buffered frames

pub mod bus;
pub mod cartridge;
pub mod clock;
pub mod config;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod gameboy;
pub mod ppu;

pub use config::{Config, EmulatorConfig, UnmappedReads};
pub use controller::Button;
pub use error::{EmulatorError, Result};
pub use gameboy::GameBoy;
