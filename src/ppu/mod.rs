//! LCD controller (PPU) timing for the Game Boy.
//!
//! Scanlines are 456 cycles (OAM scan 80, pixel transfer 172, HBlank 204); lines 144–153
//! are VBlank, 70224 cycles per frame. Owns VRAM, OAM, HRAM and the BGP/OBP0/OBP1 palettes.
//! Tiles and sprites are not rasterised; each visible line is filled with the backdrop shade.

pub mod frame;
pub mod palette;
pub mod ppu;
