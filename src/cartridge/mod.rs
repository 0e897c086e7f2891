//! Game Boy cartridge loading and header parsing.
//!
//! - **cartridge**: Holds the ROM image, mapped flat at $0000–$7FFF.
//! - **header**: Logo check, title, checksums, and the hardware variant the image targets.

pub mod cartridge;
pub mod header;
