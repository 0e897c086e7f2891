//! Monochrome palettes (BGP $FF47, OBP0 $FF48, OBP1 $FF49).
//!
//! Each register packs four 2-bit shade numbers: bits 1–0 give the shade for colour 0,
//! bits 3–2 for colour 1, and so on.

/// One of the four LCD grey levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    White,
    LightGray,
    DarkGray,
    Black,
}

impl Shade {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Shade::White,
            1 => Shade::LightGray,
            2 => Shade::DarkGray,
            _ => Shade::Black,
        }
    }

    /// Display colour (0xRRGGBB), DMG green tint.
    pub fn rgb(self) -> u32 {
        match self {
            Shade::White => 0xE0F8D0,
            Shade::LightGray => 0x88C070,
            Shade::DarkGray => 0x346856,
            Shade::Black => 0x081820,
        }
    }
}

/// A palette register and its decoded colour-to-shade table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    raw: u8,
    shades: [Shade; 4],
}

impl Palette {
    pub fn new(raw: u8) -> Self {
        let mut palette = Self {
            raw: 0,
            shades: [Shade::White; 4],
        };
        palette.write(raw);
        palette
    }

    pub fn read(&self) -> u8 {
        self.raw
    }

    pub fn write(&mut self, raw: u8) {
        self.raw = raw;
        for (i, shade) in self.shades.iter_mut().enumerate() {
            *shade = Shade::from_bits(raw >> (i * 2));
        }
    }

    /// Shade for a 2-bit colour number.
    pub fn shade(&self, colour: u8) -> Shade {
        self.shades[(colour & 0x03) as usize]
    }
}
