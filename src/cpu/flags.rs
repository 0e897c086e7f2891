//! Flag register (F) bits. Bits 3–0 are left as written.

pub const FLAG_ZERO: u8 = 1 << 7;
pub const FLAG_SUBTRACT: u8 = 1 << 6;
pub const FLAG_HALF_CARRY: u8 = 1 << 5;
pub const FLAG_CARRY: u8 = 1 << 4;

/// The four condition bits together.
pub const FLAG_MASK: u8 = FLAG_ZERO | FLAG_SUBTRACT | FLAG_HALF_CARRY | FLAG_CARRY;
