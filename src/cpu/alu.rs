//! ALU operations for the LR35902.
//!
//! Every function returns the result together with the complete Z/N/H/C nibble for the
//! instruction. Flags an instruction leaves untouched are passed in and copied through.

use crate::cpu::flags::{FLAG_CARRY, FLAG_HALF_CARRY, FLAG_SUBTRACT, FLAG_ZERO};

/// Result of an ALU operation with its flag nibble (bits 7–4 of F).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult<T> {
    pub value: T,
    pub flags: u8,
}

fn flags(zero: bool, subtract: bool, half_carry: bool, carry: bool) -> u8 {
    let mut f = 0;
    if zero {
        f |= FLAG_ZERO;
    }
    if subtract {
        f |= FLAG_SUBTRACT;
    }
    if half_carry {
        f |= FLAG_HALF_CARRY;
    }
    if carry {
        f |= FLAG_CARRY;
    }
    f
}

/// ADD / ADC.
pub fn add8(a: u8, b: u8, carry: bool) -> AluResult<u8> {
    let c = u8::from(carry);
    let wide = a as u16 + b as u16 + c as u16;
    let value = wide as u8;
    AluResult {
        value,
        flags: flags(
            value == 0,
            false,
            (a & 0x0F) + (b & 0x0F) + c > 0x0F,
            wide > 0xFF,
        ),
    }
}

/// SUB / SBC / CP.
pub fn sub8(a: u8, b: u8, carry: bool) -> AluResult<u8> {
    let c = u8::from(carry);
    let value = a.wrapping_sub(b).wrapping_sub(c);
    AluResult {
        value,
        flags: flags(
            value == 0,
            true,
            (a & 0x0F) < (b & 0x0F) + c,
            (a as u16) < b as u16 + c as u16,
        ),
    }
}

pub fn and8(a: u8, b: u8) -> AluResult<u8> {
    let value = a & b;
    AluResult {
        value,
        flags: flags(value == 0, false, true, false),
    }
}

pub fn or8(a: u8, b: u8) -> AluResult<u8> {
    let value = a | b;
    AluResult {
        value,
        flags: flags(value == 0, false, false, false),
    }
}

pub fn xor8(a: u8, b: u8) -> AluResult<u8> {
    let value = a ^ b;
    AluResult {
        value,
        flags: flags(value == 0, false, false, false),
    }
}

/// INC r. Carry is preserved.
pub fn inc8(v: u8, carry: bool) -> AluResult<u8> {
    let value = v.wrapping_add(1);
    AluResult {
        value,
        flags: flags(value == 0, false, v & 0x0F == 0x0F, carry),
    }
}

/// DEC r. Carry is preserved.
pub fn dec8(v: u8, carry: bool) -> AluResult<u8> {
    let value = v.wrapping_sub(1);
    AluResult {
        value,
        flags: flags(value == 0, true, v & 0x0F == 0x00, carry),
    }
}

/// ADD HL,rr. Half-carry out of bit 11, carry out of bit 15; Z preserved.
pub fn add16(hl: u16, rr: u16, zero: bool) -> AluResult<u16> {
    let wide = hl as u32 + rr as u32;
    AluResult {
        value: wide as u16,
        flags: flags(
            zero,
            false,
            (hl & 0x0FFF) + (rr & 0x0FFF) > 0x0FFF,
            wide > 0xFFFF,
        ),
    }
}

/// SP plus a signed offset (ADD SP,e and LD HL,SP+e). H and C come from the unsigned
/// low-byte addition; Z and N are cleared.
pub fn add_sp(sp: u16, offset: u8) -> AluResult<u16> {
    let value = sp.wrapping_add(offset as i8 as u16);
    AluResult {
        value,
        flags: flags(
            false,
            false,
            (sp & 0x0F) + (offset as u16 & 0x0F) > 0x0F,
            (sp & 0xFF) + offset as u16 > 0xFF,
        ),
    }
}

/// Decimal adjust A after a BCD add or subtract.
pub fn daa(a: u8, f: u8) -> AluResult<u8> {
    let subtract = f & FLAG_SUBTRACT != 0;
    let half_carry = f & FLAG_HALF_CARRY != 0;
    let mut carry = f & FLAG_CARRY != 0;
    let mut adjust = 0u8;

    if half_carry || (!subtract && a & 0x0F > 0x09) {
        adjust |= 0x06;
    }
    if carry || (!subtract && a > 0x99) {
        adjust |= 0x60;
        carry = true;
    }

    let value = if subtract {
        a.wrapping_sub(adjust)
    } else {
        a.wrapping_add(adjust)
    };
    AluResult {
        value,
        flags: flags(value == 0, subtract, false, carry),
    }
}

/// Rotate left; bit 7 goes to carry and bit 0.
pub fn rlc(v: u8) -> AluResult<u8> {
    let value = v.rotate_left(1);
    AluResult {
        value,
        flags: flags(value == 0, false, false, v & 0x80 != 0),
    }
}

/// Rotate right; bit 0 goes to carry and bit 7.
pub fn rrc(v: u8) -> AluResult<u8> {
    let value = v.rotate_right(1);
    AluResult {
        value,
        flags: flags(value == 0, false, false, v & 0x01 != 0),
    }
}

/// Rotate left through carry.
pub fn rl(v: u8, carry: bool) -> AluResult<u8> {
    let value = (v << 1) | u8::from(carry);
    AluResult {
        value,
        flags: flags(value == 0, false, false, v & 0x80 != 0),
    }
}

/// Rotate right through carry.
pub fn rr(v: u8, carry: bool) -> AluResult<u8> {
    let value = (v >> 1) | (u8::from(carry) << 7);
    AluResult {
        value,
        flags: flags(value == 0, false, false, v & 0x01 != 0),
    }
}

pub fn sla(v: u8) -> AluResult<u8> {
    let value = v << 1;
    AluResult {
        value,
        flags: flags(value == 0, false, false, v & 0x80 != 0),
    }
}

/// Arithmetic shift right; bit 7 is kept.
pub fn sra(v: u8) -> AluResult<u8> {
    let value = (v >> 1) | (v & 0x80);
    AluResult {
        value,
        flags: flags(value == 0, false, false, v & 0x01 != 0),
    }
}

pub fn srl(v: u8) -> AluResult<u8> {
    let value = v >> 1;
    AluResult {
        value,
        flags: flags(value == 0, false, false, v & 0x01 != 0),
    }
}

/// Exchange nibbles.
pub fn swap(v: u8) -> AluResult<u8> {
    let value = v.rotate_left(4);
    AluResult {
        value,
        flags: flags(value == 0, false, false, false),
    }
}

/// BIT b: Z set when the bit is clear. Carry is preserved.
pub fn bit(v: u8, bit: u8, carry: bool) -> u8 {
    flags(v & (1 << bit) == 0, false, true, carry)
}
