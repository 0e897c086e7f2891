//! LR35902 register set.
//!
//! The eight 8-bit registers live in one array; the 16-bit pairs are computed views, so a
//! pair write is just two byte writes.

use std::fmt;

use crate::cartridge::header::HardwareVariant;

/// 8-bit register, usable as an index into the register array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
}

/// 16-bit register pair, or the stack pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    SP,
}

impl Reg16 {
    /// High and low halves of a pair. `None` for SP, which is a separate counter.
    fn halves(self) -> Option<(Reg8, Reg8)> {
        match self {
            Reg16::AF => Some((Reg8::A, Reg8::F)),
            Reg16::BC => Some((Reg8::B, Reg8::C)),
            Reg16::DE => Some((Reg8::D, Reg8::E)),
            Reg16::HL => Some((Reg8::H, Reg8::L)),
            Reg16::SP => None,
        }
    }
}

impl fmt::Display for Reg8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg8::A => "A",
            Reg8::F => "F",
            Reg8::B => "B",
            Reg8::C => "C",
            Reg8::D => "D",
            Reg8::E => "E",
            Reg8::H => "H",
            Reg8::L => "L",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Reg16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg16::AF => "AF",
            Reg16::BC => "BC",
            Reg16::DE => "DE",
            Reg16::HL => "HL",
            Reg16::SP => "SP",
        };
        f.write_str(name)
    }
}

/// Register file snapshot; cheap to copy for tracing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    regs: [u8; 8],
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    /// Registers holding the values the boot ROM leaves behind on `variant`.
    pub fn new(variant: HardwareVariant) -> Self {
        let mut registers = Self::default();
        registers.initialize(variant);
        registers
    }

    /// Power-on values. Only AF differs between variants; PC always starts at $0100.
    pub fn initialize(&mut self, variant: HardwareVariant) {
        let af = match variant {
            HardwareVariant::Dmg => 0x01B0,
            HardwareVariant::SuperGameBoy => 0x0100,
            HardwareVariant::Pocket => 0xFFB0,
            HardwareVariant::Color => 0x1180,
        };
        self.set16(Reg16::AF, af);
        self.set16(Reg16::BC, 0x0013);
        self.set16(Reg16::DE, 0x00D8);
        self.set16(Reg16::HL, 0x014D);
        self.sp = 0xFFFE;
        self.pc = 0x0100;
    }

    pub fn get(&self, reg: Reg8) -> u8 {
        self.regs[reg as usize]
    }

    pub fn set(&mut self, reg: Reg8, value: u8) {
        self.regs[reg as usize] = value;
    }

    pub fn get16(&self, reg: Reg16) -> u16 {
        match reg.halves() {
            Some((hi, lo)) => u16::from_be_bytes([self.get(hi), self.get(lo)]),
            None => self.sp,
        }
    }

    pub fn set16(&mut self, reg: Reg16, value: u16) {
        match reg.halves() {
            Some((hi, lo)) => {
                let [h, l] = value.to_be_bytes();
                self.set(hi, h);
                self.set(lo, l);
            }
            None => self.sp = value,
        }
    }

    pub fn a(&self) -> u8 {
        self.get(Reg8::A)
    }

    pub fn f(&self) -> u8 {
        self.get(Reg8::F)
    }

    pub fn hl(&self) -> u16 {
        self.get16(Reg16::HL)
    }

    /// Test a flag bit (`FLAG_*` mask).
    pub fn flag(&self, mask: u8) -> bool {
        self.f() & mask != 0
    }

    /// Set or clear a flag bit, leaving every other bit of F untouched.
    pub fn set_flag(&mut self, mask: u8, on: bool) {
        let f = self.f();
        self.set(Reg8::F, if on { f | mask } else { f & !mask });
    }
}
