//! Opcode tables.
//!
//! `PRIMARY` and `EXTENDED` map an opcode byte to an [`Instruction`]: the operation with its
//! operand kinds, and a fixed cycle cost. $CB in the primary table selects the extended
//! table, whose entry carries the full cost of the prefixed instruction. Conditional
//! control flow costs the same whether or not it branches.

use std::fmt;

use crate::cpu::registers::{Reg8, Reg16};

/// Where an 8-bit operand comes from or goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand8 {
    Reg(Reg8),
    /// Immediate byte following the opcode.
    Imm,
    /// Memory addressed by a register pair: (BC), (DE), (HL).
    Ind(Reg16),
    /// (HL), then HL += 1.
    HlInc,
    /// (HL), then HL -= 1.
    HlDec,
    /// Memory at an immediate 16-bit address.
    Abs,
    /// $FF00 + immediate byte.
    High,
    /// $FF00 + C.
    HighC,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    NotZero,
    Zero,
    NotCarry,
    Carry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Nop,
    /// STOP; the padding byte after it is consumed.
    Stop,
    Halt,
    Di,
    Ei,
    /// $CB: next byte indexes `EXTENDED`.
    Prefix,
    /// No instruction is defined for this byte.
    Illegal,
    /// LD dst,src.
    Ld(Operand8, Operand8),
    /// LD rr,nn.
    LdImm16(Reg16),
    /// LD (nn),SP.
    LdAbsSp,
    LdSpHl,
    /// LD HL,SP+e.
    LdHlSpOffset,
    Push(Reg16),
    Pop(Reg16),
    Alu(AluOp, Operand8),
    Inc(Operand8),
    Dec(Operand8),
    Inc16(Reg16),
    Dec16(Reg16),
    AddHl(Reg16),
    /// ADD SP,e.
    AddSp,
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Jp(Condition),
    JpHl,
    Jr(Condition),
    Call(Condition),
    Ret(Condition),
    Reti,
    Rst(u8),
    Shift(ShiftOp, Operand8),
    Bit(u8, Operand8),
    Res(u8, Operand8),
    Set(u8, Operand8),
}

/// One opcode table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    /// T-cycles. Zero only for `Prefix` (cost comes from the extended entry) and `Illegal`.
    pub cycles: u32,
}

const fn ins(op: Op, cycles: u32) -> Instruction {
    Instruction { op, cycles }
}

const A: Operand8 = Operand8::Reg(Reg8::A);
const B: Operand8 = Operand8::Reg(Reg8::B);
const C: Operand8 = Operand8::Reg(Reg8::C);
const D: Operand8 = Operand8::Reg(Reg8::D);
const E: Operand8 = Operand8::Reg(Reg8::E);
const H: Operand8 = Operand8::Reg(Reg8::H);
const L: Operand8 = Operand8::Reg(Reg8::L);
const N: Operand8 = Operand8::Imm;
const IND_BC: Operand8 = Operand8::Ind(Reg16::BC);
const IND_DE: Operand8 = Operand8::Ind(Reg16::DE);
const IND_HL: Operand8 = Operand8::Ind(Reg16::HL);

/// Register operand encoded in the low three bits: B, C, D, E, H, L, (HL), A.
const fn reg_operand(code: u8) -> Operand8 {
    match code & 7 {
        0 => B,
        1 => C,
        2 => D,
        3 => E,
        4 => H,
        5 => L,
        6 => IND_HL,
        _ => A,
    }
}

const fn alu_op(code: u8) -> AluOp {
    match code & 7 {
        0 => AluOp::Add,
        1 => AluOp::Adc,
        2 => AluOp::Sub,
        3 => AluOp::Sbc,
        4 => AluOp::And,
        5 => AluOp::Xor,
        6 => AluOp::Or,
        _ => AluOp::Cp,
    }
}

const fn shift_op(code: u8) -> ShiftOp {
    match code & 7 {
        0 => ShiftOp::Rlc,
        1 => ShiftOp::Rrc,
        2 => ShiftOp::Rl,
        3 => ShiftOp::Rr,
        4 => ShiftOp::Sla,
        5 => ShiftOp::Sra,
        6 => ShiftOp::Swap,
        _ => ShiftOp::Srl,
    }
}

const fn is_memory(operand: Operand8) -> bool {
    !matches!(operand, Operand8::Reg(_))
}

const fn primary(opcode: u8) -> Instruction {
    match opcode {
        0x00 => ins(Op::Nop, 4),
        0x01 => ins(Op::LdImm16(Reg16::BC), 12),
        0x02 => ins(Op::Ld(IND_BC, A), 8),
        0x03 => ins(Op::Inc16(Reg16::BC), 8),
        0x04 => ins(Op::Inc(B), 4),
        0x05 => ins(Op::Dec(B), 4),
        0x06 => ins(Op::Ld(B, N), 8),
        0x07 => ins(Op::Rlca, 4),
        0x08 => ins(Op::LdAbsSp, 20),
        0x09 => ins(Op::AddHl(Reg16::BC), 8),
        0x0A => ins(Op::Ld(A, IND_BC), 8),
        0x0B => ins(Op::Dec16(Reg16::BC), 8),
        0x0C => ins(Op::Inc(C), 4),
        0x0D => ins(Op::Dec(C), 4),
        0x0E => ins(Op::Ld(C, N), 8),
        0x0F => ins(Op::Rrca, 4),

        0x10 => ins(Op::Stop, 4),
        0x11 => ins(Op::LdImm16(Reg16::DE), 12),
        0x12 => ins(Op::Ld(IND_DE, A), 8),
        0x13 => ins(Op::Inc16(Reg16::DE), 8),
        0x14 => ins(Op::Inc(D), 4),
        0x15 => ins(Op::Dec(D), 4),
        0x16 => ins(Op::Ld(D, N), 8),
        0x17 => ins(Op::Rla, 4),
        0x18 => ins(Op::Jr(Condition::Always), 8),
        0x19 => ins(Op::AddHl(Reg16::DE), 8),
        0x1A => ins(Op::Ld(A, IND_DE), 8),
        0x1B => ins(Op::Dec16(Reg16::DE), 8),
        0x1C => ins(Op::Inc(E), 4),
        0x1D => ins(Op::Dec(E), 4),
        0x1E => ins(Op::Ld(E, N), 8),
        0x1F => ins(Op::Rra, 4),

        0x20 => ins(Op::Jr(Condition::NotZero), 8),
        0x21 => ins(Op::LdImm16(Reg16::HL), 12),
        0x22 => ins(Op::Ld(Operand8::HlInc, A), 8),
        0x23 => ins(Op::Inc16(Reg16::HL), 8),
        0x24 => ins(Op::Inc(H), 4),
        0x25 => ins(Op::Dec(H), 4),
        0x26 => ins(Op::Ld(H, N), 8),
        0x27 => ins(Op::Daa, 4),
        0x28 => ins(Op::Jr(Condition::Zero), 8),
        0x29 => ins(Op::AddHl(Reg16::HL), 8),
        0x2A => ins(Op::Ld(A, Operand8::HlInc), 8),
        0x2B => ins(Op::Dec16(Reg16::HL), 8),
        0x2C => ins(Op::Inc(L), 4),
        0x2D => ins(Op::Dec(L), 4),
        0x2E => ins(Op::Ld(L, N), 8),
        0x2F => ins(Op::Cpl, 4),

        0x30 => ins(Op::Jr(Condition::NotCarry), 8),
        0x31 => ins(Op::LdImm16(Reg16::SP), 12),
        0x32 => ins(Op::Ld(Operand8::HlDec, A), 8),
        0x33 => ins(Op::Inc16(Reg16::SP), 8),
        0x34 => ins(Op::Inc(IND_HL), 12),
        0x35 => ins(Op::Dec(IND_HL), 12),
        0x36 => ins(Op::Ld(IND_HL, N), 12),
        0x37 => ins(Op::Scf, 4),
        0x38 => ins(Op::Jr(Condition::Carry), 8),
        0x39 => ins(Op::AddHl(Reg16::SP), 8),
        0x3A => ins(Op::Ld(A, Operand8::HlDec), 8),
        0x3B => ins(Op::Dec16(Reg16::SP), 8),
        0x3C => ins(Op::Inc(A), 4),
        0x3D => ins(Op::Dec(A), 4),
        0x3E => ins(Op::Ld(A, N), 8),
        0x3F => ins(Op::Ccf, 4),

        0x76 => ins(Op::Halt, 4),
        // LD r,r' block
        0x40..=0x7F => {
            let dst = reg_operand(opcode >> 3);
            let src = reg_operand(opcode);
            let cycles = if is_memory(dst) || is_memory(src) { 8 } else { 4 };
            ins(Op::Ld(dst, src), cycles)
        }
        // ALU A,r block
        0x80..=0xBF => {
            let src = reg_operand(opcode);
            let cycles = if is_memory(src) { 8 } else { 4 };
            ins(Op::Alu(alu_op(opcode >> 3), src), cycles)
        }

        0xC0 => ins(Op::Ret(Condition::NotZero), 8),
        0xC1 => ins(Op::Pop(Reg16::BC), 12),
        0xC2 => ins(Op::Jp(Condition::NotZero), 12),
        0xC3 => ins(Op::Jp(Condition::Always), 12),
        0xC4 => ins(Op::Call(Condition::NotZero), 12),
        0xC5 => ins(Op::Push(Reg16::BC), 16),
        0xC6 => ins(Op::Alu(AluOp::Add, N), 8),
        0xC7 => ins(Op::Rst(0x00), 32),
        0xC8 => ins(Op::Ret(Condition::Zero), 8),
        0xC9 => ins(Op::Ret(Condition::Always), 8),
        0xCA => ins(Op::Jp(Condition::Zero), 12),
        0xCB => ins(Op::Prefix, 0),
        0xCC => ins(Op::Call(Condition::Zero), 12),
        0xCD => ins(Op::Call(Condition::Always), 12),
        0xCE => ins(Op::Alu(AluOp::Adc, N), 8),
        0xCF => ins(Op::Rst(0x08), 32),

        0xD0 => ins(Op::Ret(Condition::NotCarry), 8),
        0xD1 => ins(Op::Pop(Reg16::DE), 12),
        0xD2 => ins(Op::Jp(Condition::NotCarry), 12),
        0xD4 => ins(Op::Call(Condition::NotCarry), 12),
        0xD5 => ins(Op::Push(Reg16::DE), 16),
        0xD6 => ins(Op::Alu(AluOp::Sub, N), 8),
        0xD7 => ins(Op::Rst(0x10), 32),
        0xD8 => ins(Op::Ret(Condition::Carry), 8),
        0xD9 => ins(Op::Reti, 8),
        0xDA => ins(Op::Jp(Condition::Carry), 12),
        0xDC => ins(Op::Call(Condition::Carry), 12),
        0xDE => ins(Op::Alu(AluOp::Sbc, N), 8),
        0xDF => ins(Op::Rst(0x18), 32),

        0xE0 => ins(Op::Ld(Operand8::High, A), 12),
        0xE1 => ins(Op::Pop(Reg16::HL), 12),
        0xE2 => ins(Op::Ld(Operand8::HighC, A), 8),
        0xE5 => ins(Op::Push(Reg16::HL), 16),
        0xE6 => ins(Op::Alu(AluOp::And, N), 8),
        0xE7 => ins(Op::Rst(0x20), 32),
        0xE8 => ins(Op::AddSp, 16),
        0xE9 => ins(Op::JpHl, 4),
        0xEA => ins(Op::Ld(Operand8::Abs, A), 16),
        0xEE => ins(Op::Alu(AluOp::Xor, N), 8),
        0xEF => ins(Op::Rst(0x28), 32),

        0xF0 => ins(Op::Ld(A, Operand8::High), 12),
        0xF1 => ins(Op::Pop(Reg16::AF), 12),
        0xF2 => ins(Op::Ld(A, Operand8::HighC), 8),
        0xF3 => ins(Op::Di, 4),
        0xF5 => ins(Op::Push(Reg16::AF), 16),
        0xF6 => ins(Op::Alu(AluOp::Or, N), 8),
        0xF7 => ins(Op::Rst(0x30), 32),
        0xF8 => ins(Op::LdHlSpOffset, 12),
        0xF9 => ins(Op::LdSpHl, 8),
        0xFA => ins(Op::Ld(A, Operand8::Abs), 16),
        0xFB => ins(Op::Ei, 4),
        0xFE => ins(Op::Alu(AluOp::Cp, N), 8),
        0xFF => ins(Op::Rst(0x38), 32),

        // $D3 $DB $DD $E3 $E4 $EB $EC $ED $F4 $FC $FD
        _ => ins(Op::Illegal, 0),
    }
}

const fn extended(opcode: u8) -> Instruction {
    let target = reg_operand(opcode);
    let bit = (opcode >> 3) & 7;
    let op = match opcode >> 6 {
        0 => Op::Shift(shift_op(opcode >> 3), target),
        1 => Op::Bit(bit, target),
        2 => Op::Res(bit, target),
        _ => Op::Set(bit, target),
    };
    ins(op, if is_memory(target) { 16 } else { 8 })
}

const fn build_primary() -> [Instruction; 256] {
    let mut table = [ins(Op::Illegal, 0); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = primary(i as u8);
        i += 1;
    }
    table
}

const fn build_extended() -> [Instruction; 256] {
    let mut table = [ins(Op::Illegal, 0); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = extended(i as u8);
        i += 1;
    }
    table
}

/// Unprefixed opcodes.
pub static PRIMARY: [Instruction; 256] = build_primary();

/// $CB-prefixed opcodes: rotates, shifts, SWAP, BIT, RES, SET.
pub static EXTENDED: [Instruction; 256] = build_extended();

impl fmt::Display for Operand8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand8::Reg(reg) => write!(f, "{reg}"),
            Operand8::Imm => f.write_str("n"),
            Operand8::Ind(pair) => write!(f, "({pair})"),
            Operand8::HlInc => f.write_str("(HL+)"),
            Operand8::HlDec => f.write_str("(HL-)"),
            Operand8::Abs => f.write_str("(nn)"),
            Operand8::High => f.write_str("($FF00+n)"),
            Operand8::HighC => f.write_str("($FF00+C)"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::Always => "",
            Condition::NotZero => "NZ",
            Condition::Zero => "Z",
            Condition::NotCarry => "NC",
            Condition::Carry => "C",
        };
        f.write_str(name)
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AluOp::Add => "ADD A,",
            AluOp::Adc => "ADC A,",
            AluOp::Sub => "SUB ",
            AluOp::Sbc => "SBC A,",
            AluOp::And => "AND ",
            AluOp::Xor => "XOR ",
            AluOp::Or => "OR ",
            AluOp::Cp => "CP ",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ShiftOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShiftOp::Rlc => "RLC",
            ShiftOp::Rrc => "RRC",
            ShiftOp::Rl => "RL",
            ShiftOp::Rr => "RR",
            ShiftOp::Sla => "SLA",
            ShiftOp::Sra => "SRA",
            ShiftOp::Swap => "SWAP",
            ShiftOp::Srl => "SRL",
        };
        f.write_str(name)
    }
}

/// Mnemonic with a condition operand, e.g. `JP NZ,nn` or plain `JP nn`.
fn with_condition(f: &mut fmt::Formatter<'_>, name: &str, cond: Condition, rest: &str) -> fmt::Result {
    match (cond, rest.is_empty()) {
        (Condition::Always, true) => f.write_str(name),
        (Condition::Always, false) => write!(f, "{name} {rest}"),
        (cond, true) => write!(f, "{name} {cond}"),
        (cond, false) => write!(f, "{name} {cond},{rest}"),
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Nop => f.write_str("NOP"),
            Op::Stop => f.write_str("STOP"),
            Op::Halt => f.write_str("HALT"),
            Op::Di => f.write_str("DI"),
            Op::Ei => f.write_str("EI"),
            Op::Prefix => f.write_str("PREFIX CB"),
            Op::Illegal => f.write_str("???"),
            Op::Ld(dst, src) => write!(f, "LD {dst},{src}"),
            Op::LdImm16(reg) => write!(f, "LD {reg},nn"),
            Op::LdAbsSp => f.write_str("LD (nn),SP"),
            Op::LdSpHl => f.write_str("LD SP,HL"),
            Op::LdHlSpOffset => f.write_str("LD HL,SP+e"),
            Op::Push(reg) => write!(f, "PUSH {reg}"),
            Op::Pop(reg) => write!(f, "POP {reg}"),
            Op::Alu(op, src) => write!(f, "{op}{src}"),
            Op::Inc(target) => write!(f, "INC {target}"),
            Op::Dec(target) => write!(f, "DEC {target}"),
            Op::Inc16(reg) => write!(f, "INC {reg}"),
            Op::Dec16(reg) => write!(f, "DEC {reg}"),
            Op::AddHl(reg) => write!(f, "ADD HL,{reg}"),
            Op::AddSp => f.write_str("ADD SP,e"),
            Op::Rlca => f.write_str("RLCA"),
            Op::Rrca => f.write_str("RRCA"),
            Op::Rla => f.write_str("RLA"),
            Op::Rra => f.write_str("RRA"),
            Op::Daa => f.write_str("DAA"),
            Op::Cpl => f.write_str("CPL"),
            Op::Scf => f.write_str("SCF"),
            Op::Ccf => f.write_str("CCF"),
            Op::Jp(cond) => with_condition(f, "JP", *cond, "nn"),
            Op::JpHl => f.write_str("JP HL"),
            Op::Jr(cond) => with_condition(f, "JR", *cond, "e"),
            Op::Call(cond) => with_condition(f, "CALL", *cond, "nn"),
            Op::Ret(cond) => with_condition(f, "RET", *cond, ""),
            Op::Reti => f.write_str("RETI"),
            Op::Rst(vector) => write!(f, "RST ${vector:02X}"),
            Op::Shift(op, target) => write!(f, "{op} {target}"),
            Op::Bit(bit, target) => write!(f, "BIT {bit},{target}"),
            Op::Res(bit, target) => write!(f, "RES {bit},{target}"),
            Op::Set(bit, target) => write!(f, "SET {bit},{target}"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)
    }
}
