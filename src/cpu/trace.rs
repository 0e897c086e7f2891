//! Per-instruction execution trace.

use std::fmt;

use ansi_term::Colour::Cyan;

use crate::cpu::{
    instructions::Instruction,
    registers::{Reg8, Registers},
};

/// State observed as an instruction is dispatched. `registers` is taken after the opcode
/// fetch, so `registers.pc` already points past it; `pc` is where the opcode was.
pub struct TraceEntry<'a> {
    pub pc: u16,
    pub opcode: u8,
    /// Opcode came from the $CB table.
    pub prefixed: bool,
    pub instruction: &'a Instruction,
    pub registers: Registers,
    /// Live interrupt master enable.
    pub ime: bool,
    /// Cycles retired before this instruction.
    pub cycles: u64,
}

impl fmt::Display for TraceEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.registers;
        let code = if self.prefixed {
            format!("CB {:02X}", self.opcode)
        } else {
            format!("{:02X}", self.opcode)
        };
        write!(
            f,
            "{:04X}  {:<6}{:<18}A:{:02X} F:{:02X} B:{:02X} C:{:02X} D:{:02X} E:{:02X} H:{:02X} L:{:02X} SP:{:04X} IME:{} CYC:{}",
            self.pc,
            code,
            self.instruction.to_string(),
            r.get(Reg8::A),
            r.get(Reg8::F),
            r.get(Reg8::B),
            r.get(Reg8::C),
            r.get(Reg8::D),
            r.get(Reg8::E),
            r.get(Reg8::H),
            r.get(Reg8::L),
            r.sp,
            u8::from(self.ime),
            self.cycles
        )
    }
}

/// Receives one entry per executed instruction.
pub trait TraceSink {
    fn record(&mut self, entry: &TraceEntry<'_>);
}

/// Prints every entry to stdout.
pub struct ConsoleTrace;

impl TraceSink for ConsoleTrace {
    fn record(&mut self, entry: &TraceEntry<'_>) {
        println!("{} {}", Cyan.paint("TRACE"), entry);
    }
}
