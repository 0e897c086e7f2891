use crate::{
    bus::Bus,
    cartridge::header::HardwareVariant,
    cpu::{
        alu::{self, AluResult},
        flags::{FLAG_CARRY, FLAG_HALF_CARRY, FLAG_MASK, FLAG_SUBTRACT, FLAG_ZERO},
        instructions::{AluOp, Condition, EXTENDED, Instruction, Op, Operand8, PRIMARY, ShiftOp},
        interrupts::{self, DISPATCH_CYCLES, INT_MASK, InterruptMasterEnable},
        registers::{Reg8, Reg16, Registers},
        trace::{TraceEntry, TraceSink},
    },
    error::CpuError,
};

pub const IF_ADDR: u16 = 0xFF0F;
pub const IE_ADDR: u16 = 0xFFFF;

/// Cycles charged for a step spent halted or stopped.
const HALTED_CYCLES: u32 = 4;

pub struct CPU<B: Bus> {
    pub registers: Registers,
    pub bus: B,
    /// Total T-cycles since power-on.
    pub cycles: u64,
    /// Set by HALT and STOP; cleared once an enabled interrupt is requested.
    pub halted: bool,
    ime: InterruptMasterEnable,
    /// Set by an illegal opcode. Every later step reports it again.
    locked: Option<CpuError>,
    trace: Option<Box<dyn TraceSink>>,
}

impl<B: Bus> CPU<B> {
    /// CPU in the state the boot ROM hands over on `variant`: PC at $0100, IME off.
    pub fn new(bus: B, variant: HardwareVariant) -> Self {
        Self {
            registers: Registers::new(variant),
            bus,
            cycles: 0,
            halted: false,
            ime: InterruptMasterEnable::Disabled,
            locked: None,
            trace: None,
        }
    }

    /// Live interrupt master enable flag.
    pub fn interrupts_enabled(&self) -> bool {
        self.ime.enabled()
    }

    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.trace = sink;
    }

    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace.take()
    }

    /// Run one unit of work (an interrupt dispatch, one halted tick, or one instruction)
    /// and return the T-cycles it took. The bus is ticked by the same amount.
    pub fn step(&mut self) -> Result<u32, CpuError> {
        if let Some(err) = self.locked {
            return Err(err);
        }

        let cycles = match self.service_interrupt() {
            Some(cycles) => cycles,
            None if self.halted => HALTED_CYCLES,
            None => self.execute_next()?,
        };

        self.cycles += u64::from(cycles);
        self.bus.tick(cycles);
        Ok(cycles)
    }

    fn service_interrupt(&mut self) -> Option<u32> {
        let flags = self.bus.read(IF_ADDR);
        let pending = self.bus.read(IE_ADDR) & flags & INT_MASK;
        if pending == 0 {
            return None;
        }
        self.halted = false;
        if !self.ime.enabled() {
            return None;
        }

        let (bit, vector) = interrupts::vector(pending)?;
        self.bus.write(IF_ADDR, flags & !bit);
        self.ime = InterruptMasterEnable::Disabled;
        self.push16(self.registers.pc);
        self.registers.pc = vector;
        Some(DISPATCH_CYCLES)
    }

    fn execute_next(&mut self) -> Result<u32, CpuError> {
        let pc = self.registers.pc;
        let mut opcode = self.fetch_byte();
        let mut instruction = PRIMARY[opcode as usize];
        let prefixed = instruction.op == Op::Prefix;
        if prefixed {
            opcode = self.fetch_byte();
            instruction = EXTENDED[opcode as usize];
        }

        self.trace(pc, opcode, prefixed, &instruction);

        if instruction.op == Op::Illegal {
            let err = CpuError::IllegalOpcode { opcode, pc };
            self.locked = Some(err);
            return Err(err);
        }

        // An EI/DI pending now was issued by the previous instruction; it lands after this one.
        let toggle_pending = self.ime.is_pending();
        self.execute(instruction.op);
        if toggle_pending {
            self.ime.commit();
        }
        Ok(instruction.cycles)
    }

    fn trace(&mut self, pc: u16, opcode: u8, prefixed: bool, instruction: &Instruction) {
        if let Some(sink) = self.trace.as_mut() {
            sink.record(&TraceEntry {
                pc,
                opcode,
                prefixed,
                instruction,
                registers: self.registers,
                ime: self.ime.enabled(),
                cycles: self.cycles,
            });
        }
    }

    fn fetch_byte(&mut self) -> u8 {
        let byte = self.bus.read(self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(1);
        byte
    }

    fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch_byte();
        let hi = self.fetch_byte();
        u16::from_le_bytes([lo, hi])
    }

    /// Low byte ends up at the lower address.
    fn push16(&mut self, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        self.bus.write(self.registers.sp, hi);
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        self.bus.write(self.registers.sp, lo);
    }

    fn pop16(&mut self) -> u16 {
        let lo = self.bus.read(self.registers.sp);
        self.registers.sp = self.registers.sp.wrapping_add(1);
        let hi = self.bus.read(self.registers.sp);
        self.registers.sp = self.registers.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    /// Replace Z/N/H/C. The low nibble of F is left as it was.
    fn set_flags(&mut self, flags: u8) {
        let f = self.registers.f();
        self.registers.set(Reg8::F, (f & !FLAG_MASK) | (flags & FLAG_MASK));
    }

    fn carry(&self) -> bool {
        self.registers.flag(FLAG_CARRY)
    }

    fn condition(&self, cond: Condition) -> bool {
        match cond {
            Condition::Always => true,
            Condition::NotZero => !self.registers.flag(FLAG_ZERO),
            Condition::Zero => self.registers.flag(FLAG_ZERO),
            Condition::NotCarry => !self.carry(),
            Condition::Carry => self.carry(),
        }
    }

    fn read_operand(&mut self, operand: Operand8) -> u8 {
        match operand {
            Operand8::Reg(reg) => self.registers.get(reg),
            Operand8::Imm => self.fetch_byte(),
            Operand8::Ind(pair) => {
                let addr = self.registers.get16(pair);
                self.bus.read(addr)
            }
            Operand8::HlInc => {
                let hl = self.registers.hl();
                self.registers.set16(Reg16::HL, hl.wrapping_add(1));
                self.bus.read(hl)
            }
            Operand8::HlDec => {
                let hl = self.registers.hl();
                self.registers.set16(Reg16::HL, hl.wrapping_sub(1));
                self.bus.read(hl)
            }
            Operand8::Abs => {
                let addr = self.fetch_word();
                self.bus.read(addr)
            }
            Operand8::High => {
                let offset = self.fetch_byte();
                self.bus.read(0xFF00 | offset as u16)
            }
            Operand8::HighC => {
                let offset = self.registers.get(Reg8::C);
                self.bus.read(0xFF00 | offset as u16)
            }
        }
    }

    fn write_operand(&mut self, operand: Operand8, value: u8) {
        match operand {
            Operand8::Reg(reg) => self.registers.set(reg, value),
            // never a destination
            Operand8::Imm => {}
            Operand8::Ind(pair) => {
                let addr = self.registers.get16(pair);
                self.bus.write(addr, value);
            }
            Operand8::HlInc => {
                let hl = self.registers.hl();
                self.registers.set16(Reg16::HL, hl.wrapping_add(1));
                self.bus.write(hl, value);
            }
            Operand8::HlDec => {
                let hl = self.registers.hl();
                self.registers.set16(Reg16::HL, hl.wrapping_sub(1));
                self.bus.write(hl, value);
            }
            Operand8::Abs => {
                let addr = self.fetch_word();
                self.bus.write(addr, value);
            }
            Operand8::High => {
                let offset = self.fetch_byte();
                self.bus.write(0xFF00 | offset as u16, value);
            }
            Operand8::HighC => {
                let offset = self.registers.get(Reg8::C);
                self.bus.write(0xFF00 | offset as u16, value);
            }
        }
    }

    /// Read-modify-write on an operand, storing the result and its flags.
    fn modify(&mut self, operand: Operand8, f: impl FnOnce(u8, bool) -> AluResult<u8>) {
        let value = self.read_operand(operand);
        let result = f(value, self.carry());
        self.write_operand(operand, result.value);
        self.set_flags(result.flags);
    }

    /// Accumulator rotates clear Z regardless of the result.
    fn rotate_a(&mut self, f: impl FnOnce(u8, bool) -> AluResult<u8>) {
        let result = f(self.registers.a(), self.carry());
        self.registers.set(Reg8::A, result.value);
        self.set_flags(result.flags & !FLAG_ZERO);
    }

    fn alu(&mut self, op: AluOp, value: u8) {
        let a = self.registers.a();
        let carry = self.carry();
        let result = match op {
            AluOp::Add => alu::add8(a, value, false),
            AluOp::Adc => alu::add8(a, value, carry),
            AluOp::Sub | AluOp::Cp => alu::sub8(a, value, false),
            AluOp::Sbc => alu::sub8(a, value, carry),
            AluOp::And => alu::and8(a, value),
            AluOp::Xor => alu::xor8(a, value),
            AluOp::Or => alu::or8(a, value),
        };
        if op != AluOp::Cp {
            self.registers.set(Reg8::A, result.value);
        }
        self.set_flags(result.flags);
    }

    fn shift(op: ShiftOp, value: u8, carry: bool) -> AluResult<u8> {
        match op {
            ShiftOp::Rlc => alu::rlc(value),
            ShiftOp::Rrc => alu::rrc(value),
            ShiftOp::Rl => alu::rl(value, carry),
            ShiftOp::Rr => alu::rr(value, carry),
            ShiftOp::Sla => alu::sla(value),
            ShiftOp::Sra => alu::sra(value),
            ShiftOp::Swap => alu::swap(value),
            ShiftOp::Srl => alu::srl(value),
        }
    }

    fn execute(&mut self, op: Op) {
        match op {
            Op::Nop => {}
            Op::Stop => {
                self.fetch_byte();
                self.halted = true;
            }
            Op::Halt => self.halted = true,
            Op::Di => self.ime.request_disable(),
            Op::Ei => self.ime.request_enable(),
            // resolved in execute_next
            Op::Prefix | Op::Illegal => {}

            Op::Ld(dst, src) => {
                let value = self.read_operand(src);
                self.write_operand(dst, value);
            }
            Op::LdImm16(reg) => {
                let value = self.fetch_word();
                self.registers.set16(reg, value);
            }
            Op::LdAbsSp => {
                let addr = self.fetch_word();
                let [lo, hi] = self.registers.sp.to_le_bytes();
                self.bus.write(addr, lo);
                self.bus.write(addr.wrapping_add(1), hi);
            }
            Op::LdSpHl => self.registers.sp = self.registers.hl(),
            Op::LdHlSpOffset => {
                let offset = self.fetch_byte();
                let result = alu::add_sp(self.registers.sp, offset);
                self.registers.set16(Reg16::HL, result.value);
                self.set_flags(result.flags);
            }
            Op::Push(reg) => {
                let value = self.registers.get16(reg);
                self.push16(value);
            }
            Op::Pop(reg) => {
                let value = self.pop16();
                self.registers.set16(reg, value);
            }

            Op::Alu(op, src) => {
                let value = self.read_operand(src);
                self.alu(op, value);
            }
            Op::Inc(target) => self.modify(target, alu::inc8),
            Op::Dec(target) => self.modify(target, alu::dec8),
            Op::Inc16(reg) => {
                let value = self.registers.get16(reg).wrapping_add(1);
                self.registers.set16(reg, value);
            }
            Op::Dec16(reg) => {
                let value = self.registers.get16(reg).wrapping_sub(1);
                self.registers.set16(reg, value);
            }
            Op::AddHl(reg) => {
                let zero = self.registers.flag(FLAG_ZERO);
                let result = alu::add16(self.registers.hl(), self.registers.get16(reg), zero);
                self.registers.set16(Reg16::HL, result.value);
                self.set_flags(result.flags);
            }
            Op::AddSp => {
                let offset = self.fetch_byte();
                let result = alu::add_sp(self.registers.sp, offset);
                self.registers.sp = result.value;
                self.set_flags(result.flags);
            }

            Op::Rlca => self.rotate_a(|v, _| alu::rlc(v)),
            Op::Rrca => self.rotate_a(|v, _| alu::rrc(v)),
            Op::Rla => self.rotate_a(alu::rl),
            Op::Rra => self.rotate_a(alu::rr),
            Op::Daa => {
                let result = alu::daa(self.registers.a(), self.registers.f());
                self.registers.set(Reg8::A, result.value);
                self.set_flags(result.flags);
            }
            Op::Cpl => {
                let a = self.registers.a();
                self.registers.set(Reg8::A, !a);
                self.registers.set_flag(FLAG_SUBTRACT, true);
                self.registers.set_flag(FLAG_HALF_CARRY, true);
            }
            Op::Scf => {
                self.registers.set_flag(FLAG_SUBTRACT, false);
                self.registers.set_flag(FLAG_HALF_CARRY, false);
                self.registers.set_flag(FLAG_CARRY, true);
            }
            Op::Ccf => {
                let carry = self.carry();
                self.registers.set_flag(FLAG_SUBTRACT, false);
                self.registers.set_flag(FLAG_HALF_CARRY, false);
                self.registers.set_flag(FLAG_CARRY, !carry);
            }

            Op::Jp(cond) => {
                let addr = self.fetch_word();
                if self.condition(cond) {
                    self.registers.pc = addr;
                }
            }
            Op::JpHl => self.registers.pc = self.registers.hl(),
            Op::Jr(cond) => {
                let offset = self.fetch_byte() as i8;
                if self.condition(cond) {
                    self.registers.pc = self.registers.pc.wrapping_add(offset as u16);
                }
            }
            Op::Call(cond) => {
                let addr = self.fetch_word();
                if self.condition(cond) {
                    self.push16(self.registers.pc);
                    self.registers.pc = addr;
                }
            }
            Op::Ret(cond) => {
                if self.condition(cond) {
                    self.registers.pc = self.pop16();
                }
            }
            Op::Reti => {
                self.registers.pc = self.pop16();
                self.ime = InterruptMasterEnable::Enabled;
            }
            Op::Rst(vector) => {
                self.push16(self.registers.pc);
                self.registers.pc = vector as u16;
            }

            Op::Shift(op, target) => self.modify(target, |v, carry| Self::shift(op, v, carry)),
            Op::Bit(bit, src) => {
                let value = self.read_operand(src);
                let flags = alu::bit(value, bit, self.carry());
                self.set_flags(flags);
            }
            Op::Res(bit, target) => {
                let value = self.read_operand(target);
                self.write_operand(target, value & !(1 << bit));
            }
            Op::Set(bit, target) => {
                let value = self.read_operand(target);
                self.write_operand(target, value | (1 << bit));
            }
        }
    }
}
