use std::{cell::RefCell, rc::Rc};

use crate::{
    bus::Bus,
    cartridge::header::HardwareVariant,
    cpu::{
        cpu::{CPU, IE_ADDR, IF_ADDR},
        flags::{FLAG_CARRY, FLAG_HALF_CARRY, FLAG_SUBTRACT, FLAG_ZERO},
        instructions::{EXTENDED, Op, PRIMARY},
        interrupts::{INT_JOYPAD, INT_TIMER, INT_VBLANK},
        registers::{Reg8, Reg16},
        trace::{TraceEntry, TraceSink},
    },
    error::CpuError,
};

struct TestBus {
    mem: [u8; 65536],
    ticks: u32,
}

impl TestBus {
    fn new() -> Self {
        Self {
            mem: [0; 65536],
            ticks: 0,
        }
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.mem[addr as usize] = data;
    }

    fn tick(&mut self, cycles: u32) {
        self.ticks += cycles;
    }
}

const START: usize = 0x0100;

fn cpu_with(program: &[u8]) -> CPU<TestBus> {
    let mut bus = TestBus::new();
    bus.mem[START..START + program.len()].copy_from_slice(program);
    CPU::new(bus, HardwareVariant::Dmg)
}

fn step(cpu: &mut CPU<TestBus>) -> u32 {
    cpu.step().expect("legal opcode")
}

#[test]
fn small_program_runs_end_to_end() {
    // LD A,5; LD B,3; ADD A,B; NOP
    let mut cpu = cpu_with(&[0x3E, 0x05, 0x06, 0x03, 0x80, 0x00]);

    let total: u32 = (0..4).map(|_| step(&mut cpu)).sum();

    assert_eq!(cpu.registers.a(), 8);
    assert!(!cpu.registers.flag(FLAG_ZERO));
    assert!(!cpu.registers.flag(FLAG_HALF_CARRY));
    assert!(!cpu.registers.flag(FLAG_CARRY));
    assert_eq!(cpu.registers.pc, START as u16 + 6);
    assert_eq!(total, 24);
    assert_eq!(cpu.cycles, 24);
    assert_eq!(cpu.bus.ticks, 24);
}

#[test]
fn add_sets_half_carry() {
    let mut cpu = cpu_with(&[0x80]); // ADD A,B
    cpu.registers.set(Reg8::A, 0x0F);
    cpu.registers.set(Reg8::B, 0x01);
    step(&mut cpu);

    assert_eq!(cpu.registers.a(), 0x10);
    assert!(!cpu.registers.flag(FLAG_ZERO));
    assert!(!cpu.registers.flag(FLAG_SUBTRACT));
    assert!(cpu.registers.flag(FLAG_HALF_CARRY));
    assert!(!cpu.registers.flag(FLAG_CARRY));
}

#[test]
fn sub_borrows_through_zero() {
    let mut cpu = cpu_with(&[0x90]); // SUB B
    cpu.registers.set(Reg8::A, 0x00);
    cpu.registers.set(Reg8::B, 0x01);
    step(&mut cpu);

    assert_eq!(cpu.registers.a(), 0xFF);
    assert!(!cpu.registers.flag(FLAG_ZERO));
    assert!(cpu.registers.flag(FLAG_SUBTRACT));
    assert!(cpu.registers.flag(FLAG_CARRY));
}

#[test]
fn cp_leaves_accumulator() {
    let mut cpu = cpu_with(&[0xFE, 0x42]); // CP $42
    cpu.registers.set(Reg8::A, 0x42);
    step(&mut cpu);

    assert_eq!(cpu.registers.a(), 0x42);
    assert!(cpu.registers.flag(FLAG_ZERO));
    assert!(cpu.registers.flag(FLAG_SUBTRACT));
}

#[test]
fn flag_updates_keep_low_nibble_of_f() {
    let mut cpu = cpu_with(&[0x80]);
    cpu.registers.set(Reg8::A, 0x0F);
    cpu.registers.set(Reg8::B, 0x01);
    cpu.registers.set(Reg8::F, 0x0F);
    step(&mut cpu);

    assert_eq!(cpu.registers.f(), FLAG_HALF_CARRY | 0x0F);
}

#[test]
fn push_pop_round_trip_for_every_pair() {
    let cases = [
        (0xC5, 0xC1, Reg16::BC),
        (0xD5, 0xD1, Reg16::DE),
        (0xE5, 0xE1, Reg16::HL),
        (0xF5, 0xF1, Reg16::AF),
    ];
    for (push, pop, pair) in cases {
        let mut cpu = cpu_with(&[push, pop]);
        cpu.registers.set16(pair, 0x12F5);

        assert_eq!(step(&mut cpu), 16);
        assert_eq!(cpu.registers.sp, 0xFFFC);
        assert_eq!(cpu.bus.mem[0xFFFC], 0xF5, "{pair} low byte");
        assert_eq!(cpu.bus.mem[0xFFFD], 0x12, "{pair} high byte");

        cpu.registers.set16(pair, 0);
        assert_eq!(step(&mut cpu), 12);
        assert_eq!(cpu.registers.get16(pair), 0x12F5, "{pair}");
        assert_eq!(cpu.registers.sp, 0xFFFE);
    }
}

#[test]
fn pushed_low_byte_sits_at_the_new_stack_pointer() {
    // PUSH BC; LD HL,SP+0; LD A,(HL)
    let mut cpu = cpu_with(&[0xC5, 0xF8, 0x00, 0x7E]);
    cpu.registers.set16(Reg16::BC, 0xBEEF);
    step(&mut cpu);
    step(&mut cpu);
    step(&mut cpu);
    assert_eq!(cpu.registers.get16(Reg16::HL), 0xFFFC);
    assert_eq!(cpu.registers.a(), 0xEF);
}

#[test]
fn stop_skips_its_operand_and_halts() {
    let mut cpu = cpu_with(&[0x10, 0x00, 0x3C]); // STOP; INC A
    assert_eq!(step(&mut cpu), 4);
    assert!(cpu.halted);
    assert_eq!(cpu.registers.pc, START as u16 + 2);

    // Stays put until an enabled interrupt is requested
    assert_eq!(step(&mut cpu), 4);
    assert_eq!(cpu.registers.pc, START as u16 + 2);
}

#[test]
fn ei_takes_effect_after_next_instruction() {
    let mut cpu = cpu_with(&[0xFB, 0x00]); // EI; NOP
    step(&mut cpu);
    assert!(!cpu.interrupts_enabled());
    step(&mut cpu);
    assert!(cpu.interrupts_enabled());
}

#[test]
fn di_takes_effect_after_next_instruction() {
    let mut cpu = cpu_with(&[0xFB, 0x00, 0xF3, 0x00]); // EI; NOP; DI; NOP
    step(&mut cpu);
    step(&mut cpu);
    assert!(cpu.interrupts_enabled());
    step(&mut cpu);
    assert!(cpu.interrupts_enabled());
    step(&mut cpu);
    assert!(!cpu.interrupts_enabled());
}

#[test]
fn every_defined_opcode_costs_cycles() {
    for opcode in 0..=255u8 {
        let expected = PRIMARY[opcode as usize];
        if matches!(expected.op, Op::Illegal | Op::Prefix) {
            continue;
        }
        let mut cpu = cpu_with(&[opcode, 0x00, 0x00]);
        let cycles = step(&mut cpu);
        assert!(cycles > 0, "${opcode:02X}");
        assert_eq!(cycles, expected.cycles, "${opcode:02X}");
    }

    for opcode in 0..=255u8 {
        let mut cpu = cpu_with(&[0xCB, opcode]);
        let cycles = step(&mut cpu);
        assert!(cycles > 0, "$CB ${opcode:02X}");
        assert_eq!(cycles, EXTENDED[opcode as usize].cycles);
        assert_eq!(cpu.registers.pc, START as u16 + 2);
    }
}

#[test]
fn illegal_opcode_locks_the_cpu() {
    let mut cpu = cpu_with(&[0xD3, 0x00]);
    let err = CpuError::IllegalOpcode {
        opcode: 0xD3,
        pc: 0x0100,
    };

    assert_eq!(cpu.step(), Err(err));
    assert_eq!(cpu.step(), Err(err));
    assert_eq!(cpu.cycles, 0);
    assert_eq!(cpu.bus.ticks, 0);
}

#[test]
fn jp_and_jr() {
    let mut cpu = cpu_with(&[0xC3, 0x00, 0x20]); // JP $2000
    assert_eq!(step(&mut cpu), 12);
    assert_eq!(cpu.registers.pc, 0x2000);

    let mut cpu = cpu_with(&[0x18, 0xFE]); // JR -2
    assert_eq!(step(&mut cpu), 8);
    assert_eq!(cpu.registers.pc, 0x0100);

    let mut cpu = cpu_with(&[0xE9]); // JP HL
    cpu.registers.set16(Reg16::HL, 0x4000);
    step(&mut cpu);
    assert_eq!(cpu.registers.pc, 0x4000);
}

#[test]
fn conditional_not_taken_costs_the_same() {
    let mut cpu = cpu_with(&[0x20, 0x10]); // JR NZ,+16
    cpu.registers.set_flag(FLAG_ZERO, true);
    assert_eq!(step(&mut cpu), 8);
    assert_eq!(cpu.registers.pc, 0x0102);

    let mut cpu = cpu_with(&[0xDA, 0x00, 0x20]); // JP C,$2000
    cpu.registers.set_flag(FLAG_CARRY, false);
    assert_eq!(step(&mut cpu), 12);
    assert_eq!(cpu.registers.pc, 0x0103);
}

#[test]
fn call_and_ret() {
    let mut cpu = cpu_with(&[0xCD, 0x00, 0x20]); // CALL $2000
    cpu.bus.mem[0x2000] = 0xC9; // RET

    assert_eq!(step(&mut cpu), 12);
    assert_eq!(cpu.registers.pc, 0x2000);
    assert_eq!(cpu.registers.sp, 0xFFFC);
    assert_eq!(cpu.bus.mem[0xFFFC], 0x03);
    assert_eq!(cpu.bus.mem[0xFFFD], 0x01);

    assert_eq!(step(&mut cpu), 8);
    assert_eq!(cpu.registers.pc, 0x0103);
    assert_eq!(cpu.registers.sp, 0xFFFE);
}

#[test]
fn rst_pushes_return_address() {
    let mut cpu = cpu_with(&[0xFF]); // RST $38
    assert_eq!(step(&mut cpu), 32);
    assert_eq!(cpu.registers.pc, 0x0038);
    assert_eq!(cpu.bus.mem[0xFFFC], 0x01);
    assert_eq!(cpu.bus.mem[0xFFFD], 0x01);
}

#[test]
fn reti_enables_interrupts_immediately() {
    let mut cpu = cpu_with(&[0xD9]);
    cpu.registers.sp = 0xFFFC;
    cpu.bus.mem[0xFFFC] = 0x00;
    cpu.bus.mem[0xFFFD] = 0x30;

    step(&mut cpu);
    assert_eq!(cpu.registers.pc, 0x3000);
    assert!(cpu.interrupts_enabled());
}

#[test]
fn halt_idles_until_an_interrupt_is_serviced() {
    let mut cpu = cpu_with(&[0xFB, 0x00, 0x76]); // EI; NOP; HALT
    step(&mut cpu);
    step(&mut cpu);
    step(&mut cpu);
    assert!(cpu.halted);

    assert_eq!(step(&mut cpu), 4);
    assert!(cpu.halted);
    assert_eq!(cpu.registers.pc, 0x0103);

    cpu.bus.mem[IE_ADDR as usize] = INT_VBLANK;
    cpu.bus.mem[IF_ADDR as usize] = INT_VBLANK;
    assert_eq!(step(&mut cpu), 20);
    assert!(!cpu.halted);
    assert!(!cpu.interrupts_enabled());
    assert_eq!(cpu.registers.pc, 0x0040);
    assert_eq!(cpu.bus.mem[IF_ADDR as usize], 0);
    assert_eq!(cpu.bus.mem[0xFFFC], 0x03);
    assert_eq!(cpu.bus.mem[0xFFFD], 0x01);
}

#[test]
fn halt_wakes_without_dispatch_when_ime_is_off() {
    let mut cpu = cpu_with(&[0x76, 0x3C]); // HALT; INC A
    step(&mut cpu);
    assert!(cpu.halted);

    cpu.bus.mem[IE_ADDR as usize] = INT_TIMER;
    cpu.bus.mem[IF_ADDR as usize] = INT_TIMER;
    let a = cpu.registers.a();
    assert_eq!(step(&mut cpu), 4);
    assert!(!cpu.halted);
    assert_eq!(cpu.registers.a(), a.wrapping_add(1));
    assert_eq!(cpu.bus.mem[IF_ADDR as usize], INT_TIMER);
}

#[test]
fn interrupts_dispatch_in_priority_order() {
    let mut cpu = cpu_with(&[0xFB, 0x00, 0x00]);
    step(&mut cpu);
    step(&mut cpu);

    cpu.bus.mem[IE_ADDR as usize] = 0x1F;
    cpu.bus.mem[IF_ADDR as usize] = INT_TIMER | INT_JOYPAD;
    step(&mut cpu);
    assert_eq!(cpu.registers.pc, 0x0050);
    assert_eq!(cpu.bus.mem[IF_ADDR as usize], INT_JOYPAD);
}

#[test]
fn extended_rotates_write_their_own_register() {
    let mut cpu = cpu_with(&[0xCB, 0x00, 0xCB, 0x09]); // RLC B; RRC C
    cpu.registers.set(Reg8::B, 0x85);
    cpu.registers.set(Reg8::C, 0x01);

    assert_eq!(step(&mut cpu), 8);
    assert_eq!(cpu.registers.get(Reg8::B), 0x0B);
    assert_eq!(cpu.registers.get(Reg8::C), 0x01);
    assert!(cpu.registers.flag(FLAG_CARRY));

    step(&mut cpu);
    assert_eq!(cpu.registers.get(Reg8::C), 0x80);
    assert_eq!(cpu.registers.get(Reg8::B), 0x0B);
}

#[test]
fn extended_ops_on_hl_memory() {
    // SET 3,(HL); BIT 3,(HL); RES 3,(HL)
    let mut cpu = cpu_with(&[0xCB, 0xDE, 0xCB, 0x5E, 0xCB, 0x9E]);
    cpu.registers.set16(Reg16::HL, 0xC000);

    assert_eq!(step(&mut cpu), 16);
    assert_eq!(cpu.bus.mem[0xC000], 0x08);
    step(&mut cpu);
    assert!(!cpu.registers.flag(FLAG_ZERO));
    step(&mut cpu);
    assert_eq!(cpu.bus.mem[0xC000], 0x00);
}

#[test]
fn hl_increment_loads() {
    let mut cpu = cpu_with(&[0x22, 0x2A]); // LD (HL+),A; LD A,(HL+)
    cpu.registers.set16(Reg16::HL, 0xC000);
    cpu.registers.set(Reg8::A, 0x42);
    cpu.bus.mem[0xC001] = 0x99;

    step(&mut cpu);
    assert_eq!(cpu.bus.mem[0xC000], 0x42);
    assert_eq!(cpu.registers.hl(), 0xC001);

    step(&mut cpu);
    assert_eq!(cpu.registers.a(), 0x99);
    assert_eq!(cpu.registers.hl(), 0xC002);
}

#[test]
fn high_page_loads() {
    let mut cpu = cpu_with(&[0xE0, 0x80, 0xF0, 0x81]); // LDH ($80),A; LDH A,($81)
    cpu.registers.set(Reg8::A, 0x5A);
    cpu.bus.mem[0xFF81] = 0x33;

    assert_eq!(step(&mut cpu), 12);
    assert_eq!(cpu.bus.mem[0xFF80], 0x5A);
    assert_eq!(step(&mut cpu), 12);
    assert_eq!(cpu.registers.a(), 0x33);
}

#[test]
fn store_sp_at_absolute_address() {
    let mut cpu = cpu_with(&[0x08, 0x00, 0xC0]); // LD ($C000),SP
    assert_eq!(step(&mut cpu), 20);
    assert_eq!(cpu.bus.mem[0xC000], 0xFE);
    assert_eq!(cpu.bus.mem[0xC001], 0xFF);
}

#[test]
fn add_hl_keeps_zero_flag() {
    let mut cpu = cpu_with(&[0x09]); // ADD HL,BC
    cpu.registers.set16(Reg16::HL, 0x0FFF);
    cpu.registers.set16(Reg16::BC, 0x0001);
    cpu.registers.set_flag(FLAG_ZERO, true);
    step(&mut cpu);

    assert_eq!(cpu.registers.hl(), 0x1000);
    assert!(cpu.registers.flag(FLAG_ZERO));
    assert!(cpu.registers.flag(FLAG_HALF_CARRY));
    assert!(!cpu.registers.flag(FLAG_CARRY));
}

#[test]
fn daa_corrects_bcd_sum() {
    let mut cpu = cpu_with(&[0xC6, 0x27, 0x27]); // ADD A,$27; DAA
    cpu.registers.set(Reg8::A, 0x15);
    step(&mut cpu);
    step(&mut cpu);
    assert_eq!(cpu.registers.a(), 0x42);
}

#[test]
fn rlca_clears_zero() {
    let mut cpu = cpu_with(&[0x07]);
    cpu.registers.set(Reg8::A, 0x00);
    cpu.registers.set_flag(FLAG_ZERO, true);
    step(&mut cpu);
    assert!(!cpu.registers.flag(FLAG_ZERO));
}

struct Recorder(Rc<RefCell<Vec<String>>>);

impl TraceSink for Recorder {
    fn record(&mut self, entry: &TraceEntry<'_>) {
        self.0.borrow_mut().push(entry.to_string());
    }
}

#[test]
fn trace_sink_sees_each_instruction() {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let mut cpu = cpu_with(&[0x3E, 0x05, 0xCB, 0x37]); // LD A,5; SWAP A
    cpu.set_trace_sink(Some(Box::new(Recorder(Rc::clone(&lines)))));
    step(&mut cpu);
    step(&mut cpu);

    let lines = lines.borrow();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("0100  3E"));
    assert!(lines[0].contains("LD A,n"));
    assert!(lines[1].starts_with("0102  CB 37"));
    assert!(lines[1].contains("SWAP A"));
    assert!(lines[1].contains("CYC:8"));
}

#[test]
fn trace_shows_interrupt_master_enable() {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let mut cpu = cpu_with(&[0xFB, 0x00, 0x00]); // EI; NOP; NOP
    cpu.set_trace_sink(Some(Box::new(Recorder(Rc::clone(&lines)))));
    step(&mut cpu);
    step(&mut cpu);
    step(&mut cpu);

    let lines = lines.borrow();
    // EI takes effect after the instruction that follows it
    assert!(lines[0].contains("IME:0"));
    assert!(lines[1].contains("IME:0"));
    assert!(lines[2].contains("IME:1"));
}
