//! Machine driver: one loaded cartridge, run a frame at a time.

use std::path::Path;

use ansi_term::Colour::Green;

use crate::{
    bus::GbBus,
    cartridge::cartridge::Cartridge,
    clock::Clock,
    config::EmulatorConfig,
    controller::Button,
    cpu::{cpu::CPU, trace::TraceSink},
    error::{EmulatorError, Result},
};

/// Where the boot ROM hands over to the cartridge.
pub const ENTRY_POINT: u16 = 0x0100;

pub struct GameBoy {
    config: EmulatorConfig,
    cpu: Option<CPU<GbBus>>,
    clock: Clock,
    /// Sink set before anything was loaded; handed to the next CPU.
    trace: Option<Box<dyn TraceSink>>,
}

impl GameBoy {
    pub fn new(config: EmulatorConfig) -> Self {
        Self {
            config,
            cpu: None,
            clock: Clock::new(),
            trace: None,
        }
    }

    /// Load a cartridge image, replacing whatever was running.
    pub fn load(&mut self, rom: Vec<u8>) -> Result<()> {
        let cart = Cartridge::from_bytes(rom)?;
        self.insert(cart);
        Ok(())
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let cart = Cartridge::load(path)?;
        self.insert(cart);
        Ok(())
    }

    fn insert(&mut self, cart: Cartridge) {
        let variant = self.config.model.unwrap_or_else(|| cart.variant());
        println!(
            "{} loaded \"{}\" ({}, running as {})",
            Green.bold().paint("INFO"),
            cart.title(),
            cart.header().cartridge_kind(),
            variant
        );

        let trace = match self.cpu.take() {
            Some(mut old) => old.take_trace_sink(),
            None => self.trace.take(),
        };
        let mut cpu = CPU::new(GbBus::new(cart, self.config.unmapped_reads), variant);
        cpu.set_trace_sink(trace);
        self.cpu = Some(cpu);
        self.clock.reset();
    }

    /// Run until the frame clock reaches `CYCLES_PER_FRAME` and return the cycles run.
    /// The last instruction may overshoot; the total is not clamped.
    pub fn emulate_frame(&mut self) -> Result<u32> {
        let cpu = self.cpu.as_mut().ok_or(EmulatorError::NotLoaded)?;
        self.clock.reset();

        while !self.clock.frame_complete() {
            if cpu.bus.booting() && cpu.registers.pc == ENTRY_POINT {
                cpu.bus.finish_boot();
            }
            let cycles = cpu.step()?;
            self.clock.advance(cycles);
        }

        Ok(self.clock.cycles())
    }

    pub fn key_down(&mut self, button: Button) {
        if let Some(cpu) = self.cpu.as_mut() {
            cpu.bus.key_down(button);
        }
    }

    pub fn key_up(&mut self, button: Button) {
        if let Some(cpu) = self.cpu.as_mut() {
            cpu.bus.key_up(button);
        }
    }

    /// Title from the cartridge header.
    pub fn game_name(&self) -> Option<&str> {
        self.cpu.as_ref().map(|cpu| cpu.bus.cart.title())
    }

    /// Last completed frame, 160x144 `0x00RRGGBB` pixels.
    pub fn frame(&self) -> Option<&[u32]> {
        self.cpu.as_ref().map(|cpu| cpu.bus.ppu.frame())
    }

    /// True when a new frame was published since the last `clear_frame_ready`.
    pub fn frame_ready(&self) -> bool {
        self.cpu.as_ref().is_some_and(|cpu| cpu.bus.frame_ready())
    }

    pub fn clear_frame_ready(&mut self) {
        if let Some(cpu) = self.cpu.as_mut() {
            cpu.bus.clear_frame_ready();
        }
    }

    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        match self.cpu.as_mut() {
            Some(cpu) => cpu.set_trace_sink(Some(sink)),
            None => self.trace = Some(sink),
        }
    }

    pub fn cpu(&self) -> Option<&CPU<GbBus>> {
        self.cpu.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cartridge::header::{HardwareVariant, tests::build_rom},
        clock::CYCLES_PER_FRAME,
        cpu::interrupts::INT_JOYPAD,
        error::{CartridgeError, CpuError},
        ppu::frame::{SCREEN_HEIGHT, SCREEN_WIDTH},
    };

    /// Where test programs start, just past the header.
    const PROGRAM: usize = 0x0150;

    /// Image whose entry point jumps over the header to `program`.
    fn rom_with(program: &[u8]) -> Vec<u8> {
        let mut rom = build_rom("FRAMES");
        rom[0x0100..0x0103].copy_from_slice(&[0xC3, 0x50, 0x01]); // JP $0150
        rom[PROGRAM..PROGRAM + program.len()].copy_from_slice(program);
        rom
    }

    #[test]
    fn frame_without_cartridge_is_an_error() {
        let mut gb = GameBoy::new(EmulatorConfig::default());
        assert!(matches!(gb.emulate_frame(), Err(EmulatorError::NotLoaded)));
        assert_eq!(gb.game_name(), None);
        assert!(gb.frame().is_none());
    }

    #[test]
    fn frame_runs_until_threshold_is_crossed() {
        // JP $0150 (12), then JR -2 (8) forever
        let mut gb = GameBoy::new(EmulatorConfig::default());
        gb.load(rom_with(&[0x18, 0xFE])).unwrap();
        assert_eq!(gb.emulate_frame().unwrap(), 12 + 8 * 8777);
        // Only the loop now, which lands exactly on the threshold
        assert_eq!(gb.emulate_frame().unwrap(), CYCLES_PER_FRAME);
        assert_eq!(gb.cpu().unwrap().registers.pc, PROGRAM as u16);
    }

    #[test]
    fn frame_overshoot_is_not_clamped() {
        // LD ($C000),SP; JP $0150: 20 + 12 per loop
        let mut gb = GameBoy::new(EmulatorConfig::default());
        gb.load(rom_with(&[0x08, 0x00, 0xC0, 0xC3, 0x50, 0x01])).unwrap();

        // 12 + 2194 loops reaches 70220; the next LD crosses to 70240
        assert_eq!(gb.emulate_frame().unwrap(), 70_240);
        // Second frame starts on the JP and crosses on an LD again
        assert_eq!(gb.emulate_frame().unwrap(), 70_240);
        assert_eq!(gb.cpu().unwrap().registers.pc, PROGRAM as u16 + 3);
        assert_eq!(gb.cpu().unwrap().bus.wram[0], 0xFE);
    }

    #[test]
    fn game_name_comes_from_header() {
        let mut gb = GameBoy::new(EmulatorConfig::default());
        gb.load(build_rom("POKEMON RED")).unwrap();
        assert_eq!(gb.game_name(), Some("POKEMON RED"));
    }

    #[test]
    fn bad_logo_is_rejected() {
        let mut rom = build_rom("BAD");
        rom[0x0104] = 0x00;
        let mut gb = GameBoy::new(EmulatorConfig::default());
        assert!(matches!(
            gb.load(rom),
            Err(EmulatorError::Cartridge(CartridgeError::LogoMismatch))
        ));
        assert!(gb.cpu().is_none());
    }

    #[test]
    fn boot_stage_ends_at_entry_point() {
        let mut gb = GameBoy::new(EmulatorConfig::default());
        gb.load(rom_with(&[0x18, 0xFE])).unwrap();
        assert!(gb.cpu().unwrap().bus.booting());
        gb.emulate_frame().unwrap();
        assert!(!gb.cpu().unwrap().bus.booting());
    }

    #[test]
    fn model_override_picks_register_values() {
        let config = EmulatorConfig {
            model: Some(HardwareVariant::Pocket),
            ..EmulatorConfig::default()
        };
        let mut gb = GameBoy::new(config);
        gb.load(build_rom("POCKET")).unwrap();
        assert_eq!(gb.cpu().unwrap().registers.a(), 0xFF);
    }

    #[test]
    fn illegal_opcode_stops_the_frame() {
        let mut gb = GameBoy::new(EmulatorConfig::default());
        gb.load(rom_with(&[0x00, 0xDD])).unwrap();
        assert!(matches!(
            gb.emulate_frame(),
            Err(EmulatorError::Cpu(CpuError::IllegalOpcode {
                opcode: 0xDD,
                pc: 0x0151
            }))
        ));
    }

    #[test]
    fn key_presses_reach_the_joypad() {
        let mut gb = GameBoy::new(EmulatorConfig::default());
        gb.load(build_rom("KEYS")).unwrap();
        gb.key_down(Button::Start);
        assert_eq!(gb.cpu().unwrap().bus.interrupt_flag & INT_JOYPAD, INT_JOYPAD);
        gb.key_up(Button::Start);
        assert_eq!(gb.cpu().unwrap().bus.controller.actions, 0x0F);
    }

    #[test]
    fn frame_is_published_at_vblank() {
        let mut gb = GameBoy::new(EmulatorConfig::default());
        gb.load(rom_with(&[0x18, 0xFE])).unwrap();
        assert_eq!(gb.frame().unwrap().len(), SCREEN_WIDTH * SCREEN_HEIGHT);
        assert!(!gb.frame_ready());

        gb.emulate_frame().unwrap();
        assert!(gb.frame_ready());
        gb.clear_frame_ready();
        assert!(!gb.frame_ready());
    }
}
