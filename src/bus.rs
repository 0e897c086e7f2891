//! Memory bus and address decoding for the Game Boy.
//!
//! Maps CPU addresses to the cartridge, PPU memory, work RAM, the joypad and the
//! interrupt registers.

use crate::{
    cartridge::cartridge::Cartridge,
    config::UnmappedReads,
    controller::{Button, Controller},
    cpu::interrupts::{INT_JOYPAD, INT_MASK},
    ppu::ppu::{OAM_LEN, PPU},
};

/// The CPU's view of the 16-bit address space. Implementors decode addresses; the CPU
/// only sees bytes and reports the cycles each step consumed.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
    /// Called after each CPU step with the cycles it took.
    fn tick(&mut self, _cycles: u32) {}
}

pub const WRAM_LEN: usize = 0x2000;
pub const ERAM_LEN: usize = 0x2000;

/// Main Game Boy bus: cartridge, PPU, work RAM, external RAM, joypad and interrupts.
pub struct GbBus {
    pub cart: Cartridge,
    pub ppu: PPU,
    pub controller: Controller,
    pub wram: [u8; WRAM_LEN],
    pub eram: [u8; ERAM_LEN],
    /// IE ($FFFF).
    pub ie: u8,
    /// IF ($FF0F), low five bits.
    pub interrupt_flag: u8,
    booting: bool,
    unmapped: UnmappedReads,
}

impl GbBus {
    /// Create a bus for a freshly loaded cartridge. The boot stage starts active.
    pub fn new(cart: Cartridge, unmapped: UnmappedReads) -> Self {
        Self {
            cart,
            ppu: PPU::new(),
            controller: Controller::new(),
            wram: [0; WRAM_LEN],
            eram: [0; ERAM_LEN],
            ie: 0,
            interrupt_flag: 0,
            booting: true,
            unmapped,
        }
    }

    /// True until the boot stage is left; ROM writes go to the image meanwhile.
    pub fn booting(&self) -> bool {
        self.booting
    }

    pub fn finish_boot(&mut self) {
        self.booting = false;
    }

    /// Set when VBlank entry swaps the back buffer to the front; `ppu.frame()` then holds
    /// the finished 160x144 image until the next swap.
    pub fn frame_ready(&self) -> bool {
        self.ppu.frame_ready
    }

    /// Acknowledge the published frame once the host has presented it.
    pub fn clear_frame_ready(&mut self) {
        self.ppu.frame_ready = false;
    }

    /// A new press requests the joypad interrupt.
    pub fn key_down(&mut self, button: Button) {
        if self.controller.press(button) {
            self.interrupt_flag |= INT_JOYPAD;
        }
    }

    pub fn key_up(&mut self, button: Button) {
        self.controller.release(button);
    }

    fn unmapped_read(&self) -> u8 {
        match self.unmapped {
            UnmappedReads::InterruptEnable => self.ie,
            UnmappedReads::Zero => 0,
        }
    }

    /// OAM DMA: copy 160 bytes from `page << 8` into sprite attribute memory.
    fn oam_dma(&mut self, page: u8) {
        let source = u16::from(page) << 8;
        let mut data = [0u8; OAM_LEN];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = self.read(source.wrapping_add(i as u16));
        }
        self.ppu.oam_dma(page, &data);
    }
}

impl Bus for GbBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // Cartridge ROM; no boot overlay, so $0000-$00FF reads the image too
            0x0000..=0x7FFF => self.cart.read(addr),
            0x8000..=0x9FFF => self.ppu.read_vram(addr),
            0xA000..=0xBFFF => self.eram[(addr - 0xA000) as usize],
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize],
            // Echo of $C000-$DDFF
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize],
            0xFE00..=0xFE9F => self.ppu.read_oam(addr),
            0xFF00 => self.controller.read(),
            0xFF0F => 0xE0 | self.interrupt_flag,
            0xFF40..=0xFF4B => self.ppu.read_register(addr),
            0xFF80..=0xFFFE => self.ppu.read_hram(addr),
            0xFFFF => self.ie,
            _ => self.unmapped_read(),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x7FFF => {
                if self.booting {
                    self.cart.write_through(addr, data);
                }
            }
            0x8000..=0x9FFF => self.ppu.write_vram(addr, data),
            0xA000..=0xBFFF => self.eram[(addr - 0xA000) as usize] = data,
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize] = data,
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize] = data,
            0xFE00..=0xFE9F => self.ppu.write_oam(addr, data),
            0xFF00 => self.controller.write(data),
            0xFF0F => self.interrupt_flag = data & INT_MASK,
            0xFF46 => self.oam_dma(data),
            0xFF40..=0xFF4B => self.ppu.write_register(addr, data),
            0xFF50 => {
                if data != 0 {
                    self.booting = false;
                }
            }
            0xFF80..=0xFFFE => self.ppu.write_hram(addr, data),
            0xFFFF => self.ie = data,
            _ => {}
        }
    }

    /// Advance the PPU and latch the interrupts it raised into IF.
    fn tick(&mut self, cycles: u32) {
        self.ppu.step(cycles);
        self.interrupt_flag |= self.ppu.take_interrupts();
    }
}
