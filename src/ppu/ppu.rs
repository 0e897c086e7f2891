//! LCD controller timing and video memory.
//!
//! Handles the four-mode scanline state machine, LY/LYC, STAT and VBlank interrupt requests,
//! VRAM (tile patterns and background maps), OAM, HRAM and palettes. Registers: $FF40–$FF4B.
//!
//! Timing is instruction-granular: the mode clock advances by the cost of the instruction
//! just executed and is reset to zero on every mode change, so any overshoot is discarded.

use crate::clock::Clock;
use crate::cpu::interrupts::{INT_LCD_STAT, INT_VBLANK};
use crate::ppu::frame::FrameBuffers;
use crate::ppu::palette::{Palette, Shade};

/// OAM (Object Attribute Memory): 40 sprites × 4 bytes. Each entry: Y, X, tile, flags.
pub const OAM_LEN: usize = 160;
/// Tile patterns in $8000–$97FF, 16 bytes each (8×8 pixels, 2 bits per pixel).
pub const TILE_COUNT: usize = 384;
pub const TILE_LEN: usize = 16;
/// Each background map is 32×32 tile indices.
pub const MAP_LEN: usize = 32 * 32;
/// High RAM $FF80–$FFFE.
pub const HRAM_LEN: usize = 127;

const OAM_SCAN_CYCLES: u32 = 80;
const PIXEL_TRANSFER_CYCLES: u32 = 172;
const HBLANK_CYCLES: u32 = 204;
const VBLANK_LINE_CYCLES: u32 = 456;
const LAST_VISIBLE_LINE: u8 = 143;
const LAST_LINE: u8 = 153;

// LCDC ($FF40) bits used here; the rest only matter to a rasteriser
const LCDC_BG_ENABLE: u8 = 1 << 0;
const LCDC_TILE_SET: u8 = 1 << 4;
const LCDC_LCD_ENABLE: u8 = 1 << 7;

// STAT ($FF41) interrupt selects
const STAT_HBLANK: u8 = 1 << 3;
const STAT_VBLANK: u8 = 1 << 4;
const STAT_OAM: u8 = 1 << 5;
const STAT_LYC: u8 = 1 << 6;
const STAT_WRITABLE: u8 = STAT_HBLANK | STAT_VBLANK | STAT_OAM | STAT_LYC;

/// LCD mode. The STAT encoding is HBlank = 0, VBlank = 1, OAMScan = 2, PixelTransfer = 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    HBlank,
    VBlank,
    OamScan,
    PixelTransfer,
}

impl Mode {
    pub fn bits(self) -> u8 {
        match self {
            Mode::HBlank => 0,
            Mode::VBlank => 1,
            Mode::OamScan => 2,
            Mode::PixelTransfer => 3,
        }
    }
}

/// PPU state: mode timing, registers, video memory, and the frame buffers.
pub struct PPU {
    pub mode: Mode,
    /// Cycles spent in the current mode; reset on every transition.
    pub mode_clock: Clock,
    /// LY ($FF44), 0–153.
    pub line: u8,
    /// LYC ($FF45).
    pub lyc: u8,
    pub lcdc: u8,
    /// STAT bits 3–6.
    pub stat_select: u8,
    pub scroll_x: u8,
    pub scroll_y: u8,
    pub window_x: u8,
    pub window_y: u8,
    /// Last page written to DMA ($FF46).
    pub dma: u8,
    pub bgp: Palette,
    pub obp0: Palette,
    pub obp1: Palette,
    pub tiles: [[u8; TILE_LEN]; TILE_COUNT],
    /// Map 0 at $9800, map 1 at $9C00.
    pub maps: [[u8; MAP_LEN]; 2],
    pub oam: [u8; OAM_LEN],
    pub hram: [u8; HRAM_LEN],
    /// Set on VBlank entry; cleared by the host after presenting.
    pub frame_ready: bool,
    /// IF bits raised since the bus last collected them.
    interrupts: u8,
    frames: FrameBuffers,
}

impl PPU {
    /// Create the PPU in its post-boot state: HBlank, line 0, LCD and background on.
    pub fn new() -> Self {
        Self {
            mode: Mode::HBlank,
            mode_clock: Clock::new(),
            line: 0,
            lyc: 0,
            lcdc: LCDC_LCD_ENABLE | LCDC_TILE_SET | LCDC_BG_ENABLE,
            stat_select: 0,
            scroll_x: 0,
            scroll_y: 0,
            window_x: 0,
            window_y: 0,
            dma: 0xFF,
            bgp: Palette::new(0xFC),
            obp0: Palette::new(0xFF),
            obp1: Palette::new(0xFF),
            tiles: [[0; TILE_LEN]; TILE_COUNT],
            maps: [[0; MAP_LEN]; 2],
            oam: [0; OAM_LEN],
            hram: [0; HRAM_LEN],
            frame_ready: false,
            interrupts: 0,
            frames: FrameBuffers::new(Shade::White.rgb()),
        }
    }

    /// Advance by the cost of the last instruction. At most one mode transition per call.
    pub fn step(&mut self, cycles: u32) {
        self.mode_clock.advance(cycles);
        let elapsed = self.mode_clock.cycles();

        match self.mode {
            Mode::OamScan => {
                if elapsed >= OAM_SCAN_CYCLES {
                    self.enter(Mode::PixelTransfer);
                }
            }
            Mode::PixelTransfer => {
                if elapsed >= PIXEL_TRANSFER_CYCLES {
                    self.enter(Mode::HBlank);
                }
            }
            Mode::HBlank => {
                if elapsed >= HBLANK_CYCLES {
                    let last_visible = self.line >= LAST_VISIBLE_LINE;
                    self.set_line(self.line + 1);
                    if last_visible {
                        self.enter(Mode::VBlank);
                    } else {
                        self.enter(Mode::OamScan);
                    }
                }
            }
            Mode::VBlank => {
                if elapsed >= VBLANK_LINE_CYCLES {
                    self.mode_clock.reset();
                    if self.line >= LAST_LINE {
                        self.set_line(0);
                        self.enter(Mode::OamScan);
                    } else {
                        self.set_line(self.line + 1);
                    }
                }
            }
        }
    }

    fn enter(&mut self, mode: Mode) {
        self.mode = mode;
        self.mode_clock.reset();

        match mode {
            Mode::HBlank => {
                self.frames.fill_line(self.line, self.backdrop().rgb());
                if self.stat_select & STAT_HBLANK != 0 {
                    self.interrupts |= INT_LCD_STAT;
                }
            }
            Mode::VBlank => {
                self.interrupts |= INT_VBLANK;
                if self.stat_select & STAT_VBLANK != 0 {
                    self.interrupts |= INT_LCD_STAT;
                }
                self.frames.swap();
                self.frame_ready = true;
            }
            Mode::OamScan => {
                if self.stat_select & STAT_OAM != 0 {
                    self.interrupts |= INT_LCD_STAT;
                }
            }
            Mode::PixelTransfer => {}
        }
    }

    fn set_line(&mut self, line: u8) {
        self.line = line;
        if self.line == self.lyc && self.stat_select & STAT_LYC != 0 {
            self.interrupts |= INT_LCD_STAT;
        }
    }

    /// Shade shown behind the background: colour 0 through BGP, or white with the LCD or
    /// background disabled.
    fn backdrop(&self) -> Shade {
        if self.lcd_enabled() && self.bg_enabled() {
            self.bgp.shade(0)
        } else {
            Shade::White
        }
    }

    /// Collect and clear pending interrupt requests (IF bits).
    pub fn take_interrupts(&mut self) -> u8 {
        std::mem::take(&mut self.interrupts)
    }

    /// Last completed frame.
    pub fn frame(&self) -> &[u32] {
        self.frames.front()
    }

    pub fn lcd_enabled(&self) -> bool {
        self.lcdc & LCDC_LCD_ENABLE != 0
    }

    pub fn bg_enabled(&self) -> bool {
        self.lcdc & LCDC_BG_ENABLE != 0
    }

    /// Read VRAM ($8000–$9FFF).
    pub fn read_vram(&self, addr: u16) -> u8 {
        let offset = addr as usize & 0x1FFF;
        match offset {
            0x0000..=0x17FF => self.tiles[offset / TILE_LEN][offset % TILE_LEN],
            0x1800..=0x1BFF => self.maps[0][offset - 0x1800],
            _ => self.maps[1][offset - 0x1C00],
        }
    }

    /// Write VRAM ($8000–$9FFF).
    pub fn write_vram(&mut self, addr: u16, data: u8) {
        let offset = addr as usize & 0x1FFF;
        match offset {
            0x0000..=0x17FF => self.tiles[offset / TILE_LEN][offset % TILE_LEN] = data,
            0x1800..=0x1BFF => self.maps[0][offset - 0x1800] = data,
            _ => self.maps[1][offset - 0x1C00] = data,
        }
    }

    /// Read OAM ($FE00–$FE9F).
    pub fn read_oam(&self, addr: u16) -> u8 {
        self.oam[(addr - 0xFE00) as usize]
    }

    pub fn write_oam(&mut self, addr: u16, data: u8) {
        self.oam[(addr - 0xFE00) as usize] = data;
    }

    /// Copy a full page into OAM (DMA from $FF46). The bus supplies the source bytes.
    pub fn oam_dma(&mut self, page: u8, data: &[u8; OAM_LEN]) {
        self.dma = page;
        self.oam.copy_from_slice(data);
    }

    /// Read HRAM ($FF80–$FFFE).
    pub fn read_hram(&self, addr: u16) -> u8 {
        self.hram[(addr - 0xFF80) as usize]
    }

    pub fn write_hram(&mut self, addr: u16, data: u8) {
        self.hram[(addr - 0xFF80) as usize] = data;
    }

    /// Read an LCD register ($FF40–$FF4B).
    pub fn read_register(&self, addr: u16) -> u8 {
        match addr {
            0xFF40 => self.lcdc,
            0xFF41 => {
                let coincidence = if self.line == self.lyc { 0x04 } else { 0 };
                0x80 | self.stat_select | coincidence | self.mode.bits()
            }
            0xFF42 => self.scroll_y,
            0xFF43 => self.scroll_x,
            0xFF44 => self.line,
            0xFF45 => self.lyc,
            0xFF46 => self.dma,
            0xFF47 => self.bgp.read(),
            0xFF48 => self.obp0.read(),
            0xFF49 => self.obp1.read(),
            0xFF4A => self.window_y,
            0xFF4B => self.window_x,
            _ => 0xFF,
        }
    }

    /// Write an LCD register ($FF40–$FF4B). LY is read-only; DMA is handled by the bus.
    pub fn write_register(&mut self, addr: u16, data: u8) {
        match addr {
            0xFF40 => self.lcdc = data,
            0xFF41 => self.stat_select = data & STAT_WRITABLE,
            0xFF42 => self.scroll_y = data,
            0xFF43 => self.scroll_x = data,
            0xFF44 => {}
            0xFF45 => self.lyc = data,
            0xFF47 => self.bgp.write(data),
            0xFF48 => self.obp0.write(data),
            0xFF49 => self.obp1.write(data),
            0xFF4A => self.window_y = data,
            0xFF4B => self.window_x = data,
            _ => {}
        }
    }
}

impl Default for PPU {
    fn default() -> Self {
        Self::new()
    }
}
