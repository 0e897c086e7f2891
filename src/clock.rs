//! Cycle counters for frame pacing and LCD mode timing.
//!
//! The DMG runs at 4.194304 MHz and a full LCD frame (154 lines × 456 cycles)
//! takes 70224 cycles, roughly 59.7 frames per second.

/// CPU clock frequency in Hz (T-cycles per second).
pub const CPU_FREQUENCY_HZ: u32 = 4_194_304;

/// Cycles in one video frame.
pub const CYCLES_PER_FRAME: u32 = 70_224;

/// Monotonic cycle accumulator. Used once by the frame driver and once by the PPU for
/// the current mode; neither wraps within a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    cycles: u32,
}

impl Clock {
    pub fn new() -> Self {
        Self { cycles: 0 }
    }

    pub fn advance(&mut self, cycles: u32) {
        self.cycles += cycles;
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn reset(&mut self) {
        self.cycles = 0;
    }

    /// True once a whole frame's worth of cycles has elapsed. Overshoot is kept.
    pub fn frame_complete(&self) -> bool {
        self.cycles >= CYCLES_PER_FRAME
    }
}
