//! Double-buffered 160×144 frame output.
//!
//! The PPU writes only the back buffer. `swap` at VBlank publishes it as the front buffer,
//! which the host reads between frames.

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

pub struct FrameBuffers {
    front: Vec<u32>,
    back: Vec<u32>,
}

impl FrameBuffers {
    pub fn new(fill: u32) -> Self {
        Self {
            front: vec![fill; SCREEN_WIDTH * SCREEN_HEIGHT],
            back: vec![fill; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    /// Last completed frame, row-major 0xRRGGBB.
    pub fn front(&self) -> &[u32] {
        &self.front
    }

    /// Fill one row of the back buffer. Lines past the bottom edge are ignored.
    pub fn fill_line(&mut self, line: u8, colour: u32) {
        let line = line as usize;
        if line >= SCREEN_HEIGHT {
            return;
        }
        let start = line * SCREEN_WIDTH;
        self.back[start..start + SCREEN_WIDTH].fill(colour);
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }
}
