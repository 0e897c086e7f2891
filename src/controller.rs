//! Joypad input handling.
//!
//! The eight buttons sit in a 2×4 matrix behind $FF00 (P1). Writing clears bit 4 to select
//! the direction row or bit 5 to select the action row; reading returns the selected row
//! in bits 0–3, active-low (0 = pressed).

/// A joypad button. The discriminant is the bit within its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    fn is_direction(self) -> bool {
        matches!(self, Button::Right | Button::Left | Button::Up | Button::Down)
    }

    fn mask(self) -> u8 {
        match self {
            Button::Right | Button::A => 0x01,
            Button::Left | Button::B => 0x02,
            Button::Up | Button::Select => 0x04,
            Button::Down | Button::Start => 0x08,
        }
    }
}

const SELECT_DIRECTIONS: u8 = 0x10;
const SELECT_ACTIONS: u8 = 0x20;

/// Joypad connected to P1 ($FF00).
pub struct Controller {
    /// Direction row: bit 0 = Right, 1 = Left, 2 = Up, 3 = Down. Active-low.
    pub directions: u8,
    /// Action row: bit 0 = A, 1 = B, 2 = Select, 3 = Start. Active-low.
    pub actions: u8,
    /// Bits 4–5 as last written.
    pub select: u8,
}

impl Controller {
    /// Create a controller with no buttons pressed and no row selected.
    pub fn new() -> Self {
        Controller {
            directions: 0x0F,
            actions: 0x0F,
            select: SELECT_DIRECTIONS | SELECT_ACTIONS,
        }
    }

    /// Read P1. Unselected rows read as released; bits 6–7 read as 1.
    pub fn read(&self) -> u8 {
        let mut row = 0x0F;
        if self.select & SELECT_DIRECTIONS == 0 {
            row &= self.directions;
        }
        if self.select & SELECT_ACTIONS == 0 {
            row &= self.actions;
        }
        0xC0 | self.select | row
    }

    /// Write P1. Only the row-select bits are writable.
    pub fn write(&mut self, data: u8) {
        self.select = data & (SELECT_DIRECTIONS | SELECT_ACTIONS);
    }

    /// Press a button. Returns true when it was not already held (a new press).
    pub fn press(&mut self, button: Button) -> bool {
        let row = self.row_mut(button);
        let was_released = *row & button.mask() != 0;
        *row &= !button.mask();
        was_released
    }

    pub fn release(&mut self, button: Button) {
        *self.row_mut(button) |= button.mask();
    }

    fn row_mut(&mut self, button: Button) -> &mut u8 {
        if button.is_direction() {
            &mut self.directions
        } else {
            &mut self.actions
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
