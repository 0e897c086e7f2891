//! Interrupt request bits and the interrupt master enable (IME).
//!
//! EI and DI do not change IME directly. They leave it pending, and the executor commits
//! the pending change once the *next* instruction has finished.

// IF ($FF0F) / IE ($FFFF) bits, in priority order.
pub const INT_VBLANK: u8 = 1 << 0;
pub const INT_LCD_STAT: u8 = 1 << 1;
pub const INT_TIMER: u8 = 1 << 2;
pub const INT_SERIAL: u8 = 1 << 3;
pub const INT_JOYPAD: u8 = 1 << 4;
pub const INT_MASK: u8 = 0x1F;

/// Cycles spent dispatching to an interrupt vector.
pub const DISPATCH_CYCLES: u32 = 20;

/// Handler address for the highest-priority bit set in `pending`.
pub fn vector(pending: u8) -> Option<(u8, u16)> {
    let pending = pending & INT_MASK;
    if pending == 0 {
        return None;
    }
    let bit = pending.trailing_zeros() as u8;
    Some((1 << bit, 0x0040 + 8 * bit as u16))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InterruptMasterEnable {
    #[default]
    Disabled,
    /// EI executed; enabled once the following instruction completes.
    PendingEnable,
    Enabled,
    /// DI executed; disabled once the following instruction completes.
    PendingDisable,
}

impl InterruptMasterEnable {
    /// The live flag. Pending states report the value they are leaving.
    pub fn enabled(self) -> bool {
        matches!(self, Self::Enabled | Self::PendingDisable)
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Self::PendingEnable | Self::PendingDisable)
    }

    /// EI.
    pub fn request_enable(&mut self) {
        if *self != Self::Enabled {
            *self = Self::PendingEnable;
        }
    }

    /// DI.
    pub fn request_disable(&mut self) {
        if *self != Self::Disabled {
            *self = Self::PendingDisable;
        }
    }

    /// Apply a pending change. Called at the instruction boundary after the one that
    /// followed EI/DI.
    pub fn commit(&mut self) {
        *self = match *self {
            Self::PendingEnable => Self::Enabled,
            Self::PendingDisable => Self::Disabled,
            settled => settled,
        };
    }
}
