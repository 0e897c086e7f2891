//! Sharp LR35902 CPU emulation for the Game Boy.
//!
//! Table-driven decode (`instructions`) with fixed per-opcode cycle costs, the $CB
//! extended set, deferred EI/DI, HALT/STOP and interrupt dispatch.
//! Memory and I/O go through the `Bus` trait.

pub mod alu;
pub mod cpu;
pub mod flags;
pub mod instructions;
pub mod interrupts;
pub mod registers;
pub mod trace;

#[cfg(test)]
mod tests;
