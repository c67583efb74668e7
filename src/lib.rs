//! A CHIP-8 interpreter core with a fixed-rate frame driver.

pub mod emu;
mod nibble;

pub use nibble::{NibbleOutOfRange, u4};
