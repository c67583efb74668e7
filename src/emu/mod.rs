mod chip8;
mod display;
mod execute;
mod font;
mod keypad;
mod memory;
mod opcode;
mod rom;
mod runner;
mod stack;
mod types;

pub use chip8::*;
pub use display::*;
pub use font::*;
pub use keypad::*;
pub use memory::*;
pub use opcode::*;
pub use rom::*;
pub use runner::*;
pub use stack::*;
pub use types::*;
