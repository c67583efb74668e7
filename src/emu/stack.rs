use super::Chip8Error;

pub const STACK_DEPTH: usize = 16;

/// Fixed-depth return address stack.
pub struct Stack {
    entries: [u16; STACK_DEPTH],
    /// Number of occupied entries, 0..=16
    sp: usize,
}

impl Stack {
    pub fn new() -> Self {
        Stack {
            entries: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<(), Chip8Error> {
        let slot = self
            .entries
            .get_mut(self.sp)
            .ok_or(Chip8Error::StackOverflow)?;
        *slot = addr;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, Chip8Error> {
        self.sp = self.sp.checked_sub(1).ok_or(Chip8Error::StackUnderflow)?;
        Ok(self.entries[self.sp])
    }

    pub fn depth(&self) -> usize {
        self.sp
    }

    pub fn clear(&mut self) {
        self.entries = [0; STACK_DEPTH];
        self.sp = 0;
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
