use super::{Chip8Error, FONT, FONT_END_ADDRESS, FONT_START_ADDRESS};

// CHIP-8 memory map
pub const MEMORY_SIZE: usize = 4096;
pub const ROM_START_ADDRESS: usize = 0x200;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - ROM_START_ADDRESS;

/// 4KB of byte-addressable memory. Every access is bounds checked.
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    /// Zeroed memory with the font glyphs in place.
    pub fn new() -> Self {
        let mut memory = Memory {
            bytes: [0; MEMORY_SIZE],
        };
        memory.bytes[FONT_START_ADDRESS..FONT_END_ADDRESS].copy_from_slice(&FONT);
        memory
    }

    pub fn read(&self, addr: usize) -> Result<u8, Chip8Error> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(Chip8Error::MemoryFault { address: addr })
    }

    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), Chip8Error> {
        *self
            .bytes
            .get_mut(addr)
            .ok_or(Chip8Error::MemoryFault { address: addr })? = value;
        Ok(())
    }

    /// Reads a big-endian 16-bit word at `addr`.
    pub fn read_word(&self, addr: usize) -> Result<u16, Chip8Error> {
        let high = self.read(addr)?;
        let low = self.read(addr + 1)?;

        Ok(u16::from_be_bytes([high, low]))
    }

    /// Borrows `len` bytes starting at `addr`, failing on the first address
    /// that falls outside memory.
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8], Chip8Error> {
        let end = Self::range_end(addr, len)?;
        Ok(&self.bytes[addr..end])
    }

    pub fn slice_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8], Chip8Error> {
        let end = Self::range_end(addr, len)?;
        Ok(&mut self.bytes[addr..end])
    }

    /// Copies a program to the ROM area. The caller has already checked the size.
    pub(crate) fn load_program(&mut self, rom: &[u8]) {
        self.bytes[ROM_START_ADDRESS..ROM_START_ADDRESS + rom.len()].copy_from_slice(rom);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    fn range_end(addr: usize, len: usize) -> Result<usize, Chip8Error> {
        let end = addr + len;
        if addr >= MEMORY_SIZE && len > 0 {
            return Err(Chip8Error::MemoryFault { address: addr });
        }
        if end > MEMORY_SIZE {
            return Err(Chip8Error::MemoryFault {
                address: MEMORY_SIZE,
            });
        }
        Ok(end)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
