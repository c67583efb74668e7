use rand::{SeedableRng, rngs::StdRng};

use super::{
    Chip8Error, Chip8Result, Display, Keypad, LoadError, MAX_ROM_SIZE, Memory, Opcode,
    ROM_START_ADDRESS, Stack,
};
use crate::u4;

/// CHIP-8 virtual machine state
pub struct Chip8 {
    /// 4KB memory, font at 0x000 and program at 0x200
    pub(crate) memory: Memory,
    /// Display buffer: 64x32 monochrome pixels
    pub(crate) display: Display,

    /// Program counter: address of the next instruction to execute
    pub(crate) pc: u16,
    /// Index register: used for memory operations
    pub(crate) i: u16,
    /// General-purpose registers V0-VF (VF is used as a flag register)
    pub(crate) v: [u8; 16],
    /// Call stack for subroutine returns
    pub(crate) stack: Stack,

    /// Delay timer: decrements at 60Hz until it reaches 0
    pub(crate) delay_timer: u8,
    /// Sound timer: decrements at 60Hz, beeps while non-zero
    pub(crate) sound_timer: u8,

    /// Keypad state, indexed by layout position
    pub(crate) keypad: Keypad,
    /// Source for Cxkk, seeded once at construction
    pub(crate) rng: StdRng,

    program_loaded: bool,
}

impl Chip8 {
    /// Creates an interpreter with an OS-seeded random source.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Creates an interpreter whose Cxkk sequence is fixed by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Chip8 {
            memory: Memory::new(),
            display: Display::new(),
            pc: ROM_START_ADDRESS as u16,
            i: 0,
            v: [0; 16],
            stack: Stack::new(),
            delay_timer: 0,
            sound_timer: 0,
            keypad: Keypad::new(),
            rng,
            program_loaded: false,
        }
    }

    /// Resets the machine and loads a ROM at 0x200.
    ///
    /// On error the machine stays reset with no program loaded.
    pub fn load_program(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        self.reset();

        if rom.is_empty() {
            log::warn!("Rejected empty ROM");
            return Err(LoadError::Empty);
        }
        if rom.len() > MAX_ROM_SIZE {
            log::warn!("Rejected ROM of {} bytes", rom.len());
            return Err(LoadError::TooLarge {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            });
        }

        self.memory.load_program(rom);
        self.program_loaded = true;
        log::info!("Loaded {} byte ROM at {:#05X}", rom.len(), ROM_START_ADDRESS);

        Ok(())
    }

    /// Executes a single CPU cycle (fetch, decode, execute).
    ///
    /// Does nothing until a program has been loaded.
    pub fn execute_one(&mut self) -> Result<Chip8Result, Chip8Error> {
        if !self.program_loaded {
            return Ok(Chip8Result::Idle);
        }

        let word = self.fetch()?;
        let opcode = Opcode::decode(word);
        log::trace!("{:#05X}: {word:04X} {opcode:?}", self.pc.wrapping_sub(2));
        self.execute(opcode)
    }

    /// Updates the delay and sound timers. Should be called at 60Hz.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Set the state of the key at a keypad layout position.
    pub fn set_key(&mut self, position: u4, pressed: bool) {
        self.keypad.set(position, pressed);
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn get_display_pixel(&self, y: usize, x: usize) -> bool {
        self.display.pixel(x, y)
    }

    /// Returns true if the sound timer is greater than zero, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn is_loaded(&self) -> bool {
        self.program_loaded
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn v(&self, reg: u4) -> u8 {
        self.v[reg]
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn memory(&self) -> &[u8] {
        self.memory.as_slice()
    }

    /// Zeroes everything except the font, the keypad and the random source.
    fn reset(&mut self) {
        self.memory = Memory::new();
        self.display.clear();
        self.pc = ROM_START_ADDRESS as u16;
        self.i = 0;
        self.v = [0; 16];
        self.stack.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.program_loaded = false;
    }

    /// Fetches the next 16-bit opcode and advances the program counter past it.
    fn fetch(&mut self) -> Result<u16, Chip8Error> {
        let word = self.memory.read_word(self.pc as usize)?;
        self.pc = self.pc.wrapping_add(2);
        Ok(word)
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
