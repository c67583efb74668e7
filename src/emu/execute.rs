use rand::Rng;

use super::{
    Chip8, Chip8Error, Chip8Result, DISPLAY_X, DISPLAY_Y, FONT_START_ADDRESS, GLYPH_SIZE, Opcode,
    OpcodeALU,
};
use crate::u4;

impl Chip8 {
    /// Runs one decoded instruction. The program counter already points past it.
    pub(crate) fn execute(&mut self, opcode: Opcode) -> Result<Chip8Result, Chip8Error> {
        match opcode {
            Opcode::ClearDisplay => {
                self.display.clear();
                return Ok(Chip8Result::DisplayUpdated);
            }
            Opcode::Jump { nnn } => {
                self.pc = nnn;
            }
            Opcode::JumpWithOffset { nnn } => {
                self.pc = nnn + u16::from(self.v[0]);
            }
            Opcode::Call { nnn } => {
                self.stack.push(self.pc)?;
                self.pc = nnn;
            }
            Opcode::Return => {
                self.pc = self.stack.pop()?;
            }
            Opcode::SkipRegEqualImm { x, kk } => {
                self.skip_if(self.v[x] == kk);
            }
            Opcode::SkipRegNotEqualImm { x, kk } => {
                self.skip_if(self.v[x] != kk);
            }
            Opcode::SkipRegEqualReg { x, y } => {
                self.skip_if(self.v[x] == self.v[y]);
            }
            Opcode::SkipRegNotEqualReg { x, y } => {
                self.skip_if(self.v[x] != self.v[y]);
            }
            Opcode::SetRegImm { x, kk } => {
                self.v[x] = kk;
            }
            Opcode::AddRegImm { x, kk } => {
                self.v[x] = self.v[x].wrapping_add(kk);
            }
            Opcode::ALU { x, y, op } => {
                self.execute_alu(x, y, op);
            }
            Opcode::Random { x, kk } => {
                let rand_byte: u8 = self.rng.random();
                self.v[x] = rand_byte & kk;
            }
            Opcode::SetIndexImm { nnn } => {
                self.i = nnn;
            }
            Opcode::AddIndexReg { x } => {
                self.i = self.i.wrapping_add(self.v[x].into());
            }
            Opcode::Draw { x, y, n } => {
                return self.execute_draw(x, y, n);
            }
            Opcode::SkipIfPressed { x } => {
                self.skip_if(self.keypad.is_value_pressed(self.v[x]));
            }
            Opcode::SkipIfNotPressed { x } => {
                self.skip_if(!self.keypad.is_value_pressed(self.v[x]));
            }
            Opcode::WaitForKey { x } => {
                return Ok(self.execute_wait_for_key(x));
            }
            Opcode::ReadDelayTimer { x } => {
                self.v[x] = self.delay_timer;
            }
            Opcode::SetDelayTimer { x } => {
                self.delay_timer = self.v[x];
            }
            Opcode::SetSoundTimer { x } => {
                self.sound_timer = self.v[x];
            }
            Opcode::FontChar { x } => {
                self.i = (FONT_START_ADDRESS + usize::from(self.v[x]) * GLYPH_SIZE) as u16;
            }
            Opcode::BCD { x } => {
                let value = self.v[x];
                let digits = self.memory.slice_mut(self.i.into(), 3)?;
                digits.copy_from_slice(&[value / 100, (value / 10) % 10, value % 10]);
            }
            Opcode::StoreRegs { x } => {
                let count = usize::from(x) + 1;
                let dest = self.memory.slice_mut(self.i.into(), count)?;
                dest.copy_from_slice(&self.v[..count]);
            }
            Opcode::LoadRegs { x } => {
                let count = usize::from(x) + 1;
                let src = self.memory.slice(self.i.into(), count)?;
                self.v[..count].copy_from_slice(src);
            }
            Opcode::Unknown(word) => {
                log::debug!("Skipping unknown opcode {word:#06X}");
            }
        };

        Ok(Chip8Result::Continue)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    /// VF is always written last so a result landing in VF is overwritten by the flag.
    fn execute_alu(&mut self, x: u4, y: u4, op: OpcodeALU) {
        match op {
            OpcodeALU::Set => self.v[x] = self.v[y],
            OpcodeALU::Or => self.v[x] |= self.v[y],
            OpcodeALU::And => self.v[x] &= self.v[y],
            OpcodeALU::Xor => self.v[x] ^= self.v[y],
            OpcodeALU::Add => {
                let (res, overflow) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = res;
                self.v[0xF] = u8::from(overflow);
            }
            OpcodeALU::Sub => {
                let (res, borrow) = self.v[x].overflowing_sub(self.v[y]);
                self.v[x] = res;
                self.v[0xF] = u8::from(!borrow); // Notice that borrow is inverted
            }
            OpcodeALU::SubReverse => {
                let (res, borrow) = self.v[y].overflowing_sub(self.v[x]);
                self.v[x] = res;
                self.v[0xF] = u8::from(!borrow);
            }
            OpcodeALU::ShiftRight => {
                let lsb = self.v[x] & 1;
                self.v[x] >>= 1;
                self.v[0xF] = lsb;
            }
            OpcodeALU::ShiftLeft => {
                let msb = self.v[x] >> 7;
                self.v[x] <<= 1;
                self.v[0xF] = msb;
            }
        }
    }

    fn execute_draw(&mut self, x: u4, y: u4, n: u4) -> Result<Chip8Result, Chip8Error> {
        let x_pos = self.v[x] as usize % DISPLAY_X;
        let y_pos = self.v[y] as usize % DISPLAY_Y;

        // Rows below the bottom edge are clipped, so they are never read either
        let row_count = usize::from(n).min(DISPLAY_Y - y_pos);
        let sprite = self.memory.slice(self.i.into(), row_count)?;

        let any_erased = self.display.draw_sprite(x_pos, y_pos, sprite);
        self.v[0xF] = u8::from(any_erased);

        Ok(Chip8Result::DisplayUpdated)
    }

    fn execute_wait_for_key(&mut self, x: u4) -> Chip8Result {
        match self.keypad.first_pressed_value() {
            Some(key) => {
                self.v[x] = key;
                Chip8Result::Continue
            }
            None => {
                // Repeat this instruction until a key is pressed
                self.pc = self.pc.wrapping_sub(2);
                Chip8Result::WaitingForKey
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Loads `program` and runs one instruction per word.
    fn run(program: &[u16]) -> Chip8 {
        let mut chip8 = load(program);
        for _ in program {
            chip8.execute_one().unwrap();
        }
        chip8
    }

    fn load(program: &[u16]) -> Chip8 {
        let rom: Vec<u8> = program.iter().flat_map(|w| w.to_be_bytes()).collect();
        let mut chip8 = Chip8::with_seed(0x5EED);
        chip8.load_program(&rom).unwrap();
        chip8
    }

    #[test]
    fn set_and_add_immediate() {
        for kk in [0x00, 0x7F, 0xFF] {
            let chip8 = run(&[0x6300 | kk]);
            assert_eq!(chip8.v[3], kk as u8);
        }

        let chip8 = run(&[0x6FFF, 0x60FF, 0x7002]);
        assert_eq!(chip8.v[0], 0x01);
        assert_eq!(chip8.v[0xF], 0xFF, "7xkk leaves VF alone");
    }

    #[test]
    fn add_sets_carry() {
        for (a, b, sum, flag) in [(0, 0, 0, 0), (255, 1, 0, 1), (128, 128, 0, 1), (20, 22, 42, 0)] {
            let chip8 = run(&[0x6000 | a, 0x6100 | b, 0x8014]);
            assert_eq!((chip8.v[0], chip8.v[0xF]), (sum, flag), "{a} + {b}");
        }
    }

    #[test]
    fn sub_sets_not_borrow() {
        let chip8 = run(&[0x6005, 0x6105, 0x8015]);
        assert_eq!((chip8.v[0], chip8.v[0xF]), (0, 1));

        let chip8 = run(&[0x6002, 0x6105, 0x8015]);
        assert_eq!((chip8.v[0], chip8.v[0xF]), (253, 0));

        let chip8 = run(&[0x6005, 0x6102, 0x8017]);
        assert_eq!((chip8.v[0], chip8.v[0xF]), (253, 0));

        let chip8 = run(&[0x6002, 0x6105, 0x8017]);
        assert_eq!((chip8.v[0], chip8.v[0xF]), (3, 1));
    }

    #[test]
    fn shifts_report_bit_shifted_out_of_vx() {
        let chip8 = run(&[0x6003, 0x61FE, 0x8016]);
        assert_eq!((chip8.v[0], chip8.v[0xF]), (1, 1));

        let chip8 = run(&[0x6081, 0x6100, 0x801E]);
        assert_eq!((chip8.v[0], chip8.v[0xF]), (2, 1));

        let chip8 = run(&[0x6040, 0x801E]);
        assert_eq!((chip8.v[0], chip8.v[0xF]), (0x80, 0));
    }

    #[test]
    fn flag_wins_when_vf_is_the_destination() {
        let chip8 = run(&[0x6FFF, 0x6101, 0x8F14]);
        assert_eq!(chip8.v[0xF], 1);

        let chip8 = run(&[0x6F02, 0x8FF6]);
        assert_eq!(chip8.v[0xF], 0);
    }

    #[test]
    fn bitwise_ops_leave_vf_alone() {
        let chip8 = run(&[0x6F07, 0x600C, 0x610A, 0x8011, 0x6209, 0x8022, 0x8013]);
        // ((0x0C | 0x0A) & 0x09) ^ 0x0A
        assert_eq!(chip8.v[0], 0x02);
        assert_eq!(chip8.v[0xF], 7);
    }

    #[test]
    fn skips() {
        let chip8 = run(&[0x6042, 0x3042]);
        assert_eq!(chip8.pc, 0x206);

        let chip8 = run(&[0x6042, 0x4042]);
        assert_eq!(chip8.pc, 0x204);

        let chip8 = run(&[0x6042, 0x6142, 0x5010]);
        assert_eq!(chip8.pc, 0x208);

        let chip8 = run(&[0x6042, 0x6142, 0x9010]);
        assert_eq!(chip8.pc, 0x206);
    }

    #[test]
    fn jumps() {
        let chip8 = run(&[0x1ABC]);
        assert_eq!(chip8.pc, 0xABC);

        let chip8 = run(&[0x6010, 0xB300]);
        assert_eq!(chip8.pc, 0x310);
    }

    #[test]
    fn call_and_return() {
        let mut chip8 = load(&[0x2206, 0x0000, 0x0000, 0x00EE]);
        chip8.execute_one().unwrap();
        assert_eq!((chip8.pc, chip8.stack_depth()), (0x206, 1));
        chip8.execute_one().unwrap();
        assert_eq!((chip8.pc, chip8.stack_depth()), (0x202, 0));
    }

    #[test]
    fn return_with_empty_stack_is_fatal() {
        let mut chip8 = load(&[0x00EE]);
        assert_eq!(chip8.execute_one(), Err(Chip8Error::StackUnderflow));
    }

    #[test]
    fn unbounded_recursion_overflows() {
        let mut chip8 = load(&[0x2200]);
        for _ in 0..16 {
            chip8.execute_one().unwrap();
        }
        assert_eq!(chip8.execute_one(), Err(Chip8Error::StackOverflow));
    }

    #[test]
    fn random_is_masked_and_reproducible() {
        let a = run(&[0xC00F, 0xC1FF, 0xC200]);
        let b = run(&[0xC00F, 0xC1FF, 0xC200]);
        assert_eq!(a.v, b.v);
        assert_eq!(a.v[0] & 0xF0, 0);
        assert_eq!(a.v[2], 0);
    }

    #[test]
    fn index_register_ops() {
        let chip8 = run(&[0xA123, 0x6010, 0xF01E]);
        assert_eq!(chip8.i, 0x133);

        let chip8 = run(&[0xAFFF, 0x60FF, 0xF01E]);
        assert_eq!(chip8.i, 0x10FE);
        assert_eq!(chip8.v[0xF], 0);

        let chip8 = run(&[0x6001, 0xF029]);
        assert_eq!(chip8.i, 5);

        let chip8 = run(&[0x600F, 0xF029]);
        assert_eq!(chip8.i, 75);
    }

    #[test]
    fn bcd() {
        let chip8 = run(&[0x60FF, 0xA300, 0xF033]);
        assert_eq!(&chip8.memory()[0x300..0x303], &[2, 5, 5]);

        let chip8 = run(&[0x6000, 0xA300, 0xF033]);
        assert_eq!(&chip8.memory()[0x300..0x303], &[0, 0, 0]);

        let chip8 = run(&[0x607B, 0xA300, 0xF033]);
        assert_eq!(&chip8.memory()[0x300..0x303], &[1, 2, 3]);
    }

    #[test]
    fn bcd_past_end_of_memory_faults_without_writing() {
        let mut chip8 = load(&[0x60FF, 0xAFFE, 0xF033]);
        chip8.execute_one().unwrap();
        chip8.execute_one().unwrap();
        assert_eq!(
            chip8.execute_one(),
            Err(Chip8Error::MemoryFault { address: 0x1000 })
        );
        assert_eq!(chip8.memory()[0xFFE], 0);
    }

    #[test]
    fn store_and_load_registers() {
        let chip8 = run(&[0x6011, 0x6122, 0x6233, 0xA400, 0xF155]);
        assert_eq!(&chip8.memory()[0x400..0x403], &[0x11, 0x22, 0x00]);
        assert_eq!(chip8.i, 0x400, "I is not advanced");

        let mut chip8 = load(&[0xA000, 0xF465]);
        chip8.execute_one().unwrap();
        chip8.execute_one().unwrap();
        assert_eq!(&chip8.v[..6], &[0xF0, 0x90, 0x90, 0x90, 0xF0, 0x00]);
    }

    #[test]
    fn timers_from_registers() {
        let mut chip8 = run(&[0x6007, 0xF015, 0xF018]);
        assert_eq!((chip8.delay_timer, chip8.sound_timer), (7, 7));

        chip8.tick_timers();
        chip8.load_program(&[0xF5, 0x07]).unwrap();
        chip8.delay_timer = 3;
        chip8.execute_one().unwrap();
        assert_eq!(chip8.v[5], 3);
    }

    #[test]
    fn draw_reports_collision() {
        let mut chip8 = load(&[0x6003, 0x6104, 0xA000, 0xD015, 0xD015]);
        for _ in 0..3 {
            chip8.execute_one().unwrap();
        }

        assert_eq!(chip8.execute_one(), Ok(Chip8Result::DisplayUpdated));
        assert_eq!(chip8.v[0xF], 0);
        assert!(chip8.get_display_pixel(4, 3));
        assert!(!chip8.get_display_pixel(5, 4));

        chip8.execute_one().unwrap();
        assert_eq!(chip8.v[0xF], 1);
        assert!(chip8.display.rows().iter().flatten().all(|&p| !p));
    }

    #[test]
    fn draw_origin_wraps_but_sprite_clips() {
        // V0 = 66 -> column 2, V1 = 62 -> row 30
        let chip8 = run(&[0x6042, 0x613E, 0xA000, 0xD015]);
        assert!(chip8.get_display_pixel(30, 2));
        assert!(chip8.get_display_pixel(31, 2));
        assert!(!chip8.get_display_pixel(0, 2));
        assert!(!chip8.get_display_pixel(1, 2));
    }

    #[test]
    fn key_skips_use_layout_mapping() {
        let mut chip8 = load(&[0x600C, 0xE09E]);
        chip8.set_key(u4::new(3), true);
        chip8.execute_one().unwrap();
        chip8.execute_one().unwrap();
        assert_eq!(chip8.pc, 0x206);

        let mut chip8 = load(&[0x600C, 0xE0A1]);
        chip8.set_key(u4::new(0xC), true);
        chip8.execute_one().unwrap();
        chip8.execute_one().unwrap();
        assert_eq!(chip8.pc, 0x206, "position 0xC holds key A, not key C");
    }

    #[test]
    fn wait_for_key_polls() {
        let mut chip8 = load(&[0xF30A]);
        for _ in 0..3 {
            assert_eq!(chip8.execute_one(), Ok(Chip8Result::WaitingForKey));
            assert_eq!(chip8.pc, 0x200);
        }

        chip8.set_key(u4::new(13), true);
        assert_eq!(chip8.execute_one(), Ok(Chip8Result::Continue));
        assert_eq!((chip8.v[3], chip8.pc), (0x0, 0x202));
    }

    #[test]
    fn unknown_opcodes_only_advance_pc() {
        let chip8 = run(&[0x6A01, 0x0123, 0x812F, 0xE0FF, 0xF0FF]);
        assert_eq!(chip8.pc, 0x20A);
        assert_eq!(chip8.v[0xA], 1);
        assert_eq!(chip8.v.iter().filter(|&&r| r != 0).count(), 1);
    }
}
