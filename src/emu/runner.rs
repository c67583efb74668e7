use super::{Chip8, Chip8Error, Chip8Result, LoadError};
use crate::u4;

pub const TIMER_HZ: f32 = 60.0;
pub const FRAME_TIME_STEP: f32 = 1.0 / TIMER_HZ;

/// Frames run by one `update` at most. Any further backlog is dropped.
pub const MAX_CATCH_UP_FRAMES: u32 = 4;

pub const DEFAULT_INSTRUCTIONS_PER_FRAME: u32 = 10;

/// High-level emulator runner that manages timing internally.
///
/// Each 60Hz frame executes a fixed number of instructions followed by one
/// timer tick.
pub struct Chip8Runner {
    chip8: Chip8,
    instructions_per_frame: u32,
    frame_dt_accumulator: f32,
    redraw: bool,
}

impl Chip8Runner {
    pub fn new(chip8: Chip8, instructions_per_frame: u32) -> Self {
        Self {
            chip8,
            instructions_per_frame,
            frame_dt_accumulator: 0.0,
            redraw: true,
        }
    }

    /// Update emulator by delta time (in seconds).
    ///
    /// Returns the number of frames run. A fatal error stops the current
    /// frame and is passed through.
    pub fn update(&mut self, dt: f32) -> Result<u32, Chip8Error> {
        self.frame_dt_accumulator += dt;

        let mut frames = 0;
        while self.frame_dt_accumulator >= FRAME_TIME_STEP {
            if frames == MAX_CATCH_UP_FRAMES {
                // We clear the accumulator to avoid "catching up" in the next frame.
                self.frame_dt_accumulator = 0.0;
                break;
            }
            self.frame_dt_accumulator -= FRAME_TIME_STEP;
            self.run_frame()?;
            frames += 1;
        }

        Ok(frames)
    }

    /// Runs one frame worth of instructions, then ticks the timers.
    pub fn run_frame(&mut self) -> Result<(), Chip8Error> {
        for _ in 0..self.instructions_per_frame {
            match self.chip8.execute_one()? {
                Chip8Result::DisplayUpdated => self.redraw = true,
                Chip8Result::Idle => break,
                Chip8Result::Continue | Chip8Result::WaitingForKey => {}
            }
        }
        self.chip8.tick_timers();
        Ok(())
    }

    /// Returns true once after the display changed.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    pub fn load_program(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        self.frame_dt_accumulator = 0.0;
        self.redraw = true;
        self.chip8.load_program(rom)
    }

    /// Returns true if the sound timer is active, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.chip8.should_beep()
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, position: u4, pressed: bool) {
        self.chip8.set_key(position, pressed)
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn get_display_pixel(&self, y: usize, x: usize) -> bool {
        self.chip8.get_display_pixel(y, x)
    }

    pub fn chip8_ref(&self) -> &Chip8 {
        &self.chip8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(rom: &[u8], ipf: u32) -> Chip8Runner {
        let mut chip8 = Chip8::with_seed(1);
        chip8.load_program(rom).unwrap();
        Chip8Runner::new(chip8, ipf)
    }

    #[test]
    fn runs_whole_frames_only() {
        // 7001; 1200 -> V0 counts executed adds
        let mut runner = runner(&[0x70, 0x01, 0x12, 0x00], 4);

        assert_eq!(runner.update(FRAME_TIME_STEP * 0.5).unwrap(), 0);
        assert_eq!(runner.chip8_ref().v(u4::new(0)), 0);

        assert_eq!(runner.update(FRAME_TIME_STEP * 0.6).unwrap(), 1);
        assert_eq!(runner.chip8_ref().v(u4::new(0)), 2);
    }

    #[test]
    fn timers_tick_once_per_frame() {
        // V0 = 10; DT = V0; loop
        let mut runner = runner(&[0x60, 0x0A, 0xF0, 0x15, 0x12, 0x04], 50);
        runner.run_frame().unwrap();
        assert_eq!(runner.chip8_ref().delay_timer(), 9);
        runner.run_frame().unwrap();
        assert_eq!(runner.chip8_ref().delay_timer(), 8);
    }

    #[test]
    fn catch_up_is_bounded() {
        let mut runner = runner(&[0x12, 0x00], 1);
        assert_eq!(runner.update(10.0).unwrap(), MAX_CATCH_UP_FRAMES);
        assert_eq!(runner.update(0.0).unwrap(), 0);
    }

    #[test]
    fn fatal_errors_propagate() {
        let mut runner = runner(&[0x00, 0xEE], 1);
        assert_eq!(runner.run_frame(), Err(Chip8Error::StackUnderflow));
    }

    #[test]
    fn redraw_is_reported_once() {
        let mut runner = runner(&[0x00, 0xE0, 0x12, 0x02], 2);
        assert!(runner.take_redraw());
        assert!(!runner.take_redraw());

        runner.run_frame().unwrap();
        assert!(runner.take_redraw());
        runner.run_frame().unwrap();
        assert!(!runner.take_redraw());
    }

    #[test]
    fn unloaded_runner_only_ticks() {
        let mut runner = Chip8Runner::new(Chip8::with_seed(1), 10);
        runner.run_frame().unwrap();
        assert_eq!(runner.chip8_ref().pc(), 0x200);
    }
}
