pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;

/// A type alias for the CHIP-8 display buffer representation
pub type DisplayBuffer<T> = [[T; DISPLAY_X]; DISPLAY_Y];

/// Monochrome 64x32 framebuffer with XOR sprite blitting.
pub struct Display {
    pixels: DisplayBuffer<bool>,
}

impl Display {
    pub fn new() -> Self {
        Display {
            pixels: [[false; DISPLAY_X]; DISPLAY_Y],
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [[false; DISPLAY_X]; DISPLAY_Y];
    }

    /// Pixel state at column `x`, row `y`. Off-grid coordinates read as off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    pub fn rows(&self) -> &DisplayBuffer<bool> {
        &self.pixels
    }

    /// XORs an 8-pixel-wide sprite onto the grid with its top-left corner at
    /// `(x, y)`, which must already be reduced into the grid.
    ///
    /// Rows and columns past the right or bottom edge are clipped.
    /// Returns true if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut any_erased = false;

        for (row, &sprite_byte) in sprite.iter().enumerate() {
            let Some(line) = self.pixels.get_mut(y + row) else {
                break;
            };

            for col in 0..8 {
                if sprite_byte & (0x80 >> col) == 0 {
                    continue;
                }
                let Some(pixel) = line.get_mut(x + col) else {
                    break;
                };

                if *pixel {
                    any_erased = true;
                }
                *pixel ^= true;
            }
        }

        any_erased
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
