use crate::u4;

/// Key value printed at each keypad position, scanned row by row:
///
/// ```text
/// 1 2 3 C
/// 4 5 6 D
/// 7 8 9 E
/// A 0 B F
/// ```
pub const KEY_LAYOUT: [u8; 16] = [
    0x1, 0x2, 0x3, 0xC, //
    0x4, 0x5, 0x6, 0xD, //
    0x7, 0x8, 0x9, 0xE, //
    0xA, 0x0, 0xB, 0xF, //
];

/// Key value at a layout position.
pub fn key_value(position: u4) -> u8 {
    KEY_LAYOUT[position]
}

/// Layout position of a key value. Only the low nibble of `value` is used.
pub fn key_position(value: u8) -> u4 {
    let value = value & 0x0F;
    let position = KEY_LAYOUT
        .iter()
        .position(|&v| v == value)
        .unwrap_or_default();
    u4::new(position as u8)
}

/// Pressed state of the 16 keys, indexed by layout position.
#[derive(Default)]
pub struct Keypad {
    latches: [bool; 16],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, position: u4, pressed: bool) {
        self.latches[position] = pressed;
    }

    pub fn is_pressed(&self, position: u4) -> bool {
        self.latches[position]
    }

    pub fn is_value_pressed(&self, value: u8) -> bool {
        self.is_pressed(key_position(value))
    }

    /// Value of the first pressed key in layout order.
    pub fn first_pressed_value(&self) -> Option<u8> {
        self.latches
            .iter()
            .position(|&pressed| pressed)
            .map(|position| KEY_LAYOUT[position])
    }
}
