use std::path::PathBuf;

/// Outcome of a single `execute_one` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8Result {
    /// No program is loaded, nothing was fetched.
    Idle,
    /// The instruction ran and did not touch the display.
    Continue,
    /// The instruction cleared or drew to the display.
    DisplayUpdated,
    /// Fx0A found no pressed key and rewound the program counter.
    WaitingForKey,
}

/// Fatal conditions raised while executing an instruction.
///
/// The instruction that raised it is abandoned; the driver decides whether to
/// stop or reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Chip8Error {
    #[error("Memory access out of bounds at address {address:#06X}")]
    MemoryFault { address: usize },

    #[error("Stack overflow: subroutine call with a full call stack")]
    StackOverflow,

    #[error("Stack underflow: attempted to return from a subroutine with empty call stack")]
    StackUnderflow,
}

/// Reasons a ROM could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("ROM is empty")]
    Empty,

    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    TooLarge { size: usize, max_size: usize },

    #[error("Failed to read ROM file {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
