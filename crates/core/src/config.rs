//! Knobs that must be settled before a program is compiled and run.

use crate::errors::ConfigError;

/// Smallest tape the interpreter (or a translated program) may be given.
pub const MIN_TAPE_SIZE: usize = 10_000;
/// Smallest bracket stack the compiler may be given.
pub const MIN_STACK_SIZE: usize = 1_000;

pub const DEFAULT_TAPE_SIZE: usize = 30_000;
pub const DEFAULT_STACK_SIZE: usize = 1_000;

/// How `.` reaches the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Every byte is flushed as soon as it's written.
    #[default]
    Unbuffered,
    /// Bytes are held until a newline, a full buffer, or the next `,`.
    LineBuffered,
}

/// Validated settings for one compile-and-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    tape_size: usize,
    stack_size: usize,
    output_mode: OutputMode,
}

impl Config {
    /// Checks both sizes against their minimums.
    pub fn new(tape_size: usize, stack_size: usize) -> Result<Self, ConfigError> {
        if tape_size < MIN_TAPE_SIZE {
            return Err(ConfigError::TapeTooSmall {
                requested: tape_size,
                minimum: MIN_TAPE_SIZE,
            });
        }

        if stack_size < MIN_STACK_SIZE {
            return Err(ConfigError::StackTooSmall {
                requested: stack_size,
                minimum: MIN_STACK_SIZE,
            });
        }

        Ok(Config {
            tape_size,
            stack_size,
            output_mode: OutputMode::default(),
        })
    }

    pub fn with_output_mode(self, output_mode: OutputMode) -> Self {
        Config {
            output_mode,
            ..self
        }
    }

    pub fn tape_size(&self) -> usize {
        self.tape_size
    }

    /// How deeply loops may nest before compilation gives up.
    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tape_size: DEFAULT_TAPE_SIZE,
            stack_size: DEFAULT_STACK_SIZE,
            output_mode: OutputMode::default(),
        }
    }
}
