//! Runs a [Program] directly against a [Tape].
//!
//! Since this is platform-independent code, it will run anywhere the translated C would.

use std::io::{self, Read, Write};

use tracing::debug;

use crate::config::{Config, OutputMode};
use crate::errors::{Direction, RuntimeError};
use crate::ir::{JumpTarget, Program};
use crate::program::{walk, Flow, InstructionHandler};
use crate::tape::Tape;

/// What `,` stores in the current cell once the input has run dry. It's what `getchar(3)`'s `EOF`
/// becomes when it's stored in an `unsigned char`.
pub const EOF_SENTINEL: u8 = 0xFF;

/// How many bytes [OutputMode::LineBuffered] holds on to before flushing regardless.
pub const LINE_BUFFER_CAPACITY: usize = 1024;

/// Everything one run of a program needs: the tape, and somewhere to read and write bytes.
pub struct Interpreter<R, W> {
    tape: Tape,
    input: R,
    output: W,
    output_mode: OutputMode,
    line_buffer: Vec<u8>,
}

impl<R: Read, W: Write> Interpreter<R, W> {
    /// A fresh, zero-filled tape sized according to the config.
    pub fn new(config: &Config, input: R, output: W) -> Self {
        Interpreter::with_tape(
            Tape::new(config.tape_size()),
            config.output_mode(),
            input,
            output,
        )
    }

    /// Starts from an existing tape, cursor and all.
    pub fn with_tape(tape: Tape, output_mode: OutputMode, input: R, output: W) -> Self {
        Interpreter {
            tape,
            input,
            output,
            output_mode,
            line_buffer: Vec::with_capacity(LINE_BUFFER_CAPACITY),
        }
    }

    /// Runs the program to completion. Any output still in the line buffer is flushed, even when
    /// the run fails.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        debug!(
            instructions = program.len(),
            tape_size = self.tape.len(),
            "interpreting program"
        );

        let result = walk(program, self);
        if result.is_err() {
            // the run's own error matters more than a failed flush
            let _ = self.flush_line_buffer();
        }
        result
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn flush_line_buffer(&mut self) -> io::Result<()> {
        if !self.line_buffer.is_empty() {
            self.output.write_all(&self.line_buffer)?;
            self.line_buffer.clear();
        }
        self.output.flush()
    }

    /// Reads a single byte, or [None] at the end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut one_byte = [0u8];
        loop {
            match self.input.read(&mut one_byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(one_byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: Read, W: Write> InstructionHandler for Interpreter<R, W> {
    type Error = RuntimeError;

    fn move_by(&mut self, delta: isize) -> Result<(), RuntimeError> {
        self.tape.move_by(delta);
        Ok(())
    }

    fn add_by(&mut self, delta: i32) -> Result<(), RuntimeError> {
        self.tape.add_by(delta);
        Ok(())
    }

    fn output(&mut self) -> Result<(), RuntimeError> {
        let byte = self.tape.read();

        match self.output_mode {
            OutputMode::Unbuffered => {
                self.output.write_all(&[byte])?;
                self.output.flush()?;
            }
            OutputMode::LineBuffered => {
                self.line_buffer.push(byte);
                if byte == b'\n' || self.line_buffer.len() >= LINE_BUFFER_CAPACITY {
                    self.flush_line_buffer()?;
                }
            }
        }

        Ok(())
    }

    fn input(&mut self) -> Result<(), RuntimeError> {
        // Prompts must be visible before we block.
        self.flush_line_buffer()?;

        let byte = self.read_byte()?.unwrap_or(EOF_SENTINEL);
        self.tape.write(byte);
        Ok(())
    }

    fn set_zero(&mut self) -> Result<(), RuntimeError> {
        self.tape.set_zero();
        Ok(())
    }

    fn scan_zero_left(&mut self) -> Result<(), RuntimeError> {
        let position = self
            .tape
            .scan_zero_left(self.tape.cursor())
            .ok_or(RuntimeError::NoZeroCell {
                direction: Direction::Left,
            })?;
        self.tape.move_to(position);
        Ok(())
    }

    fn scan_zero_right(&mut self) -> Result<(), RuntimeError> {
        let position = self
            .tape
            .scan_zero_right(self.tape.cursor())
            .ok_or(RuntimeError::NoZeroCell {
                direction: Direction::Right,
            })?;
        self.tape.move_to(position);
        Ok(())
    }

    fn jump_if_zero(&mut self, _: JumpTarget) -> Result<Flow, RuntimeError> {
        if self.tape.read() == 0 {
            Ok(Flow::Jump)
        } else {
            Ok(Flow::Continue)
        }
    }

    fn jump_if_non_zero(&mut self, _: JumpTarget) -> Result<Flow, RuntimeError> {
        if self.tape.read() != 0 {
            Ok(Flow::Jump)
        } else {
            Ok(Flow::Continue)
        }
    }

    fn finish(&mut self) -> Result<(), RuntimeError> {
        self.flush_line_buffer()?;
        Ok(())
    }
}
