//! Defines [InstructionHandler], which lets a [Program] be walked the same way regardless of
//! whether it's being run or translated.

use crate::ir::{Instruction, JumpTarget, Program};

/// What to do after a jump instruction has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Fall through to the next instruction.
    Continue,
    /// Resume just after the jump's partner.
    Jump,
}

/// Gives meaning to each [Instruction]. Executing a program and translating it are both just
/// handlers; [walk] takes care of the program counter.
pub trait InstructionHandler {
    type Error;

    fn move_by(&mut self, delta: isize) -> Result<(), Self::Error>;
    fn add_by(&mut self, delta: i32) -> Result<(), Self::Error>;
    fn output(&mut self) -> Result<(), Self::Error>;
    fn input(&mut self) -> Result<(), Self::Error>;
    fn set_zero(&mut self) -> Result<(), Self::Error>;
    fn scan_zero_left(&mut self) -> Result<(), Self::Error>;
    fn scan_zero_right(&mut self) -> Result<(), Self::Error>;

    /// The `[` of a loop. Return [Flow::Jump] to skip past the matching `]`.
    fn jump_if_zero(&mut self, target: JumpTarget) -> Result<Flow, Self::Error>;

    /// The `]` of a loop. Return [Flow::Jump] to go back to just after the matching `[`.
    fn jump_if_non_zero(&mut self, target: JumpTarget) -> Result<Flow, Self::Error>;

    /// Called once after the last instruction.
    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Walks the program from the first instruction until the program counter falls off the end.
pub fn walk<H: InstructionHandler>(program: &Program, handler: &mut H) -> Result<(), H::Error> {
    use Instruction::*;

    let mut program_counter = 0;

    while program_counter < program.len() {
        program_counter = match program[program_counter] {
            MoveBy(delta) => {
                handler.move_by(delta)?;
                program_counter + 1
            }
            AddBy(delta) => {
                handler.add_by(delta)?;
                program_counter + 1
            }
            Output => {
                handler.output()?;
                program_counter + 1
            }
            Input => {
                handler.input()?;
                program_counter + 1
            }
            SetZero => {
                handler.set_zero()?;
                program_counter + 1
            }
            ScanZeroLeft => {
                handler.scan_zero_left()?;
                program_counter + 1
            }
            ScanZeroRight => {
                handler.scan_zero_right()?;
                program_counter + 1
            }
            JumpIfZero(target) => match handler.jump_if_zero(target)? {
                Flow::Jump => target.0 + 1,
                Flow::Continue => program_counter + 1,
            },
            JumpIfNonZero(target) => match handler.jump_if_non_zero(target)? {
                Flow::Jump => target.0 + 1,
                Flow::Continue => program_counter + 1,
            },
        }
    }

    handler.finish()
}
