//! The instruction stream: what the compiler produces, and what both backends consume.

use std::fmt;
use std::ops::Index;

/// One step of a compiled program. Runs of `+`/`-` and `>`/`<` are already folded, and the three
/// loop idioms `[-]`, `[<]` and `[>]` have their own instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    MoveBy(isize),
    AddBy(i32),
    Output,
    Input,
    SetZero,
    ScanZeroLeft,
    ScanZeroRight,
    JumpIfZero(JumpTarget),
    JumpIfNonZero(JumpTarget),
}

/// A concrete offset from the beginning of a program to a specific instruction.
///
/// Jumps always point at their partner: the `]` for a `[`, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpTarget(pub usize);

/// A fully compiled program, with every jump resolved.
///
/// Only the compiler can make one of these, so every [Program] has properly paired jumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub(crate) fn new(instructions: Vec<Instruction>) -> Self {
        Program { instructions }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Writes the program in a pseudo-assembly format, one instruction per line.
    pub fn disassemble<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for (i, instr) in self.instructions.iter().enumerate() {
            writeln!(out, "{:4}: {}", i, instr)?;
        }
        Ok(())
    }
}

impl Index<usize> for Program {
    type Output = Instruction;

    fn index(&self, index: usize) -> &Self::Output {
        &self.instructions[index]
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;
        match self {
            MoveBy(amount) => write!(f, "bp <- bp + #{}", amount),
            AddBy(amount) => write!(f, "[bp] <- [bp] + #{}", amount),
            Output => write!(f, "putchar [bp]"),
            Input => write!(f, "getchar [bp]"),
            SetZero => write!(f, "zro"),
            ScanZeroLeft => write!(f, "scl"),
            ScanZeroRight => write!(f, "scr"),
            JumpIfZero(target) => write!(f, "beq {}", target.0),
            JumpIfNonZero(target) => write!(f, "bne {}", target.0),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.disassemble(f)
    }
}
