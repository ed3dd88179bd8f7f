//! Brainfold internals.
//!
//! The pipeline is deliberately short:
//!
//!  - source text is compiled, in a single pass, into a [Program]: a flat list of [Instruction]s
//!    where runs of `+`/`-` and `>`/`<` are folded, `[-]`, `[<]` and `[>]` get dedicated
//!    instructions, and every loop already knows where its partner is;
//!  - the [Program] is then either _interpreted_ against a circular [Tape], or _translated_ into
//!    a C program that does the same thing once it's been compiled.
//!
//! Both backends are just [InstructionHandler]s; [program::walk] drives either of them.

pub mod codegen;
pub mod compile;
pub mod config;
pub mod errors;
pub mod interpreter;
pub mod ir;
pub mod program;
pub mod tape;

use std::io::{Read, Write};

pub use crate::codegen::CodeGenerator;
pub use crate::compile::compile;
pub use crate::config::{Config, OutputMode};
pub use crate::errors::{CompilationError, ConfigError, Error, RuntimeError};
pub use crate::interpreter::Interpreter;
pub use crate::ir::{Instruction, JumpTarget, Program};
pub use crate::program::{Flow, InstructionHandler};
pub use crate::tape::Tape;

/// Compiles and runs source text on a fresh tape. Returns the tape as the program left it.
pub fn interpret<R: Read, W: Write>(
    source_text: &[u8],
    config: &Config,
    input: R,
    output: W,
) -> Result<Tape, Error> {
    let program = compile(source_text, config)?;
    let mut interpreter = Interpreter::new(config, input, output);
    interpreter.run(&program)?;

    Ok(interpreter.tape().clone())
}

/// Compiles source text and translates it to C.
pub fn transpile(source_text: &[u8], config: &Config) -> Result<String, Error> {
    let program = compile(source_text, config)?;
    let c_source = CodeGenerator::new(config).generate(&program)?;

    Ok(c_source)
}
