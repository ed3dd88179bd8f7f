//! Generates C source for a given program.
//!
//! The result is a complete, freestanding C99 translation unit. It has to be compiled with an
//! external C compiler to be of any use; nothing here runs it.

use std::fmt::{self, Write};

use tracing::debug;

use crate::config::{Config, OutputMode};
use crate::interpreter::{EOF_SENTINEL, LINE_BUFFER_CAPACITY};
use crate::ir::{JumpTarget, Program};
use crate::program::{walk, Flow, InstructionHandler};

/// Takes a compiled [Program] and writes equivalent C.
///
/// Loops become `while` blocks; the generator only needs to know how deeply it's nested, never
/// where a jump goes.
pub struct CodeGenerator {
    source: String,
    tape_size: usize,
    output_mode: OutputMode,
    // the `]` each open block is waiting for
    open_loops: Vec<JumpTarget>,
}

impl CodeGenerator {
    pub fn new(config: &Config) -> Self {
        CodeGenerator {
            source: String::new(),
            tape_size: config.tape_size(),
            output_mode: config.output_mode(),
            open_loops: Vec::new(),
        }
    }

    /// Translates the whole program, returning the C source text.
    pub fn generate(mut self, program: &Program) -> Result<String, fmt::Error> {
        debug!(
            instructions = program.len(),
            tape_size = self.tape_size,
            "translating program to C"
        );

        self.write_header()?;
        walk(program, &mut self)?;

        Ok(self.source)
    }

    fn write_header(&mut self) -> fmt::Result {
        let out = &mut self.source;

        writeln!(out, "/* Generated by brainfold. */")?;
        writeln!(out, "#include <stdio.h>")?;
        writeln!(out, "#include <stdlib.h>")?;
        writeln!(out)?;
        writeln!(out, "#define TAPE_SIZE {}", self.tape_size)?;
        writeln!(out)?;
        writeln!(out, "static unsigned char tape[TAPE_SIZE];")?;
        writeln!(out, "static size_t pointer = 0;")?;
        writeln!(out)?;

        write_find_zero(out, "left", "i = (i == 0) ? TAPE_SIZE - 1 : i - 1;")?;
        write_find_zero(out, "right", "i = (i + 1) % TAPE_SIZE;")?;

        writeln!(out, "static unsigned char read_byte(void) {{")?;
        writeln!(out, "\tint c;")?;
        writeln!(out, "\tfflush(stdout);")?;
        writeln!(out, "\tc = getchar();")?;
        writeln!(
            out,
            "\treturn (c == EOF) ? 0x{:02X} : (unsigned char) c;",
            EOF_SENTINEL
        )?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "int main(void) {{")?;
        if self.output_mode == OutputMode::LineBuffered {
            writeln!(
                out,
                "\tsetvbuf(stdout, NULL, _IOLBF, {});",
                LINE_BUFFER_CAPACITY
            )?;
        }
        writeln!(out)
    }

    /// Writes one statement at the current nesting depth.
    fn statement(&mut self, code: fmt::Arguments) -> fmt::Result {
        for _ in 0..=self.open_loops.len() {
            self.source.push('\t');
        }
        self.source.write_fmt(code)?;
        self.source.push('\n');
        Ok(())
    }
}

/// Writes `find_zero_left()` or `find_zero_right()`. Both give up on a tape with no zero cells.
fn write_find_zero(out: &mut String, direction: &str, step: &str) -> fmt::Result {
    writeln!(out, "static size_t find_zero_{}(size_t position) {{", direction)?;
    writeln!(out, "\tsize_t i = position;")?;
    writeln!(out, "\tdo {{")?;
    writeln!(out, "\t\tif (tape[i] == 0) {{")?;
    writeln!(out, "\t\t\treturn i;")?;
    writeln!(out, "\t\t}}")?;
    writeln!(out, "\t\t{}", step)?;
    writeln!(out, "\t}} while (i != position);")?;
    writeln!(
        out,
        "\tfprintf(stderr, \"runtime error: scanned {} but the tape has no zero cell\\n\");",
        direction
    )?;
    writeln!(out, "\texit(1);")?;
    writeln!(out, "}}")?;
    writeln!(out)
}

impl InstructionHandler for CodeGenerator {
    type Error = fmt::Error;

    fn move_by(&mut self, delta: isize) -> fmt::Result {
        let size = self.tape_size as isize;
        if delta >= 0 {
            let forwards = delta % size;
            self.statement(format_args!("pointer = (pointer + {}) % TAPE_SIZE;", forwards))
        } else {
            let backwards = -(delta % size);
            self.statement(format_args!(
                "pointer = (pointer + TAPE_SIZE - {}) % TAPE_SIZE;",
                backwards
            ))
        }
    }

    fn add_by(&mut self, delta: i32) -> fmt::Result {
        let delta = delta as i64;
        if delta >= 0 {
            self.statement(format_args!("tape[pointer] += {};", delta % 256))
        } else {
            self.statement(format_args!("tape[pointer] -= {};", -delta % 256))
        }
    }

    fn output(&mut self) -> fmt::Result {
        self.statement(format_args!("putchar(tape[pointer]);"))?;
        if self.output_mode == OutputMode::Unbuffered {
            self.statement(format_args!("fflush(stdout);"))?;
        }
        Ok(())
    }

    fn input(&mut self) -> fmt::Result {
        self.statement(format_args!("tape[pointer] = read_byte();"))
    }

    fn set_zero(&mut self) -> fmt::Result {
        self.statement(format_args!("tape[pointer] = 0;"))
    }

    fn scan_zero_left(&mut self) -> fmt::Result {
        self.statement(format_args!("pointer = find_zero_left(pointer);"))
    }

    fn scan_zero_right(&mut self) -> fmt::Result {
        self.statement(format_args!("pointer = find_zero_right(pointer);"))
    }

    fn jump_if_zero(&mut self, target: JumpTarget) -> Result<Flow, fmt::Error> {
        self.statement(format_args!("while (tape[pointer] != 0) {{"))?;
        self.open_loops.push(target);
        Ok(Flow::Continue)
    }

    fn jump_if_non_zero(&mut self, _: JumpTarget) -> Result<Flow, fmt::Error> {
        let closed = self.open_loops.pop();
        debug_assert!(closed.is_some(), "closed a loop that was never opened");

        self.statement(format_args!("}}"))?;
        Ok(Flow::Continue)
    }

    fn finish(&mut self) -> fmt::Result {
        debug_assert!(self.open_loops.is_empty(), "loops left open");

        writeln!(self.source)?;
        writeln!(self.source, "\tfflush(stdout);")?;
        writeln!(self.source, "\treturn 0;")?;
        writeln!(self.source, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;

    fn translate(source: &str, config: &Config) -> String {
        let program = compile(source.as_bytes(), config).unwrap();
        CodeGenerator::new(config).generate(&program).unwrap()
    }

    #[test]
    fn loops_become_nested_while_blocks() {
        let c = translate("+[->++<]<.", &Config::default());

        let expected_body = "\
\ttape[pointer] += 1;
\twhile (tape[pointer] != 0) {
\t\ttape[pointer] -= 1;
\t\tpointer = (pointer + 1) % TAPE_SIZE;
\t\ttape[pointer] += 2;
\t\tpointer = (pointer + TAPE_SIZE - 1) % TAPE_SIZE;
\t}
\tpointer = (pointer + TAPE_SIZE - 1) % TAPE_SIZE;
\tputchar(tape[pointer]);
\tfflush(stdout);
";
        assert!(c.contains(expected_body), "unexpected output:\n{}", c);
        assert!(c.ends_with("\treturn 0;\n}\n"));
    }

    #[test]
    fn header_declares_the_tape_and_helpers() {
        let config = crate::config::Config::new(12_345, 1_000).unwrap();
        let c = translate("", &config);

        assert!(c.contains("#define TAPE_SIZE 12345\n"));
        assert!(c.contains("static unsigned char tape[TAPE_SIZE];"));
        assert!(c.contains("static size_t find_zero_left(size_t position) {"));
        assert!(c.contains("static size_t find_zero_right(size_t position) {"));
        assert!(c.contains("return (c == EOF) ? 0xFF : (unsigned char) c;"));
        assert!(c.contains("int main(void) {"));
        assert!(!c.contains("setvbuf"));
    }

    #[test]
    fn idioms_call_the_helpers() {
        let c = translate("[-]>[<]<[>],", &Config::default());

        assert!(c.contains("\ttape[pointer] = 0;\n"));
        assert!(c.contains("\tpointer = find_zero_left(pointer);\n"));
        assert!(c.contains("\tpointer = find_zero_right(pointer);\n"));
        assert!(c.contains("\ttape[pointer] = read_byte();\n"));
        // the helpers have their own loops; the program body has none
        assert!(!c.contains("while (tape[pointer] != 0)"));
    }

    #[test]
    fn deltas_are_reduced() {
        let plus = "+".repeat(300);
        let minus = "-".repeat(257);
        let c = translate(&format!("{}{}{}", plus, ">", minus), &Config::default());
        assert!(c.contains("\ttape[pointer] += 44;\n"));
        assert!(c.contains("\ttape[pointer] -= 1;\n"));

        let left = "<".repeat(30_001);
        let c = translate(&left, &Config::default());
        assert!(c.contains("\tpointer = (pointer + TAPE_SIZE - 1) % TAPE_SIZE;\n"));
    }

    #[test]
    fn line_buffered_output_skips_flushes() {
        let config = Config::default().with_output_mode(OutputMode::LineBuffered);
        let c = translate("+.", &config);

        assert!(c.contains("\tsetvbuf(stdout, NULL, _IOLBF, 1024);\n"));
        assert!(c.contains("\tputchar(tape[pointer]);\n\n\tfflush(stdout);\n\treturn 0;"));
    }

    #[test]
    fn hello_world_has_two_loops() {
        let c = translate(
            "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.",
            &Config::default(),
        );

        assert_eq!(c.matches("while (tape[pointer] != 0) {").count(), 2);
        assert!(c.contains("\t\t}\n\t\tpointer"));
        assert_eq!(c.matches("putchar(").count(), 13);
    }
}
