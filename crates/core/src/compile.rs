//! Turns source text into a [Program], in one pass.
//!
//! Three things happen at once:
//!
//!  - runs of `>`/`<` and `+`/`-` are folded into a single [Instruction::MoveBy] or
//!    [Instruction::AddBy] carrying the net change;
//!  - the loops `[-]`, `[<]` and `[>]` are recognized and replaced with one instruction each;
//!  - every `[` is paired with its `]`, and both are given their partner's index.
//!
//! Everything that isn't one of the eight commands is a comment.

use tracing::{debug, trace};

use crate::config::Config;
use crate::errors::{CompilationError, Location, Reason};
use crate::ir::{Instruction, JumpTarget, Program};

/// Compiles source text (really, just a bunch of bytes) into a [Program].
pub fn compile(source_text: &[u8], config: &Config) -> Result<Program, CompilationError> {
    use crate::ir::Instruction::*;

    let mut instructions = Vec::new();
    let mut open_loops = BracketStack::with_limit(config.stack_size());
    let mut i = 0;

    while i < source_text.len() {
        match source_text[i] {
            b'[' => {
                if let Some(idiom) = loop_idiom(&source_text[i + 1..]) {
                    trace!(offset = i, instruction = %idiom, "replaced loop idiom");
                    instructions.push(idiom);
                    i += 3;
                    continue;
                }

                let here = instructions.len();
                if !open_loops.push(here, i) {
                    return Err(CompilationError::new(
                        Reason::StackOverflow {
                            limit: open_loops.limit(),
                        },
                        Location::of_offset(source_text, i),
                    ));
                }
                // The target is patched once the matching ']' turns up.
                instructions.push(JumpIfZero(JumpTarget(0)));
            }
            b']' => {
                let start = match open_loops.pop() {
                    Some(start) => start,
                    None => {
                        return Err(CompilationError::new(
                            Reason::TooManyCloseBrackets,
                            Location::of_offset(source_text, i),
                        ));
                    }
                };

                let here = instructions.len();
                instructions[start] = JumpIfZero(JumpTarget(here));
                instructions.push(JumpIfNonZero(JumpTarget(start)));
            }
            b'>' | b'<' => {
                let (net, length) = fold_run(&source_text[i..], b'>', b'<');
                instructions.push(MoveBy(net));
                i += length;
                continue;
            }
            b'+' | b'-' => {
                let (net, length) = fold_run(&source_text[i..], b'+', b'-');
                // Cells wrap at 256, so truncating a huge run keeps its effect.
                instructions.push(AddBy(net as i32));
                i += length;
                continue;
            }
            b'.' => instructions.push(Output),
            b',' => instructions.push(Input),
            _ => (),
        }

        i += 1;
    }

    if let Some(offset) = open_loops.innermost_offset() {
        return Err(CompilationError::new(
            Reason::NotEnoughCloseBrackets,
            Location::of_offset(source_text, offset),
        ));
    }

    debug!(
        source_len = source_text.len(),
        instructions = instructions.len(),
        "compiled program"
    );

    Ok(Program::new(instructions))
}

/// Recognizes `-]`, `<]`, and `>]` right after a `[`.
fn loop_idiom(rest: &[u8]) -> Option<Instruction> {
    match rest {
        [b'-', b']', ..] => Some(Instruction::SetZero),
        [b'<', b']', ..] => Some(Instruction::ScanZeroLeft),
        [b'>', b']', ..] => Some(Instruction::ScanZeroRight),
        _ => None,
    }
}

/// Folds the maximal run of `up`/`down` bytes at the start of `text`.
///
/// Returns the net change (`up` counts +1, `down` counts -1) and how many bytes the run spans.
fn fold_run(text: &[u8], up: u8, down: u8) -> (isize, usize) {
    let length = text
        .iter()
        .take_while(|&&b| b == up || b == down)
        .count();
    let net = text[..length]
        .iter()
        .map(|&b| if b == up { 1 } else { -1 })
        .sum();

    (net, length)
}

// Private data structures

/// Keeps track of every `[` that hasn't been closed yet.
struct BracketStack {
    // (index of the JumpIfZero, byte offset of the '[')
    stack: Vec<(usize, usize)>,
    limit: usize,
}

impl BracketStack {
    fn with_limit(limit: usize) -> Self {
        Self {
            stack: Vec::new(),
            limit,
        }
    }

    fn limit(&self) -> usize {
        self.limit
    }

    /// Returns false if the stack is already at its limit.
    fn push(&mut self, instruction: usize, offset: usize) -> bool {
        if self.stack.len() >= self.limit {
            return false;
        }
        self.stack.push((instruction, offset));
        true
    }

    fn pop(&mut self) -> Option<usize> {
        self.stack.pop().map(|(instruction, _)| instruction)
    }

    fn innermost_offset(&self) -> Option<usize> {
        self.stack.last().map(|&(_, offset)| offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Instruction::*;

    fn compile_ok(source: &str) -> Vec<Instruction> {
        compile(source.as_bytes(), &Config::default())
            .unwrap()
            .instructions()
            .to_vec()
    }

    fn compile_err(source: &str) -> CompilationError {
        compile(source.as_bytes(), &Config::default()).unwrap_err()
    }

    /// Every `[` points forwards at a `]` that points straight back.
    fn assert_jumps_are_paired(instructions: &[Instruction]) {
        for (i, &instr) in instructions.iter().enumerate() {
            match instr {
                JumpIfZero(JumpTarget(t)) => {
                    assert!(t > i, "[ at {} points backwards to {}", i, t);
                    assert_eq!(instructions[t], JumpIfNonZero(JumpTarget(i)));
                }
                JumpIfNonZero(JumpTarget(t)) => {
                    assert!(t < i, "] at {} points forwards to {}", i, t);
                    assert_eq!(instructions[t], JumpIfZero(JumpTarget(i)));
                }
                _ => (),
            }
        }
    }

    #[test]
    fn empty_source_is_an_empty_program() {
        assert!(compile_ok("").is_empty());
        assert!(compile_ok("this is all comments").is_empty());
    }

    #[test]
    fn folds_runs() {
        assert_eq!(compile_ok("+++++"), vec![AddBy(5)]);
        assert_eq!(compile_ok(">><<<"), vec![MoveBy(-1)]);
        assert_eq!(compile_ok("+"), vec![AddBy(1)]);
        assert_eq!(
            compile_ok("++>>-<."),
            vec![AddBy(2), MoveBy(2), AddBy(-1), MoveBy(-1), Output]
        );
    }

    #[test]
    fn net_zero_runs_still_fold_to_one_instruction() {
        assert_eq!(compile_ok("+-+-+-+-"), vec![AddBy(0)]);
        assert_eq!(compile_ok("><"), vec![MoveBy(0)]);
    }

    #[test]
    fn comments_break_runs() {
        assert_eq!(compile_ok("++ ++"), vec![AddBy(2), AddBy(2)]);
    }

    #[test]
    fn io_is_never_folded() {
        assert_eq!(compile_ok("..,,"), vec![Output, Output, Input, Input]);
    }

    #[test]
    fn recognizes_loop_idioms() {
        assert_eq!(compile_ok("[-]"), vec![SetZero]);
        assert_eq!(compile_ok("[<]"), vec![ScanZeroLeft]);
        assert_eq!(compile_ok("[>]"), vec![ScanZeroRight]);
        assert_eq!(
            compile_ok("+[-]>[<]<[>]"),
            vec![AddBy(1), SetZero, MoveBy(1), ScanZeroLeft, MoveBy(-1), ScanZeroRight]
        );
    }

    #[test]
    fn idioms_win_over_longer_loops() {
        // "[-]" is taken as an idiom, so the trailing ']' has nothing to close.
        let error = compile_err("[-]]");
        assert_eq!(error.reason(), Reason::TooManyCloseBrackets);

        // ...but inside another loop it's fine.
        assert_eq!(
            compile_ok("[[-]]"),
            vec![JumpIfZero(JumpTarget(2)), SetZero, JumpIfNonZero(JumpTarget(0))]
        );
    }

    #[test]
    fn idioms_need_adjacent_characters() {
        assert_eq!(
            compile_ok("[ -]"),
            vec![
                JumpIfZero(JumpTarget(2)),
                AddBy(-1),
                JumpIfNonZero(JumpTarget(0))
            ]
        );
        assert_eq!(
            compile_ok("[--]"),
            vec![
                JumpIfZero(JumpTarget(2)),
                AddBy(-2),
                JumpIfNonZero(JumpTarget(0))
            ]
        );
    }

    #[test]
    fn resolves_nested_jumps() {
        let instructions = compile_ok("+[>+[>+<-]<-]");
        assert_eq!(instructions[1], JumpIfZero(JumpTarget(12)));
        assert_eq!(instructions[4], JumpIfZero(JumpTarget(9)));
        assert_jumps_are_paired(&instructions);
    }

    #[test]
    fn hello_world_jumps_are_paired() {
        let instructions = compile_ok(
            "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.",
        );
        assert_jumps_are_paired(&instructions);
        assert!(instructions.contains(&ScanZeroLeft));
    }

    #[test]
    fn too_many_close_brackets() {
        let error = compile_err("+]");
        assert!(error.is_unmatched_loop());
        assert_eq!(error.reason(), Reason::TooManyCloseBrackets);
        assert_eq!(error.location(), Some(&Location::new(1, 2)));
    }

    #[test]
    fn not_enough_close_brackets() {
        let error = compile_err("[\n[+]");
        assert!(error.is_unmatched_loop());
        assert_eq!(error.reason(), Reason::NotEnoughCloseBrackets);
        // the outer '[' is the one left open
        assert_eq!(error.location(), Some(&Location::new(1, 1)));
    }

    #[test]
    fn unmatched_brackets_in_the_middle() {
        assert!(compile_err("][").is_unmatched_loop());
        assert!(compile_err("[[]").is_unmatched_loop());
        assert!(compile_err("[]]").is_unmatched_loop());
    }

    #[test]
    fn nesting_is_limited_by_stack_size() {
        let config = Config::new(crate::config::MIN_TAPE_SIZE, 1_000).unwrap();
        let deep = format!("{}{}", "[".repeat(1_001), "]".repeat(1_001));
        let error = compile(deep.as_bytes(), &config).unwrap_err();
        assert_eq!(error.reason(), Reason::StackOverflow { limit: 1_000 });

        let fits = format!("{}{}", "[".repeat(1_000), "]".repeat(1_000));
        assert!(compile(fits.as_bytes(), &config).is_ok());
    }
}
