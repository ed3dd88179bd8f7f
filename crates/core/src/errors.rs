//! All errors that can be _generated_ by the compiler, the configuration, or a running program.
use std::fmt;
use std::io;

use thiserror::Error;

/// Any error that occurs as a result of compiling the source code.
#[derive(Debug)]
pub struct CompilationError {
    reason: Reason,
    location: Option<Location>,
}

/// Where in the source text a [CompilationError] happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    filename: Option<String>,
    line_no: u32,
    column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    TooManyCloseBrackets,
    NotEnoughCloseBrackets,
    StackOverflow { limit: usize },
}

/// Raised before compilation when the requested resources are too small.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid tape size {requested} [must be at least {minimum}]")]
    TapeTooSmall { requested: usize, minimum: usize },
    #[error("invalid stack size {requested} [must be at least {minimum}]")]
    StackTooSmall { requested: usize, minimum: usize },
}

/// Which way a scan for a zero cell was going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Something went wrong while a compiled program was being interpreted.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime error: scanned {direction} but the tape has no zero cell")]
    NoZeroCell { direction: Direction },
    #[error("runtime error: {0}")]
    Io(#[from] io::Error),
}

/// Umbrella error for everything a caller of this crate can run into.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Compilation(#[from] CompilationError),
    #[error("{0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("could not generate C source")]
    Codegen(#[from] fmt::Error),
}

impl CompilationError {
    pub fn new(reason: Reason, location: Location) -> Self {
        CompilationError {
            reason,
            location: Some(location),
        }
    }

    pub fn without_location(reason: Reason) -> Self {
        CompilationError {
            reason,
            location: None,
        }
    }

    /// Attaches a filename to the location, so that the message points at the right file.
    pub fn in_file(mut self, filename: impl Into<String>) -> Self {
        if let Some(location) = self.location.as_mut() {
            location.filename = Some(filename.into());
        }
        self
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// True for both flavours of mismatched `[` and `]`.
    pub fn is_unmatched_loop(&self) -> bool {
        matches!(
            self.reason,
            Reason::TooManyCloseBrackets | Reason::NotEnoughCloseBrackets
        )
    }

    pub fn message(&self) -> String {
        self.reason.message()
    }

    pub fn message_identifier(&self) -> u32 {
        self.reason.message_identifier()
    }
}

impl Reason {
    pub fn message_identifier(&self) -> u32 {
        use Reason::*;
        match self {
            TooManyCloseBrackets => 0x001,
            NotEnoughCloseBrackets => 0x002,
            StackOverflow { .. } => 0x003,
        }
    }

    pub fn message(&self) -> String {
        use Reason::*;
        match self {
            TooManyCloseBrackets => {
                "too many ']' brackets. Check that each '[' has a matching ']'".to_owned()
            }
            NotEnoughCloseBrackets => {
                "too many '[' brackets. Check that each '[' has a matching ']'".to_owned()
            }
            StackOverflow { limit } => format!(
                "loops are nested more than {} deep. Use a larger --stack size",
                limit
            ),
        }
    }
}

impl Location {
    pub fn new(line_no: u32, column: u32) -> Self {
        Location {
            filename: None,
            line_no,
            column,
        }
    }

    /// Finds the line and column (both 1-based) of a byte offset into the source text.
    pub fn of_offset(source_text: &[u8], offset: usize) -> Self {
        let before = &source_text[..offset.min(source_text.len())];
        let line_no = before.iter().filter(|&&b| b == b'\n').count() as u32 + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let column = (before.len() - line_start) as u32 + 1;

        Location::new(line_no, column)
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    pub fn column(&self) -> u32 {
        self.column
    }
}

impl std::error::Error for CompilationError {}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let location = self
            .location
            .as_ref()
            .map(|l| format!(" {}:", l))
            .unwrap_or_else(|| String::from(""));

        write!(
            f,
            "error[{:04x}]:{} {}",
            self.message_identifier(),
            location,
            self.message()
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.filename {
            Some(filename) => write!(f, "{}:{}:{}", filename, self.line_no, self.column),
            None => write!(f, "{}:{}", self.line_no, self.column),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_of_offset_counts_lines_and_columns() {
        let source = b"++\n+[\n  ]]";
        assert_eq!(Location::of_offset(source, 0), Location::new(1, 1));
        assert_eq!(Location::of_offset(source, 4), Location::new(2, 2));
        assert_eq!(Location::of_offset(source, 9), Location::new(3, 4));
    }

    #[test]
    fn display_includes_identifier_and_location() {
        let error = CompilationError::new(Reason::TooManyCloseBrackets, Location::new(3, 4))
            .in_file("hello.bf");

        assert_eq!(
            error.to_string(),
            "error[0001]: hello.bf:3:4: too many ']' brackets. Check that each '[' has a matching ']'"
        );
    }

    #[test]
    fn display_without_location() {
        let error = CompilationError::without_location(Reason::StackOverflow { limit: 1000 });

        assert_eq!(
            error.to_string(),
            "error[0003]: loops are nested more than 1000 deep. Use a larger --stack size"
        );
        assert!(!error.is_unmatched_loop());
    }
}
