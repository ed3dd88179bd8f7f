//! The circular "universe" of byte cells that a program runs against.

/// A fixed number of cells, arranged in a circle, with a cursor pointing at one of them.
///
/// Moving off either end of the tape wraps around to the other end, and adding to a cell wraps
/// modulo 256.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<u8>,
    cursor: usize,
}

impl Tape {
    /// Allocates a zero-filled tape with the cursor on the first cell.
    ///
    /// # Panics
    ///
    /// If `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "a tape needs at least one cell");

        Tape {
            cells: vec![0; size],
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn move_by(&mut self, delta: isize) {
        let size = self.len() as isize;
        let offset = delta.rem_euclid(size) as usize;
        self.cursor = (self.cursor + offset) % self.len();
    }

    /// Puts the cursor on an absolute position (taken modulo the tape size).
    pub fn move_to(&mut self, position: usize) {
        self.cursor = position % self.len();
    }

    pub fn add_by(&mut self, delta: i32) {
        let cell = &mut self.cells[self.cursor];
        *cell = cell.wrapping_add(delta.rem_euclid(256) as u8);
    }

    pub fn read(&self) -> u8 {
        self.cells[self.cursor]
    }

    pub fn write(&mut self, byte: u8) {
        self.cells[self.cursor] = byte;
    }

    pub fn set_zero(&mut self) {
        self.write(0);
    }

    /// Position of the nearest zero cell at or to the left of `from`, wrapping around the start of
    /// the tape. [None] when no cell is zero. Like [Tape::move_to], `from` is taken modulo the tape
    /// size.
    pub fn scan_zero_left(&self, from: usize) -> Option<usize> {
        let from = from % self.len();
        let (before, after) = self.cells.split_at(from + 1);
        before
            .iter()
            .rposition(|&c| c == 0)
            .or_else(|| after.iter().rposition(|&c| c == 0).map(|i| from + 1 + i))
    }

    /// Position of the nearest zero cell at or to the right of `from`, wrapping around the end of
    /// the tape. [None] when no cell is zero.
    pub fn scan_zero_right(&self, from: usize) -> Option<usize> {
        let from = from % self.len();
        let (before, after) = self.cells.split_at(from);
        after
            .iter()
            .position(|&c| c == 0)
            .map(|i| from + i)
            .or_else(|| before.iter().position(|&c| c == 0))
    }
}

impl Default for Tape {
    fn default() -> Self {
        Tape::new(crate::config::DEFAULT_TAPE_SIZE)
    }
}
