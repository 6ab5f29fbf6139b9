//! Terminal Screen Model
//!
//! Feeds raw session bytes through a `vte` parser to keep a character grid
//! and cursor position. The printable text (plus CR, LF and TAB) is kept as
//! an unconsumed stream for pattern waits and reads, so escape sequences
//! never sit between the characters a wait is looking for.

use vte::{Params, Parser, Perform};

use super::transport::CursorPosition;

/// Upper bound on unconsumed stream text kept in memory
pub const MAX_PENDING_BYTES: usize = 16 * 1024 * 1024;

const TAB_WIDTH: usize = 8;

/// Screen grid plus unconsumed stream
pub struct TerminalScreen {
    parser: Parser,
    grid: Grid,
    pending: String,
}

impl TerminalScreen {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            parser: Parser::new(),
            grid: Grid::new(rows.max(1), cols.max(1)),
            pending: String::new(),
        }
    }

    /// Process incoming bytes. Returns whether the cursor moved; a scroll
    /// at the bottom row counts as movement.
    pub fn feed(&mut self, bytes: &[u8]) -> bool {
        let before = self.grid.cursor;
        self.grid.scrolled = false;
        self.parser.advance(&mut self.grid, bytes);
        self.append_stream();
        self.grid.cursor != before || self.grid.scrolled
    }

    pub fn cursor(&self) -> CursorPosition {
        self.grid.cursor
    }

    pub fn rows(&self) -> usize {
        self.grid.rows
    }

    pub fn cols(&self) -> usize {
        self.grid.cols
    }

    /// Text of `row` between `from_col` (inclusive) and `to_col` (exclusive)
    pub fn row_text(&self, row: usize, from_col: usize, to_col: usize) -> String {
        match self.grid.cells.get(row) {
            Some(cells) => {
                let to = to_col.min(cells.len());
                if from_col >= to {
                    return String::new();
                }
                cells[from_col..to].iter().collect()
            }
            None => String::new(),
        }
    }

    /// Unconsumed stream text
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Consume the stream through the first occurrence of `pattern`
    pub fn take_through(&mut self, pattern: &str) -> bool {
        match self.pending.find(pattern) {
            Some(start) => {
                self.pending.drain(..start + pattern.len());
                true
            }
            None => false,
        }
    }

    /// Return the stream text before the first `terminator`, consuming both
    pub fn take_until(&mut self, terminator: &str) -> Option<String> {
        let start = self.pending.find(terminator)?;
        let text = self.pending[..start].to_string();
        self.pending.drain(..start + terminator.len());
        Some(text)
    }

    /// Drop the unconsumed stream, returning how many bytes were discarded
    pub fn discard_pending(&mut self) -> usize {
        let len = self.pending.len();
        self.pending.clear();
        len
    }

    fn append_stream(&mut self) {
        self.pending.push_str(&self.grid.text);
        self.grid.text.clear();

        if self.pending.len() > MAX_PENDING_BYTES {
            let mut cut = self.pending.len() - MAX_PENDING_BYTES;
            while !self.pending.is_char_boundary(cut) {
                cut += 1;
            }
            warn!("Unconsumed session output over limit, dropping {} bytes", cut);
            self.pending.drain(..cut);
        }
    }
}

impl Default for TerminalScreen {
    fn default() -> Self {
        Self::new(24, 80)
    }
}

/// Character grid driven by the `vte` parser
struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<char>>,
    cursor: CursorPosition,
    scrolled: bool,
    /// Printable text seen since the last `feed`
    text: String,
}

impl Grid {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![vec![' '; cols]; rows],
            cursor: CursorPosition::default(),
            scrolled: false,
            text: String::new(),
        }
    }

    fn line_feed(&mut self) {
        if self.cursor.row + 1 >= self.rows {
            self.cells.remove(0);
            self.cells.push(vec![' '; self.cols]);
            self.scrolled = true;
        } else {
            self.cursor.row += 1;
        }
    }

    fn erase_line(&mut self, row: usize, from: usize, to: usize) {
        if let Some(cells) = self.cells.get_mut(row) {
            let to = to.min(cells.len());
            for cell in cells.iter_mut().take(to).skip(from) {
                *cell = ' ';
            }
        }
    }

    fn erase_display(&mut self, mode: u16) {
        let CursorPosition { row, col } = self.cursor;
        match mode {
            0 => {
                self.erase_line(row, col, self.cols);
                for r in row + 1..self.rows {
                    self.erase_line(r, 0, self.cols);
                }
            }
            1 => {
                for r in 0..row {
                    self.erase_line(r, 0, self.cols);
                }
                self.erase_line(row, 0, col + 1);
            }
            _ => {
                for r in 0..self.rows {
                    self.erase_line(r, 0, self.cols);
                }
            }
        }
    }

    fn set_position(&mut self, row: usize, col: usize) {
        self.cursor.row = row.min(self.rows - 1);
        self.cursor.col = col.min(self.cols - 1);
    }
}

/// First parameter of a CSI sequence, with `default` for absent or zero
fn first_param(params: &Params, default: u16) -> u16 {
    params
        .iter()
        .next()
        .and_then(|p| p.first().copied())
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

impl Perform for Grid {
    fn print(&mut self, c: char) {
        if self.cursor.col >= self.cols {
            self.cursor.col = 0;
            self.line_feed();
        }
        let CursorPosition { row, col } = self.cursor;
        self.cells[row][col] = c;
        self.cursor.col += 1;
        self.text.push(c);
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\r' | b'\n' | b'\t') {
            self.text.push(byte as char);
        }
        match byte {
            b'\r' => self.cursor.col = 0,
            b'\n' | 0x0b | 0x0c => self.line_feed(),
            0x08 => self.cursor.col = self.cursor.col.saturating_sub(1),
            b'\t' => {
                let next = (self.cursor.col / TAB_WIDTH + 1) * TAB_WIDTH;
                self.cursor.col = next.min(self.cols - 1);
            }
            _ => {}
        }
    }

    fn csi_dispatch(&mut self, params: &Params, _intermediates: &[u8], ignore: bool, action: char) {
        if ignore {
            return;
        }
        let CursorPosition { row, col } = self.cursor;
        match action {
            'A' => self.set_position(row.saturating_sub(first_param(params, 1) as usize), col),
            'B' => self.set_position(row + first_param(params, 1) as usize, col),
            'C' => self.set_position(row, col + first_param(params, 1) as usize),
            'D' => self.set_position(row, col.saturating_sub(first_param(params, 1) as usize)),
            'G' => self.set_position(row, first_param(params, 1) as usize - 1),
            'd' => self.set_position(first_param(params, 1) as usize - 1, col),
            'H' | 'f' => {
                let mut iter = params.iter();
                let r = iter
                    .next()
                    .and_then(|p| p.first().copied())
                    .filter(|&v| v != 0)
                    .unwrap_or(1);
                let c = iter
                    .next()
                    .and_then(|p| p.first().copied())
                    .filter(|&v| v != 0)
                    .unwrap_or(1);
                self.set_position(r as usize - 1, c as usize - 1);
            }
            'J' => {
                let mode = params.iter().next().and_then(|p| p.first().copied()).unwrap_or(0);
                self.erase_display(mode);
            }
            'K' => {
                let mode = params.iter().next().and_then(|p| p.first().copied()).unwrap_or(0);
                match mode {
                    0 => self.erase_line(row, col, self.cols),
                    1 => self.erase_line(row, 0, col + 1),
                    _ => self.erase_line(row, 0, self.cols),
                }
            }
            _ => {}
        }
    }
}
