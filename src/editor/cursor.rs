/// A (line, column) position in a buffer.
///
/// Ordering is document order, so `min`/`max` of two cursors give the start
/// and end of the text between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub line: usize,
    pub col: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self { line: 0, col: 0 }
    }

    pub fn at(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    pub fn move_left(&mut self) {
        self.col = self.col.saturating_sub(1);
    }

    pub fn move_right(&mut self, line_len: usize) {
        self.col = (self.col + 1).min(line_len);
    }

    pub fn move_up(&mut self) {
        self.line = self.line.saturating_sub(1);
    }

    pub fn move_down(&mut self, line_count: usize) {
        self.line = (self.line + 1).min(line_count.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_order_compares_line_first() {
        assert!(Cursor::at(1, 0) > Cursor::at(0, 40));
        assert!(Cursor::at(2, 3) < Cursor::at(2, 4));
        assert_eq!(Cursor::at(0, 5).min(Cursor::at(0, 2)), Cursor::at(0, 2));
    }

    #[test]
    fn horizontal_moves_stay_on_line() {
        let mut cursor = Cursor::new();
        cursor.move_left();
        assert_eq!(cursor, Cursor::at(0, 0));
        cursor.move_right(2);
        cursor.move_right(2);
        cursor.move_right(2);
        assert_eq!(cursor, Cursor::at(0, 2));
    }

    #[test]
    fn vertical_moves_stay_in_buffer() {
        let mut cursor = Cursor::new();
        cursor.move_up();
        assert_eq!(cursor.line, 0);
        cursor.move_down(3);
        cursor.move_down(3);
        cursor.move_down(3);
        assert_eq!(cursor.line, 2);
    }

    #[test]
    fn move_down_in_empty_buffer_stays_put() {
        let mut cursor = Cursor::new();
        cursor.move_down(0);
        assert_eq!(cursor.line, 0);
    }
}
