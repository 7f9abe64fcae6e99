/// Share of the content area the console pane takes when shown
const CONSOLE_RATIO: f32 = 0.4;

/// A rectangle of terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Split this rect horizontally (top/bottom)
    pub fn split_horizontal(&self, ratio: f32) -> (Rect, Rect) {
        let split_y = self.y + (self.height as f32 * ratio) as u16;
        let top = Rect::new(self.x, self.y, self.width, split_y - self.y);
        let bottom = Rect::new(
            self.x,
            split_y,
            self.width,
            self.height - (split_y - self.y),
        );
        (top, bottom)
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.x && column < self.x + self.width && row >= self.y && row < self.y + self.height
    }
}

/// Where each part of the screen goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub editor: Rect,
    /// Row of the separator above the console
    pub separator: Option<u16>,
    pub console: Option<Rect>,
    pub status_row: u16,
}

impl Layout {
    /// Editor on top, console below when shown, one status line at the bottom
    pub fn compute(width: u16, height: u16, console_visible: bool) -> Self {
        let content = Rect::new(0, 0, width, height.saturating_sub(1));
        let status_row = height.saturating_sub(1);
        if !console_visible || content.height < 3 {
            return Self {
                editor: content,
                separator: None,
                console: None,
                status_row,
            };
        }

        let (editor, lower) = content.split_horizontal(1.0 - CONSOLE_RATIO);
        let console = Rect::new(lower.x, lower.y + 1, lower.width, lower.height.saturating_sub(1));
        Self {
            editor,
            separator: Some(lower.y),
            console: Some(console),
            status_row,
        }
    }
}
