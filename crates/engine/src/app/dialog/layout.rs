use crate::app::host::FontMetrics;

/// Where a dialog box sits on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogLayout {
    #[default]
    Bottom,
    Top,
    Left,
    Right,
    Center,
    Full,
}

impl DialogLayout {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Bottom" => Some(Self::Bottom),
            "Top" => Some(Self::Top),
            "Left" => Some(Self::Left),
            "Right" => Some(Self::Right),
            "Center" => Some(Self::Center),
            "Full" => Some(Self::Full),
            _ => None,
        }
    }

    /// Frame rectangle for a screen of `screen_width` by `screen_height`.
    pub fn frame(self, screen_width: u32, screen_height: u32) -> FrameRect {
        let sw = screen_width as i32;
        let sh = screen_height as i32;
        let (width, height, left, top) = match self {
            Self::Bottom => {
                let width = sw - 4;
                let height = sh / 3 + 5;
                (width, height, (sw - width) >> 1, sh - height)
            }
            Self::Top => {
                let width = sw - 4;
                (width, sh / 3 + 5, (sw - width) >> 1, 0)
            }
            Self::Left => (sw / 3 + 5, sh, 0, 0),
            Self::Right => {
                let width = sw / 3 + 5;
                (width, sh, sw - width, 0)
            }
            Self::Center => {
                // Square box sized off the screen width.
                let side = (sw << 1) / 3;
                (side, side, (sw - side) >> 1, (sh - side) >> 1)
            }
            Self::Full => (sw, sh, 0, 0),
        };
        FrameRect {
            left,
            top,
            width: width.max(1) as u32,
            height: height.max(1) as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// Border thickness of the dialog box in pixels.
pub const FRAME_UNIT: u32 = 5;
/// Borders wider than this are drawn explicitly instead of by the frame.
pub const MAX_FRAME_UNIT: u32 = 12;

/// The region of a frame text is laid out in, in frame-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextArea {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub font: FontMetrics,
}

impl TextArea {
    pub fn within(frame: FrameRect, font: FontMetrics) -> Self {
        let inset = FRAME_UNIT.min(MAX_FRAME_UNIT);
        Self {
            left: inset + 1,
            top: inset + 1,
            width: frame.width.saturating_sub((inset << 1) + 2),
            height: frame.height.saturating_sub((inset << 1) + 1),
            font,
        }
    }

    pub fn row_height(&self) -> u32 {
        self.font.char_height + 1
    }

    pub fn chars_per_row(&self) -> usize {
        (self.width / self.font.char_width.max(1)) as usize
    }

    pub fn rows(&self) -> usize {
        (self.height / self.row_height()) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_layout_hugs_the_lower_edge() {
        let frame = DialogLayout::Bottom.frame(160, 120);
        assert_eq!(
            frame,
            FrameRect {
                left: 2,
                top: 75,
                width: 156,
                height: 45,
            }
        );
    }

    #[test]
    fn side_layouts_take_a_third_of_the_width() {
        assert_eq!(DialogLayout::Left.frame(160, 120).width, 58);
        let right = DialogLayout::Right.frame(160, 120);
        assert_eq!((right.left, right.width, right.height), (102, 58, 120));
    }

    #[test]
    fn center_layout_is_square_on_width() {
        let frame = DialogLayout::Center.frame(160, 120);
        assert_eq!((frame.width, frame.height), (106, 106));
        assert_eq!((frame.left, frame.top), (27, 7));
    }

    #[test]
    fn text_area_counts_rows_and_columns() {
        let area = TextArea::within(DialogLayout::Bottom.frame(160, 120), FontMetrics::FONT8);
        assert_eq!(area.width, 144);
        assert_eq!(area.chars_per_row(), 24);
        assert_eq!(area.rows(), 3);
    }
}
