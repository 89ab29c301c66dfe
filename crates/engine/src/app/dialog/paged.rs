use image::RgbaImage;

use crate::app::host::{FontMetrics, Host};
use crate::app::input::{Button, ButtonEdges};

use super::layout::{DialogLayout, FrameRect, TextArea};
use super::render::split_lines;
use super::{DialogResult, DialogStyle, Prompt, PromptStep};

/// Text wrapped to the dialog width and shown a page at a time.
#[derive(Debug, Clone)]
pub struct LongTextPrompt {
    pages: Vec<Vec<String>>,
    page: usize,
    frame: FrameRect,
    area: TextArea,
    style: DialogStyle,
}

impl LongTextPrompt {
    pub fn new(text: &str, frame: FrameRect, font: FontMetrics) -> Self {
        let area = TextArea::within(frame, font);
        let rows: Vec<String> = split_lines(text)
            .into_iter()
            .flat_map(|line| wrap_line(line, area.chars_per_row()))
            .collect();
        let per_page = area.rows().max(1);
        let mut pages: Vec<Vec<String>> = rows.chunks(per_page).map(<[String]>::to_vec).collect();
        if pages.is_empty() {
            pages.push(Vec::new());
        }
        Self {
            pages,
            page: 0,
            frame,
            area,
            style: DialogStyle::default(),
        }
    }

    pub fn with_layout(
        text: &str,
        layout: DialogLayout,
        screen: (u32, u32),
        font: FontMetrics,
    ) -> Self {
        Self::new(text, layout.frame(screen.0, screen.1), font)
    }

    pub fn with_style(mut self, style: DialogStyle) -> Self {
        self.style = style;
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_index(&self) -> usize {
        self.page
    }

    pub fn current_page(&self) -> &[String] {
        self.pages.get(self.page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.pages.len()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }
}

impl Prompt for LongTextPrompt {
    fn frame(&self) -> FrameRect {
        self.frame
    }

    fn style(&self) -> DialogStyle {
        self.style
    }

    fn handle(&mut self, edges: &ButtonEdges) -> PromptStep {
        if edges.pressed(Button::A) || edges.pressed(Button::Down) {
            if !self.has_next() {
                return PromptStep::Done(DialogResult::Closed);
            }
            self.page += 1;
            return PromptStep::Redraw;
        }
        if edges.pressed(Button::Up) && self.has_prev() {
            self.page -= 1;
            return PromptStep::Redraw;
        }
        PromptStep::Idle
    }

    fn render(&self, host: &mut dyn Host, target: &mut RgbaImage) {
        let row_height = self.area.row_height() as i32;
        for (slot, row) in self.current_page().iter().enumerate() {
            host.print(
                target,
                row,
                self.area.left as i32,
                self.area.top as i32 + slot as i32 * row_height,
                self.style.text,
                self.area.font,
            );
        }
    }
}

/// Greedy word wrap. Words longer than a row are hard-split.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            rows.push(word.drain(..width).collect());
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.len()
        } else {
            current.chars().count() + 1 + word.len()
        };
        if needed > width {
            rows.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::ButtonStates;

    fn press(button: Button) -> ButtonEdges {
        let mut edges = ButtonEdges::default();
        edges.update(&ButtonStates::default());
        edges.update(&ButtonStates::default().with_down(button));
        edges
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(wrap_line("the quick brown fox", 10), ["the quick", "brown fox"]);
        assert_eq!(wrap_line("abcdefghij", 4), ["abcd", "efgh", "ij"]);
        assert_eq!(wrap_line("", 8), [""]);
    }

    #[test]
    fn rows_are_grouped_into_pages() {
        let prompt = LongTextPrompt::with_layout(
            "one\\ntwo\\nthree\\nfour\\nfive",
            DialogLayout::Bottom,
            (160, 120),
            FontMetrics::FONT8,
        );
        assert_eq!(prompt.page_count(), 2);
        assert_eq!(prompt.current_page(), ["one", "two", "three"]);
    }

    #[test]
    fn a_or_down_advance_and_close_after_the_last_page() {
        let mut prompt = LongTextPrompt::with_layout(
            "1\\n2\\n3\\n4",
            DialogLayout::Bottom,
            (160, 120),
            FontMetrics::FONT8,
        );
        assert_eq!(prompt.handle(&press(Button::Down)), PromptStep::Redraw);
        assert_eq!(prompt.current_page(), ["4"]);
        assert_eq!(prompt.handle(&press(Button::Up)), PromptStep::Redraw);
        assert_eq!(prompt.handle(&press(Button::Up)), PromptStep::Idle);
        assert_eq!(prompt.handle(&press(Button::A)), PromptStep::Redraw);
        assert_eq!(
            prompt.handle(&press(Button::A)),
            PromptStep::Done(DialogResult::Closed)
        );
    }
}
