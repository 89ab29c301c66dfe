use image::RgbaImage;

use crate::app::host::{FontMetrics, Host};
use crate::app::input::{Button, ButtonEdges};

use super::layout::{DialogLayout, FrameRect, TextArea};
use super::render::{draw_text_centered, fill_rect, split_lines};
use super::{DialogResult, DialogStyle, Prompt, PromptStep};

/// A message that closes on A.
#[derive(Debug, Clone)]
pub struct ConfirmPrompt {
    message: String,
    frame: FrameRect,
    style: DialogStyle,
}

impl ConfirmPrompt {
    pub fn new(message: impl Into<String>, frame: FrameRect) -> Self {
        Self {
            message: message.into(),
            frame,
            style: DialogStyle::default(),
        }
    }

    pub fn with_style(mut self, style: DialogStyle) -> Self {
        self.style = style;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Prompt for ConfirmPrompt {
    fn frame(&self) -> FrameRect {
        self.frame
    }

    fn style(&self) -> DialogStyle {
        self.style
    }

    fn handle(&mut self, edges: &ButtonEdges) -> PromptStep {
        if edges.pressed(Button::A) {
            PromptStep::Done(DialogResult::Confirmed)
        } else {
            PromptStep::Idle
        }
    }

    fn render(&self, host: &mut dyn Host, target: &mut RgbaImage) {
        draw_text_centered(host, target, &self.message, self.style.text, 1, true);
    }
}

/// A scrolling list; A picks the highlighted entry.
#[derive(Debug, Clone)]
pub struct ChoicePrompt {
    choices: Vec<String>,
    selected: usize,
    first_visible: usize,
    frame: FrameRect,
    area: TextArea,
    style: DialogStyle,
}

impl ChoicePrompt {
    pub fn new(choices: Vec<String>, frame: FrameRect, font: FontMetrics) -> Self {
        Self {
            choices,
            selected: 0,
            first_visible: 0,
            frame,
            area: TextArea::within(frame, font),
            style: DialogStyle::default(),
        }
    }

    /// Choices given as one string separated by `\n` escapes.
    pub fn from_text(text: &str, frame: FrameRect, font: FontMetrics) -> Self {
        let choices = split_lines(text).into_iter().map(str::to_string).collect();
        Self::new(choices, frame, font)
    }

    /// Bottom-anchored list sized for the given screen.
    pub fn bottom(choices: Vec<String>, screen: (u32, u32), font: FontMetrics) -> Self {
        Self::new(choices, DialogLayout::Bottom.frame(screen.0, screen.1), font)
    }

    pub fn with_style(mut self, style: DialogStyle) -> Self {
        self.style = style;
        self
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// The highlighted entry, or `""` when the list is empty.
    pub fn selected_item(&self) -> &str {
        self.choices
            .get(self.selected)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn first_visible(&self) -> usize {
        self.first_visible
    }

    fn visible_rows(&self) -> usize {
        self.area.rows().max(1)
    }

    pub fn last_visible(&self) -> usize {
        (self.first_visible + self.visible_rows())
            .min(self.choices.len())
            .saturating_sub(1)
    }

    pub fn has_more(&self) -> bool {
        self.first_visible + self.visible_rows() < self.choices.len()
    }

    pub fn has_less(&self) -> bool {
        self.first_visible > 0
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 >= self.choices.len() {
            return;
        }
        self.selected += 1;
        if self.selected > self.last_visible() {
            self.first_visible += 1;
        }
    }

    pub fn move_up(&mut self) {
        if self.selected == 0 {
            return;
        }
        self.selected -= 1;
        if self.selected < self.first_visible {
            self.first_visible = self.selected;
        }
    }
}

impl Prompt for ChoicePrompt {
    fn frame(&self) -> FrameRect {
        self.frame
    }

    fn style(&self) -> DialogStyle {
        self.style
    }

    fn handle(&mut self, edges: &ButtonEdges) -> PromptStep {
        if edges.pressed(Button::A) {
            return PromptStep::Done(DialogResult::Choice(self.selected));
        }
        let before = (self.selected, self.first_visible);
        if edges.pressed(Button::Down) {
            self.move_down();
        }
        if edges.pressed(Button::Up) {
            self.move_up();
        }
        if (self.selected, self.first_visible) == before {
            PromptStep::Idle
        } else {
            PromptStep::Redraw
        }
    }

    fn render(&self, host: &mut dyn Host, target: &mut RgbaImage) {
        let area = self.area;
        let row_height = area.row_height() as i32;
        let left = area.left as i32;
        let top = area.top as i32;
        let rows = self
            .choices
            .iter()
            .enumerate()
            .skip(self.first_visible)
            .take(self.visible_rows());
        for (slot, (index, choice)) in rows.enumerate() {
            let y = top + slot as i32 * row_height;
            let (back, text) = if index == self.selected {
                (self.style.select_back, self.style.select_text)
            } else {
                (self.style.background, self.style.text)
            };
            fill_rect(target, left - 1, y - 1, area.width, area.font.char_height + 1, back);
            host.print(target, choice, left, y, text, area.font);
        }
    }
}
