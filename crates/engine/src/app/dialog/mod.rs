//! Modal prompts drawn as an overlay sprite.
//!
//! A [`ModalDialog`] is polled once per frame by the engine while it is open.
//! Object updates are held back and user events are disabled on the host
//! until the prompt completes.

mod choice;
mod layout;
mod paged;
mod render;
mod sequence;

use std::fmt;

use image::RgbaImage;
use tracing::debug;

use super::bitmap::{Color, Image};
use super::host::{Host, SpriteHandle};
use super::input::{Button, ButtonEdges, ButtonStates};
use super::named_values::SpriteKind;

pub use choice::{ChoicePrompt, ConfirmPrompt};
pub use layout::{DialogLayout, FrameRect, TextArea, FRAME_UNIT, MAX_FRAME_UNIT};
pub use paged::LongTextPrompt;
pub use render::{draw_rect, draw_text, draw_text_centered, fill_rect, split_lines};
pub use sequence::{DialogSequence, DialogStep, SequencePrompt};

/// Kind tag of overlay sprites. Never issued by the kind registry in practice.
pub const DIALOG_SPRITE_KIND: SpriteKind = SpriteKind(u32::MAX);
const OVERLAY_Z: i32 = i32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResult {
    Confirmed,
    Choice(usize),
    Closed,
}

/// Outcome of feeding one frame of input to a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStep {
    Idle,
    Redraw,
    Done(DialogResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogStyle {
    pub background: Color,
    pub border: Color,
    pub text: Color,
    pub select_back: Color,
    pub select_text: Color,
}

impl Default for DialogStyle {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            border: Color::BLACK,
            text: Color::BLACK,
            select_back: Color::PINK,
            select_text: Color::BLACK,
        }
    }
}

pub trait Prompt {
    fn frame(&self) -> FrameRect;
    fn style(&self) -> DialogStyle {
        DialogStyle::default()
    }
    fn handle(&mut self, edges: &ButtonEdges) -> PromptStep;
    /// Draws the prompt's content over the already-filled frame.
    fn render(&self, host: &mut dyn Host, target: &mut RgbaImage);
}

type CompletionHandler = Box<dyn FnOnce(&DialogResult)>;

pub struct ModalDialog {
    prompt: Box<dyn Prompt>,
    edges: ButtonEdges,
    sprite: Option<SpriteHandle>,
    on_complete: Option<CompletionHandler>,
}

impl ModalDialog {
    pub fn new(prompt: impl Prompt + 'static) -> Self {
        Self {
            prompt: Box::new(prompt),
            edges: ButtonEdges::default(),
            sprite: None,
            on_complete: None,
        }
    }

    pub fn on_complete(mut self, handler: impl FnOnce(&DialogResult) + 'static) -> Self {
        self.on_complete = Some(Box::new(handler));
        self
    }

    pub fn is_open(&self) -> bool {
        self.sprite.is_some()
    }

    pub fn sprite(&self) -> Option<SpriteHandle> {
        self.sprite
    }

    pub(crate) fn open(&mut self, host: &mut dyn Host) {
        if self.is_open() {
            return;
        }
        host.set_user_events_enabled(false);
        let frame = self.prompt.frame();
        let image = self.draw(host);
        let sprite = host.create_sprite(image, DIALOG_SPRITE_KIND);
        if let Some(state) = host.sprite_mut(sprite) {
            state.set_left(frame.left as f32);
            state.set_top(frame.top as f32);
            state.z = OVERLAY_Z;
        }
        self.sprite = Some(sprite);
        debug!(
            left = frame.left,
            top = frame.top,
            width = frame.width,
            height = frame.height,
            "dialog_opened"
        );
    }

    /// Feeds this frame's buttons to the prompt. Returns the result once the
    /// prompt completes, after the overlay has been torn down.
    pub(crate) fn poll(&mut self, host: &mut dyn Host) -> Option<DialogResult> {
        let mut states = ButtonStates::default();
        for button in Button::ALL {
            states.set(button, host.is_pressed(button));
        }
        self.edges.update(&states);

        match self.prompt.handle(&self.edges) {
            PromptStep::Idle => None,
            PromptStep::Redraw => {
                let image = self.draw(host);
                if let Some(sprite) = self.sprite {
                    if let Some(state) = host.sprite_mut(sprite) {
                        state.set_image(image);
                    }
                }
                None
            }
            PromptStep::Done(result) => {
                self.close(host);
                if let Some(handler) = self.on_complete.take() {
                    handler(&result);
                }
                Some(result)
            }
        }
    }

    fn close(&mut self, host: &mut dyn Host) {
        if let Some(sprite) = self.sprite.take() {
            host.destroy_sprite(sprite);
        }
        host.set_user_events_enabled(true);
    }

    fn draw(&self, host: &mut dyn Host) -> Image {
        let frame = self.prompt.frame();
        let style = self.prompt.style();
        let mut target = RgbaImage::from_pixel(frame.width, frame.height, style.background.rgba());
        draw_rect(&mut target, 0, 0, frame.width, frame.height, style.border);
        self.prompt.render(host, &mut target);
        Image::from_rgba(target)
    }
}

impl fmt::Debug for ModalDialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalDialog")
            .field("frame", &self.prompt.frame())
            .field("sprite", &self.sprite)
            .finish()
    }
}
