use std::fmt;
use std::rc::Rc;

use image::RgbaImage;

use crate::app::host::{FontMetrics, Host};
use crate::app::input::ButtonEdges;

use super::layout::FrameRect;
use super::paged::LongTextPrompt;
use super::{DialogResult, DialogStyle, Prompt, PromptStep};

type Condition = Rc<dyn Fn() -> bool>;
type Action = Rc<dyn Fn()>;

/// One line of a branching conversation.
#[derive(Clone, Default)]
pub struct DialogStep {
    pub speaker_id: u32,
    pub text: String,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
    pub responses: Vec<DialogStep>,
}

impl DialogStep {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn spoken_by(mut self, speaker_id: u32) -> Self {
        self.speaker_id = speaker_id;
        self
    }

    pub fn when(mut self, condition: impl Fn() -> bool + 'static) -> Self {
        self.conditions.push(Rc::new(condition));
        self
    }

    pub fn then(mut self, action: impl Fn() + 'static) -> Self {
        self.actions.push(Rc::new(action));
        self
    }

    pub fn respond(mut self, step: DialogStep) -> Self {
        self.responses.push(step);
        self
    }

    /// True when every condition holds. A step without conditions is always
    /// valid.
    pub fn is_valid(&self) -> bool {
        self.conditions.iter().all(|condition| condition())
    }

    pub fn do_actions(&self) {
        for action in &self.actions {
            action();
        }
    }
}

impl fmt::Debug for DialogStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogStep")
            .field("speaker_id", &self.speaker_id)
            .field("text", &self.text)
            .field("conditions", &self.conditions.len())
            .field("actions", &self.actions.len())
            .field("responses", &self.responses)
            .finish()
    }
}

/// Walks a tree of [`DialogStep`]s. The first pick comes from the top-level
/// steps, later picks from the responses of the step picked before.
#[derive(Debug, Clone, Default)]
pub struct DialogSequence {
    pub steps: Vec<DialogStep>,
    path: Vec<usize>,
}

impl DialogSequence {
    pub fn new(steps: Vec<DialogStep>) -> Self {
        Self {
            steps,
            path: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.path.clear();
    }

    pub fn current_step(&self) -> Option<&DialogStep> {
        let (first, rest) = self.path.split_first()?;
        let mut step = self.steps.get(*first)?;
        for index in rest {
            step = step.responses.get(*index)?;
        }
        Some(step)
    }

    fn candidates(&self) -> &[DialogStep] {
        if self.path.is_empty() {
            return &self.steps;
        }
        self.current_step()
            .map(|step| step.responses.as_slice())
            .unwrap_or(&[])
    }

    /// Moves to the first valid candidate. Returns false when none is left.
    pub fn next_step(&mut self) -> bool {
        let Some(index) = self.candidates().iter().position(DialogStep::is_valid) else {
            return false;
        };
        self.path.push(index);
        true
    }
}

/// Plays a [`DialogSequence`] as consecutive paged text boxes. A step's
/// actions run once its text has been dismissed.
#[derive(Debug)]
pub struct SequencePrompt {
    sequence: DialogSequence,
    current: Option<LongTextPrompt>,
    frame: FrameRect,
    font: FontMetrics,
    style: DialogStyle,
}

impl SequencePrompt {
    pub fn new(mut sequence: DialogSequence, frame: FrameRect, font: FontMetrics) -> Self {
        sequence.reset();
        let mut prompt = Self {
            sequence,
            current: None,
            frame,
            font,
            style: DialogStyle::default(),
        };
        prompt.advance();
        prompt
    }

    pub fn sequence(&self) -> &DialogSequence {
        &self.sequence
    }

    fn advance(&mut self) -> bool {
        if !self.sequence.next_step() {
            self.current = None;
            return false;
        }
        let text = self
            .sequence
            .current_step()
            .map(|step| step.text.as_str())
            .unwrap_or("");
        let prompt = LongTextPrompt::new(text, self.frame, self.font).with_style(self.style);
        self.current = Some(prompt);
        true
    }
}

impl Prompt for SequencePrompt {
    fn frame(&self) -> FrameRect {
        self.frame
    }

    fn style(&self) -> DialogStyle {
        self.style
    }

    fn handle(&mut self, edges: &ButtonEdges) -> PromptStep {
        let Some(current) = self.current.as_mut() else {
            return PromptStep::Done(DialogResult::Closed);
        };
        match current.handle(edges) {
            PromptStep::Done(_) => {
                if let Some(step) = self.sequence.current_step() {
                    step.do_actions();
                }
                if self.advance() {
                    PromptStep::Redraw
                } else {
                    PromptStep::Done(DialogResult::Closed)
                }
            }
            step => step,
        }
    }

    fn render(&self, host: &mut dyn Host, target: &mut RgbaImage) {
        if let Some(current) = &self.current {
            current.render(host, target);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::app::dialog::layout::DialogLayout;
    use crate::app::input::{Button, ButtonStates};

    fn press_a() -> ButtonEdges {
        let mut edges = ButtonEdges::default();
        edges.update(&ButtonStates::default());
        edges.update(&ButtonStates::default().with_down(Button::A));
        edges
    }

    #[test]
    fn first_valid_top_level_step_wins() {
        let mut sequence = DialogSequence::new(vec![
            DialogStep::new("locked").when(|| false),
            DialogStep::new("hello").respond(DialogStep::new("bye")),
        ]);

        assert!(sequence.next_step());
        assert_eq!(sequence.current_step().map(|s| s.text.as_str()), Some("hello"));
        assert!(sequence.next_step());
        assert_eq!(sequence.current_step().map(|s| s.text.as_str()), Some("bye"));
        assert!(!sequence.next_step());

        sequence.reset();
        assert!(sequence.current_step().is_none());
    }

    #[test]
    fn conditions_are_evaluated_at_pick_time() {
        let open = Rc::new(Cell::new(false));
        let gate = Rc::clone(&open);
        let mut sequence =
            DialogSequence::new(vec![DialogStep::new("gate").when(move || gate.get())]);

        assert!(!sequence.next_step());
        open.set(true);
        assert!(sequence.next_step());
    }

    #[test]
    fn prompt_runs_actions_after_each_step_and_closes_at_the_end() {
        let ran = Rc::new(Cell::new(0));
        let counter = Rc::clone(&ran);
        let sequence = DialogSequence::new(vec![DialogStep::new("hi")
            .then(move || counter.set(counter.get() + 1))
            .respond(DialogStep::new("again"))]);
        let mut prompt = SequencePrompt::new(
            sequence,
            DialogLayout::Bottom.frame(160, 120),
            FontMetrics::FONT8,
        );

        assert_eq!(prompt.handle(&press_a()), PromptStep::Redraw);
        assert_eq!(ran.get(), 1);
        assert_eq!(
            prompt.handle(&press_a()),
            PromptStep::Done(DialogResult::Closed)
        );
    }

    #[test]
    fn empty_sequence_closes_immediately() {
        let mut prompt = SequencePrompt::new(
            DialogSequence::default(),
            DialogLayout::Bottom.frame(160, 120),
            FontMetrics::FONT8,
        );
        assert_eq!(
            prompt.handle(&ButtonEdges::default()),
            PromptStep::Done(DialogResult::Closed)
        );
    }
}
