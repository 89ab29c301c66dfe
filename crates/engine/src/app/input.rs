#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Menu,
}

const BUTTON_COUNT: usize = 7;

impl Button {
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::A,
        Button::B,
        Button::Menu,
    ];

    const fn index(self) -> usize {
        match self {
            Button::Up => 0,
            Button::Down => 1,
            Button::Left => 2,
            Button::Right => 3,
            Button::A => 4,
            Button::B => 5,
            Button::Menu => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonStates {
    down: [bool; BUTTON_COUNT],
}

impl ButtonStates {
    pub fn set(&mut self, button: Button, is_down: bool) {
        self.down[button.index()] = is_down;
    }

    pub fn is_down(&self, button: Button) -> bool {
        self.down[button.index()]
    }

    pub fn with_down(mut self, button: Button) -> Self {
        self.set(button, true);
        self
    }
}

/// Press-edge detector over successive [`ButtonStates`].
///
/// Latches start out pressed so a button still held from before the detector
/// existed has to be released before it registers.
#[derive(Debug, Clone, Copy)]
pub struct ButtonEdges {
    latched: [bool; BUTTON_COUNT],
    pressed: [bool; BUTTON_COUNT],
}

impl Default for ButtonEdges {
    fn default() -> Self {
        Self {
            latched: [true; BUTTON_COUNT],
            pressed: [false; BUTTON_COUNT],
        }
    }
}

impl ButtonEdges {
    pub fn update(&mut self, states: &ButtonStates) {
        for button in Button::ALL {
            let idx = button.index();
            let down = states.is_down(button);
            self.pressed[idx] = down && !self.latched[idx];
            self.latched[idx] = down;
        }
    }

    /// True only on the frame the button went down.
    pub fn pressed(&self, button: Button) -> bool {
        self.pressed[button.index()]
    }
}
