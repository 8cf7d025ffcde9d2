//! Buttons sampled once per tick.

/// Logical buttons the simulation understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    Up,
    Down,
    Left,
    Right,
    Push,
    Menu,
    Reset,
    Cancel,
}

impl Input {
    pub const ALL: [Input; 8] = [
        Input::Up,
        Input::Down,
        Input::Left,
        Input::Right,
        Input::Push,
        Input::Menu,
        Input::Reset,
        Input::Cancel,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Reports whether a button is held right now.
pub trait InputSource {
    fn pressed(&self, input: Input) -> bool;
}

impl<F> InputSource for F
where
    F: Fn(Input) -> bool,
{
    fn pressed(&self, input: Input) -> bool {
        self(input)
    }
}

/// Turns held buttons into one-shot presses.
///
/// `rising` is true only on the first tick a button is seen held.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EdgeLatch {
    held: u8,
}

impl EdgeLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rising(&mut self, input: Input, pressed: bool) -> bool {
        let was = self.held & input.bit() != 0;
        if pressed {
            self.held |= input.bit();
        } else {
            self.held &= !input.bit();
        }
        pressed && !was
    }

    /// Samples `input` from `source` and reports a rising edge.
    pub fn poll(&mut self, source: &dyn InputSource, input: Input) -> bool {
        self.rising(input, source.pressed(input))
    }

    /// Records which buttons are held right now without reporting edges.
    ///
    /// A copy handed to a fresh level keeps a held button from firing there
    /// until it is released.
    pub fn track(&mut self, source: &dyn InputSource) {
        for input in Input::ALL {
            self.rising(input, source.pressed(input));
        }
    }
}
