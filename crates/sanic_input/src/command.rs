//! Abstract commands

/// Logical buttons of player one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    P1Up,
    P1Down,
    P1Left,
    P1Right,
    P1Action1,
    P1Action2,
    P1Action3,
    P1Action4,
}

impl Button {
    /// The button on the same axis pointing the other way
    pub fn opposite(self) -> Option<Button> {
        match self {
            Button::P1Up => Some(Button::P1Down),
            Button::P1Down => Some(Button::P1Up),
            Button::P1Left => Some(Button::P1Right),
            Button::P1Right => Some(Button::P1Left),
            _ => None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Button::P1Left | Button::P1Right)
    }
}

/// Button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Down,
    Held,
    Up,
}

/// Device family that produced a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Keyboard,
    Joystick,
}

/// A translated input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub source: InputSource,
    pub button: Button,
    pub edge: Edge,
    /// Analog magnitude in 0..=1; digital buttons report 1.0 (0.0 on release)
    pub value: f32,
}

impl Command {
    pub fn new(source: InputSource, button: Button, edge: Edge) -> Self {
        let value = if edge == Edge::Up { 0.0 } else { 1.0 };
        Self { source, button, edge, value }
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.value = value;
        self
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self.edge, Edge::Down | Edge::Held)
    }
}
