//! Joystick translation
//!
//! Axis 0 is horizontal, axis 1 vertical (negative = up). Values inside the
//! deadzone count as centred; outside it the reported magnitude is
//! `min(|value| + deadzone, 1)`.

use std::collections::HashMap;

use crate::command::{Button, Command, Edge, InputSource};
use crate::CommandSource;

pub const DEFAULT_DEADZONE: f32 = 0.15;

/// Translates joystick axis and button events into commands
pub struct JoystickTranslator {
    pub deadzone: f32,
    buttons: HashMap<u32, Button>,
    /// Direction currently pushed on each axis, with its magnitude
    axes: [Option<(Button, f32)>; 2],
    held_buttons: Vec<Button>,
}

impl Default for JoystickTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl JoystickTranslator {
    pub fn new() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            buttons: HashMap::from([(13, Button::P1Action1), (14, Button::P1Action2)]),
            axes: [None, None],
            held_buttons: Vec::new(),
        }
    }

    pub fn with_deadzone(mut self, deadzone: f32) -> Self {
        self.deadzone = deadzone;
        self
    }

    pub fn with_button(mut self, index: u32, button: Button) -> Self {
        self.buttons.insert(index, button);
        self
    }

    /// Translate axis motion
    ///
    /// Flipping the stick from one side to the other releases the old
    /// direction before pressing the new one, so this may return two commands.
    pub fn process_axis(&mut self, axis: usize, value: f32) -> Vec<Command> {
        let (negative, positive) = match axis {
            0 => (Button::P1Left, Button::P1Right),
            1 => (Button::P1Up, Button::P1Down),
            _ => return Vec::new(),
        };

        let pushed = if value.abs() > self.deadzone {
            let magnitude = (value.abs() + self.deadzone).min(1.0);
            Some((if value < 0.0 { negative } else { positive }, magnitude))
        } else {
            None
        };

        let mut commands = Vec::new();
        let previous = self.axes[axis];
        match (previous, pushed) {
            (Some((old, _)), Some((new, magnitude))) if old == new => {
                commands.push(Command::new(InputSource::Joystick, new, Edge::Held).with_value(magnitude));
            }
            (previous, pushed) => {
                if let Some((old, _)) = previous {
                    commands.push(Command::new(InputSource::Joystick, old, Edge::Up));
                }
                if let Some((new, magnitude)) = pushed {
                    commands.push(Command::new(InputSource::Joystick, new, Edge::Down).with_value(magnitude));
                }
            }
        }
        self.axes[axis] = pushed;
        commands
    }

    /// Translate a button event; unmapped buttons give None
    pub fn process_button(&mut self, index: u32, pressed: bool) -> Option<Command> {
        let button = self.buttons.get(&index).copied()?;
        if pressed {
            let edge = if self.held_buttons.contains(&button) {
                Edge::Held
            } else {
                self.held_buttons.push(button);
                Edge::Down
            };
            Some(Command::new(InputSource::Joystick, button, edge))
        } else {
            self.held_buttons.retain(|b| *b != button);
            Some(Command::new(InputSource::Joystick, button, Edge::Up))
        }
    }
}

impl CommandSource for JoystickTranslator {
    fn held_commands(&self) -> Vec<Command> {
        let axes = self
            .axes
            .iter()
            .flatten()
            .map(|(b, v)| Command::new(InputSource::Joystick, *b, Edge::Held).with_value(*v));
        let buttons = self
            .held_buttons
            .iter()
            .map(|b| Command::new(InputSource::Joystick, *b, Edge::Held));
        axes.chain(buttons).collect()
    }

    fn reset(&mut self) {
        self.axes = [None, None];
        self.held_buttons.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_deadzone_is_centred() {
        let mut js = JoystickTranslator::new();
        assert!(js.process_axis(0, 0.1).is_empty());
        assert!(js.held_commands().is_empty());
    }

    #[test]
    fn test_axis_push_and_release() {
        let mut js = JoystickTranslator::new();
        let down = js.process_axis(0, -0.5);
        assert_eq!(down.len(), 1);
        assert_eq!(down[0].button, Button::P1Left);
        assert_eq!(down[0].edge, Edge::Down);
        assert!((down[0].value - 0.65).abs() < EPSILON);

        let held = js.process_axis(0, -0.6);
        assert_eq!(held[0].edge, Edge::Held);

        let up = js.process_axis(0, 0.0);
        assert_eq!(up, vec![Command::new(InputSource::Joystick, Button::P1Left, Edge::Up)]);
    }

    #[test]
    fn test_magnitude_is_capped() {
        let mut js = JoystickTranslator::new();
        let down = js.process_axis(1, 0.95);
        assert_eq!(down[0].button, Button::P1Down);
        assert_eq!(down[0].value, 1.0);
    }

    #[test]
    fn test_flip_releases_old_direction_first() {
        let mut js = JoystickTranslator::new();
        js.process_axis(0, 0.8);
        let flip = js.process_axis(0, -0.8);
        assert_eq!(flip.len(), 2);
        assert_eq!((flip[0].button, flip[0].edge), (Button::P1Right, Edge::Up));
        assert_eq!((flip[1].button, flip[1].edge), (Button::P1Left, Edge::Down));
    }

    #[test]
    fn test_buttons() {
        let mut js = JoystickTranslator::new();
        assert_eq!(js.process_button(0, true), None);
        let down = js.process_button(13, true).expect("mapped");
        assert_eq!((down.button, down.edge), (Button::P1Action1, Edge::Down));
        assert_eq!(js.held_commands().len(), 1);
        let up = js.process_button(13, false).expect("mapped");
        assert_eq!(up.edge, Edge::Up);
        assert!(js.held_commands().is_empty());
    }

    #[test]
    fn test_unknown_axis() {
        let mut js = JoystickTranslator::new();
        assert!(js.process_axis(5, 1.0).is_empty());
    }
}
