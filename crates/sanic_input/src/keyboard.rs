//! Keyboard translation
//!
//! Default bindings:
//! - Arrow keys: directions
//! - Q/W/E/R: action buttons 1-4

use std::collections::HashMap;

use winit::event::ElementState;
use winit::keyboard::KeyCode;

use crate::command::{Button, Command, Edge, InputSource};
use crate::CommandSource;

/// Translates keyboard events into commands
pub struct KeyboardTranslator {
    keymap: HashMap<KeyCode, Button>,
    /// Held buttons in press order
    held: Vec<Button>,
}

impl Default for KeyboardTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardTranslator {
    pub fn new() -> Self {
        let keymap = HashMap::from([
            (KeyCode::ArrowUp, Button::P1Up),
            (KeyCode::ArrowDown, Button::P1Down),
            (KeyCode::ArrowLeft, Button::P1Left),
            (KeyCode::ArrowRight, Button::P1Right),
            (KeyCode::KeyQ, Button::P1Action1),
            (KeyCode::KeyW, Button::P1Action2),
            (KeyCode::KeyE, Button::P1Action3),
            (KeyCode::KeyR, Button::P1Action4),
        ]);
        Self {
            keymap,
            held: Vec::new(),
        }
    }

    /// Bind a key, replacing whatever it was bound to
    pub fn with_binding(mut self, key: KeyCode, button: Button) -> Self {
        self.keymap.insert(key, button);
        self
    }

    /// Look up the button bound to a key
    pub fn button_for(&self, key: KeyCode) -> Option<Button> {
        self.keymap.get(&key).copied()
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.held.contains(&button)
    }

    /// Translate a key event
    ///
    /// Returns None for unbound keys. A press of an already held button (key
    /// repeat) is reported as `Held`. Releasing a direction while its opposite
    /// is still held reports the opposite as freshly pressed instead.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> Option<Command> {
        let button = self.button_for(key)?;

        match state {
            ElementState::Pressed => {
                if self.held.contains(&button) {
                    Some(Command::new(InputSource::Keyboard, button, Edge::Held))
                } else {
                    self.held.push(button);
                    Some(Command::new(InputSource::Keyboard, button, Edge::Down))
                }
            }
            ElementState::Released => {
                self.held.retain(|b| *b != button);
                if let Some(opposite) = button.opposite() {
                    if self.held.contains(&opposite) {
                        log::trace!("{:?} released while {:?} held", button, opposite);
                        return Some(Command::new(InputSource::Keyboard, opposite, Edge::Down));
                    }
                }
                Some(Command::new(InputSource::Keyboard, button, Edge::Up))
            }
        }
    }
}

impl CommandSource for KeyboardTranslator {
    fn held_commands(&self) -> Vec<Command> {
        self.held
            .iter()
            .map(|b| Command::new(InputSource::Keyboard, *b, Edge::Held))
            .collect()
    }

    fn reset(&mut self) {
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(t: &mut KeyboardTranslator, key: KeyCode) -> Option<Command> {
        t.process_keyboard(key, ElementState::Pressed)
    }

    fn release(t: &mut KeyboardTranslator, key: KeyCode) -> Option<Command> {
        t.process_keyboard(key, ElementState::Released)
    }

    #[test]
    fn test_unbound_key_is_ignored() {
        let mut t = KeyboardTranslator::new();
        assert_eq!(press(&mut t, KeyCode::KeyZ), None);
        assert!(t.held_commands().is_empty());
    }

    #[test]
    fn test_down_then_repeat_is_held() {
        let mut t = KeyboardTranslator::new();
        let first = press(&mut t, KeyCode::ArrowLeft).expect("bound");
        assert_eq!(first.edge, Edge::Down);
        assert_eq!(first.button, Button::P1Left);

        let repeat = press(&mut t, KeyCode::ArrowLeft).expect("bound");
        assert_eq!(repeat.edge, Edge::Held);
    }

    #[test]
    fn test_release_reports_up() {
        let mut t = KeyboardTranslator::new();
        press(&mut t, KeyCode::KeyQ);
        let up = release(&mut t, KeyCode::KeyQ).expect("bound");
        assert_eq!(up, Command::new(InputSource::Keyboard, Button::P1Action1, Edge::Up));
        assert!(!t.is_held(Button::P1Action1));
    }

    #[test]
    fn test_left_release_with_right_held_synthesizes_right_down() {
        let mut t = KeyboardTranslator::new();
        press(&mut t, KeyCode::ArrowRight);
        press(&mut t, KeyCode::ArrowLeft);

        let cmd = release(&mut t, KeyCode::ArrowLeft).expect("bound");
        assert_eq!(cmd.button, Button::P1Right);
        assert_eq!(cmd.edge, Edge::Down);
    }

    #[test]
    fn test_vertical_axis_synthesis() {
        let mut t = KeyboardTranslator::new();
        press(&mut t, KeyCode::ArrowUp);
        press(&mut t, KeyCode::ArrowDown);

        let cmd = release(&mut t, KeyCode::ArrowDown).expect("bound");
        assert_eq!(cmd.button, Button::P1Up);
        assert_eq!(cmd.edge, Edge::Down);
    }

    #[test]
    fn test_held_commands_in_press_order() {
        let mut t = KeyboardTranslator::new();
        press(&mut t, KeyCode::ArrowRight);
        press(&mut t, KeyCode::KeyQ);

        let held: Vec<Button> = t.held_commands().iter().map(|c| c.button).collect();
        assert_eq!(held, vec![Button::P1Right, Button::P1Action1]);
        assert!(t.held_commands().iter().all(|c| c.edge == Edge::Held));

        t.reset();
        assert!(t.held_commands().is_empty());
    }

    #[test]
    fn test_custom_binding() {
        let mut t = KeyboardTranslator::new().with_binding(KeyCode::Space, Button::P1Action1);
        let cmd = press(&mut t, KeyCode::Space).expect("bound");
        assert_eq!(cmd.button, Button::P1Action1);
    }
}
