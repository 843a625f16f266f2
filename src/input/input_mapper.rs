//! Input mapping from raw events to application actions
//!
//! Maps keyboard input to high-level actions like Exit and ToggleFullscreen.
//! Player keys (arrows, Q/W/E/R) are NOT mapped here - they go to the
//! keyboard translator and on to the hero.

use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// Actions triggered by application keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Exit application (Escape)
    Exit,
    /// Toggle fullscreen mode (F key)
    ToggleFullscreen,
}

/// Maps raw keyboard events to application actions
pub struct InputMapper;

impl InputMapper {
    /// Map keyboard input to an action
    ///
    /// Returns `Some(action)` for application keys, `None` for everything else
    pub fn map_keyboard(key: KeyCode, state: ElementState) -> Option<InputAction> {
        // Only handle key presses, not releases
        if state != ElementState::Pressed {
            return None;
        }

        match key {
            KeyCode::Escape => Some(InputAction::Exit),
            KeyCode::KeyF => Some(InputAction::ToggleFullscreen),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_exits() {
        let action = InputMapper::map_keyboard(KeyCode::Escape, ElementState::Pressed);
        assert_eq!(action, Some(InputAction::Exit));
    }

    #[test]
    fn test_player_keys_not_mapped() {
        for key in [KeyCode::ArrowLeft, KeyCode::ArrowUp, KeyCode::KeyQ, KeyCode::KeyW] {
            let action = InputMapper::map_keyboard(key, ElementState::Pressed);
            assert_eq!(action, None, "Key {:?} should not be mapped", key);
        }
    }

    #[test]
    fn test_key_release_ignored() {
        assert_eq!(InputMapper::map_keyboard(KeyCode::Escape, ElementState::Released), None);
    }

    #[test]
    fn test_fullscreen_key() {
        assert_eq!(
            InputMapper::map_keyboard(KeyCode::KeyF, ElementState::Pressed),
            Some(InputAction::ToggleFullscreen)
        );
    }
}
