//! Player input translation
//!
//! Device events (keyboard keys, joystick axes and buttons) are turned into
//! abstract `(source, button, edge)` [`Command`]s so game code never sees a
//! key code. Translators also keep track of held buttons and resolve opposing
//! directions so releasing one of two opposite keys keeps the actor moving.

mod command;
mod joystick;
mod keyboard;

pub use command::{Button, Command, Edge, InputSource};
pub use joystick::{JoystickTranslator, DEFAULT_DEADZONE};
pub use keyboard::KeyboardTranslator;

/// A source of held-button repeats, polled once per frame
pub trait CommandSource {
    /// One `Edge::Held` command for every button currently held
    fn held_commands(&self) -> Vec<Command>;

    /// Forget every held button (focus loss, respawn)
    fn reset(&mut self);
}
