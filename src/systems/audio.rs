//! Sound cue sink
//!
//! Cues are trigger-and-forget. There is no mixer; each cue is resolved
//! against the registry's sound table and logged.

use std::sync::Arc;

use sanic_core::{ResourceRegistry, SoundCue};

pub struct AudioSystem {
    registry: Arc<ResourceRegistry>,
    played: u64,
}

impl AudioSystem {
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry, played: 0 }
    }

    /// Play one cue; false if the registry has no sound for it
    pub fn play(&mut self, cue: &SoundCue) -> bool {
        match self.registry.sound(cue.name) {
            Some(path) => {
                if cue.restart {
                    log::debug!("Restarting sound '{}'", cue.name);
                }
                log::info!("Sound '{}' ({})", cue.name, path.display());
                self.played += 1;
                true
            }
            None => {
                log::warn!("Unknown sound cue '{}'", cue.name);
                false
            }
        }
    }

    pub fn play_all(&mut self, cues: &[SoundCue]) {
        for cue in cues {
            self.play(cue);
        }
    }

    /// Cues that resolved to a sound so far
    pub fn played(&self) -> u64 {
        self.played
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_cues() {
        let registry = ResourceRegistry::from_ron("{}", r#"{ "hurt": "hurt.ogg" }"#).expect("registry");
        let mut audio = AudioSystem::new(Arc::new(registry));

        assert!(audio.play(&SoundCue::restarting("hurt")));
        assert!(!audio.play(&SoundCue::new("missing")));
        audio.play_all(&[SoundCue::new("hurt"), SoundCue::new("nope")]);
        assert_eq!(audio.played(), 2);
    }
}
