//! The shipped level and resources load and run

use std::path::Path;
use std::sync::Arc;

use sanic_core::{Level, LevelData, ResourceRegistry};
use sanicforever::config::AppConfig;
use sanicforever::systems::{hud_area, level_area, score_draw_list, AudioSystem, SimulationSystem};

fn load_shipped() -> (Level, Arc<ResourceRegistry>) {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = AppConfig::default();
    let registry = Arc::new(ResourceRegistry::load(root.join(&config.paths.resources)).unwrap());
    let data = LevelData::load(root.join(&config.paths.level)).unwrap();
    let level = Level::load(&data, Arc::clone(&registry), config.level_settings()).unwrap();
    (level, registry)
}

#[test]
fn test_registry_has_actor_sheets_and_cues() {
    let (_, registry) = load_shipped();
    registry.require_sheets(&["sanic", "leg", "zombie"]).unwrap();
    for cue in ["sanic-spawn", "hurt", "die"] {
        assert!(registry.sound(cue).is_some(), "no sound for '{}'", cue);
    }
}

#[test]
fn test_level_spawns_hero_and_zombies() {
    let (level, _) = load_shipped();
    assert!(level.hero().is_some());
    assert_eq!(level.actors().iter().filter(|(_, a)| a.is_zombie()).count(), 2);
    assert!(level.shape("moving_lift").is_some());
    assert!(level.shape("pit").is_some());
}

#[test]
fn test_frames_run_and_score() {
    let (mut level, registry) = load_shipped();
    let config = AppConfig::default();
    let mut simulation = SimulationSystem::new(&config.world);
    let mut audio = AudioSystem::new(registry);
    level.resize(level_area(config.window.width, config.window.height, &config.display));

    let mut played = 0;
    for _ in 0..60 {
        let result = simulation.advance(&mut level, &[], 1.0 / 60.0);
        audio.play_all(&result.cues);
        played += result.cues.len();
        assert!(!result.hero_respawned);
    }

    assert_eq!(simulation.score(), 60);
    // the spawn cue from loading
    assert_eq!(played, 1);
    assert_eq!(audio.played(), 1);
    assert!(level.hero().is_some());
    assert!(!level.draw()[0].quads.is_empty());

    // "60" in the HUD: six and six lit segments
    let hud = hud_area(config.window.width, config.window.height, &config.display);
    assert_eq!(score_draw_list(simulation.score(), hud).quads.len(), 12);
}
