//! Sanic Forever - a 2D physics platformer
//!
//! Loads the configured level and runs it in a window until Escape or close.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::WindowId,
};

use sanic_core::{Level, LevelData, ResourceRegistry};
use sanic_input::{CommandSource, KeyboardTranslator};
use sanicforever::config::AppConfig;
use sanicforever::error::AppError;
use sanicforever::input::{InputAction, InputMapper};
use sanicforever::systems::{
    frame_interval, route_key, score_draw_list, AudioSystem, RenderSystem, SimulationSystem, WindowSystem,
};

/// Logs shutdown however `main` is left
struct TeardownGuard;

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        log::info!("Sanic Forever shut down");
    }
}

/// Main application state
struct App {
    config: AppConfig,
    level: Level,
    window: Option<WindowSystem>,
    render: Option<RenderSystem>,
    simulation: SimulationSystem,
    audio: AudioSystem,
    keyboard: KeyboardTranslator,
    frame_interval: Duration,
    next_frame: Instant,
    /// First fatal error; reported once the event loop returns
    error: Option<AppError>,
}

impl App {
    fn new(config: AppConfig) -> Result<Self, AppError> {
        let registry = Arc::new(ResourceRegistry::load(&config.paths.resources)?);
        let data = LevelData::load(&config.paths.level)?;
        let level = Level::load(&data, Arc::clone(&registry), config.level_settings())?;
        log::info!("Loaded level '{}' with {} actors", level.name(), level.actors().len());

        Ok(Self {
            simulation: SimulationSystem::new(&config.world),
            audio: AudioSystem::new(registry),
            keyboard: KeyboardTranslator::new(),
            frame_interval: frame_interval(config.window.target_fps),
            next_frame: Instant::now(),
            level,
            window: None,
            render: None,
            error: None,
            config,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }

    /// One frame: input, simulation, sound, title, draw
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let held = self.keyboard.held_commands();
        let result = self.simulation.update(&mut self.level, &held);
        if result.hero_respawned {
            // the new hero starts with no buttons down
            self.keyboard.reset();
        }
        self.audio.play_all(&result.cues);

        if let Some(window) = &self.window {
            window.update_title(self.simulation.score());
        }

        let mut lists = self.level.draw();
        let rendered = match &mut self.render {
            Some(render) => {
                lists.push(score_draw_list(self.simulation.score(), render.hud_area()));
                render.render_frame(&lists)
            }
            None => Ok(()),
        };
        if let Err(e) = rendered {
            self.fail(event_loop, e.into());
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match WindowSystem::create(event_loop, &self.config.window) {
            Ok(window) => window,
            Err(e) => return self.fail(event_loop, e.into()),
        };
        let render = match RenderSystem::new(
            Arc::clone(window.window()),
            self.config.display.clone(),
            self.config.window.vsync,
        ) {
            Ok(render) => render,
            Err(e) => return self.fail(event_loop, e.into()),
        };

        self.level.resize(render.level_area());
        self.simulation.reset_clock();
        window.request_redraw();

        self.window = Some(window);
        self.render = Some(render);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(render) = &mut self.render {
                    render.resize(size.width, size.height);
                    self.level.resize(render.level_area());
                }
            }

            WindowEvent::Focused(false) => {
                self.keyboard.reset();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                match InputMapper::map_keyboard(key, event.state) {
                    Some(InputAction::Exit) => {
                        event_loop.exit();
                        return;
                    }
                    Some(InputAction::ToggleFullscreen) => {
                        if let Some(window) = &self.window {
                            window.toggle_fullscreen();
                        }
                        return;
                    }
                    None => {}
                }
                route_key(&mut self.keyboard, &mut self.level, key, event.state);
            }

            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame {
            self.next_frame = now + self.frame_interval;
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}

fn run(config: AppConfig) -> Result<(), AppError> {
    let mut app = App::new(config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    let loaded = AppConfig::load();
    let log_level = loaded
        .as_ref()
        .map(|config| config.debug.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    let _teardown = TeardownGuard;
    log::info!("Starting Sanic Forever");

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
