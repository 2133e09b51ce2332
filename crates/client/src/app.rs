//! Application state and event loop handler.

use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use nashira_core::fade::FadeTimeline;
use nashira_core::fireflies::FireflyField;
use nashira_core::loading::LoadTracker;
use nashira_core::playback::PlaybackToggle;
use nashira_core::SceneConfig;

use crate::assets::{self, AssetPayload, Loader};
use crate::audio::AudioEngine;
use crate::links;
use crate::renderer::{FrameParams, Renderer};

/// Seconds after startup at which the control hints are announced.
const CONTROLS_REVEAL: f32 = 2.0;

/// Main application state.
pub struct App {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    audio: AudioEngine,
    loader: Option<Loader>,
    tracker: LoadTracker,
    fade: FadeTimeline,
    playback: PlaybackToggle,
    started_at: Instant,
    loaded_at: Option<Instant>,
    last_frame: Option<Instant>,
    dragging: bool,
    cursor: Option<(f64, f64)>,
    controls_announced: bool,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: SceneConfig) -> Self {
        let audio = AudioEngine::new(config.audio.volume);
        Self {
            config,
            window: None,
            renderer: None,
            audio,
            loader: None,
            tracker: LoadTracker::new(),
            fade: FadeTimeline::default(),
            playback: PlaybackToggle::new(),
            started_at: Instant::now(),
            loaded_at: None,
            last_frame: None,
            dragging: false,
            cursor: None,
            controls_announced: false,
            error: None,
        }
    }

    /// The error that ended the event loop, if any.
    pub fn into_result(self) -> anyhow::Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title("Nashira")
            .with_inner_size(PhysicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let field = FireflyField::generate(
            self.config.fireflies.count,
            self.config.fireflies.seed,
        );
        let mut renderer =
            pollster::block_on(Renderer::new(window.clone(), &self.config, &field))?;
        renderer.set_pixel_ratio(window.scale_factor());

        // Kick off the background loaders; completions arrive per frame.
        self.loader = Some(assets::spawn(&self.config.assets));
        self.started_at = Instant::now();

        self.window = Some(window);
        self.renderer = Some(renderer);

        tracing::info!("Window and renderer initialized");
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    /// Drain loader completions and feed the load join.
    fn poll_assets(&mut self) -> anyhow::Result<()> {
        let Some(loader) = &self.loader else {
            return Ok(());
        };

        for event in loader.poll() {
            let payload = event.result?;
            match payload {
                AssetPayload::BakedTexture(image) => {
                    if let Some(renderer) = &mut self.renderer {
                        renderer.install_baked_texture(&image);
                    }
                }
                AssetPayload::Model(model) => {
                    if let Some(renderer) = &mut self.renderer {
                        renderer.install_model(&model)?;
                    }
                }
                AssetPayload::AudioTrack(track) => {
                    if let Err(e) = self.audio.set_track(track) {
                        // A missing output device mutes the scene but does
                        // not invalidate it.
                        tracing::warn!("audio unavailable: {e}");
                    }
                }
            }
            if self.tracker.complete(event.kind) {
                self.loaded_at = Some(Instant::now());
                tracing::info!("all assets loaded");
            }
        }
        Ok(())
    }

    fn overlay_alpha(&self) -> f32 {
        match self.loaded_at {
            Some(at) => self.fade.alpha_at(at.elapsed().as_secs_f32()),
            None => 1.0,
        }
    }

    fn update_title(&self) {
        if let Some(window) = &self.window {
            window.set_title(&format!("Nashira {}", self.playback.icon()));
        }
    }

    fn announce_controls(&mut self) {
        if self.controls_announced
            || self.started_at.elapsed().as_secs_f32() < CONTROLS_REVEAL
        {
            return;
        }
        self.controls_announced = true;
        self.update_title();
        tracing::info!("controls: drag to orbit, scroll to zoom, Space/M toggles audio, 1/2 open credits");
    }

    fn toggle_audio(&mut self) {
        let playing = self.playback.toggle();
        self.audio.set_playing(playing);
        self.update_title();
        tracing::debug!("audio {}", if playing { "playing" } else { "paused" });
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.poll_assets() {
            self.fail(event_loop, e);
            return;
        }
        self.announce_controls();

        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        let params = FrameParams {
            elapsed: self.started_at.elapsed().as_secs_f32(),
            dt,
            overlay_alpha: self.overlay_alpha(),
        };

        let Some(renderer) = &mut self.renderer else {
            return;
        };
        match renderer.render(&params) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(window) = &self.window {
                    renderer.resize(window.inner_size());
                }
            }
            Err(e) => {
                self.fail(event_loop, anyhow::anyhow!("render error: {e:?}"));
                return;
            }
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: PhysicalKey) {
        match key {
            PhysicalKey::Code(KeyCode::Space) | PhysicalKey::Code(KeyCode::KeyM) => {
                self.toggle_audio();
            }
            PhysicalKey::Code(KeyCode::Digit1) => {
                links::open(&self.config.credits.composer_url);
            }
            PhysicalKey::Code(KeyCode::Digit2) => {
                links::open(&self.config.credits.artist_url);
            }
            PhysicalKey::Code(KeyCode::Escape) => {
                event_loop.exit();
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init_window(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting");
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(new_size);
                }
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.set_pixel_ratio(scale_factor);
                }
            }

            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    self.handle_key(event_loop, event.physical_key);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.dragging = state == ElementState::Pressed;
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x, position.y);
                if self.dragging {
                    if let (Some((px, py)), Some(renderer)) =
                        (self.cursor, self.renderer.as_mut())
                    {
                        renderer
                            .camera_mut()
                            .orbit((x - px) as f32, (y - py) as f32);
                    }
                }
                self.cursor = Some((x, y));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                if let Some(renderer) = &mut self.renderer {
                    renderer.camera_mut().zoom(steps);
                }
            }

            _ => {}
        }
    }
}
