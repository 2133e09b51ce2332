//! Nashira Client
//!
//! Windowed viewer for the portal diorama: winit event loop, wgpu renderer,
//! background asset loading, and cpal audio output.

pub mod app;
pub mod assets;
pub mod audio;
pub mod links;
pub mod renderer;

use std::path::Path;

use anyhow::Context as _;
use nashira_core::SceneConfig;

/// Default config file, looked up in the working directory.
const CONFIG_FILE: &str = "nashira.ron";

/// Run the viewer.
pub fn run() -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};
    use winit::event_loop::EventLoop;

    use app::App;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("nashira_client=debug".parse()?)
                .add_directive("nashira_core=debug".parse()?),
        )
        .init();

    let config = SceneConfig::load_if_present(Path::new(CONFIG_FILE))
        .with_context(|| format!("loading {CONFIG_FILE}"))?;

    tracing::info!("Starting Nashira");

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);

    event_loop.run_app(&mut app)?;

    app.into_result()
}
