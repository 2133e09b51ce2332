//! Nashira Core
//!
//! Platform-free logic for the portal diorama: configuration, the firefly
//! field, the asset-load join, the overlay fade timeline, and the ambient
//! track toggle. Nothing in this crate touches the GPU, the window, or the
//! audio device, so all of it is unit-testable.

pub mod color;
pub mod config;
pub mod fade;
pub mod fireflies;
pub mod loading;
pub mod playback;
pub mod random;

pub use config::SceneConfig;
