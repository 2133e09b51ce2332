//! Background asset loading.
//!
//! Each asset decodes on its own thread and reports exactly once over a
//! shared channel; the app drains the channel every frame and feeds the
//! load join. Assets are never re-requested, so there is no cancellation
//! or retry.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use nashira_core::config::AssetPaths;
use nashira_core::loading::AssetKind;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to decode texture {path}: {source}")]
    Texture {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to import model {path}: {source}")]
    Model {
        path: PathBuf,
        source: gltf::Error,
    },
    #[error("failed to decode track {path}: {source}")]
    Track {
        path: PathBuf,
        source: hound::Error,
    },
}

/// Raw glTF import output, handed to the renderer for scene assembly.
pub struct ModelData {
    pub document: gltf::Document,
    pub buffers: Vec<gltf::buffer::Data>,
}

/// Decoded ambient track: interleaved stereo f32 at the source rate.
pub struct DecodedTrack {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// One loader's completion message.
pub enum AssetPayload {
    BakedTexture(image::RgbaImage),
    Model(ModelData),
    AudioTrack(DecodedTrack),
}

pub struct AssetEvent {
    pub kind: AssetKind,
    pub result: Result<AssetPayload, AssetError>,
}

/// Handle to the in-flight loaders.
pub struct Loader {
    rx: Receiver<AssetEvent>,
}

impl Loader {
    /// Drain every completion that has arrived since the last call.
    pub fn poll(&self) -> Vec<AssetEvent> {
        self.rx.try_iter().collect()
    }
}

/// Spawn the three loader threads.
pub fn spawn(paths: &AssetPaths) -> Loader {
    let (tx, rx) = mpsc::channel();

    spawn_loader(tx.clone(), AssetKind::BakedTexture, paths.baked_texture_path(), |path| {
        image::open(&path)
            .map(|img| AssetPayload::BakedTexture(img.to_rgba8()))
            .map_err(|source| AssetError::Texture { path, source })
    });

    spawn_loader(tx.clone(), AssetKind::Model, paths.model_path(), |path| {
        gltf::import(&path)
            .map(|(document, buffers, _images)| {
                AssetPayload::Model(ModelData { document, buffers })
            })
            .map_err(|source| AssetError::Model { path, source })
    });

    spawn_loader(tx, AssetKind::AudioTrack, paths.track_path(), |path| {
        decode_wav(&path)
            .map(AssetPayload::AudioTrack)
            .map_err(|source| AssetError::Track { path, source })
    });

    Loader { rx }
}

fn spawn_loader<F>(tx: Sender<AssetEvent>, kind: AssetKind, path: PathBuf, decode: F)
where
    F: FnOnce(PathBuf) -> Result<AssetPayload, AssetError> + Send + 'static,
{
    thread::spawn(move || {
        tracing::debug!("loading {kind:?} from {}", path.display());
        let result = decode(path);
        // The receiver going away just means the app shut down mid-load.
        let _ = tx.send(AssetEvent { kind, result });
    });
}

/// Decode a WAV file into interleaved stereo f32.
fn decode_wav(path: &Path) -> Result<DecodedTrack, hound::Error> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<_, _>>()?
        }
    };

    // The mixer only deals with one layout: interleaved stereo.
    let samples = match spec.channels {
        1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        2 => samples,
        n => samples
            .chunks_exact(n as usize)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    };

    Ok(DecodedTrack {
        samples,
        sample_rate: spec.sample_rate,
    })
}
