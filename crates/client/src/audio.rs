//! Ambient audio output.
//!
//! A cpal output stream shares [`AudioState`] with the main thread behind a
//! mutex. The decoded track is interleaved stereo f32; the cursor wraps at
//! the end so the track loops. Paused playback (or no track yet) renders
//! silence. The stream handle is kept alive by the engine.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use crate::assets::DecodedTrack;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("failed to build output stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start output stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

/// State shared between the main thread and the audio callback.
struct AudioState {
    /// Interleaved stereo samples.
    track: Vec<f32>,
    /// Next sample index to play.
    cursor: usize,
    playing: bool,
    volume: f32,
}

/// Fill `out` from the shared state, wrapping at the track end.
fn mix(state: &mut AudioState, out: &mut [f32]) {
    if !state.playing || state.track.is_empty() {
        out.fill(0.0);
        return;
    }
    for sample in out.iter_mut() {
        *sample = state.track[state.cursor] * state.volume;
        state.cursor = (state.cursor + 1) % state.track.len();
    }
}

/// Owns the output stream and the shared playback state.
pub struct AudioEngine {
    state: Arc<Mutex<AudioState>>,
    _stream: Option<Stream>,
}

impl AudioEngine {
    /// Engine with no track yet; the stream is opened when one arrives.
    pub fn new(volume: f32) -> Self {
        Self {
            state: Arc::new(Mutex::new(AudioState {
                track: Vec::new(),
                cursor: 0,
                playing: false,
                volume,
            })),
            _stream: None,
        }
    }

    /// Install the decoded track and open the output stream at its rate.
    pub fn set_track(&mut self, track: DecodedTrack) -> Result<(), AudioError> {
        let sample_rate = track.sample_rate;
        {
            let mut state = self.state.lock().unwrap();
            state.track = track.samples;
            state.cursor = 0;
        }
        if self._stream.is_none() {
            self._stream = Some(build_stream(Arc::clone(&self.state), sample_rate)?);
        }
        Ok(())
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.state.lock().unwrap().playing = playing;
    }
}

fn build_stream(state: Arc<Mutex<AudioState>>, sample_rate: u32) -> Result<Stream, AudioError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

    let config = StreamConfig {
        channels: 2,
        sample_rate: SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let mut state = state.lock().unwrap();
            mix(&mut state, data);
        },
        |err| tracing::error!("audio stream error: {err}"),
        None,
    )?;
    stream.play()?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(track: Vec<f32>, playing: bool, volume: f32) -> AudioState {
        AudioState {
            track,
            cursor: 0,
            playing,
            volume,
        }
    }

    #[test]
    fn paused_renders_silence() {
        let mut state = state_with(vec![1.0; 8], false, 1.0);
        let mut out = [0.5f32; 4];
        mix(&mut state, &mut out);
        assert_eq!(out, [0.0; 4]);
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn empty_track_renders_silence() {
        let mut state = state_with(Vec::new(), true, 1.0);
        let mut out = [0.5f32; 4];
        mix(&mut state, &mut out);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn cursor_wraps_for_looping() {
        let mut state = state_with(vec![0.1, 0.2, 0.3, 0.4], true, 1.0);
        let mut out = [0.0f32; 6];
        mix(&mut state, &mut out);
        assert_eq!(out, [0.1, 0.2, 0.3, 0.4, 0.1, 0.2]);
        assert_eq!(state.cursor, 2);
    }

    #[test]
    fn volume_scales_samples() {
        let mut state = state_with(vec![1.0, -1.0], true, 0.1);
        let mut out = [0.0f32; 2];
        mix(&mut state, &mut out);
        assert!((out[0] - 0.1).abs() < 1e-6);
        assert!((out[1] + 0.1).abs() < 1e-6);
    }
}
