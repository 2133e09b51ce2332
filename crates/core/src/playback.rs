//! Ambient track playback state.

/// Play/pause flip for the ambient track. Starts paused.
#[derive(Debug, Default)]
pub struct PlaybackToggle {
    playing: bool,
}

impl PlaybackToggle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the playback state and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Icon for the current state, shown in the window title.
    pub fn icon(&self) -> &'static str {
        if self.playing {
            "\u{1F50A}" // 🔊
        } else {
            "\u{1F508}" // 🔈
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_paused() {
        let toggle = PlaybackToggle::new();
        assert!(!toggle.is_playing());
        assert_eq!(toggle.icon(), "\u{1F508}");
    }

    #[test]
    fn alternates_on_each_toggle() {
        let mut toggle = PlaybackToggle::new();
        assert!(toggle.toggle());
        assert!(toggle.is_playing());
        assert_eq!(toggle.icon(), "\u{1F50A}");
        assert!(!toggle.toggle());
        assert!(!toggle.is_playing());
        assert_eq!(toggle.icon(), "\u{1F508}");
        assert!(toggle.toggle());
        assert!(toggle.is_playing());
    }
}
