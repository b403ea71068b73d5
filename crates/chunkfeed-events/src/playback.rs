#![forbid(unsafe_code)]

use std::time::Duration;

/// Events emitted by player controls.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    PlayStateChanged { playing: bool },
    /// Volume after clamping.
    VolumeChanged { volume: f64 },
    FullscreenChanged { fullscreen: bool },
    /// Playback position after a skip.
    Seeked { position: Duration },
}
