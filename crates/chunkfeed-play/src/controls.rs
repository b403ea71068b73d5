#![forbid(unsafe_code)]

use std::time::Duration;

use chunkfeed_events::{EventBus, PlaybackEvent};
use tracing::debug;

use crate::{PlaybackSurface, Volume};

/// Volume change applied by a single up/down press.
pub const VOLUME_STEP: f64 = 0.1;
/// Volume change applied by the "max" press.
pub const VOLUME_BOOST: f64 = 1.0;
/// Distance covered by the forward/rewind buttons.
pub const SKIP_INTERVAL: Duration = Duration::from_secs(10);

/// Maps control presses to surface calls.
///
/// Holds no playback state of its own; every decision reads the surface first.
pub struct PlayerControls<S> {
    surface: S,
    bus: Option<EventBus>,
}

impl<S: PlaybackSurface> PlayerControls<S> {
    pub fn new(surface: S) -> Self {
        Self { surface, bus: None }
    }

    /// Publish a [`PlaybackEvent`] for every change.
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn publish(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }

    /// Returns `true` if the surface is now playing.
    pub fn toggle_play_pause(&self) -> bool {
        let playing = if self.surface.is_paused() {
            self.surface.play();
            true
        } else {
            self.surface.pause();
            false
        };
        debug!(playing, "play/pause toggled");
        self.publish(PlaybackEvent::PlayStateChanged { playing });
        playing
    }

    /// Applies `delta` to the current volume, clamped to `[0.0, 2.0]`.
    pub fn adjust_volume(&self, delta: f64) -> Volume {
        let volume = Volume::new(self.surface.volume()).adjusted(delta);
        self.surface.set_volume(volume.get());
        self.publish(PlaybackEvent::VolumeChanged {
            volume: volume.get(),
        });
        volume
    }

    pub fn volume_up(&self) -> Volume {
        self.adjust_volume(VOLUME_STEP)
    }

    pub fn volume_down(&self) -> Volume {
        self.adjust_volume(-VOLUME_STEP)
    }

    pub fn volume_max(&self) -> Volume {
        self.adjust_volume(VOLUME_BOOST)
    }

    /// Returns `true` if the surface is now fullscreen.
    pub fn toggle_fullscreen(&self) -> bool {
        let fullscreen = if self.surface.is_fullscreen() {
            self.surface.exit_fullscreen();
            false
        } else {
            self.surface.request_fullscreen();
            true
        };
        self.publish(PlaybackEvent::FullscreenChanged { fullscreen });
        fullscreen
    }

    pub fn skip_forward(&self) -> Duration {
        let position = self.surface.current_time().saturating_add(SKIP_INTERVAL);
        self.seek(position)
    }

    /// Rewinds, stopping at the start of the media.
    pub fn skip_backward(&self) -> Duration {
        let position = self.surface.current_time().saturating_sub(SKIP_INTERVAL);
        self.seek(position)
    }

    fn seek(&self, position: Duration) -> Duration {
        self.surface.set_current_time(position);
        self.publish(PlaybackEvent::Seeked { position });
        position
    }
}
