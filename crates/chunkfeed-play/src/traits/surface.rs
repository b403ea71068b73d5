use std::{sync::Arc, time::Duration};

use crate::SourceHandle;

/// The element the viewer watches.
///
/// Implementations own the decode pipeline behind the surface; chunkfeed only
/// drives it through these calls. Methods take `&self`; implementations use
/// interior mutability.
#[cfg_attr(
    any(test, feature = "test-utils"),
    unimock::unimock(api = PlaybackSurfaceMock)
)]
pub trait PlaybackSurface: Send + Sync + 'static {
    // -- source --

    fn attach_source(&self, source: SourceHandle);

    // -- transport --

    fn play(&self);

    fn pause(&self);

    fn is_paused(&self) -> bool;

    // -- timing --

    fn current_time(&self) -> Duration;

    fn set_current_time(&self, time: Duration);

    // -- volume --

    /// Current volume in `0.0..=2.0`.
    fn volume(&self) -> f64;

    fn set_volume(&self, volume: f64);

    // -- fullscreen --

    fn request_fullscreen(&self);

    fn exit_fullscreen(&self);

    fn is_fullscreen(&self) -> bool;
}

impl<S: PlaybackSurface + ?Sized> PlaybackSurface for Arc<S> {
    fn attach_source(&self, source: SourceHandle) {
        (**self).attach_source(source);
    }

    fn play(&self) {
        (**self).play();
    }

    fn pause(&self) {
        (**self).pause();
    }

    fn is_paused(&self) -> bool {
        (**self).is_paused()
    }

    fn current_time(&self) -> Duration {
        (**self).current_time()
    }

    fn set_current_time(&self, time: Duration) {
        (**self).set_current_time(time);
    }

    fn volume(&self) -> f64 {
        (**self).volume()
    }

    fn set_volume(&self, volume: f64) {
        (**self).set_volume(volume);
    }

    fn request_fullscreen(&self) {
        (**self).request_fullscreen();
    }

    fn exit_fullscreen(&self) {
        (**self).exit_fullscreen();
    }

    fn is_fullscreen(&self) -> bool {
        (**self).is_fullscreen()
    }
}
