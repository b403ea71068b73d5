#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Contracts for the collaborators a segment pipeline drives.
//!
//! - [`PlaybackSurface`]: the element the user watches (play, pause, volume, fullscreen).
//! - [`MediaSource`]: source container attached to a surface; opens decode buffers.
//! - [`SourceBuffer`]: appendable decode buffer with asynchronous completion.
//!
//! [`PlayerControls`] is the thin glue that turns button presses into surface calls.

mod controls;
mod error;
mod traits;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use controls::{PlayerControls, SKIP_INTERVAL, VOLUME_BOOST, VOLUME_STEP};
pub use error::{AppendError, MediaSourceError};
#[cfg(any(test, feature = "test-utils"))]
pub use traits::surface::PlaybackSurfaceMock;
pub use traits::{
    source::{MediaSource, SourceBuffer, SourceFactory},
    surface::PlaybackSurface,
};
pub use types::{ReadyState, SourceHandle, Volume};
