#![forbid(unsafe_code)]

use std::sync::Arc;

use chunkfeed_events::{EventBus, SessionId, StreamEvent};
use chunkfeed_net::{HttpClient, Net};
use chunkfeed_play::{MediaSource, PlaybackSurface, PlayerControls, SourceFactory};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::StreamOptions,
    controller::{StreamController, StreamSummary},
    error::{ControllerError, StreamResult},
    session::StreamStatus,
};

/// How a session ended.
pub type SessionOutcome = Result<StreamSummary, ControllerError>;

struct ActiveSession {
    id: SessionId,
    cancel: CancellationToken,
    status: watch::Receiver<StreamStatus>,
    task: JoinHandle<SessionOutcome>,
}

/// Owns the one streaming session of a playback surface.
///
/// Starting a new source cancels the running session and waits for its task
/// to finish before the new session issues any request, so two sessions never
/// feed the same surface.
pub struct StreamPlayer<N, F, S> {
    net: N,
    factory: F,
    surface: Arc<S>,
    options: StreamOptions,
    bus: EventBus,
    next_session: u64,
    active: Option<ActiveSession>,
}

impl<F, S> StreamPlayer<HttpClient, F, S>
where
    F: SourceFactory,
    S: PlaybackSurface,
{
    /// Player over a real HTTP client built from `options.net`.
    pub fn with_http(factory: F, surface: S, options: StreamOptions) -> StreamResult<Self> {
        let net = HttpClient::new(options.net.clone())?;
        Ok(Self::new(net, factory, surface, options))
    }
}

impl<N, F, S> StreamPlayer<N, F, S>
where
    N: Net + Clone + 'static,
    F: SourceFactory,
    S: PlaybackSurface,
{
    pub fn new(net: N, factory: F, surface: S, options: StreamOptions) -> Self {
        let bus = options.event_bus();
        let options = options.with_events(bus.clone());
        Self {
            net,
            factory,
            surface: Arc::new(surface),
            options,
            bus,
            next_session: 0,
            active: None,
        }
    }

    /// Bus shared by every session and by [`Self::controls`].
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Transport controls bound to this player's surface.
    pub fn controls(&self) -> PlayerControls<Arc<S>> {
        PlayerControls::new(Arc::clone(&self.surface)).with_events(self.bus.clone())
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(|active| active.id)
    }

    /// Status of the current session, `None` when nothing was started.
    pub fn status(&self) -> Option<StreamStatus> {
        self.active
            .as_ref()
            .map(|active| active.status.borrow().clone())
    }

    pub fn subscribe_status(&self) -> Option<watch::Receiver<StreamStatus>> {
        self.active.as_ref().map(|active| active.status.clone())
    }

    /// Start streaming from `base_url`, replacing any running session.
    ///
    /// The previous session is fully torn down before the new source is
    /// created and attached.
    pub async fn start(&mut self, base_url: Url) -> StreamResult<SessionId> {
        if let Some(outcome) = self.stop().await {
            debug!(?outcome, "previous session replaced");
        }

        self.next_session += 1;
        let id = SessionId(self.next_session);
        let source = self.factory.create_source();
        let handle = source.handle();
        let controller = StreamController::new(
            id,
            base_url.clone(),
            self.net.clone(),
            source,
            &self.options,
        )?;

        self.surface.attach_source(handle);
        info!(session = %id, %handle, base = %base_url, "session started");
        self.bus.publish(StreamEvent::SessionStarted {
            session: id,
            base_url: base_url.to_string(),
        });

        let cancel = controller.cancel_token();
        let status = controller.subscribe_status();
        let task = tokio::spawn(controller.run());
        self.active = Some(ActiveSession {
            id,
            cancel,
            status,
            task,
        });
        Ok(id)
    }

    /// Cancel the running session and wait until its task is gone.
    ///
    /// Returns `None` if no session was running. A session that already
    /// finished reports its own outcome rather than `Cancelled`.
    pub async fn stop(&mut self) -> Option<SessionOutcome> {
        let active = self.active.take()?;
        debug!(session = %active.id, "stopping session");
        active.cancel.cancel();
        Some(join(active.id, active.task).await)
    }

    /// Wait for the running session to end on its own.
    ///
    /// Dropping the returned future leaves the session running and owned by
    /// the player.
    pub async fn wait(&mut self) -> Option<SessionOutcome> {
        let active = self.active.as_mut()?;
        let id = active.id;
        let joined = (&mut active.task).await;
        self.active = None;
        Some(flatten(id, joined))
    }
}

async fn join(id: SessionId, task: JoinHandle<SessionOutcome>) -> SessionOutcome {
    flatten(id, task.await)
}

fn flatten(
    id: SessionId,
    joined: Result<SessionOutcome, tokio::task::JoinError>,
) -> SessionOutcome {
    joined.unwrap_or_else(|e| {
        warn!(session = %id, error = %e, "session task did not complete");
        Err(ControllerError::Aborted(e.to_string()))
    })
}

impl<N, F, S> Drop for StreamPlayer<N, F, S> {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}
