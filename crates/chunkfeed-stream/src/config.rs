#![forbid(unsafe_code)]

use std::sync::Arc;

use chunkfeed_events::EventBus;
use chunkfeed_net::NetOptions;
use tokio_util::sync::CancellationToken;

use crate::{
    addresser::SegmentTemplate,
    fetcher::{NonEmptyPayload, PayloadValidator},
    retry::RetryPolicy,
};

/// Codec string for the decode buffer when none is configured.
pub const DEFAULT_MIME_CODECS: &str = "video/mp4; codecs=\"avc1.42E01E, mp4a.40.2\"";

/// Configuration shared by every session a player starts.
#[derive(Clone)]
pub struct StreamOptions {
    /// Segment naming below the base URL.
    pub template: SegmentTemplate,
    /// MIME type and codecs the decode buffer is opened with.
    pub mime_codecs: String,
    /// Network configuration.
    pub net: NetOptions,
    /// Per-segment budget for transient fetch failures.
    pub fetch_retry: RetryPolicy,
    /// Per-segment budget for `BufferFull` appends.
    pub append_retry: RetryPolicy,
    /// Decides whether a fetched body is decodable.
    pub validator: Arc<dyn PayloadValidator>,
    /// Parent cancellation token; sessions use child tokens.
    pub cancel: Option<CancellationToken>,
    /// Event bus (optional - if not provided, one is created internally).
    pub bus: Option<EventBus>,
    /// Capacity of the events channel (used when `bus` is not provided).
    pub events_channel_capacity: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            template: SegmentTemplate::default(),
            mime_codecs: DEFAULT_MIME_CODECS.to_string(),
            net: NetOptions::default(),
            fetch_retry: RetryPolicy::default(),
            append_retry: RetryPolicy::default(),
            validator: Arc::new(NonEmptyPayload),
            cancel: None,
            bus: None,
            events_channel_capacity: 64,
        }
    }
}

impl StreamOptions {
    pub fn with_template(mut self, template: SegmentTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_mime_codecs<S: Into<String>>(mut self, mime_codecs: S) -> Self {
        self.mime_codecs = mime_codecs.into();
        self
    }

    pub fn with_net(mut self, net: NetOptions) -> Self {
        self.net = net;
        self
    }

    pub fn with_fetch_retry(mut self, policy: RetryPolicy) -> Self {
        self.fetch_retry = policy;
        self
    }

    pub fn with_append_retry(mut self, policy: RetryPolicy) -> Self {
        self.append_retry = policy;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn PayloadValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// The configured bus, or a fresh one.
    pub(crate) fn event_bus(&self) -> EventBus {
        self.bus
            .clone()
            .unwrap_or_else(|| EventBus::new(self.events_channel_capacity))
    }

    /// A token for one session, cancelled together with the parent if any.
    pub(crate) fn session_token(&self) -> CancellationToken {
        self.cancel
            .as_ref()
            .map_or_else(CancellationToken::new, CancellationToken::child_token)
    }
}
