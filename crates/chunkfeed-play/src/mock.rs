//! In-memory collaborators for tests.
//!
//! [`MemorySourceBuffer`] records every append and counts overlapping ones, so
//! tests can assert ordering and the single-append-in-flight rule directly.

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::{
    AppendError, MediaSource, MediaSourceError, PlaybackSurface, ReadyState, SourceBuffer,
    SourceFactory, SourceHandle, Volume,
};

// MemorySurface

#[derive(Debug)]
struct SurfaceState {
    paused: bool,
    time: Duration,
    volume: Volume,
    fullscreen: bool,
    attached: Vec<SourceHandle>,
}

/// Surface that only remembers what it was told.
#[derive(Clone, Debug)]
pub struct MemorySurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SurfaceState {
                paused: true,
                time: Duration::ZERO,
                volume: Volume::default(),
                fullscreen: false,
                attached: Vec::new(),
            })),
        }
    }

    /// Every source handle attached so far, oldest first.
    pub fn attached(&self) -> Vec<SourceHandle> {
        self.state.lock().attached.clone()
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSurface for MemorySurface {
    fn attach_source(&self, source: SourceHandle) {
        self.state.lock().attached.push(source);
    }

    fn play(&self) {
        self.state.lock().paused = false;
    }

    fn pause(&self) {
        self.state.lock().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn current_time(&self) -> Duration {
        self.state.lock().time
    }

    fn set_current_time(&self, time: Duration) {
        self.state.lock().time = time;
    }

    fn volume(&self) -> f64 {
        self.state.lock().volume.get()
    }

    fn set_volume(&self, volume: f64) {
        self.state.lock().volume = Volume::new(volume);
    }

    fn request_fullscreen(&self) {
        self.state.lock().fullscreen = true;
    }

    fn exit_fullscreen(&self) {
        self.state.lock().fullscreen = false;
    }

    fn is_fullscreen(&self) -> bool {
        self.state.lock().fullscreen
    }
}

// MemorySourceBuffer

#[derive(Default)]
struct BufferInner {
    appended: Mutex<Vec<Bytes>>,
    failures: Mutex<VecDeque<AppendError>>,
    append_delay: Mutex<Duration>,
    updating: AtomicBool,
    overlaps: AtomicUsize,
    append_calls: AtomicUsize,
    closed: AtomicBool,
}

struct UpdatingGuard<'a>(&'a AtomicBool);

impl Drop for UpdatingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Decode buffer that keeps appended payloads in memory.
#[derive(Clone, Default)]
pub struct MemorySourceBuffer {
    inner: Arc<BufferInner>,
}

impl MemorySourceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads accepted so far, in append order.
    pub fn appended(&self) -> Vec<Bytes> {
        self.inner.appended.lock().clone()
    }

    /// Number of `append` calls, including rejected ones.
    pub fn append_calls(&self) -> usize {
        self.inner.append_calls.load(Ordering::SeqCst)
    }

    /// Appends started while another one was still pending.
    pub fn overlaps(&self) -> usize {
        self.inner.overlaps.load(Ordering::SeqCst)
    }

    /// Queue a failure for the next append that reaches the decoder.
    pub fn fail_next(&self, error: AppendError) {
        self.inner.failures.lock().push_back(error);
    }

    /// Time each append takes before completing.
    pub fn set_append_delay(&self, delay: Duration) {
        *self.inner.append_delay.lock() = delay;
    }

    /// Tear the buffer down; later appends fail with `DecodeBufferClosed`.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SourceBuffer for MemorySourceBuffer {
    async fn append(&self, bytes: Bytes) -> Result<(), AppendError> {
        self.inner.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.updating.swap(true, Ordering::SeqCst) {
            self.inner.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let _updating = UpdatingGuard(&self.inner.updating);

        let delay = *self.inner.append_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(AppendError::DecodeBufferClosed);
        }
        if let Some(error) = self.inner.failures.lock().pop_front() {
            return Err(error);
        }

        self.inner.appended.lock().push(bytes);
        Ok(())
    }
}

// MemoryMediaSource

struct SourceInner {
    handle: SourceHandle,
    state: watch::Sender<ReadyState>,
    detached: AtomicBool,
    buffer: MemorySourceBuffer,
    mime_types: Mutex<Vec<String>>,
    end_of_stream_calls: AtomicUsize,
}

/// Source container backed by a single [`MemorySourceBuffer`].
#[derive(Clone)]
pub struct MemoryMediaSource {
    inner: Arc<SourceInner>,
}

impl MemoryMediaSource {
    pub fn new(handle: SourceHandle) -> Self {
        let (state, _) = watch::channel(ReadyState::Closed);
        Self {
            inner: Arc::new(SourceInner {
                handle,
                state,
                detached: AtomicBool::new(false),
                buffer: MemorySourceBuffer::new(),
                mime_types: Mutex::new(Vec::new()),
                end_of_stream_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Report the container as open.
    pub fn open(&self) {
        self.inner.state.send_replace(ReadyState::Open);
    }

    /// Simulate the surface discarding the container.
    pub fn detach(&self) {
        self.inner.detached.store(true, Ordering::SeqCst);
        self.inner.buffer.close();
        self.inner.state.send_replace(ReadyState::Closed);
    }

    /// The buffer every `open_source_buffer` call hands out.
    pub fn buffer(&self) -> &MemorySourceBuffer {
        &self.inner.buffer
    }

    pub fn mime_types(&self) -> Vec<String> {
        self.inner.mime_types.lock().clone()
    }

    pub fn end_of_stream_calls(&self) -> usize {
        self.inner.end_of_stream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSource for MemoryMediaSource {
    type Buffer = MemorySourceBuffer;

    fn handle(&self) -> SourceHandle {
        self.inner.handle
    }

    fn ready_state(&self) -> ReadyState {
        *self.inner.state.borrow()
    }

    async fn opened(&self) -> Result<(), MediaSourceError> {
        let mut rx = self.inner.state.subscribe();
        loop {
            if self.inner.detached.load(Ordering::SeqCst) {
                return Err(MediaSourceError::Closed);
            }
            match *rx.borrow_and_update() {
                ReadyState::Open => return Ok(()),
                ReadyState::Ended => return Err(MediaSourceError::NotOpen(ReadyState::Ended)),
                ReadyState::Closed => {}
            }
            if rx.changed().await.is_err() {
                return Err(MediaSourceError::Closed);
            }
        }
    }

    fn open_source_buffer(&self, mime_codecs: &str) -> Result<Self::Buffer, MediaSourceError> {
        let state = self.ready_state();
        if state != ReadyState::Open {
            return Err(MediaSourceError::NotOpen(state));
        }
        self.inner.mime_types.lock().push(mime_codecs.to_string());
        Ok(self.inner.buffer.clone())
    }

    fn end_of_stream(&self) -> Result<(), MediaSourceError> {
        let state = self.ready_state();
        if state != ReadyState::Open {
            return Err(MediaSourceError::NotOpen(state));
        }
        self.inner.end_of_stream_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.state.send_replace(ReadyState::Ended);
        Ok(())
    }
}

// MemorySourceFactory

/// Factory that remembers every container it created.
#[derive(Clone)]
pub struct MemorySourceFactory {
    next_id: Arc<AtomicU64>,
    created: Arc<Mutex<Vec<MemoryMediaSource>>>,
    auto_open: bool,
}

impl MemorySourceFactory {
    /// Containers open immediately after creation.
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicU64::new(1)),
            created: Arc::new(Mutex::new(Vec::new())),
            auto_open: true,
        }
    }

    /// Containers stay closed until a test calls [`MemoryMediaSource::open`].
    pub fn manual_open() -> Self {
        Self {
            auto_open: false,
            ..Self::new()
        }
    }

    pub fn created(&self) -> Vec<MemoryMediaSource> {
        self.created.lock().clone()
    }
}

impl Default for MemorySourceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFactory for MemorySourceFactory {
    type Source = MemoryMediaSource;

    fn create_source(&self) -> MemoryMediaSource {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let source = MemoryMediaSource::new(SourceHandle(id));
        if self.auto_open {
            source.open();
        }
        self.created.lock().push(source.clone());
        source
    }
}
