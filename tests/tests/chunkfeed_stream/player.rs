use std::time::Duration;

use chunkfeed::{
    events::{Event, PlaybackEvent, StreamEvent},
    play::{
        MediaSource, PlaybackSurface, SourceHandle,
        mock::{MemorySourceFactory, MemorySurface},
    },
    stream::{StreamOptions, StreamPlayer, StreamStatus},
};
use chunkfeed_test_utils::{Reply, ScriptedNet, segment_payload};
use url::Url;

use crate::common::{drain_stream_events, init_tracing};

type TestPlayer = StreamPlayer<ScriptedNet, MemorySourceFactory, MemorySurface>;

fn player(net: &ScriptedNet) -> (TestPlayer, MemorySourceFactory, MemorySurface) {
    let factory = MemorySourceFactory::new();
    let surface = MemorySurface::new();
    let player = StreamPlayer::new(
        net.clone(),
        factory.clone(),
        surface.clone(),
        StreamOptions::default(),
    );
    (player, factory, surface)
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_restart_tears_down_previous_session_first() {
    init_tracing();
    let net = ScriptedNet::new(3);
    net.script("chunk_1.ts", [Reply::Hang]);
    let (mut player, factory, surface) = player(&net);
    let mut rx = player.events().subscribe();

    let first = player.start(url("http://cdn.test/a/")).await.unwrap();
    net.wait_for_requests(2).await;
    let second = player.start(url("http://cdn.test/b/")).await.unwrap();
    let summary = player.wait().await.unwrap().unwrap();

    assert_eq!(summary.session, second);
    assert_eq!(surface.attached(), vec![SourceHandle(1), SourceHandle(2)]);

    let created = factory.created();
    assert_eq!(created[0].buffer().appended(), vec![segment_payload(0)]);
    assert_eq!(created[0].end_of_stream_calls(), 0);
    assert_eq!(created[1].buffer().appended().len(), 3);
    assert_eq!(created[1].end_of_stream_calls(), 1);

    // Every request of the old session precedes every request of the new one.
    let paths: Vec<String> = net.requests().iter().map(|u| u.path().to_string()).collect();
    assert_eq!(
        paths,
        vec![
            "/a/chunk_0.ts",
            "/a/chunk_1.ts",
            "/b/chunk_0.ts",
            "/b/chunk_1.ts",
            "/b/chunk_2.ts",
            "/b/chunk_3.ts",
        ]
    );

    let events = drain_stream_events(&mut rx);
    let cancelled = events
        .iter()
        .position(|e| matches!(e, StreamEvent::Cancelled { session } if *session == first))
        .unwrap();
    let started = events
        .iter()
        .position(|e| matches!(e, StreamEvent::SessionStarted { session, .. } if *session == second))
        .unwrap();
    assert!(cancelled < started);
}

#[tokio::test(start_paused = true)]
async fn test_restart_while_waiting_for_open() {
    let net = ScriptedNet::new(1);
    let factory = MemorySourceFactory::manual_open();
    let mut player = StreamPlayer::new(
        net.clone(),
        factory.clone(),
        MemorySurface::new(),
        StreamOptions::default(),
    );

    player.start(url("http://cdn.test/a/")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    player.start(url("http://cdn.test/b/")).await.unwrap();
    factory.created()[1].open();

    let summary = player.wait().await.unwrap().unwrap();
    assert_eq!(summary.segments, 1);
    assert!(factory.created()[0].buffer().appended().is_empty());
    assert_eq!(net.requested_files(), vec!["chunk_0.ts", "chunk_1.ts"]);
}

#[tokio::test(start_paused = true)]
async fn test_status_follows_active_session() {
    let net = ScriptedNet::new(2);
    net.script("chunk_0.ts", [Reply::Hang]);
    let (mut player, _factory, _surface) = player(&net);
    assert!(player.status().is_none());

    player.start(url("http://cdn.test/a/")).await.unwrap();
    net.wait_for_requests(1).await;
    assert!(matches!(
        player.status(),
        Some(StreamStatus::FetchingSegment { index: 0 })
    ));

    let rx = player.subscribe_status().unwrap();
    let outcome = player.stop().await.unwrap();
    assert!(outcome.unwrap_err().is_cancelled());
    assert!(matches!(*rx.borrow(), StreamStatus::Ended));
    assert!(player.status().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_session_reported_by_wait() {
    let net = ScriptedNet::new(2);
    net.script("chunk_0.ts", [Reply::Empty]);
    let (mut player, _factory, _surface) = player(&net);

    player.start(url("http://cdn.test/a/")).await.unwrap();
    let error = player.wait().await.unwrap().unwrap_err();
    assert_eq!(error.index(), Some(0));
    assert!(player.wait().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_player_cancels_session() {
    let net = ScriptedNet::new(2);
    net.script("chunk_0.ts", [Reply::Hang]);
    let (mut player, factory, _surface) = player(&net);
    let mut rx = player.events().subscribe();

    let id = player.start(url("http://cdn.test/a/")).await.unwrap();
    net.wait_for_requests(1).await;
    drop(player);

    loop {
        match rx.recv().await.unwrap() {
            Event::Stream(StreamEvent::Cancelled { session }) if session == id => break,
            _ => {}
        }
    }
    assert!(factory.created()[0].buffer().appended().is_empty());
}

#[tokio::test]
async fn test_controls_drive_surface() {
    let net = ScriptedNet::new(0);
    let (player, _factory, surface) = player(&net);
    let mut rx = player.events().subscribe();
    let controls = player.controls();

    assert!(controls.toggle_play_pause());
    assert!(!surface.is_paused());
    assert!(controls.toggle_fullscreen());
    assert!(surface.is_fullscreen());
    assert_eq!(controls.volume_max().get(), 2.0);
    assert_eq!(controls.volume_up().get(), 2.0);
    assert_eq!(controls.skip_forward(), Duration::from_secs(10));
    assert_eq!(controls.skip_backward(), Duration::ZERO);
    assert_eq!(controls.skip_backward(), Duration::ZERO);

    let mut playback = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Playback(event) = event {
            playback.push(event);
        }
    }
    assert_eq!(playback.first(), Some(&PlaybackEvent::PlayStateChanged { playing: true }));
    assert!(playback.contains(&PlaybackEvent::FullscreenChanged { fullscreen: true }));
}

#[tokio::test]
async fn test_source_handle_attached_before_streaming() {
    let net = ScriptedNet::new(1);
    let (mut player, factory, surface) = player(&net);

    player.start(url("http://cdn.test/a/")).await.unwrap();
    assert_eq!(surface.attached(), vec![factory.created()[0].handle()]);
    player.wait().await.unwrap().unwrap();
}
