use chunkfeed::{
    play::{
        MediaSource,
        mock::{MemorySourceFactory, MemorySurface},
    },
    stream::{ControllerError, FetchError, RetryCause, StreamPlayer},
};
use chunkfeed_test_utils::{SegmentServer, segment_payload};
use rstest::rstest;

use crate::common::{fast_options, init_tracing};

fn http_player(
    factory: &MemorySourceFactory,
) -> StreamPlayer<chunkfeed::net::HttpClient, MemorySourceFactory, MemorySurface> {
    StreamPlayer::with_http(factory.clone(), MemorySurface::new(), fast_options()).unwrap()
}

#[rstest]
#[case::empty(0)]
#[case::short(3)]
#[case::longer(12)]
#[tokio::test]
async fn test_streams_all_segments_over_http(#[case] count: u64) {
    init_tracing();
    let server = SegmentServer::start(count).await;
    let factory = MemorySourceFactory::new();
    let mut player = http_player(&factory);

    player.start(server.stream_url("v42")).await.unwrap();
    let summary = player.wait().await.unwrap().unwrap();

    assert_eq!(summary.segments, count);
    let source = &factory.created()[0];
    let expected: Vec<_> = (0..count).map(segment_payload).collect();
    assert_eq!(source.buffer().appended(), expected);
    assert_eq!(source.end_of_stream_calls(), 1);

    let hits = server.hits();
    assert_eq!(hits.len() as u64, count + 1);
    assert_eq!(hits.last().unwrap(), &format!("/v42/chunk_{count}.ts"));
}

#[tokio::test]
async fn test_server_errors_are_retried_over_http() {
    let server = SegmentServer::start(3).await;
    server.fail(1, [503, 500]);
    let factory = MemorySourceFactory::new();
    let mut player = http_player(&factory);

    player.start(server.stream_url("v42")).await.unwrap();
    let summary = player.wait().await.unwrap().unwrap();

    assert_eq!(summary.segments, 3);
    assert_eq!(factory.created()[0].buffer().appended().len(), 3);
    let retried = server
        .hits()
        .iter()
        .filter(|h| h.as_str() == "/v42/chunk_1.ts")
        .count();
    assert_eq!(retried, 3);
}

#[tokio::test]
async fn test_persistent_server_error_fails_over_http() {
    let server = SegmentServer::start(3).await;
    server.fail(0, [500, 500, 500]);
    let factory = MemorySourceFactory::new();
    let mut player = http_player(&factory);

    player.start(server.stream_url("v42")).await.unwrap();
    let error = player.wait().await.unwrap().unwrap_err();

    assert!(matches!(
        error,
        ControllerError::RetriesExhausted {
            index: 0,
            attempts: 3,
            last: RetryCause::Fetch(FetchError::ServerError { status: 500, .. }),
        }
    ));
    assert!(factory.created()[0].buffer().appended().is_empty());
}

#[tokio::test]
async fn test_gone_ends_stream_early() {
    let server = SegmentServer::start(5).await;
    server.fail(2, [410]);
    let factory = MemorySourceFactory::new();
    let mut player = http_player(&factory);

    player.start(server.stream_url("v42")).await.unwrap();
    let summary = player.wait().await.unwrap().unwrap();

    assert_eq!(summary.segments, 2);
    assert_eq!(factory.created()[0].end_of_stream_calls(), 1);
}

#[tokio::test]
async fn test_restart_over_http_switches_stream() {
    let server = SegmentServer::start(2).await;
    let factory = MemorySourceFactory::manual_open();
    let mut player = http_player(&factory);

    player.start(server.stream_url("old")).await.unwrap();
    player.start(server.stream_url("new")).await.unwrap();
    factory.created()[1].open();
    let summary = player.wait().await.unwrap().unwrap();

    assert_eq!(summary.segments, 2);
    assert!(server.hits().iter().all(|h| h.starts_with("/new/")));
    assert_eq!(factory.created()[1].handle().0, 2);
}
