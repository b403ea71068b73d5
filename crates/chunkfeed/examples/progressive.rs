//! Stream `chunk_{i}.ts` segments from a base URL into an in-memory surface.
//!
//! ```
//! cargo run -p chunkfeed --example progressive --features test-utils [BASE_URL]
//! ```

use std::{env::args, error::Error};

use chunkfeed::{
    play::mock::{MemorySourceFactory, MemorySurface},
    prelude::*,
};
use tracing::{info, metadata::LevelFilter, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::default()
                .add_directive("chunkfeed_stream=debug".parse()?)
                .add_directive("chunkfeed_net=warn".parse()?)
                .add_directive(LevelFilter::INFO.into()),
        )
        .with_line_number(false)
        .with_file(false)
        .init();

    let base: Url = args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8080/videos/demo/".to_string())
        .parse()?;

    let bus = EventBus::new(128);
    let mut events_rx = bus.subscribe();
    let factory = MemorySourceFactory::new();
    let options = StreamOptions::default().with_events(bus);
    let mut player = StreamPlayer::with_http(factory.clone(), MemorySurface::new(), options)?;

    info!(%base, "starting stream");
    player.start(base).await?;
    player.controls().toggle_play_pause();

    let finished = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, stopping...");
                break None;
            }
            outcome = player.wait() => break Some(outcome),
            recv = events_rx.recv() => match recv {
                Ok(event) => info!(?event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => warn!(n, "events lagged"),
                Err(_) => {}
            },
        }
    };
    let outcome = match finished {
        Some(outcome) => outcome,
        None => player.stop().await,
    };

    match outcome {
        Some(Ok(summary)) => info!(segments = summary.segments, "stream complete"),
        Some(Err(error)) => warn!(%error, "stream stopped"),
        None => {}
    }
    for source in factory.created() {
        info!(
            handle = %source.handle(),
            appended = source.buffer().appended().len(),
            "decode buffer"
        );
    }
    Ok(())
}
