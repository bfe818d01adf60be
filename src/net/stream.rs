/// Snapshot stream: Connecting → Streaming → Closed.
///
/// One sequential task receives a message, decodes it, projects it onto the
/// grid and renders it before asking for the next one. A bad frame is logged
/// and skipped; only the transport ending (close, error, or an operator
/// interrupt) leaves the loop. The interrupt is raced against the receive
/// point only, so a frame that has started rendering always finishes.

use std::future::Future;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use futures_util::{Stream, StreamExt};
use reqwest::Url;
use thiserror::Error;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, error, info, warn};

use crate::domain::grid::{project, DisplayGrid};
use crate::domain::snapshot::{DecodeError, Snapshot};
use crate::error::ViewerError;
use crate::ui::renderer::{Dashboard, Renderer};

/// Anything that can show a projected frame.
pub trait FrameSink {
    fn present(&mut self, grid: &DisplayGrid, dash: &Dashboard<'_>) -> io::Result<()>;

    /// Something else may have written over the display; repaint fully next time.
    fn invalidate(&mut self) {}
}

impl<W: Write> FrameSink for Renderer<'_, W> {
    fn present(&mut self, grid: &DisplayGrid, dash: &Dashboard<'_>) -> io::Result<()> {
        self.render(grid, dash)
    }

    fn invalidate(&mut self) {
        Renderer::invalidate(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Connecting,
    Streaming,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    ServerClosed,
    Interrupted,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    pub skipped: u64,
    pub last_error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamSummary {
    pub stats: FrameStats,
    pub end: StreamEnd,
}

/// Grid size and per-frame time budget.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub width: usize,
    pub height: usize,
    pub budget: Duration,
}

impl Projection {
    pub fn new(width: usize, height: usize, tick_rate: u32) -> Self {
        Projection {
            width,
            height,
            budget: Duration::from_secs(1) / tick_rate.max(1),
        }
    }
}

#[derive(Debug, Error)]
enum FrameError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("render failed: {0}")]
    Render(#[from] io::Error),
}

/// Connect to `url` and stream until the server closes, the transport fails,
/// or `shutdown` resolves.
pub async fn run<S, F>(
    url: &Url,
    projection: &Projection,
    sink: &mut S,
    shutdown: F,
) -> Result<StreamSummary, ViewerError>
where
    S: FrameSink,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut state = StreamState::Connecting;
    info!("{state:?}: {url}");
    let connected = tokio::select! {
        biased;
        _ = &mut shutdown => None,
        conn = connect_async(url.as_str()) => Some(conn),
    };
    let mut ws = match connected {
        None => {
            info!("interrupted while connecting");
            return Ok(StreamSummary { stats: FrameStats::default(), end: StreamEnd::Interrupted });
        }
        Some(Err(e)) => {
            error!("could not open stream: {e}");
            return Err(ViewerError::Transport(e));
        }
        Some(Ok((ws, _response))) => ws,
    };

    state = StreamState::Streaming;
    info!("{state:?}");
    // Setup may have scribbled over the status screen.
    sink.invalidate();
    let outcome = pump(&mut ws, projection, sink, &mut shutdown).await;

    state = StreamState::Closed;
    match &outcome {
        Ok(summary) => {
            if summary.end == StreamEnd::Interrupted {
                // Best effort; the server may already be gone.
                let _ = ws.close(None).await;
            }
            info!(
                "{state:?} ({:?}): {} frames, {} skipped",
                summary.end, summary.stats.frames, summary.stats.skipped
            );
        }
        Err(e) => error!("{state:?}: {e}"),
    }
    outcome.map_err(ViewerError::Transport)
}

/// Per-message pipeline over any message stream.
pub async fn pump<St, S, F>(
    stream: &mut St,
    projection: &Projection,
    sink: &mut S,
    shutdown: F,
) -> Result<StreamSummary, WsError>
where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
    S: FrameSink,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut stats = FrameStats::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("interrupted by operator");
                return Ok(StreamSummary { stats, end: StreamEnd::Interrupted });
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(Message::Text(text))) => {
                match present_frame(text.as_str(), projection, sink, &stats) {
                    Ok(()) => stats.frames += 1,
                    Err(e) => {
                        warn!("skipping frame: {e}");
                        stats.skipped += 1;
                        stats.last_error = Some(e.to_string());
                        sink.invalidate();
                    }
                }
            }
            Some(Ok(Message::Binary(data))) => {
                debug!("ignoring {}-byte binary message", data.len());
            }
            Some(Ok(Message::Close(frame))) => {
                info!("server closed the stream: {frame:?}");
                return Ok(StreamSummary { stats, end: StreamEnd::ServerClosed });
            }
            // Ping/Pong are answered by the protocol layer
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e),
            None => return Ok(StreamSummary { stats, end: StreamEnd::ServerClosed }),
        }
    }
}

fn present_frame<S: FrameSink>(
    text: &str,
    projection: &Projection,
    sink: &mut S,
    stats: &FrameStats,
) -> Result<(), FrameError> {
    let started = Instant::now();

    let snap = Snapshot::decode(text)?;
    let grid = project(&snap, projection.width, projection.height);
    let dash = Dashboard {
        frames: stats.frames + 1,
        skipped: stats.skipped,
        last_error: stats.last_error.as_deref(),
        ..Dashboard::for_snapshot(&snap)
    };
    sink.present(&grid, &dash)?;

    let elapsed = started.elapsed();
    if elapsed > projection.budget {
        debug!("frame took {elapsed:?}, budget {:?}", projection.budget);
    }
    Ok(())
}
