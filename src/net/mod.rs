/// Talking to the race server: admin handshake, then the snapshot stream.

pub mod endpoint;
pub mod session;
pub mod stream;

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::info;

use crate::error::ViewerError;
use endpoint::ServerUrl;
use stream::{FrameSink, FrameStats, Projection, StreamEnd, StreamSummary};

/// Everything needed to start a race and watch it.
#[derive(Clone, Debug)]
pub struct SessionPlan {
    pub server: ServerUrl,
    pub drivers: Vec<String>,
    pub tick_rate: u32,
    pub settle_delay: Duration,
    pub projection: Projection,
}

/// Run the handshake, then stream into `sink` until the race ends.
/// `shutdown` is honoured in every phase; the stream never starts if the
/// handshake fails.
pub async fn watch<S, F>(
    client: &Client,
    plan: &SessionPlan,
    sink: &mut S,
    shutdown: F,
) -> Result<StreamSummary, ViewerError>
where
    S: FrameSink,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let handshake = session::initialize(
        client,
        &plan.server,
        &plan.drivers,
        plan.tick_rate,
        plan.settle_delay,
    );
    tokio::select! {
        biased;
        _ = &mut shutdown => {
            info!("interrupted during setup");
            return Ok(StreamSummary { stats: FrameStats::default(), end: StreamEnd::Interrupted });
        }
        done = handshake => done?,
    }

    stream::run(&plan.server.stream(), &plan.projection, sink, &mut shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use futures_util::SinkExt;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    use crate::domain::grid::DisplayGrid;
    use crate::net::session::tests::{answer_http, test_client};
    use crate::net::session::SetupError;
    use crate::ui::renderer::Dashboard;

    #[derive(Default)]
    struct Recorder {
        labels: Vec<String>,
    }

    impl FrameSink for Recorder {
        fn present(&mut self, grid: &DisplayGrid, _dash: &Dashboard<'_>) -> io::Result<()> {
            self.labels.push(grid.get(1, 1).map(|c| c.label().to_string()).unwrap_or_default());
            Ok(())
        }
    }

    fn plan_for(server: ServerUrl) -> SessionPlan {
        SessionPlan {
            server,
            drivers: vec!["http://driver-a:8081".into()],
            tick_rate: 5,
            settle_delay: Duration::ZERO,
            projection: Projection::new(6, 9, 5),
        }
    }

    #[tokio::test]
    async fn handshake_then_stream_survives_bad_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        tokio::spawn(async move {
            for _ in 0..3 {
                let (mut conn, _) = listener.accept().await.unwrap();
                answer_http(&mut conn, "200 OK", &log).await;
            }
            let (conn, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(conn).await.unwrap();
            ws.send(Message::text("{{{ not json")).await.unwrap();
            ws.send(Message::text(
                r#"{"payload": {"timeleft": 42,
                    "players": [{"name": "A", "car": 0, "score": 3, "x": 1, "y": 1}],
                    "track": [{"name": "trash", "x": 1, "y": 1}]}}"#,
            ))
            .await
            .unwrap();
            ws.close(None).await.ok();
        });

        let plan = plan_for(ServerUrl::parse(&format!("http://{addr}")).unwrap());
        let mut rec = Recorder::default();
        let summary = watch(&test_client(), &plan, &mut rec, std::future::pending())
            .await
            .unwrap();

        assert_eq!(seen.lock().unwrap().len(), 3);
        assert_eq!(summary.end, StreamEnd::ServerClosed);
        assert_eq!(summary.stats.skipped, 1);
        assert_eq!(summary.stats.frames, 1);
        assert_eq!(rec.labels, vec!["car-0".to_string()]);
    }

    #[tokio::test]
    async fn refused_setup_never_streams() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let plan = plan_for(ServerUrl::parse(&format!("http://{addr}")).unwrap());
        let mut rec = Recorder::default();
        let err = watch(&test_client(), &plan, &mut rec, std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, ViewerError::Setup(SetupError::Request { .. })), "{err}");
        assert!(rec.labels.is_empty());
    }

    #[tokio::test]
    async fn interrupt_during_settle_delay() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            answer_http(&mut conn, "200 OK", &log).await;
        });

        let mut plan = plan_for(ServerUrl::parse(&format!("http://{addr}")).unwrap());
        plan.settle_delay = Duration::from_secs(30);
        let mut rec = Recorder::default();
        let shutdown = tokio::time::sleep(Duration::from_millis(200));
        let summary = watch(&test_client(), &plan, &mut rec, shutdown).await.unwrap();

        assert_eq!(summary.end, StreamEnd::Interrupted);
        assert!(rec.labels.is_empty());
    }
}
