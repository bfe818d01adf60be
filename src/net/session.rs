/// Match setup handshake.
///
/// Registers the drivers, gives them a moment to come online, starts the
/// race and sets the tick rate. Responses are not inspected and nothing is
/// retried: if the server cannot be reached the viewer has nothing to show.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::net::endpoint::ServerUrl;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Configure,
    Start,
    Rate,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Configure => "configure drivers",
            Step::Start => "start race",
            Step::Rate => "set tick rate",
        })
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid server url `{url}`: {reason}")]
    BadUrl { url: String, reason: String },
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{step} request failed: {source}")]
    Request {
        step: Step,
        #[source]
        source: reqwest::Error,
    },
}

pub fn build_client(timeout: Duration) -> Result<Client, SetupError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(SetupError::Client)
}

/// Run the admin handshake against `server`.
pub async fn initialize(
    client: &Client,
    server: &ServerUrl,
    drivers: &[String],
    tick_rate: u32,
    settle: Duration,
) -> Result<(), SetupError> {
    post(client, server, Step::Configure, "drivers", &drivers.join(",")).await?;
    info!("registered {} driver(s), waiting {:?} before start", drivers.len(), settle);

    tokio::time::sleep(settle).await;

    post(client, server, Step::Start, "running", "1").await?;
    post(client, server, Step::Rate, "rate", &tick_rate.to_string()).await?;
    info!("race started at {tick_rate} updates/s");
    Ok(())
}

async fn post(
    client: &Client,
    server: &ServerUrl,
    step: Step,
    key: &str,
    value: &str,
) -> Result<(), SetupError> {
    let url = server.admin(key, value);
    debug!("POST {url}");

    let response = client
        .post(url)
        .send()
        .await
        .map_err(|source| SetupError::Request { step, source })?;

    // The server's answer is not part of the contract; just note oddities.
    if !response.status().is_success() {
        warn!("{step}: server answered {}", response.status());
    }
    Ok(())
}
