/// Top-level failure kinds. Frame-level problems (`DecodeError`, render I/O)
/// never reach this type; the stream loop absorbs them.

use std::io;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::net::session::SetupError;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),
    #[error("stream failed: {0}")]
    Transport(#[from] tungstenite::Error),
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}
