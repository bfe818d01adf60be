/// Keyboard watcher.
///
/// Raw mode turns Ctrl+C into an ordinary key event, so the viewer polls
/// the terminal on a side thread and forwards quit requests over a channel
/// the stream loop can await. The thread only reads input; it never draws.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::debug;

/// How long a single poll waits before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];

/// Does this key ask the viewer to shut down?
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'));
    ctrl_c || KEYS_QUIT.contains(&key.code)
}

/// Owns the polling thread. Dropping it stops the thread.
pub struct InputWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputWatcher {
    /// Start polling. The receiver yields one `()` per quit key press.
    pub fn spawn() -> (Self, UnboundedReceiver<()>) {
        let (tx, rx) = unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();

        let handle = std::thread::spawn(move || {
            while !thread_stop.load(Ordering::Relaxed) {
                match poll(POLL_INTERVAL) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        debug!("input polling stopped: {e}");
                        break;
                    }
                }
                if let Ok(Event::Key(key)) = event::read() {
                    if is_quit_key(&key) && tx.send(()).is_err() {
                        break;
                    }
                }
            }
        });

        let watcher = InputWatcher {
            stop,
            handle: Some(handle),
        };
        (watcher, rx)
    }
}

impl Drop for InputWatcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
