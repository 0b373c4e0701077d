//! Unix-socket [`EventSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Message`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"Host":{"AddWindow":{"desk":2,"bounds":{"x":0,"y":0,"width":400,"height":300}}}}
//! {"Host":{"Snap":{"window":3,"position":"Secondary","ratio":0.4}}}
//! {"Shell":{"DividerResizeStarted":{"window":3,"point":{"x":960,"y":500}}}}
//! {"Shell":{"TabletStateChanged":"EnteringTablet"}}
//! {"Shell":"SnapToReplaceWithKeyboard"}
//! ```

use super::Message;
use crate::traits::EventSource;
use log::{debug, error, info};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// An [`EventSource`] that listens on a Unix stream socket for
/// JSON-encoded messages.
///
/// Each accepted connection can send multiple newline-delimited messages.
/// When the connection closes, the listener waits for the next one.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UnixSocketListener {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](EventSource::run) is called.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse one line of the wire format.
    pub fn parse_line(text: &str) -> Result<Message, UnixSocketError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl EventSource for UnixSocketListener {
    type Item = Message;
    type Error = UnixSocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the sink is dropped.  Run it on a
    /// dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Message>) -> Result<(), Self::Error> {
        // Stale socket from a previous run.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("accept error: {}", e);
                    continue;
                }
            };
            debug!("client connected");
            for line in BufReader::new(stream).lines() {
                let text = match line {
                    Ok(text) => text,
                    Err(e) => {
                        error!("read error: {}", e);
                        break;
                    }
                };
                if text.trim().is_empty() {
                    continue;
                }
                match Self::parse_line(&text) {
                    Ok(message) => {
                        debug!("received {:?}", message);
                        if sink.send(message).is_err() {
                            info!("sink closed, shutting down");
                            return Ok(());
                        }
                    }
                    Err(e) => error!("bad message {:?}: {}", text, e),
                }
            }
            debug!("client disconnected");
        }
        Ok(())
    }
}

//  Tests
