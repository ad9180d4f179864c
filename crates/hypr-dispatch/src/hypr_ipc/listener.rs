//! Hyprland event socket listener
//!
//! `EventListener` owns the connection to `.socket2.sock`, reads the event
//! stream, frames it into `KIND>>PAYLOAD` lines and hands each event to a
//! [`Dispatcher`] in arrival order. The socket is receive-only; nothing is
//! ever written to it.
//!
//! ## Read loop
//!
//! Each iteration performs one read of up to [`READ_BUFFER_SIZE`] bytes and
//! dispatches every complete line in it before reading again. Handlers run
//! on the listener task, so a slow handler delays every later event.
//!
//! Errors are contained per iteration:
//!
//! - Malformed lines are dropped silently
//! - Read failures and handler errors or panics are logged, and the loop
//!   continues on the same connection
//! - A zero-byte read, connection reset or broken pipe triggers reconnection
//!
//! ## Reconnection
//!
//! - Backoff starts at 500ms, doubles each retry, caps at 10 seconds
//! - Default max retries: 5
//! - If reconnection fails, `run()` returns `HyprError::MaxRetriesExceeded`

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Duration;

use hypr_dispatch_config::ReconnectConfig;
use tokio::io::AsyncReadExt;
use tokio::net::UnixStream;
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};

use super::error::HyprError;
use super::frame::FrameDecoder;
use crate::dispatcher::Dispatcher;
use crate::event::Event;

/// Maximum number of bytes requested from the socket per read
pub const READ_BUFFER_SIZE: usize = 4096;

/// Backoff settings used when (re)connecting to the event socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Retries after the first failed attempt (0 means try once)
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectConfig::default().into()
    }
}

impl From<ReconnectConfig> for ReconnectPolicy {
    fn from(config: ReconnectConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

/// Long-lived reader of the Hyprland event socket
///
/// # Example
///
/// ```ignore
/// let socket_path = get_socket_path(&default_socket_base())?;
/// let listener = EventListener::connect(socket_path).await?;
/// listener.run(&dispatcher).await?;
/// ```
#[derive(Debug)]
pub struct EventListener {
    stream: UnixStream,
    /// The socket path (used for reconnection and error messages)
    socket_path: PathBuf,
    decoder: FrameDecoder,
    policy: ReconnectPolicy,
}

impl EventListener {
    /// Connect to the event socket at `socket_path`
    ///
    /// # Errors
    ///
    /// Returns `HyprError::SocketNotFound` if the socket path doesn't exist.
    /// Returns `HyprError::ConnectionFailed` if the connection fails.
    pub async fn connect(socket_path: PathBuf) -> Result<Self, HyprError> {
        if !socket_path.exists() {
            return Err(HyprError::SocketNotFound { path: socket_path });
        }

        let stream = UnixStream::connect(&socket_path)
            .await
            .map_err(|e| HyprError::ConnectionFailed {
                path: socket_path.clone(),
                source: e,
            })?;

        debug!("Connected to Hyprland event socket at {}", socket_path.display());

        Ok(Self::from_stream(stream, socket_path))
    }

    /// Connect with retry logic and exponential backoff
    ///
    /// The returned listener keeps `policy` for later reconnections.
    ///
    /// # Errors
    ///
    /// Returns `HyprError::MaxRetriesExceeded` if all attempts fail.
    /// The error contains the total number of attempts made.
    pub async fn connect_with_retry(
        socket_path: &Path,
        policy: ReconnectPolicy,
    ) -> Result<Self, HyprError> {
        let mut attempt = 0;
        let mut delay = policy.initial_delay;
        let last_error = loop {
            attempt += 1;

            match Self::connect(socket_path.to_path_buf()).await {
                Ok(listener) => {
                    if attempt > 1 {
                        info!(
                            "Hyprland event socket connected after {} attempt(s)",
                            attempt
                        );
                    }
                    return Ok(listener.with_policy(policy));
                }
                Err(e) => {
                    if attempt > policy.max_retries {
                        break e;
                    }

                    warn!(
                        attempt = attempt,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Hyprland event socket connection failed, retrying..."
                    );

                    sleep(delay).await;

                    delay = (delay * 2).min(policy.max_delay);
                }
            }
        };

        warn!(
            attempts = attempt,
            last_error = %last_error,
            "Failed to connect to Hyprland event socket after all retry attempts"
        );

        Err(HyprError::MaxRetriesExceeded { attempts: attempt })
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: UnixStream, socket_path: PathBuf) -> Self {
        Self {
            stream,
            socket_path,
            decoder: FrameDecoder::new(),
            policy: ReconnectPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Perform one socket read and return the events it completed
    ///
    /// Malformed lines are dropped. A line cut off at the end of the read is
    /// kept until the next call.
    ///
    /// # Errors
    ///
    /// Returns `HyprError::ConnectionClosed` on a zero-byte read.
    /// Returns `HyprError::ReadFailed` if reading from the socket fails.
    pub async fn read_events(&mut self) -> Result<Vec<Event>, HyprError> {
        let mut buf = [0u8; READ_BUFFER_SIZE];

        let bytes_read = self
            .stream
            .read(&mut buf)
            .await
            .map_err(HyprError::ReadFailed)?;

        if bytes_read == 0 {
            return Err(HyprError::ConnectionClosed);
        }

        let mut events = Vec::new();
        for result in self.decoder.decode(&buf[..bytes_read]) {
            match result {
                Ok(event) => events.push(event),
                Err(e) => trace!("Dropping malformed event line: {}", e),
            }
        }

        Ok(events)
    }

    /// Run a single read-parse-dispatch iteration
    ///
    /// Returns the number of events dispatched. The first handler failure
    /// aborts the rest of this iteration's events and is returned.
    pub async fn run_once(&mut self, dispatcher: &Dispatcher) -> Result<usize, HyprError> {
        let events = self.read_events().await?;

        for event in &events {
            trace!(kind = %event.kind, payload = %event.payload, "Dispatching event");
            dispatch_guarded(dispatcher, event)?;
        }

        Ok(events.len())
    }

    /// Read and dispatch events until the connection is lost for good
    ///
    /// Only returns when reconnection is exhausted; every other error is
    /// logged and the loop continues with the next read.
    pub async fn run(mut self, dispatcher: &Dispatcher) -> Result<(), HyprError> {
        info!(
            "Listening for Hyprland events on {}",
            self.socket_path.display()
        );

        loop {
            match self.run_once(dispatcher).await {
                Ok(_) => {}
                Err(e) if e.is_disconnect() => {
                    warn!(
                        "Hyprland event socket disconnected ({}). Attempting to reconnect...",
                        e
                    );
                    self.reconnect().await?;
                }
                Err(e) => {
                    error!("Error handling event: {}", e);
                }
            }
        }
    }

    async fn reconnect(&mut self) -> Result<(), HyprError> {
        match Self::connect_with_retry(&self.socket_path, self.policy).await {
            Ok(fresh) => {
                info!("Hyprland event socket reconnected successfully");
                self.stream = fresh.stream;
                self.decoder.clear();
                Ok(())
            }
            Err(e) => {
                warn!("Failed to reconnect to Hyprland event socket: {}", e);
                Err(e)
            }
        }
    }
}

/// Dispatch one event, turning a handler panic into `HyprError::HandlerPanicked`
fn dispatch_guarded(dispatcher: &Dispatcher, event: &Event) -> Result<usize, HyprError> {
    match panic::catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch(event))) {
        Ok(result) => Ok(result?),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Err(HyprError::HandlerPanicked {
                kind: event.kind.clone(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;
    use tokio::net::UnixListener;

    type Seen = Rc<RefCell<Vec<Event>>>;

    fn recording_dispatcher(kinds: &[&str]) -> (Dispatcher, Seen) {
        let seen = Seen::default();
        let mut dispatcher = Dispatcher::new();
        for kind in kinds {
            let seen = Rc::clone(&seen);
            dispatcher.register(*kind, move |event: &Event| {
                seen.borrow_mut().push(event.clone());
                Ok(())
            });
        }
        (dispatcher, seen)
    }

    fn paired_listener() -> (EventListener, UnixStream) {
        let (client, server) = UnixStream::pair().unwrap();
        let listener =
            EventListener::from_stream(client, PathBuf::from("/nonexistent/.socket2.sock"));
        (listener, server)
    }

    fn fast_policy(max_retries: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            max_retries,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_batched_read_dispatches_in_order() {
        let (mut listener, mut server) = paired_listener();
        let (dispatcher, seen) = recording_dispatcher(&["activewindow", "workspace"]);

        server
            .write_all(b"activewindow>>firefox,Mozilla Firefox\nworkspace>>2\n")
            .await
            .unwrap();

        let dispatched = listener.run_once(&dispatcher).await.unwrap();

        assert_eq!(dispatched, 2);
        assert_eq!(
            *seen.borrow(),
            [
                Event::new("activewindow", "firefox,Mozilla Firefox"),
                Event::new("workspace", "2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_noise_line_is_dropped() {
        let (mut listener, mut server) = paired_listener();
        let (dispatcher, seen) = recording_dispatcher(&["workspace"]);

        server
            .write_all(b"workspace>>1\nnoise\nworkspace>>2\n")
            .await
            .unwrap();

        assert_eq!(listener.run_once(&dispatcher).await.unwrap(), 2);
        assert_eq!(
            *seen.borrow(),
            [Event::new("workspace", "1"), Event::new("workspace", "2")]
        );
    }

    #[tokio::test]
    async fn test_payload_keeps_later_delimiters() {
        let (mut listener, mut server) = paired_listener();
        let (dispatcher, seen) = recording_dispatcher(&["x"]);

        server.write_all(b"x>>a>>b>>c\n").await.unwrap();
        listener.run_once(&dispatcher).await.unwrap();

        assert_eq!(*seen.borrow(), [Event::new("x", "a>>b>>c")]);
    }

    #[tokio::test]
    async fn test_unregistered_kinds_are_ignored() {
        let (mut listener, mut server) = paired_listener();
        let (dispatcher, seen) = recording_dispatcher(&["workspace"]);

        server.write_all(b"openlayer>>waybar\n").await.unwrap();

        assert_eq!(listener.run_once(&dispatcher).await.unwrap(), 1);
        assert!(seen.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_partial_line_completes_on_next_read() {
        let (mut listener, mut server) = paired_listener();
        let (dispatcher, seen) = recording_dispatcher(&["activewindow"]);

        server.write_all(b"activewindow>>kit").await.unwrap();
        assert_eq!(listener.run_once(&dispatcher).await.unwrap(), 0);

        server.write_all(b"ty,zsh\n").await.unwrap();
        assert_eq!(listener.run_once(&dispatcher).await.unwrap(), 1);

        assert_eq!(*seen.borrow(), [Event::new("activewindow", "kitty,zsh")]);
    }

    #[tokio::test]
    async fn test_handler_error_is_contained_to_iteration() {
        let (mut listener, mut server) = paired_listener();
        let (mut dispatcher, seen) = recording_dispatcher(&["workspace"]);
        dispatcher.register("activewindow", |_: &Event| anyhow::bail!("no comma"));

        server
            .write_all(b"activewindow>>broken\nworkspace>>1\n")
            .await
            .unwrap();

        let err = listener.run_once(&dispatcher).await.unwrap_err();
        assert!(matches!(err, HyprError::Handler(ref e) if e.kind == "activewindow"));
        assert!(!err.is_disconnect());
        // The rest of the failed batch is abandoned
        assert!(seen.borrow().is_empty());

        server.write_all(b"workspace>>2\n").await.unwrap();
        assert_eq!(listener.run_once(&dispatcher).await.unwrap(), 1);
        assert_eq!(*seen.borrow(), [Event::new("workspace", "2")]);
    }

    #[tokio::test]
    async fn test_handler_panic_is_caught() {
        let (mut listener, mut server) = paired_listener();
        let (mut dispatcher, seen) = recording_dispatcher(&["workspace"]);
        dispatcher.register("activewindow", |_: &Event| -> anyhow::Result<()> {
            panic!("handler exploded")
        });

        server.write_all(b"activewindow>>a,b\n").await.unwrap();

        match listener.run_once(&dispatcher).await {
            Err(HyprError::HandlerPanicked { kind, message }) => {
                assert_eq!(kind, "activewindow");
                assert!(message.contains("handler exploded"), "{}", message);
            }
            other => panic!("Expected HandlerPanicked, got: {:?}", other),
        }

        server.write_all(b"workspace>>5\n").await.unwrap();
        listener.run_once(&dispatcher).await.unwrap();
        assert_eq!(*seen.borrow(), [Event::new("workspace", "5")]);
    }

    #[tokio::test]
    async fn test_zero_byte_read_is_connection_closed() {
        let (mut listener, server) = paired_listener();
        let (dispatcher, _seen) = recording_dispatcher(&[]);

        drop(server);

        let err = listener.run_once(&dispatcher).await.unwrap_err();
        assert!(matches!(err, HyprError::ConnectionClosed));
        assert!(err.is_disconnect());
    }

    #[tokio::test]
    async fn test_connect_to_missing_socket() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join(".socket2.sock");

        match EventListener::connect(socket_path.clone()).await {
            Err(HyprError::SocketNotFound { path }) => assert_eq!(path, socket_path),
            other => panic!("Expected SocketNotFound, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_to_non_socket_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join(".socket2.sock");
        std::fs::write(&socket_path, "").unwrap();

        match EventListener::connect(socket_path.clone()).await {
            Err(HyprError::ConnectionFailed { path, .. }) => assert_eq!(path, socket_path),
            other => panic!("Expected ConnectionFailed, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_with_retry_reports_attempts() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join(".socket2.sock");

        match EventListener::connect_with_retry(&socket_path, fast_policy(2)).await {
            Err(HyprError::MaxRetriesExceeded { attempts }) => assert_eq!(attempts, 3),
            other => panic!("Expected MaxRetriesExceeded, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_with_zero_retries_tries_once() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join(".socket2.sock");

        match EventListener::connect_with_retry(&socket_path, fast_policy(0)).await {
            Err(HyprError::MaxRetriesExceeded { attempts }) => assert_eq!(attempts, 1),
            other => panic!("Expected MaxRetriesExceeded, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_reads_from_real_socket() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join(".socket2.sock");
        let server = UnixListener::bind(&socket_path).unwrap();

        let mut listener = EventListener::connect(socket_path.clone()).await.unwrap();
        assert_eq!(listener.socket_path(), socket_path.as_path());

        let (mut conn, _) = server.accept().await.unwrap();
        conn.write_all(b"workspace>>3\n").await.unwrap();

        assert_eq!(
            listener.read_events().await.unwrap(),
            [Event::new("workspace", "3")]
        );
    }

    #[tokio::test]
    async fn test_run_gives_up_when_socket_disappears() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join(".socket2.sock");
        let server = UnixListener::bind(&socket_path).unwrap();

        let listener = EventListener::connect(socket_path.clone())
            .await
            .unwrap()
            .with_policy(fast_policy(1));
        let (conn, _) = server.accept().await.unwrap();

        // Compositor goes away for good
        drop(conn);
        drop(server);
        std::fs::remove_file(&socket_path).unwrap();

        let (dispatcher, _seen) = recording_dispatcher(&[]);
        match listener.run(&dispatcher).await {
            Err(HyprError::MaxRetriesExceeded { attempts }) => assert_eq!(attempts, 2),
            other => panic!("Expected MaxRetriesExceeded, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_reconnects_after_disconnect() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join(".socket2.sock");
        let server = UnixListener::bind(&socket_path).unwrap();

        let listener = EventListener::connect(socket_path.clone())
            .await
            .unwrap()
            .with_policy(fast_policy(3));

        let done = Rc::new(Cell::new(false));
        let (mut dispatcher, seen) = recording_dispatcher(&["workspace"]);
        {
            let done = Rc::clone(&done);
            dispatcher.register("workspace", move |_: &Event| {
                done.set(true);
                Ok(())
            });
        }

        let compositor = async {
            // First connection: send a partial line, then hang up
            let (mut first, _) = server.accept().await.unwrap();
            first.write_all(b"workspace>>st").await.unwrap();
            drop(first);

            // Second connection: deliver a complete event
            let (mut second, _) = server.accept().await.unwrap();
            second.write_all(b"workspace>>4\n").await.unwrap();

            while !done.get() {
                sleep(Duration::from_millis(5)).await;
            }
            second
        };

        tokio::select! {
            result = listener.run(&dispatcher) => panic!("run() returned early: {:?}", result),
            _second = compositor => {}
        }

        // The partial line from the dropped connection was discarded
        assert_eq!(*seen.borrow(), [Event::new("workspace", "4")]);
    }
}
