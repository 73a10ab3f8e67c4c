//! Streaming connection lifecycle
//!
//! One persistent WebSocket connection with a spawned listen loop.
//! `start` never blocks the caller; `close` signals the loop and joins it,
//! so no callback fires after `close` returns. There is no automatic
//! reconnect: a failed or dropped connection leaves the instance closed
//! and a new one must be constructed.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::client::IntoClientRequest,
    tungstenite::http::HeaderValue,
    tungstenite::protocol::Message,
};
use tracing::{debug, info, warn};

use crate::auth::SignedRequest;
use crate::error::{GeminiError, Result};

/// Lifecycle states of a streaming connection.
///
/// `Idle → Connecting → Listening → (Closing) → Closed`; `Closed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Idle = 0,
    Connecting = 1,
    Listening = 2,
    Closing = 3,
    Closed = 4,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Idle,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Listening,
            3 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

/// Callbacks fired from the listen loop.
///
/// Transport and decode problems arrive here because they originate off
/// the caller's path. All methods default to no-ops.
pub trait ConnectionHooks: Send + Sync + 'static {
    /// The connection is established and listening.
    fn on_open(&self) {}

    /// A raw text frame arrived, before decoding.
    fn on_message(&self, _raw: &str) {}

    /// Connect failure or mid-stream transport error. Terminal.
    fn on_error(&self, _err: &GeminiError) {}

    /// The connection ended, normally or not. Fires exactly once per
    /// established connection.
    fn on_close(&self) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default)]
pub struct NoopHooks;

impl ConnectionHooks for NoopHooks {}

struct Worker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// A single persistent streaming connection.
pub(crate) struct Connection {
    url: String,
    state: Arc<AtomicU8>,
    hooks: Arc<dyn ConnectionHooks>,
    worker: Mutex<Option<Worker>>,
}

impl Connection {
    pub(crate) fn new(url: String, hooks: Arc<dyn ConnectionHooks>) -> Self {
        Self {
            url,
            state: Arc::new(AtomicU8::new(ConnectionState::Idle as u8)),
            hooks,
            worker: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// Begin connecting and spawn the listen loop. Only `Idle` accepts
    /// this; a second call is a usage error.
    pub(crate) async fn start<D, Fut>(
        &self,
        auth: Option<SignedRequest>,
        on_frame: D,
    ) -> Result<()>
    where
        D: FnMut(String) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut worker = self.worker.lock().await;
        let idle = self.state.compare_exchange(
            ConnectionState::Idle as u8,
            ConnectionState::Connecting as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if idle.is_err() {
            return Err(GeminiError::AlreadyStarted);
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            self.url.clone(),
            auth,
            self.state.clone(),
            self.hooks.clone(),
            shutdown_rx,
            on_frame,
        ));
        *worker = Some(Worker { shutdown, handle });
        Ok(())
    }

    /// Signal the listen loop to stop and wait for it to fully
    /// terminate. Only `Connecting` or `Listening` accept this.
    pub(crate) async fn close(&self) -> Result<()> {
        let mut worker = self.worker.lock().await;
        let state = self.state();
        if !matches!(
            state,
            ConnectionState::Connecting | ConnectionState::Listening
        ) {
            return Err(GeminiError::NotRunning);
        }
        self.state
            .store(ConnectionState::Closing as u8, Ordering::Release);

        if let Some(Worker { shutdown, handle }) = worker.take() {
            let _ = shutdown.send(true);
            let _ = handle.await;
        }
        // The loop may have been racing a remote close; it has exited
        // either way, so the terminal state always lands.
        self.state
            .store(ConnectionState::Closed as u8, Ordering::Release);
        Ok(())
    }
}

async fn run_loop<D, Fut>(
    url: String,
    auth: Option<SignedRequest>,
    state: Arc<AtomicU8>,
    hooks: Arc<dyn ConnectionHooks>,
    mut shutdown: watch::Receiver<bool>,
    mut on_frame: D,
) where
    D: FnMut(String) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let request = match build_request(&url, auth.as_ref()) {
        Ok(request) => request,
        Err(e) => {
            state.store(ConnectionState::Closed as u8, Ordering::Release);
            hooks.on_error(&e);
            return;
        }
    };

    info!(url = %url, "Connecting");
    let ws = tokio::select! {
        _ = shutdown.changed() => {
            state.store(ConnectionState::Closed as u8, Ordering::Release);
            return;
        }
        connected = connect_async(request) => match connected {
            Ok((ws, response)) => {
                debug!(status = ?response.status(), "WebSocket connected");
                ws
            }
            Err(e) => {
                state.store(ConnectionState::Closed as u8, Ordering::Release);
                hooks.on_error(&e.into());
                return;
            }
        }
    };

    state.store(ConnectionState::Listening as u8, Ordering::Release);
    hooks.on_open();

    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!("Shutdown requested");
                break;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    hooks.on_message(&text);
                    on_frame(text).await;
                }
                Some(Ok(Message::Binary(data))) => {
                    match String::from_utf8(data) {
                        Ok(text) => {
                            hooks.on_message(&text);
                            on_frame(text).await;
                        }
                        Err(e) => warn!(error = %e, "Discarding non-UTF-8 binary frame"),
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    warn!(frame = ?frame, "Received close frame");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    hooks.on_error(&e.into());
                    break;
                }
                None => {
                    warn!("WebSocket stream ended");
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
    state.store(ConnectionState::Closed as u8, Ordering::Release);
    hooks.on_close();
}

fn build_request(
    url: &str,
    auth: Option<&SignedRequest>,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request> {
    let mut request = url
        .into_client_request()
        .map_err(|e| GeminiError::WebSocketConnection(e.to_string()))?;

    if let Some(signed) = auth {
        let headers = request.headers_mut();
        for (name, value) in signed.headers() {
            let value = HeaderValue::from_str(value)
                .map_err(|e| GeminiError::WebSocketConnection(e.to_string()))?;
            headers.insert(name, value);
        }
    }
    Ok(request)
}
