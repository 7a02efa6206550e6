//! OpenOCD Tcl RPC client
//!
//! Owns one connection to OpenOCD's Tcl RPC server (default port 6666) and
//! runs one command/reply exchange at a time over it. Replies are matched to
//! commands purely by order, so exchanges never overlap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter, ReadHalf, WriteHalf};
use tokio::sync::{Mutex, Notify};

use crate::config::ClientConfig;
use crate::error::{Result, RpcError};
use crate::events::{ClientEvent, EventObserver, TracingObserver};
use crate::frame;
use crate::transport::{Connector, TcpConnector};

/// Bound on the graceful writer shutdown in `disconnect`
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Streams bound to one open socket. The socket closes once both halves drop.
struct Connection<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: BufWriter<WriteHalf<S>>,
    /// Set while an exchange is running; still set if its future was dropped
    in_flight: bool,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn new(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
            in_flight: false,
        }
    }

    async fn exchange(&mut self, payload: &str, timeout: Option<Duration>) -> Result<String> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.round_trip(payload))
                .await
                .map_err(|_| RpcError::ResponseTimeout(limit))?,
            None => self.round_trip(payload).await,
        }
    }

    async fn round_trip(&mut self, payload: &str) -> Result<String> {
        frame::write_frame(&mut self.writer, payload).await?;
        frame::read_frame(&mut self.reader).await
    }

    /// Writer first, then reader, then the socket. Release always completes.
    ///
    /// An interrupted exchange may have left bytes in the writer that the
    /// peer will never read, so that writer is dropped without flushing.
    async fn close(self) -> Result<()> {
        let Connection { reader, mut writer, in_flight } = self;
        let result = if in_flight {
            Ok(())
        } else {
            tokio::time::timeout(CLOSE_TIMEOUT, writer.shutdown())
                .await
                .unwrap_or_else(|_| {
                    Err(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "writer shutdown timed out",
                    ))
                })
        };
        drop(writer);
        drop(reader);
        result.map_err(RpcError::from)
    }
}

/// Client for OpenOCD's Tcl RPC interface.
///
/// All methods take `&self`; share the client between tasks with an `Arc`.
/// Dropping the client closes the socket.
pub struct RpcClient<C: Connector = TcpConnector> {
    config: ClientConfig,
    connector: C,
    observer: Arc<dyn EventObserver>,
    connection: Mutex<Option<Connection<C::Stream>>>,
    connected: AtomicBool,
    /// Wakes an in-flight `send` when `disconnect` is called
    abort: Notify,
}

impl RpcClient<TcpConnector> {
    /// Create a disconnected client. No I/O happens until [`connect`](Self::connect).
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(ClientConfig::new(host, port))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_connector(config, TcpConnector)
    }

    /// Create and connect in one step
    pub async fn open(config: ClientConfig) -> Result<Self> {
        let client = Self::with_config(config);
        client.connect().await?;
        Ok(client)
    }
}

impl<C: Connector> RpcClient<C> {
    pub fn with_connector(config: ClientConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            observer: Arc::new(TracingObserver),
            connection: Mutex::new(None),
            connected: AtomicBool::new(false),
            abort: Notify::new(),
        }
    }

    /// Replace the default [`TracingObserver`]
    pub fn with_observer(mut self, observer: impl EventObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Open the socket and bind the sentinel-delimited streams to it.
    ///
    /// Fails with [`RpcError::AlreadyConnected`] if a connection is held; the
    /// existing connection is left alone.
    pub async fn connect(&self) -> Result<()> {
        let mut slot = self.connection.lock().await;
        let addr = self.config.addr();

        if slot.is_some() {
            if self.connected.load(Ordering::SeqCst) {
                return Err(RpcError::AlreadyConnected(addr));
            }
            // Left behind by a disconnect still waiting for the lock
            self.release(&mut slot, "superseded by connect");
        }

        self.observer.on_event(&ClientEvent::Connecting { addr: addr.clone() });

        let attempt = self.connector.connect(&self.config.host, self.config.port);
        let stream = match self.config.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, attempt)
                .await
                .map_err(|_| RpcError::ConnectTimeout { addr: addr.clone(), timeout })?,
            None => attempt.await,
        }
        .map_err(|source| RpcError::ConnectionFailed { addr: addr.clone(), source })?;

        *slot = Some(Connection::new(stream));
        self.connected.store(true, Ordering::SeqCst);

        self.observer.on_event(&ClientEvent::Connected { addr });
        Ok(())
    }

    /// Close the connection. A no-op when not connected.
    ///
    /// A `send` blocked on this client is woken and fails with
    /// [`RpcError::Interrupted`]. The connection is released even when
    /// closing the writer fails; that error is returned afterwards.
    pub async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.abort.notify_waiters();

        let connection = {
            let mut slot = self.connection.lock().await;
            self.connected.store(false, Ordering::SeqCst);
            slot.take()
        };

        match connection {
            Some(connection) => {
                let result = connection.close().await;
                self.observer.on_event(&ClientEvent::Disconnected { addr: self.config.addr() });
                result
            }
            None => Ok(()),
        }
    }

    /// Send a Tcl command and wait for its reply.
    ///
    /// `payload` is sent without OpenOCD's command terminator; the reply is
    /// returned without it. Calls are serialized: a second caller waits for
    /// the first exchange to finish.
    ///
    /// On any transport failure or timeout the connection is released and
    /// [`is_connected`](Self::is_connected) turns false.
    pub async fn send(&self, payload: &str) -> Result<String> {
        let mut slot = self.connection.lock().await;

        let abort = self.abort.notified();
        tokio::pin!(abort);
        abort.as_mut().enable();

        if !self.connected.load(Ordering::SeqCst) {
            return Err(RpcError::NotConnected);
        }
        let connection = slot.as_mut().ok_or(RpcError::NotConnected)?;

        if connection.in_flight {
            self.release(&mut slot, "previous request was interrupted");
            return Err(RpcError::Interrupted);
        }

        self.observer.on_event(&ClientEvent::Request { payload: payload.to_string() });

        connection.in_flight = true;
        let result = tokio::select! {
            result = connection.exchange(payload, self.config.response_timeout) => result,
            _ = abort.as_mut() => Err(RpcError::Interrupted),
        };

        match result {
            Ok(reply) => {
                connection.in_flight = false;
                self.observer.on_event(&ClientEvent::Response { payload: reply.clone() });
                Ok(reply)
            }
            // Whole frame consumed, stream still in step
            Err(err @ RpcError::InvalidResponse(_)) => {
                connection.in_flight = false;
                Err(err)
            }
            Err(RpcError::Interrupted) => {
                self.release(&mut slot, "interrupted by disconnect");
                Err(RpcError::Interrupted)
            }
            Err(err) => {
                self.release(&mut slot, &err.to_string());
                Err(err)
            }
        }
    }

    /// True while a connection is held and no failure has been detected on it
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Graceful consuming disconnect
    pub async fn close(self) -> Result<()> {
        self.disconnect().await
    }

    /// Drop a connection whose command/reply pairing can no longer be trusted
    fn release(&self, slot: &mut Option<Connection<C::Stream>>, reason: &str) {
        self.connected.store(false, Ordering::SeqCst);
        if slot.take().is_some() {
            self.observer.on_event(&ClientEvent::Released {
                addr: self.config.addr(),
                reason: reason.to_string(),
            });
        }
    }
}

impl<C: Connector> Drop for RpcClient<C> {
    fn drop(&mut self) {
        self.connected.store(false, Ordering::SeqCst);
        if self.connection.get_mut().take().is_some() {
            self.observer.on_event(&ClientEvent::Disconnected { addr: self.config.addr() });
        }
    }
}

impl<C: Connector> std::fmt::Debug for RpcClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("addr", &self.config.addr())
            .field("connected", &self.is_connected())
            .finish()
    }
}
