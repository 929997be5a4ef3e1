//! The session handle.
//!
//! A [`Session`] is built around an already-connected byte stream, performs
//! the handshake in [`Session::start`], and then runs two background tasks:
//!
//! - the **inbound loop** (`inbound.rs`) reads packets and routes them;
//! - the **outbound loop** (`outbound.rs`) writes queued requests.
//!
//! Callers interact only with the handle: [`Session::submit_command`] to
//! queue a request and get a [`ReplySlot`] back, or
//! [`Session::send_command`] to do both and wait.

mod framing;
mod handshake;
mod inbound;
mod outbound;
mod pending;
mod state;

pub use pending::ReplySlot;
pub use state::SessionState;

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use jdwp_core::{CommandFrame, CommandPacket, ProtocolError, ReplyPacket, HEADER_SIZE};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::SessionError;
use outbound::Envelope;
use pending::Registration;
use state::Shared;

/// Any bidirectional byte stream a session can run over.
///
/// Implemented for every `AsyncRead + AsyncWrite` type, so a `TcpStream`,
/// a TLS stream, or a `tokio::io::duplex` half in tests all qualify.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// One debugging session over one connection.
///
/// The handle is `Send + Sync`; share it between tasks with an `Arc` and
/// call [`send_command`](Self::send_command) from as many of them as you
/// like.
///
/// # Examples
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), jdwp_session::SessionError> {
/// use jdwp_session::{Session, SessionConfig};
///
/// let session = Session::connect(SessionConfig::default()).await?;
/// session.start().await?;
/// let version = session.send_command(1, 1, Vec::new()).await?;
/// println!("{} reply bytes", version.data.len());
/// session.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    config: SessionConfig,
    shared: Arc<Shared>,
    stream: Mutex<Option<Box<dyn Transport>>>,
    /// Sender half of the submission queue.  Held under an async lock so
    /// that id allocation and enqueueing happen as one step, which keeps
    /// ids in wire order.
    submit_tx: tokio::sync::Mutex<Option<mpsc::Sender<Envelope>>>,
    submit_rx: Mutex<Option<mpsc::Receiver<Envelope>>>,
    events_tx: Mutex<Option<mpsc::Sender<CommandFrame>>>,
    events_rx: Mutex<Option<mpsc::Receiver<CommandFrame>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Wraps an established connection.  The session starts `Closed`.
    pub fn new<S: Transport>(stream: S, config: SessionConfig) -> Self {
        let (submit_tx, submit_rx) = mpsc::channel(config.submit_queue_capacity.max(1));
        let (events_tx, events_rx) = mpsc::channel(config.event_queue_capacity.max(1));
        Self {
            config,
            shared: Arc::new(Shared::new()),
            stream: Mutex::new(Some(Box::new(stream))),
            submit_tx: tokio::sync::Mutex::new(Some(submit_tx)),
            submit_rx: Mutex::new(Some(submit_rx)),
            events_tx: Mutex::new(Some(events_tx)),
            events_rx: Mutex::new(Some(events_rx)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Dials `config.host:config.port` and wraps the connection.
    ///
    /// # Errors
    ///
    /// [`SessionError::Connect`] if the dial fails or exceeds
    /// `config.connect_timeout`.
    pub async fn connect(config: SessionConfig) -> Result<Self, SessionError> {
        let addr = config.address();
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| SessionError::Connect {
                addr: addr.clone(),
                source: io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no connection within {:?}", config.connect_timeout),
                ),
            })?
            .map_err(|source| SessionError::Connect {
                addr: addr.clone(),
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("could not disable Nagle on {addr}: {e}");
        }
        info!("connected to {addr}");
        Ok(Self::new(stream, config))
    }

    /// The settings this session was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending_len()
    }

    /// Performs the handshake and launches the inbound and outbound loops.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidState`] unless the session is `Closed` and
    ///   has never been started.
    /// - [`SessionError::Handshake`] if the exchange fails; the session is
    ///   then `Failed`.
    pub async fn start(&self) -> Result<(), SessionError> {
        let mut stream = self.take_stream()?;

        if let Err(e) = handshake::perform(&mut stream, &self.config).await {
            self.shared
                .transition("fail", SessionState::Handshaking, SessionState::Failed)?;
            // Close both queues so nobody waits on a session that never opened.
            take(&self.events_tx);
            take(&self.submit_rx);
            return Err(e);
        }
        self.shared
            .transition("start", SessionState::Handshaking, SessionState::Open)?;

        let queue = take(&self.submit_rx).ok_or(SessionError::ChannelClosed)?;
        let events = take(&self.events_tx).ok_or(SessionError::ChannelClosed)?;
        let (reader, writer) = tokio::io::split(stream);

        let inbound = tokio::spawn(inbound::run(
            reader,
            Arc::clone(&self.shared),
            events,
            self.shared.subscribe_stop(),
            self.config.read_timeout,
        ));
        let outbound = tokio::spawn(outbound::run(
            writer,
            Arc::clone(&self.shared),
            queue,
            self.shared.subscribe_stop(),
            self.config.write_timeout,
        ));
        lock(&self.tasks).extend([inbound, outbound]);

        info!("session open");
        Ok(())
    }

    /// Stops an open session.
    ///
    /// Closes the submission queue, stops both loops, shuts down the write
    /// half of the connection, and releases every waiting caller with
    /// [`SessionError::ChannelClosed`].  Returns once both loops have exited.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] unless the session is `Open`.
    pub async fn stop(&self) -> Result<(), SessionError> {
        self.shared
            .transition("stop", SessionState::Open, SessionState::Closed)?;

        let released = self.shared.release_pending();
        if released > 0 {
            debug!("stop released {released} pending requests");
        }
        self.submit_tx.lock().await.take();

        let tasks = std::mem::take(&mut *lock(&self.tasks));
        for task in tasks {
            if let Err(e) = task.await {
                warn!("session task ended abnormally: {e}");
            }
        }
        info!("session stopped");
        Ok(())
    }

    /// Takes the receiver of unsolicited command packets (events).
    ///
    /// There is a single consumer: the first call returns the receiver and
    /// later calls return `None`.  The receiver yields `None` once the
    /// session has stopped or failed.
    pub fn take_command_receiver(&self) -> Option<mpsc::Receiver<CommandFrame>> {
        take(&self.events_rx)
    }

    /// Queues a request and returns the slot its reply will arrive on.
    ///
    /// The request is registered in the correlation table before it is
    /// queued, so its reply can never arrive unannounced.
    ///
    /// Submitters take turns: id allocation and enqueueing happen under one
    /// lock so ids reach the wire in order.  While the submission queue is
    /// full, the submitter waiting for room holds that lock, so every other
    /// submitter waits too.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidState`] unless the session is `Open`.
    /// - [`SessionError::Framing`] if the payload is too large to frame.
    /// - [`SessionError::ChannelClosed`] if the session ended while queueing.
    pub async fn submit(&self, packet: CommandPacket) -> Result<ReplySlot, SessionError> {
        if packet.data.len() > u32::MAX as usize - HEADER_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                len: packet.data.len(),
            }
            .into());
        }

        let queue = self.submit_tx.lock().await;
        let Some(sender) = queue.as_ref() else {
            return Err(SessionError::InvalidState {
                operation: "submit a command",
                state: self.state(),
            });
        };

        let (tx, rx) = oneshot::channel();
        let id = self.shared.register(tx)?;
        // Unregisters the request if queueing fails or this future is dropped.
        let registration = Registration::new(&self.shared, id);
        debug!(
            "submitting command {id} ({}, {})",
            packet.command_set, packet.command
        );
        sender
            .send(Envelope { id, packet })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        registration.keep();
        Ok(ReplySlot::new(id, rx, Arc::clone(&self.shared)))
    }

    /// Queues `(command_set, command)` with `payload`; see [`submit`](Self::submit).
    pub async fn submit_command(
        &self,
        command_set: u8,
        command: u8,
        payload: Vec<u8>,
    ) -> Result<ReplySlot, SessionError> {
        self.submit(CommandPacket::with_data(command_set, command, payload))
            .await
    }

    /// Sends a command and waits for its reply.
    ///
    /// A non-zero error code in the reply is *not* an error here; inspect
    /// [`ReplyPacket::error_code`].
    pub async fn send_command(
        &self,
        command_set: u8,
        command: u8,
        payload: Vec<u8>,
    ) -> Result<ReplyPacket, SessionError> {
        self.submit_command(command_set, command, payload)
            .await?
            .wait()
            .await
    }

    /// Like [`send_command`](Self::send_command), but gives up after
    /// `deadline` with [`SessionError::Timeout`].  The deadline covers
    /// queueing as well as waiting.
    pub async fn send_command_timeout(
        &self,
        command_set: u8,
        command: u8,
        payload: Vec<u8>,
        deadline: Duration,
    ) -> Result<ReplyPacket, SessionError> {
        let started = tokio::time::Instant::now();
        let slot = tokio::time::timeout(
            deadline,
            self.submit_command(command_set, command, payload),
        )
        .await
        .map_err(|_| SessionError::Timeout(deadline))??;
        let remaining = deadline.saturating_sub(started.elapsed());
        slot.wait_timeout(remaining).await
    }

    /// Moves `Closed` → `Handshaking` and hands out the stream, exactly once.
    fn take_stream(&self) -> Result<Box<dyn Transport>, SessionError> {
        let mut stream = lock(&self.stream);
        if stream.is_none() {
            return Err(SessionError::InvalidState {
                operation: "start",
                state: self.state(),
            });
        }
        self.shared
            .transition("start", SessionState::Closed, SessionState::Handshaking)?;
        stream.take().ok_or(SessionError::ChannelClosed)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Loops outlive the handle only until they notice the signal.
        self.shared.signal_stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    lock(slot).take()
}
