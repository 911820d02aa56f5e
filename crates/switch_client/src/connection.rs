use std::{thread, time::Duration};

use crossbeam_channel::{bounded, unbounded, Sender};
use futures::StreamExt;
use shared::{
    domain::{ClientRole, DEFAULT_CONTROLLER_PORT},
    protocol::{encode_line, ClientRequest, ControllerEvent, HandshakeReply},
};
use tokio::{
    io::AsyncWriteExt,
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::{mpsc, oneshot},
};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use crate::{
    queue::NotificationQueue, ConnectError, Connector, ControllerEvents, ControllerLink,
    LinkClosed, Notification,
};

/// Longest controller line accepted; a longer one ends the connection.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

type ControllerLines = FramedRead<OwnedReadHalf, LinesCodec>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub address: String,
    /// Bound on TCP connect plus handshake.
    pub timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            address: format!("127.0.0.1:{DEFAULT_CONTROLLER_PORT}"),
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    options: ConnectOptions,
}

impl TcpConnector {
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }
}

impl Connector for TcpConnector {
    type Link = ControllerConnection;

    fn connect(&self, role: ClientRole) -> Result<Self::Link, ConnectError> {
        ControllerConnection::connect(&self.options, role)
    }
}

/// TCP link to the controller. A worker thread owns the socket and a current-thread
/// runtime; notifications cross to the caller's thread through a queue drained by `pump`.
pub struct ControllerConnection {
    role: ClientRole,
    address: String,
    client_id: u64,
    queue: NotificationQueue,
    requests: mpsc::UnboundedSender<ClientRequest>,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<thread::JoinHandle<()>>,
}

type HandshakeOutcome = Result<u64, ConnectError>;

impl ControllerConnection {
    /// Blocks until the controller accepted `role`, refused it, or `options.timeout` ran out.
    pub fn connect(options: &ConnectOptions, role: ClientRole) -> Result<Self, ConnectError> {
        let (ready_tx, ready_rx) = bounded::<HandshakeOutcome>(1);
        let (event_tx, event_rx) = unbounded::<Notification>();
        let (request_tx, request_rx) = mpsc::unbounded_channel::<ClientRequest>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let address = options.address.clone();
        let timeout = options.timeout;
        let channels = WorkerChannels {
            ready: ready_tx,
            events: event_tx,
            requests: request_rx,
            shutdown: shutdown_rx,
        };
        let worker = thread::Builder::new()
            .name("controller-link".to_string())
            .spawn(move || run_worker(address, role, timeout, channels))
            .map_err(ConnectError::Runtime)?;

        let outcome = ready_rx.recv().unwrap_or_else(|_| {
            Err(ConnectError::Protocol(
                "controller link worker exited before the handshake finished".to_string(),
            ))
        });

        match outcome {
            Ok(client_id) => {
                info!(
                    address = %options.address,
                    role = %role,
                    client_id,
                    "connected to controller"
                );
                Ok(Self {
                    role,
                    address: options.address.clone(),
                    client_id,
                    queue: NotificationQueue::new(event_rx),
                    requests: request_tx,
                    shutdown: Some(shutdown_tx),
                    worker: Some(worker),
                })
            }
            Err(err) => {
                let _ = worker.join();
                Err(err)
            }
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn client_id(&self) -> u64 {
        self.client_id
    }

    fn stop_worker(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(address = %self.address, "controller link worker panicked");
            }
        }
    }
}

impl ControllerLink for ControllerConnection {
    fn role(&self) -> ClientRole {
        self.role
    }

    fn pump(&mut self, events: &mut dyn ControllerEvents) -> usize {
        self.queue.pump(events)
    }

    fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    fn request(&mut self, request: ClientRequest) -> Result<(), LinkClosed> {
        if self.queue.is_closed() {
            return Err(LinkClosed);
        }
        self.requests.send(request).map_err(|_| LinkClosed)
    }

    fn disconnect(&mut self) {
        if self.worker.is_some() {
            debug!(address = %self.address, client_id = self.client_id, "disconnecting from controller");
        }
        self.queue.close();
        self.stop_worker();
    }
}

impl Drop for ControllerConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

struct WorkerChannels {
    ready: Sender<HandshakeOutcome>,
    events: Sender<Notification>,
    requests: mpsc::UnboundedReceiver<ClientRequest>,
    shutdown: oneshot::Receiver<()>,
}

fn run_worker(address: String, role: ClientRole, timeout: Duration, channels: WorkerChannels) {
    let WorkerChannels {
        ready,
        events,
        requests,
        shutdown,
    } = channels;

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            let _ = ready.send(Err(ConnectError::Runtime(err)));
            return;
        }
    };

    runtime.block_on(async move {
        let (lines, writer, client_id) =
            match tokio::time::timeout(timeout, handshake(&address, role)).await {
                Ok(Ok(parts)) => parts,
                Ok(Err(err)) => {
                    let _ = ready.send(Err(err));
                    return;
                }
                Err(_) => {
                    let _ = ready.send(Err(ConnectError::Timeout {
                        address: address.clone(),
                        timeout,
                    }));
                    return;
                }
            };

        if ready.send(Ok(client_id)).is_err() {
            return;
        }
        serve_link(lines, writer, events, requests, shutdown).await;
    });
}

async fn handshake(
    address: &str,
    role: ClientRole,
) -> Result<(ControllerLines, OwnedWriteHalf, u64), ConnectError> {
    let io_error = |source| ConnectError::Io {
        address: address.to_string(),
        source,
    };

    let stream = TcpStream::connect(address).await.map_err(io_error)?;
    let (read_half, mut write_half) = stream.into_split();

    let hello = encode_line(&ClientRequest::Hello { role })
        .map_err(|err| ConnectError::Protocol(format!("failed to encode hello: {err}")))?;
    write_half
        .write_all(hello.as_bytes())
        .await
        .map_err(io_error)?;

    let mut lines = FramedRead::new(read_half, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
    let reply = match lines.next().await {
        Some(Ok(reply)) => reply,
        Some(Err(LinesCodecError::Io(source))) => return Err(io_error(source)),
        Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
            return Err(ConnectError::Protocol(format!(
                "handshake reply exceeds {MAX_LINE_BYTES} bytes"
            )))
        }
        None => {
            return Err(ConnectError::Protocol(
                "controller closed the connection during the handshake".to_string(),
            ))
        }
    };

    match serde_json::from_str::<HandshakeReply>(&reply) {
        Ok(HandshakeReply::Welcome { client_id }) => Ok((lines, write_half, client_id)),
        Ok(HandshakeReply::Rejected { error }) => Err(ConnectError::Rejected { role, error }),
        Err(err) => Err(ConnectError::Protocol(format!(
            "unexpected handshake reply: {err}"
        ))),
    }
}

/// Forwards controller events to the UI queue and writes queued requests back until either
/// side goes away. Every exit caused by the controller sends exactly one `ConnectionClosed`.
async fn serve_link(
    mut lines: ControllerLines,
    mut writer: OwnedWriteHalf,
    events: Sender<Notification>,
    mut requests: mpsc::UnboundedReceiver<ClientRequest>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let close = |reason: Option<String>| {
        let _ = events.send(Notification::ConnectionClosed(reason));
    };

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("controller link stopped locally");
                return;
            }
            Some(request) = requests.recv() => {
                let line = match encode_line(&request) {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(error = %err, ?request, "dropping request that failed to encode");
                        continue;
                    }
                };
                if let Err(err) = writer.write_all(line.as_bytes()).await {
                    warn!(error = %err, "failed to send request to controller");
                    close(Some(err.to_string()));
                    return;
                }
                debug!(?request, "sent request to controller");
            }
            line = lines.next() => match line {
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ControllerEvent>(&line) {
                        Ok(event) => {
                            if events.send(event.into()).is_err() {
                                return;
                            }
                        }
                        Err(err) => warn!(error = %err, "ignoring malformed controller event"),
                    }
                }
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    warn!(limit = MAX_LINE_BYTES, "controller line too long; closing connection");
                    close(Some(format!("controller sent a line longer than {MAX_LINE_BYTES} bytes")));
                    return;
                }
                Some(Err(LinesCodecError::Io(err))) => {
                    warn!(error = %err, "controller connection failed");
                    close(Some(err.to_string()));
                    return;
                }
                None => {
                    info!("controller closed the connection");
                    close(None);
                    return;
                }
            }
        }
    }
}
