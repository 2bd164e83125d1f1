use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use bytes::Bytes;
use serde::Deserialize;
use slcan_udp_proto::{CanFrame, HardwareFrame};
use tokio::sync::{mpsc, Mutex};

use crate::queue::{FlushReport, OutboundQueue, DEFAULT_CAPACITY};
use crate::transport::{Transport, UdpTransport, CAN_PORT};
use crate::util::{self, KillJoinHandle};

/// Large enough for any frame plus the padding some firmwares send.
pub const DEFAULT_READ_BUFFER: usize = 256;

const INBOUND_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    Disconnected,
    Connecting,
    Connected,
    /// Left only through [`Gateway::reset`].
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Local endpoint the socket is bound to.
    pub local: SocketAddr,
    pub queue_capacity: usize,
    pub read_buffer: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            local: SocketAddrV4::new(Ipv4Addr::new(192, 168, 131, 1), CAN_PORT).into(),
            queue_capacity: DEFAULT_CAPACITY,
            read_buffer: DEFAULT_READ_BUFFER,
        }
    }
}

/// Everything that only exists while connected.
struct Link {
    transport: UdpTransport,
    inbound: Mutex<mpsc::Receiver<io::Result<Bytes>>>,
    reader: KillJoinHandle<()>,
}

impl Link {
    fn spawn(transport: UdpTransport, read_buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(INBOUND_DEPTH);
        let reader = tokio::spawn(read_task(transport.clone(), tx, read_buffer));

        Link {
            transport,
            inbound: Mutex::new(rx),
            reader: util::kill_task_on_drop(reader),
        }
    }

    /// Stops the reader and waits for it, so that the socket is closed and
    /// the local endpoint can be bound again once this returns.
    async fn shutdown(self) {
        let Link {
            transport,
            inbound,
            reader,
        } = self;
        drop(inbound);
        reader.kill().await;
        drop(transport);
    }
}

/// Bridges [`CanFrame`]s to an SLCAN speaking MCU over UDP.
///
/// `connect` and `reset` need exclusive access; once connected the gateway
/// can be shared (e.g. in an `Arc`) between a writer calling
/// `enqueue`/`flush` and a reader calling `receive`. The two paths use
/// separate locks.
pub struct Gateway {
    config: GatewayConfig,
    state: GatewayState,
    queue: Mutex<OutboundQueue>,
    link: Option<Link>,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Gateway {
            queue: Mutex::new(OutboundQueue::with_capacity(config.queue_capacity)),
            config,
            state: GatewayState::Disconnected,
            link: None,
        }
    }

    pub fn state(&self) -> GatewayState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == GatewayState::Connected
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.link
            .as_ref()
            .and_then(|link| link.transport.local_addr().ok())
    }

    /// Binds the local endpoint, connects it to `remote` and starts the
    /// background reader. An existing connection is replaced.
    pub async fn connect(&mut self, remote: &str) -> crate::Result<()> {
        match self.state {
            GatewayState::Failed => return Err(crate::Error::Failed),
            GatewayState::Connected => log::info!("Replacing existing connection"),
            GatewayState::Disconnected | GatewayState::Connecting => {}
        }
        if let Some(link) = self.link.take() {
            link.shutdown().await;
        }

        self.state = GatewayState::Connecting;
        match UdpTransport::bind(self.config.local, remote).await {
            Ok(transport) => {
                log::info!(
                    "Connected {} -> {}",
                    self.config.local,
                    transport.remote_addr()
                );
                self.link = Some(Link::spawn(transport, self.config.read_buffer));
                self.state = GatewayState::Connected;
                Ok(())
            }
            Err(e) => {
                log::error!("Connecting to {remote} failed: {e}");
                self.state = GatewayState::Failed;
                Err(e)
            }
        }
    }

    /// Closes the connection and drops any queued frames. The local
    /// endpoint is free again when this returns.
    pub async fn reset(&mut self) {
        if let Some(link) = self.link.take() {
            link.shutdown().await;
        }
        self.queue.get_mut().clear();
        self.state = GatewayState::Disconnected;
    }

    pub async fn enqueue(&self, frame: CanFrame) -> crate::Result<()> {
        self.link()?;
        log::debug!("Queuing {frame}");
        self.queue.lock().await.enqueue(frame)?;
        Ok(())
    }

    pub async fn enqueue_hardware<H: HardwareFrame + ?Sized>(&self, frame: &H) -> crate::Result<()> {
        let frame = CanFrame::from_hardware(frame)?;
        self.enqueue(frame).await
    }

    /// Sends everything queued so far. Per-frame failures end up in the
    /// report; the queue is empty afterwards either way.
    pub async fn flush(&self) -> crate::Result<FlushReport> {
        let link = self.link()?;
        let mut queue = self.queue.lock().await;
        Ok(queue.drain_and_send(&link.transport).await)
    }

    /// Waits for the next datagram from the MCU and decodes it. Malformed
    /// datagrams are returned as errors and do not affect the connection.
    pub async fn receive(&self) -> crate::Result<CanFrame> {
        let link = self.link()?;
        let datagram = link
            .inbound
            .lock()
            .await
            .recv()
            .await
            .ok_or(crate::Error::ReaderClosed)??;

        slcan_udp_proto::decode(&datagram).map_err(|e| {
            log::warn!("Bad datagram {:?}: {}", datagram, e);
            e.into()
        })
    }

    fn link(&self) -> crate::Result<&Link> {
        match (&self.state, &self.link) {
            (GatewayState::Connected, Some(link)) => Ok(link),
            _ => Err(crate::Error::NotConnected),
        }
    }
}

/// Sole reader of the socket. Runs until the gateway drops the receiving
/// side or aborts it.
async fn read_task(transport: UdpTransport, tx: mpsc::Sender<io::Result<Bytes>>, buffer: usize) {
    let mut buf = vec![0u8; buffer];
    loop {
        let datagram = match transport.recv(&mut buf).await {
            Ok(len) => {
                log::trace!("Received {len} bytes");
                Ok(Bytes::copy_from_slice(&buf[..len]))
            }
            Err(e) => {
                log::debug!("Receive failed: {e}");
                Err(e)
            }
        };

        if tx.send(datagram).await.is_err() {
            break;
        }
    }
    log::debug!("Reader for {} exited", transport.remote_addr());
}
