//! Datagram carrier for wire frames.

use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::net::UdpSocket;

/// Well known port of the motor controller gateway.
pub const CAN_PORT: u16 = 11412;

/// Send and receive whole datagrams.
pub trait Transport {
    /// Writes one datagram. Implementations fail rather than send a partial one.
    fn send<'a>(
        &'a self,
        datagram: &'a [u8],
    ) -> impl Future<Output = io::Result<usize>> + Send + 'a;

    /// Reads one datagram into `buf`, returning its length.
    fn recv<'a>(
        &'a self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = io::Result<usize>> + Send + 'a;
}

/// A UDP socket bound locally and connected to the gateway MCU.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
}

impl UdpTransport {
    /// `remote` may omit the port, in which case [`CAN_PORT`] is used.
    pub async fn bind(local: SocketAddr, remote: &str) -> crate::Result<Self> {
        let remote = resolve(remote, local.is_ipv4()).await?;

        let socket = UdpSocket::bind(local).await?;
        socket.connect(remote).await?;

        Ok(UdpTransport {
            socket: Arc::new(socket),
            remote,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }
}

impl Transport for UdpTransport {
    fn send<'a>(
        &'a self,
        datagram: &'a [u8],
    ) -> impl Future<Output = io::Result<usize>> + Send + 'a {
        async move {
            let sent = self.socket.send(datagram).await?;
            if sent < datagram.len() {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("short send: {sent} of {} bytes", datagram.len()),
                ));
            }
            Ok(sent)
        }
    }

    fn recv<'a>(
        &'a self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = io::Result<usize>> + Send + 'a {
        self.socket.recv(buf)
    }
}

async fn resolve(remote: &str, ipv4: bool) -> crate::Result<SocketAddr> {
    let lookup: io::Result<Vec<SocketAddr>> =
        if remote.parse::<IpAddr>().is_ok() || !remote.contains(':') {
            tokio::net::lookup_host((remote, CAN_PORT))
                .await
                .map(Iterator::collect)
        } else {
            tokio::net::lookup_host(remote).await.map(Iterator::collect)
        };

    lookup
        .map_err(|source| crate::Error::Resolve {
            addr: remote.to_owned(),
            source,
        })?
        .into_iter()
        .find(|addr| addr.is_ipv4() == ipv4)
        .ok_or_else(|| crate::Error::NoAddress {
            addr: remote.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_with_default_port() {
        let addr = resolve("127.0.0.1", true).await.unwrap();
        assert_eq!(addr, "127.0.0.1:11412".parse().unwrap());

        let addr = resolve("127.0.0.1:4000", true).await.unwrap();
        assert_eq!(addr.port(), 4000);
    }

    #[tokio::test]
    async fn resolve_filters_address_family() {
        assert!(matches!(
            resolve("[::1]:4000", true).await,
            Err(crate::Error::NoAddress { .. })
        ));
    }

    #[tokio::test]
    async fn resolve_error_keeps_cause() {
        let err = resolve("127.0.0.1:notaport", true).await.unwrap_err();
        assert!(matches!(err, crate::Error::Resolve { .. }));

        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<io::Error>().is_some());
        assert!(err.to_string().starts_with("Could not resolve 127.0.0.1:notaport: "));
    }

    #[tokio::test]
    async fn sends_whole_datagrams() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap().to_string();

        let transport = UdpTransport::bind("127.0.0.1:0".parse().unwrap(), &peer_addr)
            .await
            .unwrap();
        peer.connect(transport.local_addr().unwrap()).await.unwrap();

        assert_eq!(transport.send(b"T000000010\r").await.unwrap(), 11);
        let mut buf = [0u8; 64];
        let n = peer.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"T000000010\r");

        peer.send(b"R000000020\r").await.unwrap();
        let n = transport.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"R000000020\r");
    }
}
