//! Loopback datagram relay between the web front end and the ingest loop.
//!
//! The relay is an at-most-once, unordered, size-bounded channel. One form
//! body travels as one UDP datagram; nothing is acknowledged or retried.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Destination for raw submission payloads.
#[async_trait]
pub trait PayloadSink: Send + Sync + fmt::Debug {
    /// Forward one payload, unmodified.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload was refused or could not be handed
    /// off. Success does not imply delivery.
    async fn forward(&self, payload: &[u8]) -> Result<()>;
}

/// Sending half of the relay.
#[derive(Debug)]
pub struct RelaySender {
    socket: UdpSocket,
    target: SocketAddr,
    max_payload: usize,
}

impl RelaySender {
    /// Bind an ephemeral loopback socket aimed at `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if no local socket can be bound.
    pub async fn bind(target: SocketAddr, max_payload: usize) -> Result<Self> {
        let local = match target {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::LOCALHOST, 0)),
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| Error::Bind {
                addr: local,
                source,
            })?;

        Ok(Self {
            socket,
            target,
            max_payload,
        })
    }

    /// Address datagrams are sent to.
    #[must_use]
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send one payload as a single datagram.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] without sending anything if the
    /// payload exceeds the configured bound, and [`Error::Relay`] if the
    /// socket rejects the datagram.
    pub async fn send(&self, payload: &[u8]) -> Result<()> {
        if payload.len() > self.max_payload {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: self.max_payload,
            });
        }

        let sent = self
            .socket
            .send_to(payload, self.target)
            .await
            .map_err(|e| Error::relay(format!("send to {} failed: {e}", self.target)))?;
        trace!("Sent {} byte datagram to {}", sent, self.target);
        Ok(())
    }
}

#[async_trait]
impl PayloadSink for RelaySender {
    async fn forward(&self, payload: &[u8]) -> Result<()> {
        self.send(payload).await
    }
}

/// One datagram taken off the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datagram {
    /// A payload within the size bound.
    Payload(Vec<u8>),
    /// A datagram that did not fit the bound; its content is discarded.
    Oversize {
        /// Bytes received before the datagram was cut off.
        len: usize,
    },
}

/// Receiving half of the relay.
#[derive(Debug)]
pub struct RelayReceiver {
    socket: UdpSocket,
    max_payload: usize,
    buf: Vec<u8>,
}

impl RelayReceiver {
    /// Bind the relay address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the address is unavailable.
    pub async fn bind(addr: SocketAddr, max_payload: usize) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;

        Ok(Self {
            socket,
            max_payload,
            // One spare byte tells a full-size payload from a cut-off one.
            buf: vec![0u8; max_payload + 1],
        })
    }

    /// Address the receiver is actually bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Wait for the next datagram.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Relay`] if the socket reports a receive error.
    pub async fn receive(&mut self) -> Result<Datagram> {
        let (len, src) = self
            .socket
            .recv_from(&mut self.buf)
            .await
            .map_err(|e| Error::relay(format!("receive failed: {e}")))?;

        if len > self.max_payload {
            debug!("Datagram from {} exceeds {} bytes", src, self.max_payload);
            return Ok(Datagram::Oversize { len });
        }

        trace!("Received {} byte datagram from {}", len, src);
        Ok(Datagram::Payload(self.buf[..len].to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_pair(max_payload: usize) -> (RelaySender, RelayReceiver) {
        let receiver = RelayReceiver::bind(SocketAddr::from(([127, 0, 0, 1], 0)), max_payload)
            .await
            .expect("failed to bind receiver");
        let target = receiver.local_addr().unwrap();
        let sender = RelaySender::bind(target, max_payload)
            .await
            .expect("failed to bind sender");
        (sender, receiver)
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let (sender, mut receiver) = create_test_pair(1024).await;

        sender.send(b"name=Alice&msg=Hi").await.unwrap();
        let datagram = receiver.receive().await.unwrap();

        assert_eq!(datagram, Datagram::Payload(b"name=Alice&msg=Hi".to_vec()));
    }

    #[tokio::test]
    async fn test_payload_at_bound_is_accepted() {
        let (sender, mut receiver) = create_test_pair(16).await;
        let payload = vec![b'a'; 16];

        sender.send(&payload).await.unwrap();
        assert_eq!(receiver.receive().await.unwrap(), Datagram::Payload(payload));
    }

    #[tokio::test]
    async fn test_sender_refuses_oversize_payload() {
        let (sender, _receiver) = create_test_pair(16).await;

        let err = sender.send(&[b'a'; 17]).await.unwrap_err();
        assert!(err.is_payload_too_large());
    }

    #[tokio::test]
    async fn test_receiver_drops_oversize_datagram() {
        let (_sender, mut receiver) = create_test_pair(16).await;
        let target = receiver.local_addr().unwrap();

        // Bypass the sender's own check with a raw socket.
        let raw = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        raw.send_to(&[b'a'; 100], target).await.unwrap();
        raw.send_to(b"k=v", target).await.unwrap();

        assert_eq!(
            receiver.receive().await.unwrap(),
            Datagram::Oversize { len: 17 }
        );
        assert_eq!(
            receiver.receive().await.unwrap(),
            Datagram::Payload(b"k=v".to_vec())
        );
    }

    #[tokio::test]
    async fn test_forward_through_sink_trait() {
        let (sender, mut receiver) = create_test_pair(1024).await;
        let sink: &dyn PayloadSink = &sender;

        sink.forward(b"a=1").await.unwrap();
        assert_eq!(
            receiver.receive().await.unwrap(),
            Datagram::Payload(b"a=1".to_vec())
        );
    }

    #[tokio::test]
    async fn test_bind_conflict_reports_address() {
        let first = RelayReceiver::bind(SocketAddr::from(([127, 0, 0, 1], 0)), 64)
            .await
            .unwrap();
        let addr = first.local_addr().unwrap();

        let err = RelayReceiver::bind(addr, 64).await.unwrap_err();
        assert!(matches!(err, Error::Bind { .. }));
        assert!(err.to_string().contains(&addr.to_string()));
    }
}
