//! In-memory transport pair.
//!
//! [`ChannelTransport`] plays the client side of a connection and
//! [`ChannelPeer`] the server side. Useful for embedding a session in-process
//! and for driving sessions in tests without a network.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::{
    protocol::{ClientFrame, ServerEvent},
    transport::{Transport, TransportError},
};

/// Client side of an in-memory connection.
pub struct ChannelTransport {
    client_tx: Option<mpsc::UnboundedSender<ClientFrame>>,
    server_rx: mpsc::UnboundedReceiver<ServerEvent>,
    released_tx: Option<oneshot::Sender<()>>,
    releases: Arc<AtomicUsize>,
}

impl ChannelTransport {
    /// Create a connected transport and its peer.
    #[must_use]
    pub fn pair() -> (Self, ChannelPeer) {
        let (client_tx, client_rx) = mpsc::unbounded_channel();
        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (released_tx, released_rx) = oneshot::channel();
        let releases = Arc::new(AtomicUsize::new(0));

        let transport = Self {
            client_tx: Some(client_tx),
            server_rx,
            released_tx: Some(released_tx),
            releases: Arc::clone(&releases),
        };

        let peer = ChannelPeer {
            client_rx,
            server_tx: Some(server_tx),
            released_rx: Some(released_rx),
            releases,
        };

        (transport, peer)
    }

    fn release(&mut self) {
        if let Some(tx) = self.released_tx.take() {
            self.client_tx = None;
            self.server_rx.close();
            self.releases.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(());
            tracing::debug!("channel transport released");
        }
    }
}

impl Drop for ChannelTransport {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, frame: &ClientFrame) -> Result<(), TransportError> {
        let tx = self.client_tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(frame.clone()).map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Result<ServerEvent, TransportError> {
        if self.released_tx.is_none() {
            return Err(TransportError::Closed);
        }
        self.server_rx.recv().await.ok_or(TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.release();
        Ok(())
    }
}

/// Server side of an in-memory connection.
pub struct ChannelPeer {
    client_rx: mpsc::UnboundedReceiver<ClientFrame>,
    server_tx: Option<mpsc::UnboundedSender<ServerEvent>>,
    released_rx: Option<oneshot::Receiver<()>>,
    releases: Arc<AtomicUsize>,
}

impl ChannelPeer {
    /// Push an event to the client.
    ///
    /// # Errors
    /// Returns error if either side has closed the connection.
    pub fn send(&self, event: ServerEvent) -> Result<(), TransportError> {
        self.server_tx
            .as_ref()
            .ok_or(TransportError::Closed)?
            .send(event)
            .map_err(|_| TransportError::Closed)
    }

    /// Decode a raw JSON frame and push it to the client.
    ///
    /// # Errors
    /// Returns error if the frame does not decode or the connection is closed.
    pub fn send_raw(&self, frame: &str) -> Result<(), TransportError> {
        self.send(ServerEvent::decode(frame)?)
    }

    /// Receive the next client frame, `None` once the client is gone.
    pub async fn recv(&mut self) -> Option<ClientFrame> {
        self.client_rx.recv().await
    }

    /// Receive a client frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<ClientFrame> {
        self.client_rx.try_recv().ok()
    }

    /// Hang up from the server side.
    pub fn disconnect(&mut self) {
        self.server_tx = None;
    }

    /// Wait until the client transport has been released.
    pub async fn wait_released(&mut self) {
        if let Some(rx) = self.released_rx.take() {
            let _ = rx.await;
        }
    }

    /// How many times the client transport has been released.
    #[must_use]
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use remote_repl_core::{Instruction, InstructionId, RequestId};

    use super::*;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (mut transport, mut peer) = ChannelTransport::pair();

        let frame = ClientFrame::exec(Instruction::new("1"), RequestId(0));
        transport.send(&frame).await.unwrap();
        assert_eq!(peer.recv().await, Some(frame));

        peer.send_raw(r#"{"type":"exec_received","request_id":0,"seq":9}"#)
            .unwrap();
        assert_eq!(
            transport.recv().await.unwrap(),
            ServerEvent::ExecReceived {
                request_id: RequestId(0),
                seq: InstructionId(9)
            }
        );
    }

    #[tokio::test]
    async fn test_disconnect_surfaces_closed() {
        let (mut transport, mut peer) = ChannelTransport::pair();
        peer.disconnect();
        assert!(matches!(
            transport.recv().await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_release_happens_once() {
        let (mut transport, mut peer) = ChannelTransport::pair();
        tokio_test::assert_ok!(transport.close().await);
        tokio_test::assert_ok!(transport.close().await);
        assert!(matches!(
            transport.recv().await,
            Err(TransportError::Closed)
        ));
        drop(transport);

        peer.wait_released().await;
        assert_eq!(peer.release_count(), 1);
        assert_eq!(peer.recv().await, None);
    }
}
