use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::interface::{Direction, NetworkInterface};
use crate::node::{Node, Runnable};
use crate::packet::{NetworkPacket, Protocol};

/// An end system with a single interface. Produces outbound data packets
/// and drains inbound packets; there is no upper-layer demultiplexing.
pub struct Host {
    addr: String,
    interface_l: Vec<NetworkInterface>,
    received: Mutex<Vec<String>>,
    stop_tx: broadcast::Sender<()>,
}

impl Host {
    pub fn new(addr: impl Into<String>, max_que_size: usize) -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            addr: addr.into(),
            interface_l: vec![NetworkInterface::new(max_que_size)],
            received: Mutex::new(Vec::new()),
            stop_tx,
        }
    }

    /// Construct a data packet and enqueue it for transmission.
    ///
    /// A full outbound queue drops the packet; sends are never retried.
    pub async fn send(&self, dst_addr: &str, payload: &str) {
        let p = NetworkPacket::new(dst_addr, Protocol::Data, payload);
        info!("{self}: sending packet \"{p}\"");
        if let Err(e) = self
            .interface_l[0]
            .put(p.to_wire(), Direction::Out, false)
            .await
        {
            warn!("{self}: packet \"{p}\" dropped: {e}");
        }
    }

    /// Drain one packet from the inbound queue, if any.
    pub async fn receive(&self) {
        if let Ok(pkt) = self.interface_l[0].get(Direction::In).await {
            info!("{self}: received packet \"{pkt}\"");
            self.received.lock().await.push(pkt);
        }
    }

    /// Wire forms of every packet this host has received, in arrival order.
    pub async fn received(&self) -> Vec<String> {
        self.received.lock().await.clone()
    }
}

impl Runnable for Host {
    fn start(self: Arc<Self>) -> JoinHandle<()> {
        let mut stop_rx = self.stop_tx.subscribe();
        tokio::spawn(async move {
            debug!("{self}: receive loop starting");
            loop {
                match stop_rx.try_recv() {
                    Err(broadcast::error::TryRecvError::Empty) => {}
                    _ => break,
                }
                self.receive().await;
                tokio::task::yield_now().await;
            }
            debug!("{self}: receive loop ending");
        })
    }

    fn stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Node for Host {
    fn name(&self) -> &str {
        &self.addr
    }

    fn interfaces(&self) -> &[NetworkInterface] {
        &self.interface_l
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Host_{}", self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_enqueues_encoded_packet() {
        let host = Host::new("H1", 8);
        host.send("H2", "MSG").await;
        assert_eq!(
            host.interfaces()[0].get(Direction::Out).await.unwrap(),
            "000H21MSG"
        );
    }

    #[tokio::test]
    async fn send_on_full_queue_drops_silently() {
        let host = Host::new("H1", 1);
        host.send("H2", "first").await;
        host.send("H2", "second").await;

        assert_eq!(
            host.interfaces()[0].get(Direction::Out).await.unwrap(),
            "000H21first"
        );
        assert!(host.interfaces()[0].get(Direction::Out).await.is_err());
    }

    #[tokio::test]
    async fn receive_records_inbound_packets() {
        let host = Host::new("H2", 8);
        host.interfaces()[0]
            .put("000H21MSG".into(), Direction::In, false)
            .await
            .unwrap();

        host.receive().await;
        assert_eq!(host.received().await, vec!["000H21MSG".to_string()]);

        // Nothing pending: a second receive is a no-op.
        host.receive().await;
        assert_eq!(host.received().await.len(), 1);
    }
}
