use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::NetError;
use crate::interface::Direction;
use crate::node::{Node, Runnable};

/// A bidirectional point-to-point relay between two (node, interface)
/// endpoints.
pub struct Link {
    node_1: Arc<dyn Node>,
    node_1_intf: usize,
    node_2: Arc<dyn Node>,
    node_2_intf: usize,
}

impl Link {
    /// Attach a link between two existing node interfaces.
    pub fn new(
        node_1: Arc<dyn Node>,
        node_1_intf: usize,
        node_2: Arc<dyn Node>,
        node_2_intf: usize,
    ) -> Result<Self, NetError> {
        for (node, intf) in [(&node_1, node_1_intf), (&node_2, node_2_intf)] {
            if intf >= node.interfaces().len() {
                return Err(NetError::InvalidLink(format!(
                    "{node} has no interface {intf}"
                )));
            }
        }
        Ok(Self {
            node_1,
            node_1_intf,
            node_2,
            node_2_intf,
        })
    }

    fn endpoints(&self) -> [(&Arc<dyn Node>, usize); 2] {
        [
            (&self.node_1, self.node_1_intf),
            (&self.node_2, self.node_2_intf),
        ]
    }

    /// Move at most one packet in each direction: dequeue from one side's
    /// outbound queue, enqueue on the other side's inbound queue. A full
    /// inbound queue drops the packet; the loss is logged, never retried.
    pub async fn transmit(&self) {
        for pass in 0..2 {
            let (node_a, intf_a) = self.endpoints()[pass];
            let (node_b, intf_b) = self.endpoints()[1 - pass];

            let Ok(pkt) = node_a.interfaces()[intf_a].get(Direction::Out).await else {
                continue;
            };
            match node_b.interfaces()[intf_b]
                .put(pkt.clone(), Direction::In, false)
                .await
            {
                Ok(()) => debug!(
                    "{self}: direction {node_a}-{intf_a} -> {node_b}-{intf_b}: transmitting packet {pkt}"
                ),
                Err(e) => warn!(
                    "{self}: direction {node_a}-{intf_a} -> {node_b}-{intf_b}: packet lost: {e}"
                ),
            }
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Link {}-{} to {}-{}",
            self.node_1, self.node_1_intf, self.node_2, self.node_2_intf
        )
    }
}

/// The collection of links, swept continuously by its run loop.
pub struct LinkLayer {
    link_l: Vec<Link>,
    used_endpoints: HashSet<(String, usize)>,
    stop_tx: broadcast::Sender<()>,
}

impl Default for LinkLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkLayer {
    pub fn new() -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            link_l: Vec::new(),
            used_endpoints: HashSet::new(),
            stop_tx,
        }
    }

    /// Append a link. Each (node, interface) endpoint may carry only one
    /// link.
    pub fn add_link(&mut self, link: Link) -> Result<(), NetError> {
        for (node, intf) in link.endpoints() {
            if self.used_endpoints.contains(&(node.name().to_string(), intf)) {
                return Err(NetError::InvalidLink(format!(
                    "endpoint {node}-{intf} already linked"
                )));
            }
        }
        for (node, intf) in link.endpoints() {
            self.used_endpoints.insert((node.name().to_string(), intf));
        }
        self.link_l.push(link);
        Ok(())
    }

    /// Activate every link once, in list order.
    pub async fn transfer(&self) {
        for link in &self.link_l {
            link.transmit().await;
        }
    }
}

impl Runnable for LinkLayer {
    fn start(self: Arc<Self>) -> JoinHandle<()> {
        let mut stop_rx = self.stop_tx.subscribe();
        tokio::spawn(async move {
            info!("{self}: transfer loop starting");
            loop {
                match stop_rx.try_recv() {
                    Err(broadcast::error::TryRecvError::Empty) => {}
                    _ => break,
                }
                self.transfer().await;
                tokio::task::yield_now().await;
            }
            info!("{self}: transfer loop ending");
        })
    }

    fn stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl fmt::Display for LinkLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkLayer")
    }
}
