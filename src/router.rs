use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::interface::{Direction, NetworkInterface};
use crate::node::{Node, Runnable};
use crate::packet::{NetworkPacket, Protocol};
use crate::routing_table::RoutingTable;
use crate::NodeId;

/// Cost table to direct neighbors: neighbor name -> (interface index, link cost).
pub type CostTable = HashMap<NodeId, (usize, u32)>;

/// Control packets carry a fixed placeholder destination; routers classify
/// by protocol, never by address.
const CONTROL_DST: &str = "H0";

/// Egress used for every data packet until forwarding-table lookup lands.
const FORWARD_INTF: usize = 1;

/// A multi-interface packet forwarder. Owns the cost vector to its direct
/// neighbors and the distance-vector routing table; data packets are
/// relayed, control packets feed the routing exchange.
pub struct Router {
    name: String,
    interface_l: Vec<NetworkInterface>,
    cost_table: CostTable,
    table: Mutex<RoutingTable>,
    stop_tx: broadcast::Sender<()>,
}

impl Router {
    /// Build a router with one interface per neighbor and a routing table
    /// seeded from the cost table. Neighbors are seeded in ascending name
    /// order so the initial table is deterministic.
    pub fn new(name: impl Into<String>, cost_table: CostTable, max_que_size: usize) -> Self {
        let name = name.into();
        let interface_l = (0..cost_table.len())
            .map(|_| NetworkInterface::new(max_que_size))
            .collect();

        let mut table = RoutingTable::new(name.clone());
        let mut neighbors: Vec<(&String, &(usize, u32))> = cost_table.iter().collect();
        neighbors.sort_by(|a, b| a.0.cmp(b.0));
        for (neighbor, &(_, cost)) in neighbors {
            table.add_neighbor(neighbor, cost);
        }

        let (stop_tx, _) = broadcast::channel(1);
        Self {
            name,
            interface_l,
            cost_table,
            table: Mutex::new(table),
            stop_tx,
        }
    }

    /// The owner's current best-known cost to `dest`.
    pub async fn route_cost(&self, dest: &str) -> Option<u32> {
        self.table.lock().await.cost_to(dest)
    }

    /// Render the routing table as a bordered two-dimensional table.
    pub async fn format_routes(&self) -> String {
        self.table.lock().await.to_string()
    }

    pub async fn print_routes(&self) {
        println!("\n{}", self.format_routes().await);
    }

    /// Advertise this router's own cost vector out of interface `i` as a
    /// control packet. An enqueue failure is a logged loss.
    pub async fn send_routes(&self, i: usize) {
        let vect = {
            let table = self.table.lock().await;
            HashMap::from([(self.name.clone(), table.own_row())])
        };
        let payload = match serde_json::to_string(&vect) {
            Ok(s) => s,
            Err(e) => {
                error!("{self}: could not serialize routing vector: {e}");
                return;
            }
        };

        let p = NetworkPacket::new(CONTROL_DST, Protocol::Control, payload);
        info!("{self}: sending routing update \"{p}\" from interface {i}");

        let Some(intf) = self.interface_l.get(i) else {
            error!("{self}: no interface {i} to send routing update on");
            return;
        };
        if let Err(e) = intf.put(p.to_wire(), Direction::Out, true).await {
            warn!("{self}: packet \"{p}\" lost on interface {i}: {e}");
        }
    }

    /// Sweep every inbound queue once, in index order, and dispatch each
    /// decoded packet by protocol.
    async fn process_queues(&self) {
        for i in 0..self.interface_l.len() {
            let Ok(pkt_s) = self.interface_l[i].get(Direction::In).await else {
                continue;
            };
            let p = match NetworkPacket::from_wire(&pkt_s) {
                Ok(p) => p,
                Err(e) => {
                    warn!("{self}: could not decode packet \"{pkt_s}\": {e}");
                    continue;
                }
            };
            match p.protocol {
                Protocol::Data => self.forward_packet(&p, i).await,
                Protocol::Control => self.update_routes(&p, i).await,
            }
        }
    }

    /// Relay a data packet that arrived on interface `i`.
    // TODO: forwarding-table lookup; for now every data packet leaves on
    // interface 1.
    async fn forward_packet(&self, p: &NetworkPacket, i: usize) {
        let Some(out) = self.interface_l.get(FORWARD_INTF) else {
            warn!("{self}: no interface {FORWARD_INTF} to forward on, packet \"{p}\" dropped");
            return;
        };
        if let Err(e) = out.put(p.to_wire(), Direction::Out, true).await {
            warn!("{self}: packet \"{p}\" lost on interface {i}: {e}");
            return;
        }
        info!("{self}: forwarding packet {p} from interface {i} to {FORWARD_INTF}");
    }

    /// Fold a received routing advertisement into the table and, if any
    /// cost improved, re-advertise to every known neighbor router.
    async fn update_routes(&self, p: &NetworkPacket, i: usize) {
        info!("{self}: received routing update \"{p}\" from interface {i}");

        let vect: HashMap<String, HashMap<String, u32>> = match serde_json::from_str(&p.payload) {
            Ok(v) => v,
            Err(e) => {
                warn!("{self}: routing advertisement ignored: {e}");
                return;
            }
        };

        let mut targets = Vec::new();
        {
            let mut table = self.table.lock().await;
            let mut updated = false;
            for (advertiser, adv_vect) in &vect {
                table.import(advertiser, adv_vect);
                if table.relax(advertiser, adv_vect) {
                    updated = true;
                }
            }
            if updated {
                info!("{self}: routes updated");
                for peer in table.routers() {
                    match self.cost_table.get(peer) {
                        Some(&(intf, _)) => targets.push((peer.to_string(), intf)),
                        None => error!("{self}: neighbor {peer} not found in cost table"),
                    }
                }
            }
        }

        // The table lock is released before re-advertising: send_routes
        // takes it again to snapshot the vector.
        for (peer, intf) in targets {
            debug!("{self}: sending routes to neighbor {peer} via interface {intf}");
            self.send_routes(intf).await;
        }
    }
}

impl Runnable for Router {
    fn start(self: Arc<Self>) -> JoinHandle<()> {
        let mut stop_rx = self.stop_tx.subscribe();
        tokio::spawn(async move {
            info!("{self}: starting");
            loop {
                match stop_rx.try_recv() {
                    Err(broadcast::error::TryRecvError::Empty) => {}
                    _ => break,
                }
                self.process_queues().await;
                tokio::task::yield_now().await;
            }
            info!("{self}: ending");
        })
    }

    fn stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Node for Router {
    fn name(&self) -> &str {
        &self.name
    }

    fn interfaces(&self) -> &[NetworkInterface] {
        &self.interface_l
    }
}

impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Router_{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn router_a() -> Router {
        let cost = CostTable::from([
            ("H1".to_string(), (0, 1)),
            ("RB".to_string(), (1, 1)),
        ]);
        Router::new("RA", cost, 16)
    }

    #[tokio::test]
    async fn construction_seeds_routing_table() {
        let ra = router_a();
        assert_eq!(ra.interfaces().len(), 2);
        assert_eq!(ra.route_cost("RA").await, Some(0));
        assert_eq!(ra.route_cost("H1").await, Some(1));
        assert_eq!(ra.route_cost("RB").await, Some(1));
    }

    #[tokio::test]
    async fn send_routes_emits_control_packet_with_own_vector() {
        let ra = router_a();
        ra.send_routes(1).await;

        let wire = ra.interfaces()[1].get(Direction::Out).await.unwrap();
        let p = NetworkPacket::from_wire(&wire).unwrap();
        assert_eq!(p.protocol, Protocol::Control);
        assert_eq!(p.dst_addr, "H0");

        let vect: HashMap<String, HashMap<String, u32>> =
            serde_json::from_str(&p.payload).unwrap();
        assert_eq!(vect["RA"]["RA"], 0);
        assert_eq!(vect["RA"]["H1"], 1);
        assert_eq!(vect["RA"]["RB"], 1);
    }

    #[tokio::test]
    async fn control_packet_relaxes_table_and_readvertises() {
        let ra = router_a();
        let adv = json!({"RB": {"RB": 0, "RA": 1, "H2": 3}}).to_string();
        let p = NetworkPacket::new("H0", Protocol::Control, adv);
        ra.interfaces()[0]
            .put(p.to_wire(), Direction::In, false)
            .await
            .unwrap();

        ra.process_queues().await;

        // 1 to RB plus RB's advertised 3 to H2.
        assert_eq!(ra.route_cost("H2").await, Some(4));

        // The improvement was re-advertised toward RB on interface 1.
        let wire = ra.interfaces()[1].get(Direction::Out).await.unwrap();
        let out = NetworkPacket::from_wire(&wire).unwrap();
        assert_eq!(out.protocol, Protocol::Control);
        let vect: HashMap<String, HashMap<String, u32>> =
            serde_json::from_str(&out.payload).unwrap();
        assert_eq!(vect["RA"]["H2"], 4);
    }

    #[tokio::test]
    async fn data_packet_is_forwarded_on_interface_one() {
        let ra = router_a();
        let p = NetworkPacket::new("H2", Protocol::Data, "MSG");
        ra.interfaces()[0]
            .put(p.to_wire(), Direction::In, false)
            .await
            .unwrap();

        ra.process_queues().await;

        assert_eq!(
            ra.interfaces()[1].get(Direction::Out).await.unwrap(),
            "000H21MSG"
        );
    }

    #[tokio::test]
    async fn malformed_advertisement_leaves_table_unchanged() {
        let ra = router_a();
        let p = NetworkPacket::new("H0", Protocol::Control, "not json");
        ra.interfaces()[0]
            .put(p.to_wire(), Direction::In, false)
            .await
            .unwrap();

        ra.process_queues().await;

        assert_eq!(ra.route_cost("RA").await, Some(0));
        assert_eq!(ra.route_cost("RB").await, Some(1));
        assert!(ra.interfaces()[1]
            .get(Direction::Out)
            .await
            .is_err());
    }
}
