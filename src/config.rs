use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A complete scenario description: nodes, links, queue sizes, and the
/// events the driver replays (the seeding advertisement and host messages).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    pub host_queue_size: usize,
    /// 0 means unlimited.
    pub router_queue_size: usize,
    pub hosts: Vec<String>,
    pub routers: Vec<RouterSpec>,
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub seed: Option<Seed>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSpec {
    pub name: String,
    pub neighbors: Vec<NeighborSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborSpec {
    pub name: String,
    pub interface: usize,
    pub cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    pub a: String,
    pub a_interface: usize,
    pub b: String,
    pub b_interface: usize,
}

/// The single routing update that kicks off convergence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seed {
    pub router: String,
    pub interface: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub payload: String,
}

impl Topology {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let topology: Topology = serde_json::from_str(&content)?;
        Ok(topology)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Two hosts joined by a two-router chain: H1 - RA - RB - H2.
    pub fn two_router() -> Self {
        Self {
            host_queue_size: 1000,
            router_queue_size: 1000,
            hosts: vec!["H1".into(), "H2".into()],
            routers: vec![
                RouterSpec {
                    name: "RA".into(),
                    neighbors: vec![
                        NeighborSpec { name: "H1".into(), interface: 0, cost: 1 },
                        NeighborSpec { name: "RB".into(), interface: 1, cost: 1 },
                    ],
                },
                RouterSpec {
                    name: "RB".into(),
                    neighbors: vec![
                        NeighborSpec { name: "RA".into(), interface: 0, cost: 1 },
                        NeighborSpec { name: "H2".into(), interface: 1, cost: 3 },
                    ],
                },
            ],
            links: vec![
                LinkSpec { a: "H1".into(), a_interface: 0, b: "RA".into(), b_interface: 0 },
                LinkSpec { a: "RA".into(), a_interface: 1, b: "RB".into(), b_interface: 0 },
                LinkSpec { a: "RB".into(), a_interface: 1, b: "H2".into(), b_interface: 0 },
            ],
            seed: Some(Seed { router: "RA".into(), interface: 1 }),
            messages: vec![
                Message { from: "H1".into(), to: "H2".into(), payload: "MESSAGE_FROM_H1".into() },
                Message { from: "H2".into(), to: "H1".into(), payload: "MESSAGE_FROM_H2".into() },
            ],
        }
    }

    /// Four routers with a cheap detour: the RA-RB-RD path is undercut by
    /// RA-RC-RD despite RC's expensive first hop.
    pub fn four_router() -> Self {
        Self {
            host_queue_size: 1000,
            router_queue_size: 1000,
            hosts: vec!["H1".into(), "H2".into()],
            routers: vec![
                RouterSpec {
                    name: "RA".into(),
                    neighbors: vec![
                        NeighborSpec { name: "H1".into(), interface: 0, cost: 1 },
                        NeighborSpec { name: "RB".into(), interface: 1, cost: 1 },
                        NeighborSpec { name: "RC".into(), interface: 2, cost: 5 },
                    ],
                },
                RouterSpec {
                    name: "RB".into(),
                    neighbors: vec![
                        NeighborSpec { name: "RA".into(), interface: 0, cost: 1 },
                        NeighborSpec { name: "RD".into(), interface: 1, cost: 10 },
                    ],
                },
                RouterSpec {
                    name: "RC".into(),
                    neighbors: vec![
                        NeighborSpec { name: "RA".into(), interface: 0, cost: 5 },
                        NeighborSpec { name: "RD".into(), interface: 1, cost: 1 },
                    ],
                },
                RouterSpec {
                    name: "RD".into(),
                    neighbors: vec![
                        NeighborSpec { name: "RB".into(), interface: 0, cost: 10 },
                        NeighborSpec { name: "RC".into(), interface: 1, cost: 1 },
                        NeighborSpec { name: "H2".into(), interface: 2, cost: 1 },
                    ],
                },
            ],
            links: vec![
                LinkSpec { a: "H1".into(), a_interface: 0, b: "RA".into(), b_interface: 0 },
                LinkSpec { a: "RA".into(), a_interface: 1, b: "RB".into(), b_interface: 0 },
                LinkSpec { a: "RA".into(), a_interface: 2, b: "RC".into(), b_interface: 0 },
                LinkSpec { a: "RB".into(), a_interface: 1, b: "RD".into(), b_interface: 0 },
                LinkSpec { a: "RC".into(), a_interface: 1, b: "RD".into(), b_interface: 1 },
                LinkSpec { a: "RD".into(), a_interface: 2, b: "H2".into(), b_interface: 0 },
            ],
            seed: Some(Seed { router: "RA".into(), interface: 1 }),
            messages: vec![
                Message { from: "H1".into(), to: "H2".into(), payload: "MESSAGE_FROM_H1".into() },
                Message { from: "H2".into(), to: "H1".into(), payload: "MESSAGE_FROM_H2".into() },
            ],
        }
    }
}
