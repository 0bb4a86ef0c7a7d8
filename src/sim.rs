use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::task::JoinHandle;

use crate::config::Topology;
use crate::host::Host;
use crate::link::{Link, LinkLayer};
use crate::node::{Node, Runnable};
use crate::router::{CostTable, Router};

/// A fully wired simulation instance: every node and the link layer,
/// ready to start. Construction happens entirely before any run loop; the
/// topology is never mutated afterwards.
pub struct Simulation {
    hosts: Vec<Arc<Host>>,
    routers: Vec<Arc<Router>>,
    link_layer: Arc<LinkLayer>,
    handles: Vec<JoinHandle<()>>,
}

impl Simulation {
    /// Instantiate hosts, routers, and links from a topology description.
    pub fn build(topology: &Topology) -> Result<Self> {
        let mut nodes: HashMap<String, Arc<dyn Node>> = HashMap::new();

        let mut hosts = Vec::new();
        for name in &topology.hosts {
            let host = Arc::new(Host::new(name.clone(), topology.host_queue_size));
            nodes.insert(name.clone(), host.clone());
            hosts.push(host);
        }

        let mut routers = Vec::new();
        for spec in &topology.routers {
            let cost_table: CostTable = spec
                .neighbors
                .iter()
                .map(|n| (n.name.clone(), (n.interface, n.cost)))
                .collect();
            let router = Arc::new(Router::new(
                spec.name.clone(),
                cost_table,
                topology.router_queue_size,
            ));
            nodes.insert(spec.name.clone(), router.clone());
            routers.push(router);
        }

        let mut link_layer = LinkLayer::new();
        for spec in &topology.links {
            let a = nodes
                .get(&spec.a)
                .ok_or_else(|| anyhow!("link endpoint {} does not exist", spec.a))?;
            let b = nodes
                .get(&spec.b)
                .ok_or_else(|| anyhow!("link endpoint {} does not exist", spec.b))?;
            let link = Link::new(a.clone(), spec.a_interface, b.clone(), spec.b_interface)
                .with_context(|| format!("linking {} to {}", spec.a, spec.b))?;
            link_layer.add_link(link)?;
        }

        Ok(Self {
            hosts,
            routers,
            link_layer: Arc::new(link_layer),
            handles: Vec::new(),
        })
    }

    /// Spawn one task per node plus the link layer.
    pub fn start(&mut self) {
        for host in &self.hosts {
            self.handles.push(host.clone().start());
        }
        for router in &self.routers {
            self.handles.push(router.clone().start());
        }
        self.handles.push(self.link_layer.clone().start());
    }

    pub fn hosts(&self) -> &[Arc<Host>] {
        &self.hosts
    }

    pub fn routers(&self) -> &[Arc<Router>] {
        &self.routers
    }

    pub fn host(&self, name: &str) -> Option<&Arc<Host>> {
        self.hosts.iter().find(|h| h.name() == name)
    }

    pub fn router(&self, name: &str) -> Option<&Arc<Router>> {
        self.routers.iter().find(|r| r.name() == name)
    }

    /// Signal every run loop once, then join all tasks.
    pub async fn stop(mut self) -> Result<()> {
        for host in &self.hosts {
            host.stop();
        }
        for router in &self.routers {
            router.stop();
        }
        self.link_layer.stop();

        for handle in self.handles.drain(..) {
            handle.await.context("node task panicked")?;
        }
        Ok(())
    }
}
