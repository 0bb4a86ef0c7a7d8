use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::interface::NetworkInterface;

/// Anything the driver starts and stops: hosts, routers, the link layer.
///
/// `start` spawns the run loop on the runtime and hands back its join
/// handle; `stop` delivers the single-shot shutdown signal the loop polls
/// once per iteration.
pub trait Runnable: fmt::Display + Send + Sync {
    fn start(self: Arc<Self>) -> JoinHandle<()>;
    fn stop(&self);
}

/// A network node: a runnable with addressable interfaces, consumed by the
/// link layer to move packets between endpoints.
pub trait Node: Runnable {
    fn name(&self) -> &str;
    fn interfaces(&self) -> &[NetworkInterface];
}
