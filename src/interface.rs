use std::fmt;

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tokio::sync::Mutex;

use crate::error::NetError;

/// Effective bound used when an interface is configured as unlimited.
const UNLIMITED_QUEUE: usize = 1 << 20;

/// Selects one side of an interface's queue pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// One attachment point on a node: a bounded inbound queue and a bounded
/// outbound queue of wire-encoded packets.
///
/// The two directions are fully independent; each is a bounded channel with
/// its own synchronization, so enqueue/dequeue is FIFO per direction and
/// never serializes against the other direction. Receivers sit behind a
/// mutex because both the owning node and the link layer dequeue.
pub struct NetworkInterface {
    in_tx: mpsc::Sender<String>,
    in_rx: Mutex<mpsc::Receiver<String>>,
    out_tx: mpsc::Sender<String>,
    out_rx: Mutex<mpsc::Receiver<String>>,
}

impl NetworkInterface {
    /// Create an interface whose queues hold at most `max_que_size`
    /// packets each. `0` means unlimited.
    pub fn new(max_que_size: usize) -> Self {
        let cap = if max_que_size == 0 {
            UNLIMITED_QUEUE
        } else {
            max_que_size
        };
        let (in_tx, in_rx) = mpsc::channel(cap);
        let (out_tx, out_rx) = mpsc::channel(cap);
        Self {
            in_tx,
            in_rx: Mutex::new(in_rx),
            out_tx,
            out_rx: Mutex::new(out_rx),
        }
    }

    /// Non-blocking dequeue of the head packet of the selected queue.
    pub async fn get(&self, dir: Direction) -> Result<String, NetError> {
        let mut rx = match dir {
            Direction::In => self.in_rx.lock().await,
            Direction::Out => self.out_rx.lock().await,
        };
        rx.try_recv().map_err(|e| match e {
            TryRecvError::Empty => NetError::Empty(dir),
            TryRecvError::Disconnected => NetError::Closed,
        })
    }

    /// Enqueue a packet on the selected queue.
    ///
    /// With `block` set, the call suspends until the queue has capacity and
    /// returns exactly when the append succeeds. Without it, a full queue
    /// fails immediately with [`NetError::Full`].
    pub async fn put(&self, pkt: String, dir: Direction, block: bool) -> Result<(), NetError> {
        let tx = match dir {
            Direction::In => &self.in_tx,
            Direction::Out => &self.out_tx,
        };
        if block {
            tx.send(pkt).await.map_err(|_| NetError::Closed)
        } else {
            tx.try_send(pkt).map_err(|e| match e {
                TrySendError::Full(_) => NetError::Full(dir),
                TrySendError::Closed(_) => NetError::Closed,
            })
        }
    }
}
