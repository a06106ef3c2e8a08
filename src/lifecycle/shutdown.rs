//! Shutdown coordination for the proxy.
//!
//! `main` triggers the coordinator from the signal task; `HttpServer::run`
//! holds a receiver and stops accepting once it fires, letting in-flight
//! proxied responses (including streamed bodies) finish.

use tokio::sync::broadcast;

/// Broadcast trigger shared by the signal task and the server.
///
/// Dropping the coordinator closes the channel, which receivers also treat
/// as a shutdown.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Safe to call with no subscribers.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening for shutdown.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
