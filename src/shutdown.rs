//! Shutdown coordination.
//!
//! A watch channel split into a trigger half and an awaitable handle. The
//! Ctrl-C listener is just one trigger, so the termination path is testable
//! without sending a real OS signal.

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Create a linked trigger/handle pair.
pub fn channel() -> (ShutdownTrigger, ShutdownHandle) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx: tx.into() }, ShutdownHandle { rx })
}

/// Fires the shutdown. First trigger wins; later triggers are no-ops.
#[derive(Clone)]
pub struct ShutdownTrigger {
    tx: std::sync::Arc<watch::Sender<bool>>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

/// Awaitable shutdown handle.
#[derive(Clone)]
pub struct ShutdownHandle {
    rx: watch::Receiver<bool>,
}

impl ShutdownHandle {
    /// Resolve once the shutdown has been triggered. Returns immediately if
    /// it already fired, or if every trigger was dropped.
    pub async fn recv(&mut self) {
        let _ = self.rx.wait_for(|fired| *fired).await;
    }
}

/// Listen for the process interrupt signal and fire `trigger` on the first
/// one received.
pub fn spawn_interrupt_listener(trigger: ShutdownTrigger) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => trigger.trigger(),
            Err(e) => {
                tracing::error!("failed to install interrupt handler: {}", e);
            }
        }
    })
}
