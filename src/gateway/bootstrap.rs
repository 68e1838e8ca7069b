//! Session bootstrap.
//!
//! Sequences the startup of a companion device: check the store for an
//! identity, pair or connect as appropriate, start the recent-chat collector,
//! then idle until shutdown. Generic over `GatewayClient` so the whole
//! sequence runs against the mock in tests.

use super::chats::RecentChats;
use super::linking::{self, LinkOutcome};
use super::retry::{is_gateway_error_retryable, retry_with_backoff};
use super::store::DeviceStore;
use super::traits::{GatewayClient, GatewayError, GatewayEvent, GatewayResult};
use crate::shutdown::ShutdownHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Bootstrap orchestrator.
///
/// Owns the client and store handles and passes them where needed; the
/// collector task receives only its event subscription and the shared record.
pub struct Bootstrap<C: GatewayClient> {
    client: C,
    store: DeviceStore,
    disconnected: Arc<AtomicBool>,
}

impl<C: GatewayClient> Bootstrap<C> {
    pub fn new(client: C, store: DeviceStore) -> Self {
        Self {
            client,
            store,
            disconnected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Ensure the client is connected, pairing first if this is a fresh
    /// store.
    ///
    /// On return the client is connected; all failures surface as typed
    /// errors for the CLI layer to report. Transient network failures during
    /// connection establishment are retried with capped backoff.
    pub async fn ensure_connected(&self) -> GatewayResult<()> {
        match self.store.device_identity().await? {
            None => {
                // Pairing stream must be requested before connecting
                let link_events = self.client.begin_link()?;
                self.connect_with_retry().await?;

                let outcome = linking::run_link_flow(link_events).await;

                // The stream closing is reported as success (the gateway has
                // no failure event kind); what actually proves the login is
                // the identity the client persisted during the flow.
                let outcome = if self.store.device_identity().await?.is_some() {
                    outcome
                } else {
                    LinkOutcome::Failed
                };

                match outcome {
                    LinkOutcome::LoggedIn => {
                        println!();
                        println!("Device linked successfully!");
                        Ok(())
                    }
                    LinkOutcome::Failed => Err(GatewayError::LinkFailed(
                        "pairing stream closed before the gateway assigned a device identity"
                            .to_string(),
                    )),
                }
            }
            Some(identity) => {
                self.connect_with_retry().await?;
                println!("Successfully logged in as device {}.", identity.device_id);
                Ok(())
            }
        }
    }

    async fn connect_with_retry(&self) -> GatewayResult<()> {
        retry_with_backoff(|| self.client.connect(), is_gateway_error_retryable).await
    }

    /// Start collecting the first `max` distinct conversations seen on the
    /// message stream.
    ///
    /// Registers a subscriber and spawns the collector task; returns
    /// immediately with the shared record and the task handle. Collection
    /// proceeds as events arrive.
    pub fn collect_recent_chats(&self, max: usize) -> (Arc<Mutex<RecentChats>>, JoinHandle<()>) {
        let chats = Arc::new(Mutex::new(RecentChats::new(max)));
        let shared = Arc::clone(&chats);
        let mut events = self.client.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(GatewayEvent::Message(msg)) => {
                        let Ok(mut record) = shared.lock() else { break };
                        if record.record(msg.chat.clone(), msg.timestamp_ms) {
                            tracing::debug!(chat = %msg.chat, "recorded recent chat");
                        }
                    }
                    Ok(GatewayEvent::Receipt { .. }) | Ok(GatewayEvent::Presence { .. }) => {}
                    Ok(GatewayEvent::Disconnected) => {
                        // Connection state is the client's problem; the
                        // record just stops filling until events resume
                    }
                    Ok(GatewayEvent::Unknown(kind)) => {
                        tracing::trace!(kind = %kind, "ignoring gateway event");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "chat collector lagged behind event stream");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        (chats, handle)
    }

    /// Block until the shutdown handle fires, then disconnect and return.
    pub async fn wait_for_shutdown(&self, mut shutdown: ShutdownHandle) {
        shutdown.recv().await;
        self.shutdown_once().await;
    }

    /// Disconnect exactly once; later calls are no-ops.
    pub async fn shutdown_once(&self) {
        if self.disconnected.swap(true, Ordering::SeqCst) {
            return;
        }
        println!();
        println!("Received interrupt signal, shutting down...");
        self.client.disconnect().await;
    }
}
