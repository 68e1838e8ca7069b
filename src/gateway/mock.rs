//! Mock gateway client for testing.
//!
//! Scriptable stand-in for `SocketGatewayClient`: pairing streams, connect
//! failures, and gateway events are all driven from the test.

use super::store::DeviceStore;
use super::traits::*;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};

/// Mock gateway client
#[derive(Clone)]
pub struct MockGatewayClient {
    state: Arc<Mutex<MockState>>,
    events: broadcast::Sender<GatewayEvent>,
    store: DeviceStore,
}

#[derive(Default)]
struct MockState {
    connected: bool,
    connect_calls: u32,
    disconnect_calls: u32,
    connect_failures_remaining: u32,
    scripted_link: Vec<LinkEvent>,
    link_identity: Option<String>,
    pending_link: Option<mpsc::Sender<LinkEvent>>,
}

impl MockGatewayClient {
    /// Create a mock backed by `store` (the mock persists a scripted identity
    /// there when a pairing flow completes, as the real client does).
    pub fn new(store: DeviceStore) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            events,
            store,
        }
    }

    /// Script the pairing events delivered after the next connect
    pub fn script_link_events(&self, events: Vec<LinkEvent>) {
        self.state.lock().unwrap().scripted_link = events;
    }

    /// Script the identity the "gateway" assigns when pairing completes.
    /// Without this, the pairing stream closes with nothing persisted.
    pub fn script_link_identity(&self, device_id: &str) {
        self.state.lock().unwrap().link_identity = Some(device_id.to_string());
    }

    /// Make the next `n` connect attempts fail with a network error
    pub fn fail_connects(&self, n: u32) {
        self.state.lock().unwrap().connect_failures_remaining = n;
    }

    /// Deliver a gateway event to all subscribers
    pub fn deliver(&self, event: GatewayEvent) {
        let _ = self.events.send(event);
    }

    pub fn connect_calls(&self) -> u32 {
        self.state.lock().unwrap().connect_calls
    }

    pub fn disconnect_calls(&self) -> u32 {
        self.state.lock().unwrap().disconnect_calls
    }
}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    fn begin_link(&self) -> GatewayResult<mpsc::Receiver<LinkEvent>> {
        let mut state = self.state.lock().unwrap();
        if state.pending_link.is_some() {
            return Err(GatewayError::Protocol(
                "pairing already in progress".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(16);
        state.pending_link = Some(tx);
        Ok(rx)
    }

    async fn connect(&self) -> GatewayResult<()> {
        let (pending, script, identity) = {
            let mut state = self.state.lock().unwrap();
            state.connect_calls += 1;

            if state.connect_failures_remaining > 0 {
                state.connect_failures_remaining -= 1;
                return Err(GatewayError::Network("connection refused".to_string()));
            }

            state.connected = true;
            (
                state.pending_link.take(),
                std::mem::take(&mut state.scripted_link),
                state.link_identity.clone(),
            )
        };

        if let Some(tx) = pending {
            let store = self.store.clone();
            tokio::spawn(async move {
                for event in script {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                // Persist before closing the stream, as the real client does
                if let Some(device_id) = identity {
                    let _ = store.create_identity(&device_id).await;
                }
            });
        }

        Ok(())
    }

    async fn disconnect(&self) {
        let mut state = self.state.lock().unwrap();
        state.disconnect_calls += 1;
        state.connected = false;
    }

    fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }
}
