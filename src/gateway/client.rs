//! Production gateway client over Socket.IO.
//!
//! The gateway owns the messaging protocol, encryption, and multi-device
//! session state; this client speaks the gateway's Socket.IO event surface
//! and forwards what arrives into tokio channels. Handlers are registered
//! while the connection is built, which is why pairing intent has to be
//! declared (`begin_link`) before `connect`.

use super::store::DeviceStore;
use super::traits::*;
use async_trait::async_trait;
use futures::FutureExt;
use rust_socketio::asynchronous::{Client, ClientBuilder};
use rust_socketio::{Event, Payload, TransportType};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, RwLock};

/// Gateway connection settings
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Gateway URL
    pub url: String,
    /// Socket.IO namespace for companion clients
    pub namespace: String,
    /// Device name shown in the account's linked-devices list
    pub device_name: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            url: "https://gateway.tether.dev".to_string(),
            namespace: "/client".to_string(),
            device_name: "tether-cli".to_string(),
        }
    }
}

type LinkSlot = Arc<Mutex<Option<mpsc::Sender<LinkEvent>>>>;

/// Production gateway client
pub struct SocketGatewayClient {
    settings: GatewaySettings,
    store: DeviceStore,
    socket: Arc<RwLock<Option<Client>>>,
    connected: Arc<AtomicBool>,
    events: broadcast::Sender<GatewayEvent>,
    link: LinkSlot,
}

impl SocketGatewayClient {
    pub fn new(settings: GatewaySettings, store: DeviceStore) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            settings,
            store,
            socket: Arc::new(RwLock::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
            events,
            link: Arc::new(Mutex::new(None)),
        }
    }
}

impl Clone for SocketGatewayClient {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            store: self.store.clone(),
            socket: Arc::clone(&self.socket),
            connected: Arc::clone(&self.connected),
            events: self.events.clone(),
            link: Arc::clone(&self.link),
        }
    }
}

/// Pull the first JSON value out of a Socket.IO payload
fn first_value(payload: Payload) -> Option<Value> {
    match payload {
        Payload::Text(values) => values.into_iter().next(),
        Payload::Binary(_) => None,
        _ => None,
    }
}

/// Pull a string field out of the first JSON value of a payload
fn string_field(payload: Payload, field: &str) -> Option<String> {
    first_value(payload)
        .and_then(|value| value.get(field).and_then(Value::as_str).map(str::to_string))
}

fn link_sender(slot: &LinkSlot) -> Option<mpsc::Sender<LinkEvent>> {
    slot.lock().ok().and_then(|guard| guard.clone())
}

fn take_link_sender(slot: &LinkSlot) -> Option<mpsc::Sender<LinkEvent>> {
    slot.lock().ok().and_then(|mut guard| guard.take())
}

#[derive(serde::Deserialize)]
struct ChatRef {
    chat: ChatId,
}

#[async_trait]
impl GatewayClient for SocketGatewayClient {
    fn begin_link(&self) -> GatewayResult<mpsc::Receiver<LinkEvent>> {
        if self.is_connected() {
            return Err(GatewayError::Protocol(
                "begin_link must be called before connect".to_string(),
            ));
        }

        let mut slot = self
            .link
            .lock()
            .map_err(|_| GatewayError::Protocol("pairing state poisoned".to_string()))?;
        if slot.is_some() {
            return Err(GatewayError::Protocol(
                "pairing already in progress".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(16);
        *slot = Some(tx);
        Ok(rx)
    }

    async fn connect(&self) -> GatewayResult<()> {
        tracing::info!(
            url = %self.settings.url,
            namespace = %self.settings.namespace,
            "connecting to gateway"
        );

        let events = self.events.clone();
        let link = Arc::clone(&self.link);
        let store = self.store.clone();
        let connected = Arc::clone(&self.connected);

        let builder = ClientBuilder::new(self.settings.url.clone())
            .namespace(self.settings.namespace.clone())
            .transport_type(TransportType::Any)
            .on("message", {
                let events = events.clone();
                move |payload, _| {
                    let events = events.clone();
                    async move {
                        if let Some(value) = first_value(payload) {
                            match serde_json::from_value::<MessageEvent>(value) {
                                Ok(msg) => {
                                    let _ = events.send(GatewayEvent::Message(msg));
                                }
                                Err(e) => tracing::warn!("malformed message event: {}", e),
                            }
                        }
                    }
                    .boxed()
                }
            })
            .on("receipt", {
                let events = events.clone();
                move |payload, _| {
                    let events = events.clone();
                    async move {
                        if let Some(value) = first_value(payload) {
                            if let Ok(r) = serde_json::from_value::<ChatRef>(value) {
                                let _ = events.send(GatewayEvent::Receipt { chat: r.chat });
                            }
                        }
                    }
                    .boxed()
                }
            })
            .on("presence", {
                let events = events.clone();
                move |payload, _| {
                    let events = events.clone();
                    async move {
                        if let Some(value) = first_value(payload) {
                            if let Ok(r) = serde_json::from_value::<ChatRef>(value) {
                                let _ = events.send(GatewayEvent::Presence { chat: r.chat });
                            }
                        }
                    }
                    .boxed()
                }
            })
            .on("link:code", {
                let link = Arc::clone(&link);
                move |payload, _| {
                    let link = Arc::clone(&link);
                    async move {
                        if let Some(code) = string_field(payload, "code") {
                            if let Some(tx) = link_sender(&link) {
                                let _ = tx.send(LinkEvent::Code(code)).await;
                            }
                        }
                    }
                    .boxed()
                }
            })
            .on("link:update", {
                let link = Arc::clone(&link);
                move |payload, _| {
                    let link = Arc::clone(&link);
                    async move {
                        if let Some(kind) = string_field(payload, "kind") {
                            if let Some(tx) = link_sender(&link) {
                                let _ = tx.send(LinkEvent::Update(kind)).await;
                            }
                        }
                    }
                    .boxed()
                }
            })
            .on("link:complete", {
                let link = Arc::clone(&link);
                let store = store.clone();
                move |payload, _| {
                    let link = Arc::clone(&link);
                    let store = store.clone();
                    async move {
                        if let Some(device_id) = string_field(payload, "deviceId") {
                            if let Err(e) = store.create_identity(&device_id).await {
                                tracing::error!("failed to persist device identity: {}", e);
                            }
                        }
                        // Dropping the sender closes the pairing stream
                        take_link_sender(&link);
                    }
                    .boxed()
                }
            })
            .on("disconnect", {
                let events = events.clone();
                let connected = Arc::clone(&connected);
                move |_, _| {
                    let events = events.clone();
                    let connected = Arc::clone(&connected);
                    async move {
                        tracing::warn!("gateway connection dropped");
                        connected.store(false, Ordering::SeqCst);
                        let _ = events.send(GatewayEvent::Disconnected);
                    }
                    .boxed()
                }
            })
            .on("error", {
                let events = events.clone();
                let connected = Arc::clone(&connected);
                move |err, _| {
                    let events = events.clone();
                    let connected = Arc::clone(&connected);
                    async move {
                        tracing::error!("gateway transport error: {:?}", err);
                        connected.store(false, Ordering::SeqCst);
                        let _ = events.send(GatewayEvent::Disconnected);
                    }
                    .boxed()
                }
            })
            .on_any({
                let events = events.clone();
                move |event, _, _| {
                    let events = events.clone();
                    async move {
                        if let Event::Custom(kind) = event {
                            match kind.as_str() {
                                "message" | "receipt" | "presence" | "link:code"
                                | "link:update" | "link:complete" | "disconnect" => {}
                                _ => {
                                    let _ = events.send(GatewayEvent::Unknown(kind));
                                }
                            }
                        }
                    }
                    .boxed()
                }
            });

        let client = builder
            .connect()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        // The connect callback is not reliable across transports; treat a
        // successful connect() as connected.
        self.connected.store(true, Ordering::SeqCst);

        // Declare who we are: resume as a known device, or ask to pair
        let hello = if link_sender(&self.link).is_some() {
            ("client:link", json!({ "deviceName": self.settings.device_name }))
        } else {
            match self.store.device_identity().await? {
                Some(identity) => ("client:resume", json!({ "deviceId": identity.device_id })),
                None => {
                    return Err(GatewayError::Protocol(
                        "no device identity and no pairing in progress".to_string(),
                    ))
                }
            }
        };
        client
            .emit(hello.0, hello.1)
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        *self.socket.write().await = Some(client);
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(client) = self.socket.write().await.take() {
            if let Err(e) = client.disconnect().await {
                tracing::error!("disconnect error: {:?}", e);
            }
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn client_fixture() -> (TempDir, SocketGatewayClient) {
        let temp_dir = TempDir::new().unwrap();
        let store = DeviceStore::open(&temp_dir.path().join("device.db"))
            .await
            .unwrap();
        (
            temp_dir,
            SocketGatewayClient::new(GatewaySettings::default(), store),
        )
    }

    #[test]
    fn default_settings() {
        let settings = GatewaySettings::default();
        assert_eq!(settings.namespace, "/client");
        assert_eq!(settings.device_name, "tether-cli");
        assert!(settings.url.starts_with("https://"));
    }

    #[tokio::test]
    async fn begin_link_is_single_shot() {
        let (_dir, client) = client_fixture().await;
        let _rx = client.begin_link().unwrap();
        assert!(matches!(
            client.begin_link(),
            Err(GatewayError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn link_slot_feeds_pairing_receiver() {
        let (_dir, client) = client_fixture().await;
        let mut rx = client.begin_link().unwrap();

        let tx = link_sender(&client.link).unwrap();
        tx.send(LinkEvent::Code("AAA".to_string())).await.unwrap();
        assert_eq!(rx.recv().await, Some(LinkEvent::Code("AAA".to_string())));

        // Taking the sender closes the stream, as link:complete does
        take_link_sender(&client.link);
        drop(tx);
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn first_value_takes_head_of_text_payload() {
        let payload = Payload::Text(vec![json!({"a": 1}), json!({"b": 2})]);
        assert_eq!(first_value(payload), Some(json!({"a": 1})));
        assert_eq!(first_value(Payload::Binary(vec![1u8, 2].into())), None);
    }

    #[test]
    fn string_field_reads_first_object() {
        let payload = Payload::Text(vec![json!({"code": "AAA", "n": 3})]);
        assert_eq!(string_field(payload, "code"), Some("AAA".to_string()));

        let payload = Payload::Text(vec![json!({"n": 3})]);
        assert_eq!(string_field(payload, "code"), None);
    }

    #[tokio::test]
    async fn subscribers_see_forwarded_events() {
        let (_dir, client) = client_fixture().await;
        let mut rx = client.subscribe();

        let _ = client.events.send(GatewayEvent::Unknown("call".to_string()));
        match rx.recv().await.unwrap() {
            GatewayEvent::Unknown(kind) => assert_eq!(kind, "call"),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
