//! Gateway Integration Module
//!
//! Everything that talks to (or stands in for) the messaging gateway:
//! - `traits` defines the client seam and the event types it delivers
//! - `client` is the production Socket.IO implementation
//! - `mock` is the scriptable test double
//! - `store` holds the one device identity row the gateway assigns us
//! - `linking` drives the QR pairing flow, `qr` renders the codes
//! - `bootstrap` sequences identity check, connect, and chat sampling

pub mod bootstrap;
pub mod chats;
pub mod client;
pub mod linking;
pub mod mock;
pub mod qr;
pub mod retry;
pub mod store;
pub mod traits;

pub use bootstrap::Bootstrap;
pub use chats::RecentChats;
pub use client::{GatewaySettings, SocketGatewayClient};
pub use mock::MockGatewayClient;
pub use store::{DeviceIdentity, DeviceStore};
pub use traits::{
    ChatId, GatewayClient, GatewayError, GatewayEvent, GatewayResult, LinkEvent, MessageEvent,
};
