//! Tether - Companion-Device Client
//!
//! A terminal client that links itself to an existing messaging account as a
//! secondary device and samples the first few conversations seen on the live
//! message stream.
//!
//! Key principles:
//! - All protocol state lives behind the gateway (no message history here)
//! - Local persistence is a single device identity row
//! - Orchestration only; the wire protocol is the gateway's problem
//!
//! See: DESIGN.md

pub mod gateway;
pub mod shutdown;
