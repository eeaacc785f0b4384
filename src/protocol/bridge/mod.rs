//! JSON-lines bridge implementation of the protocol capability
//!
//! The bridge is a separate process that owns the real game protocol and the
//! navigation engine. This module connects to it over TCP, sends one `open`
//! request per session, forwards its notifications as protocol events and
//! caches the world state it reports.

mod cache;
mod client;
mod messages;
mod reader;

pub use client::{
    BridgeClient, BridgeSession, DEFAULT_BRIDGE_ADDR, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_MAX_LINE_LENGTH,
};
