//! ETHYS x402 client kit.
//!
//! Talk to the ETHYS agent trust network from Rust: an HTTP [`client`],
//! host-facing [`tools`], a discovery [`retriever`] and signed, batched
//! [`telemetry`]. Identity, signing and wire types come from
//! `ethys402-core` and are re-exported here.

pub mod client;
pub mod config;
pub mod errors;
pub mod retriever;
pub mod telemetry;
pub mod tools;

pub use ethys402_core::{canonical, identity, signing, transport, types};
