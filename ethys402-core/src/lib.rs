//! ETHYS x402 core library.
//!
//! Agent identity encoding, wallet signing and the wire types of the ETHYS
//! x402 protocol. No networking lives here; see the `ethys402` crate for the
//! HTTP client, tools and telemetry.

pub mod canonical;
pub mod errors;
pub mod identity;
pub mod signing;
pub mod transport;
pub mod types;
