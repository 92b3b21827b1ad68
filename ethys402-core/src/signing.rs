//! Wallet signatures for ETHYS requests.
//!
//! Messages are signed with the EIP-191 personal-message scheme
//! (`"\x19Ethereum Signed Message:\n" || len || message`), which is what the
//! ETHYS server recovers against.

use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use alloy_signer::SignerSync;
use serde::{Deserialize, Serialize};

pub use alloy_signer_local::PrivateKeySigner;

use crate::{
    canonical::to_canonical_string,
    errors::{Error, Result},
    transport::{TelemetryEvent, TelemetryRequest},
    types::{EvmAddress, EvmSignature},
};

/// A single-use 32-byte random value, rendered as `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce(pub [u8; 32]);

impl Nonce {
    /// Fresh nonce from the thread-local CSPRNG.
    pub fn random() -> Self {
        Nonce(rand::random())
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl Display for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce({})", self.to_hex())
    }
}

impl FromStr for Nonce {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Nonce(bytes))
    }
}

impl Serialize for Nonce {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Nonce::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Generate a fresh telemetry nonce.
pub fn generate_nonce() -> Nonce {
    Nonce::random()
}

/// Parse a hex private key, with or without the `0x` prefix.
pub fn signer_from_key(private_key: &str) -> Result<PrivateKeySigner> {
    let key = private_key.trim();
    let key = key.strip_prefix("0x").unwrap_or(key);
    PrivateKeySigner::from_str(key).map_err(|err| Error::InvalidKey(err.to_string()))
}

/// Sign `message` with the EIP-191 scheme using a hex private key.
///
/// Fails with [`Error::InvalidKey`] if the key does not parse.
pub fn sign_message(message: &str, private_key: &str) -> Result<EvmSignature> {
    let signer = signer_from_key(private_key)?;
    sign_message_with(&signer, message)
}

/// Sign `message` with the EIP-191 scheme using an already parsed signer.
pub fn sign_message_with(signer: &PrivateKeySigner, message: &str) -> Result<EvmSignature> {
    let signature = signer.sign_message_sync(message.as_bytes())?;
    Ok(EvmSignature(signature))
}

/// Check that `signature` over `message` was produced by `address`.
///
/// Address comparison ignores hex case. Malformed signatures or addresses
/// yield `false`.
pub fn verify_signature(message: &str, signature: &str, address: &str) -> bool {
    let Ok(signature) = signature.parse::<EvmSignature>() else {
        return false;
    };
    let Ok(expected) = address.parse::<EvmAddress>() else {
        return false;
    };
    signature.verify(message, expected.0)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignablePayload<'a> {
    agent_id: &'a str,
    address: &'a EvmAddress,
    ts: u64,
    nonce: &'a Nonce,
    events: &'a [TelemetryEvent],
}

/// Canonical string the telemetry signature covers.
///
/// Two calls with the same logical content produce byte-identical output,
/// whatever the insertion order of the events' `data` maps.
pub fn build_signable_payload(
    agent_id: &str,
    address: &EvmAddress,
    ts: u64,
    nonce: &Nonce,
    events: &[TelemetryEvent],
) -> Result<String> {
    to_canonical_string(&SignablePayload {
        agent_id,
        address,
        ts,
        nonce,
        events,
    })
}

/// Build the signable payload and sign it.
pub fn sign_telemetry_payload(
    signer: &PrivateKeySigner,
    agent_id: &str,
    address: &EvmAddress,
    ts: u64,
    nonce: &Nonce,
    events: &[TelemetryEvent],
) -> Result<EvmSignature> {
    let payload = build_signable_payload(agent_id, address, ts, nonce, events)?;
    sign_message_with(signer, &payload)
}

/// Sign a telemetry batch and wrap it into a request body.
pub fn sign_telemetry_request(
    signer: &PrivateKeySigner,
    agent_id: &str,
    address: EvmAddress,
    ts: u64,
    nonce: Nonce,
    events: Vec<TelemetryEvent>,
) -> Result<TelemetryRequest> {
    let signature = sign_telemetry_payload(signer, agent_id, &address, ts, &nonce, &events)?;

    Ok(TelemetryRequest {
        agent_id: agent_id.to_string(),
        address,
        ts,
        nonce,
        events,
        signature,
    })
}
