//! EVM address and signature wrappers with the string encodings ETHYS expects.

use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// An EVM account address.
///
/// Renders as lowercase `0x`-prefixed hex, which is the form the ETHYS server
/// compares against when it checks a wallet signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvmAddress(pub Address);

impl EvmAddress {
    /// Lowercase `0x`-prefixed hex representation.
    pub fn to_lower_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_slice()))
    }
}

impl From<Address> for EvmAddress {
    fn from(addr: Address) -> Self {
        EvmAddress(addr)
    }
}

impl From<EvmAddress> for Address {
    fn from(addr: EvmAddress) -> Self {
        addr.0
    }
}

impl FromStr for EvmAddress {
    type Err = alloy_primitives::hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr = Address::from_str(s.trim())?;
        Ok(EvmAddress(addr))
    }
}

impl Display for EvmAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_lower_hex())
    }
}

impl Debug for EvmAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EvmAddress({})", self.to_lower_hex())
    }
}

impl Serialize for EvmAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_lower_hex())
    }
}

impl<'de> Deserialize<'de> for EvmAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EvmAddress::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A recoverable secp256k1 signature (`r || s || v`, 65 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvmSignature(pub alloy_primitives::Signature);

impl EvmSignature {
    /// `0x`-prefixed hex of the 65 signature bytes, `v` encoded as 27/28.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_bytes()))
    }

    /// Recover the EIP-191 signer of `message` and compare it to `expected`.
    pub fn verify(&self, message: &str, expected: Address) -> bool {
        self.0
            .recover_address_from_msg(message.as_bytes())
            .is_ok_and(|recovered| recovered == expected)
    }
}

impl Display for EvmSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for EvmSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EvmSignature({})", self.to_hex())
    }
}

impl FromStr for EvmSignature {
    type Err = alloy_primitives::SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sig = alloy_primitives::Signature::from_str(s.trim())?;
        Ok(EvmSignature(sig))
    }
}

impl Serialize for EvmSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EvmSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EvmSignature::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<alloy_primitives::Signature> for EvmSignature {
    fn from(sig: alloy_primitives::Signature) -> Self {
        EvmSignature(sig)
    }
}
