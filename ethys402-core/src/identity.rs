//! Agent identities and the `agentIdKey` derived from them.
//!
//! An identity is either a plain wallet (EOA) or an ERC-6551 token-bound
//! account. Its canonical encoding is a fixed 54-byte layout:
//!
//! | bytes   | field                                   |
//! |---------|-----------------------------------------|
//! | 0       | version                                 |
//! | 1       | kind (1 = EOA, 2 = token-bound)         |
//! | 2..22   | address                                 |
//! | 22..54  | token id, big-endian (zero for EOA)     |
//!
//! and `agentIdKey = keccak256(encoding)`.
//!
//! ```
//! use alloy_primitives::address;
//! use ethys402_core::identity::{AgentIdentity, derive_agent_id_key};
//!
//! let identity = AgentIdentity::eoa(address!("0x1111111111111111111111111111111111111111"));
//! let key = derive_agent_id_key(&identity);
//! assert_eq!(key, derive_agent_id_key(&identity));
//! assert_eq!(key.to_string().len(), 66);
//! ```

use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use alloy_primitives::{Address, B256, U256, keccak256};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Length of [`AgentIdentity::encode`] output.
pub const IDENTITY_ENCODING_LEN: usize = 54;

/// Identity version used when none is specified.
pub const DEFAULT_IDENTITY_VERSION: u8 = 1;

/// The kind of account an agent identity is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IdentityKind {
    /// Externally-owned account: a plain wallet key.
    Eoa = 1,
    /// ERC-6551 token-bound account: anchored to an NFT contract and token id.
    TokenBound = 2,
}

impl IdentityKind {
    /// The discriminant byte written into the encoding.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The protocol name of the kind, `"EOA"` or `"ERC6551"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            IdentityKind::Eoa => "EOA",
            IdentityKind::TokenBound => "ERC6551",
        }
    }
}

impl TryFrom<u8> for IdentityKind {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            1 => Ok(IdentityKind::Eoa),
            2 => Ok(IdentityKind::TokenBound),
            other => Err(Error::InvalidIdentity(format!(
                "unknown identity kind {other}; expected 1 (EOA) or 2 (ERC6551)"
            ))),
        }
    }
}

impl FromStr for IdentityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "EOA" => Ok(IdentityKind::Eoa),
            "ERC6551" => Ok(IdentityKind::TokenBound),
            other => Err(Error::InvalidIdentity(format!(
                "unsupported identity type '{other}'; expected 'EOA' or 'ERC6551'"
            ))),
        }
    }
}

impl Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An agent's on-chain identity.
///
/// Fields are private: once constructed an identity cannot change, so its
/// [`AgentIdKey`] is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentIdentity {
    version: u8,
    kind: IdentityKind,
    address: Address,
    token_id: Option<U256>,
}

impl AgentIdentity {
    /// A wallet identity at the default version.
    pub fn eoa(address: impl Into<Address>) -> Self {
        AgentIdentity {
            version: DEFAULT_IDENTITY_VERSION,
            kind: IdentityKind::Eoa,
            address: address.into(),
            token_id: None,
        }
    }

    /// A token-bound identity for `token_id` of `token_contract`, at the default version.
    pub fn token_bound(token_contract: impl Into<Address>, token_id: impl Into<U256>) -> Self {
        AgentIdentity {
            version: DEFAULT_IDENTITY_VERSION,
            kind: IdentityKind::TokenBound,
            address: token_contract.into(),
            token_id: Some(token_id.into()),
        }
    }

    /// Same identity under a different encoding version.
    pub fn with_version(self, version: u8) -> Self {
        AgentIdentity { version, ..self }
    }

    /// Build an identity from untrusted raw parts.
    ///
    /// Fails with [`Error::InvalidIdentity`] if `kind` is not a known
    /// discriminant or `address` is not exactly 20 bytes.
    pub fn from_parts(
        version: u8,
        kind: u8,
        address: &[u8],
        token_id: Option<U256>,
    ) -> Result<Self> {
        let kind = IdentityKind::try_from(kind)?;
        if address.len() != 20 {
            return Err(Error::InvalidIdentity(format!(
                "address must be exactly 20 bytes, got {}",
                address.len()
            )));
        }
        let address = Address::from_slice(address);

        Ok(AgentIdentity {
            version,
            kind,
            address,
            token_id,
        })
    }

    /// Build an identity from its textual form: a kind name (`"EOA"` or
    /// `"ERC6551"`) and a `0x`-prefixed 40 hex digit address.
    pub fn parse(kind: &str, address: &str, token_id: Option<U256>) -> Result<Self> {
        let kind = IdentityKind::from_str(kind)?;
        let address = parse_address(address)?;

        Ok(AgentIdentity {
            version: DEFAULT_IDENTITY_VERSION,
            kind,
            address,
            token_id,
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn kind(&self) -> IdentityKind {
        self.kind
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The token id as encoded: always zero for EOA identities.
    pub fn token_id(&self) -> U256 {
        match self.kind {
            IdentityKind::Eoa => U256::ZERO,
            IdentityKind::TokenBound => self.token_id.unwrap_or(U256::ZERO),
        }
    }

    /// Canonical fixed-layout encoding. See the [module docs](self).
    pub fn encode(&self) -> [u8; IDENTITY_ENCODING_LEN] {
        let mut out = [0u8; IDENTITY_ENCODING_LEN];
        out[0] = self.version;
        out[1] = self.kind.code();
        out[2..22].copy_from_slice(self.address.as_slice());
        out[22..].copy_from_slice(&self.token_id().to_be_bytes::<32>());
        out
    }

    /// `keccak256` of the canonical encoding.
    pub fn agent_id_key(&self) -> AgentIdKey {
        AgentIdKey(keccak256(self.encode()))
    }
}

fn parse_address(s: &str) -> Result<Address> {
    let digits = s.strip_prefix("0x").ok_or_else(|| {
        Error::InvalidIdentity(format!("address '{s}' must be 0x-prefixed"))
    })?;
    if digits.len() != 40 {
        return Err(Error::InvalidIdentity(format!(
            "address '{s}' must be 0x followed by 40 hex characters"
        )));
    }
    Address::from_str(digits)
        .map_err(|err| Error::InvalidIdentity(format!("address '{s}' is not valid hex: {err}")))
}

/// Encode `identity` into its canonical 54-byte form.
pub fn encode_identity(identity: &AgentIdentity) -> [u8; IDENTITY_ENCODING_LEN] {
    identity.encode()
}

/// Derive the stable lookup key of `identity`.
pub fn derive_agent_id_key(identity: &AgentIdentity) -> AgentIdKey {
    identity.agent_id_key()
}

/// A 32-byte identity digest, rendered as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentIdKey(pub B256);

impl AgentIdKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0.0
    }
}

impl Display for AgentIdKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_slice()))
    }
}

impl Debug for AgentIdKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AgentIdKey({self})")
    }
}

impl FromStr for AgentIdKey {
    type Err = alloy_primitives::hex::FromHexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(AgentIdKey(B256::from_str(s)?))
    }
}

impl Serialize for AgentIdKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AgentIdKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AgentIdKey::from_str(&s).map_err(serde::de::Error::custom)
    }
}
