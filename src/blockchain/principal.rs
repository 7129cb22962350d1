//! Stacks principals: c32check addresses and contract identifiers.
//!
//! # Format
//! ```text
//! standard:  'S' + c32(version) + c32(hash160 ++ checksum[0..4])
//! contract:  <standard> '.' <contract-name>
//! checksum = sha256(sha256(version ++ hash160))
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::str::FromStr;

use crate::blockchain::network::StacksNetwork;
use crate::blockchain::types::{BlockchainError, BlockchainResult};

const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Longest contract name Clarity accepts.
pub const MAX_CONTRACT_NAME_LEN: usize = 128;

/// Longest c32check address: prefix, version, and 24 payload bytes in c32.
pub const MAX_ADDRESS_LEN: usize = 41;

fn c32_digit(ch: char) -> Option<u8> {
    let normalized = match ch.to_ascii_uppercase() {
        'O' => '0',
        'L' | 'I' => '1',
        other => other,
    };
    C32_ALPHABET
        .iter()
        .position(|&c| c as char == normalized)
        .map(|p| p as u8)
}

fn c32_decode(input: &str) -> Option<Vec<u8>> {
    // Big-endian magnitude, grown as digits are folded in.
    let mut magnitude: Vec<u8> = Vec::new();
    for ch in input.chars() {
        let mut carry = c32_digit(ch)? as u32;
        for byte in magnitude.iter_mut().rev() {
            let value = (*byte as u32) * 32 + carry;
            *byte = (value & 0xff) as u8;
            carry = value >> 8;
        }
        while carry > 0 {
            magnitude.insert(0, (carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let leading_zeros = input.chars().take_while(|&c| c == '0').count();
    let mut out = vec![0u8; leading_zeros];
    out.extend(magnitude);
    Some(out)
}

fn c32_encode(data: &[u8]) -> String {
    // Little-endian base-32 digits.
    let mut digits: Vec<u8> = Vec::new();
    for &byte in data {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            let value = (*digit as u32) * 256 + carry;
            *digit = (value % 32) as u8;
            carry = value / 32;
        }
        while carry > 0 {
            digits.push((carry % 32) as u8);
            carry /= 32;
        }
    }

    let leading_zeros = data.iter().take_while(|&&b| b == 0).count();
    let mut out = "0".repeat(leading_zeros);
    out.extend(digits.iter().rev().map(|&d| C32_ALPHABET[d as usize] as char));
    out
}

fn checksum(version: u8, hash160: &[u8; 20]) -> [u8; 4] {
    let mut first = Sha256::new();
    first.update([version]);
    first.update(hash160);
    let second = Sha256::digest(first.finalize());
    let mut out = [0u8; 4];
    out.copy_from_slice(&second[..4]);
    out
}

fn invalid(value: &str, reason: impl Into<String>) -> BlockchainError {
    BlockchainError::InvalidPrincipal {
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// A single-key or multi-sig account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StandardPrincipal {
    pub version: u8,
    pub hash160: [u8; 20],
}

impl StandardPrincipal {
    /// Network this address belongs to, if its version is a known one.
    pub fn network(&self) -> Option<StacksNetwork> {
        StacksNetwork::for_version(self.version)
    }

    /// Fail unless the address belongs to `network`.
    pub fn ensure_network(&self, network: StacksNetwork) -> BlockchainResult<()> {
        if network.accepts_version(self.version) {
            return Ok(());
        }
        Err(BlockchainError::NetworkMismatch {
            expected: network.to_string(),
            actual: self
                .network()
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("version {}", self.version)),
        })
    }
}

impl FromStr for StandardPrincipal {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() > MAX_ADDRESS_LEN {
            let shown: String = s.chars().take(MAX_ADDRESS_LEN).collect();
            return Err(invalid(&shown, "address too long"));
        }
        let mut chars = s.chars();
        if chars.next() != Some('S') {
            return Err(invalid(s, "address must start with 'S'"));
        }
        let version = chars
            .next()
            .and_then(c32_digit)
            .ok_or_else(|| invalid(s, "missing or invalid version character"))?;

        let payload = c32_decode(chars.as_str()).ok_or_else(|| invalid(s, "invalid c32 character"))?;
        if payload.len() < 4 {
            return Err(invalid(s, "address too short"));
        }
        let (hash, check) = payload.split_at(payload.len() - 4);
        if hash.len() > 20 {
            return Err(invalid(s, "address too long"));
        }

        let mut hash160 = [0u8; 20];
        hash160[20 - hash.len()..].copy_from_slice(hash);

        if checksum(version, &hash160) != check {
            return Err(invalid(s, "checksum mismatch"));
        }
        Ok(Self { version, hash160 })
    }
}

impl std::fmt::Display for StandardPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut payload = self.hash160.to_vec();
        payload.extend_from_slice(&checksum(self.version, &self.hash160));
        write!(
            f,
            "S{}{}",
            C32_ALPHABET[(self.version & 0x1f) as usize] as char,
            c32_encode(&payload)
        )
    }
}

/// Validate a Clarity contract name.
pub fn validate_contract_name(name: &str) -> BlockchainResult<()> {
    if name.is_empty() || name.len() > MAX_CONTRACT_NAME_LEN {
        return Err(invalid(name, "contract name must be 1-128 characters"));
    }
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !first_ok || !rest_ok {
        return Err(invalid(name, "contract name has invalid characters"));
    }
    Ok(())
}

/// A deployed contract: issuer address plus contract name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractPrincipal {
    pub issuer: StandardPrincipal,
    pub name: String,
}

impl ContractPrincipal {
    pub fn new(issuer: StandardPrincipal, name: impl Into<String>) -> BlockchainResult<Self> {
        let name = name.into();
        validate_contract_name(&name)?;
        Ok(Self { issuer, name })
    }
}

impl FromStr for ContractPrincipal {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (issuer, name) = s
            .split_once('.')
            .ok_or_else(|| invalid(s, "expected <address>.<contract-name>"))?;
        Self::new(issuer.parse()?, name)
    }
}

impl std::fmt::Display for ContractPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.issuer, self.name)
    }
}

/// Any principal that can own assets or be passed to a contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    Standard(StandardPrincipal),
    Contract(ContractPrincipal),
}

impl FromStr for Principal {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('.') {
            s.parse().map(Principal::Contract)
        } else {
            s.parse().map(Principal::Standard)
        }
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Principal::Standard(p) => write!(f, "{}", p),
            Principal::Contract(p) => write!(f, "{}", p),
        }
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(StandardPrincipal);
string_serde!(ContractPrincipal);
string_serde!(Principal);
