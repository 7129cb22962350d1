//! Clarity value encoding.
//!
//! # Responsibilities
//! - Build typed contract-call arguments (`uint`, `principal`, `buff`, ...)
//! - Serialize them in the consensus wire format wallets and nodes expect
//! - Decode read-only call results returned by the node API
//!
//! # Wire Format
//! ```text
//! int/uint        0x00/0x01  ++ 16-byte big-endian
//! buff            0x02       ++ u32 len ++ bytes
//! true/false      0x03/0x04
//! principal       0x05 ++ version ++ hash160
//! contract        0x06 ++ version ++ hash160 ++ u8 len ++ name
//! ok/err          0x07/0x08  ++ value
//! none/some       0x09/0x0a  [++ value]
//! list            0x0b       ++ u32 len ++ values
//! tuple           0x0c       ++ u32 len ++ (u8 len ++ name ++ value)*  (names sorted)
//! string-ascii    0x0d       ++ u32 len ++ bytes
//! ```

use std::collections::BTreeMap;

use crate::blockchain::principal::{ContractPrincipal, StandardPrincipal};
use crate::blockchain::types::{BlockchainError, BlockchainResult};

const TYPE_INT: u8 = 0x00;
const TYPE_UINT: u8 = 0x01;
const TYPE_BUFFER: u8 = 0x02;
const TYPE_TRUE: u8 = 0x03;
const TYPE_FALSE: u8 = 0x04;
const TYPE_STANDARD_PRINCIPAL: u8 = 0x05;
const TYPE_CONTRACT_PRINCIPAL: u8 = 0x06;
const TYPE_RESPONSE_OK: u8 = 0x07;
const TYPE_RESPONSE_ERR: u8 = 0x08;
const TYPE_NONE: u8 = 0x09;
const TYPE_SOME: u8 = 0x0a;
const TYPE_LIST: u8 = 0x0b;
const TYPE_TUPLE: u8 = 0x0c;
const TYPE_STRING_ASCII: u8 = 0x0d;

/// Nesting deeper than this is rejected when decoding.
const MAX_DEPTH: usize = 32;

/// A Clarity value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityValue {
    Int(i128),
    UInt(u128),
    Bool(bool),
    Buffer(Vec<u8>),
    StandardPrincipal(StandardPrincipal),
    ContractPrincipal(ContractPrincipal),
    ResponseOk(Box<ClarityValue>),
    ResponseErr(Box<ClarityValue>),
    OptionalNone,
    OptionalSome(Box<ClarityValue>),
    List(Vec<ClarityValue>),
    Tuple(BTreeMap<String, ClarityValue>),
    StringAscii(String),
}

impl ClarityValue {
    pub fn uint(value: impl Into<u128>) -> Self {
        ClarityValue::UInt(value.into())
    }

    pub fn buffer(bytes: impl Into<Vec<u8>>) -> Self {
        ClarityValue::Buffer(bytes.into())
    }

    /// Consensus serialization.
    pub fn serialize(&self) -> BlockchainResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Consensus serialization as `0x`-prefixed hex.
    pub fn to_hex(&self) -> BlockchainResult<String> {
        Ok(format!("0x{}", hex::encode(self.serialize()?)))
    }

    fn write_to(&self, out: &mut Vec<u8>) -> BlockchainResult<()> {
        match self {
            ClarityValue::Int(v) => {
                out.push(TYPE_INT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::UInt(v) => {
                out.push(TYPE_UINT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::Bool(true) => out.push(TYPE_TRUE),
            ClarityValue::Bool(false) => out.push(TYPE_FALSE),
            ClarityValue::Buffer(bytes) => {
                out.push(TYPE_BUFFER);
                write_len_prefixed(out, bytes)?;
            }
            ClarityValue::StandardPrincipal(p) => {
                out.push(TYPE_STANDARD_PRINCIPAL);
                write_standard(out, p);
            }
            ClarityValue::ContractPrincipal(c) => {
                out.push(TYPE_CONTRACT_PRINCIPAL);
                write_standard(out, &c.issuer);
                write_name(out, &c.name)?;
            }
            ClarityValue::ResponseOk(inner) => {
                out.push(TYPE_RESPONSE_OK);
                inner.write_to(out)?;
            }
            ClarityValue::ResponseErr(inner) => {
                out.push(TYPE_RESPONSE_ERR);
                inner.write_to(out)?;
            }
            ClarityValue::OptionalNone => out.push(TYPE_NONE),
            ClarityValue::OptionalSome(inner) => {
                out.push(TYPE_SOME);
                inner.write_to(out)?;
            }
            ClarityValue::List(items) => {
                out.push(TYPE_LIST);
                out.extend_from_slice(&len_u32(items.len())?.to_be_bytes());
                for item in items {
                    item.write_to(out)?;
                }
            }
            ClarityValue::Tuple(fields) => {
                out.push(TYPE_TUPLE);
                out.extend_from_slice(&len_u32(fields.len())?.to_be_bytes());
                // BTreeMap iterates in sorted key order, as the format requires.
                for (name, value) in fields {
                    write_name(out, name)?;
                    value.write_to(out)?;
                }
            }
            ClarityValue::StringAscii(s) => {
                if !s.is_ascii() {
                    return Err(BlockchainError::Codec("string-ascii contains non-ASCII".into()));
                }
                out.push(TYPE_STRING_ASCII);
                write_len_prefixed(out, s.as_bytes())?;
            }
        }
        Ok(())
    }

    /// Decode a single value, rejecting trailing bytes.
    pub fn deserialize(bytes: &[u8]) -> BlockchainResult<Self> {
        let mut reader = Reader { bytes, pos: 0 };
        let value = reader.read_value(0)?;
        if reader.pos != bytes.len() {
            return Err(BlockchainError::Codec(format!(
                "{} trailing bytes after value",
                bytes.len() - reader.pos
            )));
        }
        Ok(value)
    }

    /// Decode from hex, with or without a `0x` prefix.
    pub fn from_hex(input: &str) -> BlockchainResult<Self> {
        let stripped = input.trim().strip_prefix("0x").unwrap_or(input.trim());
        let bytes = hex::decode(stripped).map_err(|e| BlockchainError::Codec(format!("invalid hex: {}", e)))?;
        Self::deserialize(&bytes)
    }

    /// Unwrap `(ok v)` to `v`; `(err e)` becomes an error; anything else is returned as is.
    pub fn into_ok(self) -> BlockchainResult<ClarityValue> {
        match self {
            ClarityValue::ResponseOk(inner) => Ok(*inner),
            ClarityValue::ResponseErr(inner) => Err(BlockchainError::ReadOnlyCall(format!(
                "contract returned err {:?}",
                inner
            ))),
            other => Ok(other),
        }
    }

    pub fn as_uint(&self) -> Option<u128> {
        match self {
            ClarityValue::UInt(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<StandardPrincipal> for ClarityValue {
    fn from(p: StandardPrincipal) -> Self {
        ClarityValue::StandardPrincipal(p)
    }
}

impl From<ContractPrincipal> for ClarityValue {
    fn from(c: ContractPrincipal) -> Self {
        ClarityValue::ContractPrincipal(c)
    }
}

fn len_u32(len: usize) -> BlockchainResult<u32> {
    u32::try_from(len).map_err(|_| BlockchainError::Codec("length exceeds u32".into()))
}

fn write_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) -> BlockchainResult<()> {
    out.extend_from_slice(&len_u32(bytes.len())?.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

fn write_standard(out: &mut Vec<u8>, p: &StandardPrincipal) {
    out.push(p.version);
    out.extend_from_slice(&p.hash160);
}

fn write_name(out: &mut Vec<u8>, name: &str) -> BlockchainResult<()> {
    let len = u8::try_from(name.len()).map_err(|_| BlockchainError::Codec(format!("name '{}' too long", name)))?;
    out.push(len);
    out.extend_from_slice(name.as_bytes());
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> BlockchainResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| BlockchainError::Codec("unexpected end of input".into()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> BlockchainResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> BlockchainResult<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }

    fn sixteen(&mut self) -> BlockchainResult<[u8; 16]> {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(self.take(16)?);
        Ok(buf)
    }

    fn standard(&mut self) -> BlockchainResult<StandardPrincipal> {
        let version = self.u8()?;
        let mut hash160 = [0u8; 20];
        hash160.copy_from_slice(self.take(20)?);
        Ok(StandardPrincipal { version, hash160 })
    }

    fn name(&mut self) -> BlockchainResult<String> {
        let len = self.u8()? as usize;
        String::from_utf8(self.take(len)?.to_vec())
            .map_err(|_| BlockchainError::Codec("name is not UTF-8".into()))
    }

    fn read_value(&mut self, depth: usize) -> BlockchainResult<ClarityValue> {
        if depth > MAX_DEPTH {
            return Err(BlockchainError::Codec("value nested too deeply".into()));
        }
        let tag = self.u8()?;
        let value = match tag {
            TYPE_INT => ClarityValue::Int(i128::from_be_bytes(self.sixteen()?)),
            TYPE_UINT => ClarityValue::UInt(u128::from_be_bytes(self.sixteen()?)),
            TYPE_BUFFER => {
                let len = self.u32()? as usize;
                ClarityValue::Buffer(self.take(len)?.to_vec())
            }
            TYPE_TRUE => ClarityValue::Bool(true),
            TYPE_FALSE => ClarityValue::Bool(false),
            TYPE_STANDARD_PRINCIPAL => ClarityValue::StandardPrincipal(self.standard()?),
            TYPE_CONTRACT_PRINCIPAL => {
                let issuer = self.standard()?;
                let name = self.name()?;
                ClarityValue::ContractPrincipal(ContractPrincipal { issuer, name })
            }
            TYPE_RESPONSE_OK => ClarityValue::ResponseOk(Box::new(self.read_value(depth + 1)?)),
            TYPE_RESPONSE_ERR => ClarityValue::ResponseErr(Box::new(self.read_value(depth + 1)?)),
            TYPE_NONE => ClarityValue::OptionalNone,
            TYPE_SOME => ClarityValue::OptionalSome(Box::new(self.read_value(depth + 1)?)),
            TYPE_LIST => {
                let len = self.u32()?;
                let mut items = Vec::new();
                for _ in 0..len {
                    items.push(self.read_value(depth + 1)?);
                }
                ClarityValue::List(items)
            }
            TYPE_TUPLE => {
                let len = self.u32()?;
                let mut fields = BTreeMap::new();
                for _ in 0..len {
                    let name = self.name()?;
                    let value = self.read_value(depth + 1)?;
                    fields.insert(name, value);
                }
                ClarityValue::Tuple(fields)
            }
            TYPE_STRING_ASCII => {
                let len = self.u32()? as usize;
                let raw = self.take(len)?;
                if !raw.is_ascii() {
                    return Err(BlockchainError::Codec("string-ascii contains non-ASCII".into()));
                }
                ClarityValue::StringAscii(String::from_utf8_lossy(raw).into_owned())
            }
            other => {
                return Err(BlockchainError::Codec(format!("unsupported type prefix 0x{:02x}", other)));
            }
        };
        Ok(value)
    }
}
