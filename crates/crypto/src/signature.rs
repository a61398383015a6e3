//! Recoverable ECDSA signature values and their wire encoding
//!
//! A [`SignatureData`] holds `v`, `r` and `s` as `0x`-prefixed hex strings,
//! the form in which they are embedded in transactions and returned to
//! callers. Transaction signatures carry the chain id inside `v`:
//!
//! ```text
//! v' = v + chain_id * 2 + 8      where v = 27 + recovery_id
//! ```
//!
//! which yields the familiar `recovery_id + chain_id * 2 + 35`. Message
//! signatures keep the raw `v`.

use alloy_rlp::{Encodable, Header};
use k256::ecdsa::{RecoveryId, Signature as K256Signature};
use serde::{Deserialize, Serialize, Serializer};

use crate::encoding::{add_hex_prefix, decode_hex, strip_hex_prefix, trim_leading_zeros};
use crate::error::{CryptoError, CryptoResult};

/// Offset added to the recovery id to form a legacy `v`
pub const LEGACY_V_OFFSET: u64 = 27;

/// Constant folded into `v` together with `chain_id * 2`
pub const CHAIN_ID_V_OFFSET: u64 = 8;

/// Smallest `v` that can carry a chain id
const MIN_CHAIN_V: u64 = 35;

/// A `(v, r, s)` triple produced by a signing call.
///
/// Equality compares the three hex strings verbatim. It is meant for
/// deduplication and tests, never for verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawSignature")]
pub struct SignatureData {
    v: String,
    r: String,
    s: String,
}

#[derive(Deserialize)]
struct RawSignature {
    v: String,
    r: String,
    s: String,
}

impl From<RawSignature> for SignatureData {
    fn from(raw: RawSignature) -> Self {
        Self::new(&raw.v, &raw.r, &raw.s)
    }
}

impl SignatureData {
    /// Build from hex strings, adding the `0x` prefix where missing.
    pub fn new(v: &str, r: &str, s: &str) -> Self {
        Self {
            v: add_hex_prefix(v).to_lowercase(),
            r: add_hex_prefix(r).to_lowercase(),
            s: add_hex_prefix(s).to_lowercase(),
        }
    }

    /// Build from big-endian byte strings.
    pub fn from_bytes(v: &[u8], r: &[u8], s: &[u8]) -> Self {
        Self {
            v: format!("0x{}", hex::encode(v)),
            r: format!("0x{}", hex::encode(r)),
            s: format!("0x{}", hex::encode(s)),
        }
    }

    /// Build from a k256 signature and an explicit `v` value.
    pub(crate) fn from_k256(signature: &K256Signature, v: u64) -> Self {
        let bytes = signature.to_bytes();
        Self {
            v: format!("0x{:x}", v),
            r: format!("0x{}", hex::encode(&bytes[..32])),
            s: format!("0x{}", hex::encode(&bytes[32..])),
        }
    }

    /// The placeholder signature `("0x01", "0x", "0x")` used for unsigned slots.
    pub fn empty() -> Self {
        Self {
            v: "0x01".to_string(),
            r: "0x".to_string(),
            s: "0x".to_string(),
        }
    }

    /// Whether this is the unsigned placeholder.
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    pub fn v(&self) -> &str {
        &self.v
    }

    pub fn r(&self) -> &str {
        &self.r
    }

    pub fn s(&self) -> &str {
        &self.s
    }

    /// Numeric value of `v`.
    pub fn v_value(&self) -> CryptoResult<u64> {
        let body = strip_hex_prefix(&self.v);
        if body.is_empty() {
            return Err(CryptoError::InvalidSignature("v value is not set".to_string()));
        }
        u64::from_str_radix(body, 16)
            .map_err(|e| CryptoError::InvalidSignature(format!("invalid v value: {}", e)))
    }

    /// Fold a chain id into `v`, consuming the raw signature.
    ///
    /// Fails with [`CryptoError::InvalidSignature`] when `v` is missing or the
    /// signature has no `r`/`s` (the unsigned placeholder).
    pub fn with_chain_id(self, chain_id: u64) -> CryptoResult<Self> {
        if strip_hex_prefix(&self.r).is_empty() || strip_hex_prefix(&self.s).is_empty() {
            return Err(CryptoError::InvalidSignature(
                "cannot apply chain id to an unsigned placeholder".to_string(),
            ));
        }
        let v = self.v_value()?;
        let encoded = chain_id
            .checked_mul(2)
            .and_then(|doubled| doubled.checked_add(v))
            .and_then(|sum| sum.checked_add(CHAIN_ID_V_OFFSET))
            .ok_or_else(|| CryptoError::InvalidSignature("chain id overflows v".to_string()))?;

        Ok(Self {
            v: format!("0x{:x}", encoded),
            ..self
        })
    }

    /// Recovery id (y parity) encoded in `v`.
    ///
    /// Accepts a bare parity (`0`/`1`), a legacy `27`/`28`, or a chain-id
    /// encoded value `>= 35`.
    pub fn recovery_id(&self) -> CryptoResult<u8> {
        let v = self.v_value()?;
        match v {
            0 | 1 => Ok(v as u8),
            v if v < LEGACY_V_OFFSET => Err(CryptoError::InvalidSignature(format!(
                "v byte out of range: {}",
                v
            ))),
            v if v < MIN_CHAIN_V => {
                let id = v - LEGACY_V_OFFSET;
                if id > 1 {
                    return Err(CryptoError::InvalidSignature(format!(
                        "v byte out of range: {}",
                        v
                    )));
                }
                Ok(id as u8)
            }
            v => Ok(((v - MIN_CHAIN_V) % 2) as u8),
        }
    }

    /// Chain id encoded in `v`, if any.
    pub fn chain_id(&self) -> Option<u64> {
        let v = self.v_value().ok()?;
        if v < MIN_CHAIN_V {
            return None;
        }
        let parity = (v - MIN_CHAIN_V) % 2;
        Some((v - MIN_CHAIN_V - parity) >> 1)
    }

    /// Drop placeholders and duplicates, keeping first occurrences in order.
    ///
    /// Returns a single placeholder when nothing remains.
    pub fn refine(signatures: Vec<SignatureData>) -> Vec<SignatureData> {
        let mut refined: Vec<SignatureData> = Vec::with_capacity(signatures.len());
        for signature in signatures {
            if !signature.is_empty() && !refined.contains(&signature) {
                refined.push(signature);
            }
        }
        if refined.is_empty() {
            refined.push(Self::empty());
        }
        refined
    }

    /// `v`, `r`, `s` as big-endian bytes with leading zero bytes removed.
    fn wire_fields(&self) -> CryptoResult<[Vec<u8>; 3]> {
        let decode = |name: &str, value: &str| -> CryptoResult<Vec<u8>> {
            let bytes = decode_hex(value)
                .map_err(|e| CryptoError::InvalidSignature(format!("invalid {} hex: {}", name, e)))?;
            let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
            Ok(bytes[first..].to_vec())
        };
        Ok([
            decode("v", &self.v)?,
            decode("r", &self.r)?,
            decode("s", &self.s)?,
        ])
    }

    /// Encode as the three-item list `[v, r, s]` embedded in a transaction.
    pub fn to_wire_list(&self) -> CryptoResult<Vec<u8>> {
        let fields = self.wire_fields()?;
        let payload_length: usize = fields.iter().map(|f| Encodable::length(f.as_slice())).sum();

        let mut out = Vec::with_capacity(payload_length + 4);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        for field in &fields {
            Encodable::encode(field.as_slice(), &mut out);
        }
        Ok(out)
    }

    /// Encode several signatures as a list of `[v, r, s]` lists.
    pub fn encode_list(signatures: &[SignatureData]) -> CryptoResult<Vec<u8>> {
        let items = signatures
            .iter()
            .map(SignatureData::to_wire_list)
            .collect::<CryptoResult<Vec<_>>>()?;
        let payload_length: usize = items.iter().map(Vec::len).sum();

        let mut out = Vec::with_capacity(payload_length + 9);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        for item in &items {
            out.extend_from_slice(item);
        }
        Ok(out)
    }

    /// Decode a list of `[v, r, s]` lists.
    ///
    /// Entries with fewer than three fields, or that are not lists at all,
    /// are skipped.
    pub fn decode_list(raw: &[u8]) -> CryptoResult<Vec<SignatureData>> {
        let mut buf = raw;
        let outer = Header::decode(&mut buf).map_err(rlp_error)?;
        if !outer.list {
            return Err(CryptoError::InvalidSignature(
                "signature container is not a list".to_string(),
            ));
        }
        let mut payload = take(&mut buf, outer.payload_length)?;

        let mut signatures = Vec::new();
        while !payload.is_empty() {
            let header = Header::decode(&mut payload).map_err(rlp_error)?;
            let mut item = take(&mut payload, header.payload_length)?;
            if !header.list {
                continue;
            }

            let mut fields = Vec::with_capacity(3);
            while !item.is_empty() {
                let field = Header::decode(&mut item).map_err(rlp_error)?;
                if field.list {
                    return Err(CryptoError::InvalidSignature(
                        "signature field must be a byte string".to_string(),
                    ));
                }
                fields.push(take(&mut item, field.payload_length)?);
            }

            if fields.len() < 3 {
                continue;
            }
            signatures.push(Self::from_bytes(fields[0], fields[1], fields[2]));
        }
        Ok(signatures)
    }

    /// Convert into a k256 signature plus recovery id for public key recovery.
    pub(crate) fn to_k256(&self) -> CryptoResult<(K256Signature, RecoveryId)> {
        let fields = self.wire_fields()?;
        let (r, s) = (&fields[1], &fields[2]);
        if r.len() > 32 || s.len() > 32 {
            return Err(CryptoError::InvalidSignature(
                "r and s must be at most 32 bytes".to_string(),
            ));
        }

        let mut rs = [0u8; 64];
        rs[32 - r.len()..32].copy_from_slice(r);
        rs[64 - s.len()..].copy_from_slice(s);

        let signature = K256Signature::from_slice(&rs)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let recovery_id = RecoveryId::from_byte(self.recovery_id()?)
            .ok_or_else(|| CryptoError::InvalidSignature("invalid recovery id".to_string()))?;
        Ok((signature, recovery_id))
    }
}

impl Default for SignatureData {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for SignatureData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V : {}\nR : {}\nS : {}", self.v, self.r, self.s)
    }
}

/// JSON form trims leading zero nibbles from every component.
impl Serialize for SignatureData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("SignatureData", 3)?;
        state.serialize_field("v", &trim_leading_zeros(&self.v))?;
        state.serialize_field("r", &trim_leading_zeros(&self.r))?;
        state.serialize_field("s", &trim_leading_zeros(&self.s))?;
        state.end()
    }
}

fn take<'a>(buf: &mut &'a [u8], len: usize) -> CryptoResult<&'a [u8]> {
    if buf.len() < len {
        return Err(CryptoError::InvalidSignature(
            "rlp payload shorter than its header".to_string(),
        ));
    }
    let (head, rest) = buf.split_at(len);
    *buf = rest;
    Ok(head)
}

fn rlp_error(e: alloy_rlp::Error) -> CryptoError {
    CryptoError::InvalidSignature(format!("rlp: {}", e))
}
