use crate::{keccak256, Hash256, Signature, SignatureError, Word};
use alloy_primitives::{Address, Bytes};
use alloy_rlp::{Buf, BufMut, Decodable, Encodable, Header};

/// The recipient of a transaction: an existing account for a message call,
/// or the creation marker for contract creation.
///
/// Encodes as the empty byte string for [`TxKind::Create`] and as the
/// 20-byte address otherwise — never as a 20-byte zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxKind {
    Create,
    Call(Address),
}

impl TxKind {
    pub fn to(self) -> Option<Address> {
        match self {
            TxKind::Create => None,
            TxKind::Call(addr) => Some(addr),
        }
    }

    pub fn is_create(self) -> bool {
        matches!(self, TxKind::Create)
    }
}

impl Encodable for TxKind {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            TxKind::Create => out.put_u8(alloy_rlp::EMPTY_STRING_CODE),
            TxKind::Call(addr) => addr.encode(out),
        }
    }

    fn length(&self) -> usize {
        match self {
            TxKind::Create => 1,
            TxKind::Call(addr) => addr.length(),
        }
    }
}

impl Decodable for TxKind {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        if let Some(&first) = buf.first() {
            if first == alloy_rlp::EMPTY_STRING_CODE {
                buf.advance(1);
                return Ok(TxKind::Create);
            }
        }
        Ok(TxKind::Call(Address::decode(buf)?))
    }
}

/// An external, signed transaction: a message call (`to` present) or a
/// contract creation (`to` empty).
///
/// Canonical wire encoding is the RLP of the nine fields in the order
/// `[nonce, gas_price, gas_limit, to, value, data, v, r, s]`. Signing hash
/// is either the pre-EIP-155 six-field encoding, or the EIP-155 nine-field
/// encoding with `(chain_id, 0, 0)` standing in for `(v, r, s)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub gas_price: Word,
    pub gas_limit: u64,
    pub to: TxKind,
    pub value: Word,
    pub data: Bytes,
    pub v: u64,
    pub r: Word,
    pub s: Word,
}

impl Transaction {
    /// `Some(chain_id)` if `v` carries an EIP-155 replay-protected chain id,
    /// `None` for legacy `v` of 27 or 28.
    pub fn chain_id(&self) -> Option<u64> {
        match self.v {
            27 | 28 => None,
            v if v >= 35 => Some((v - 35) / 2),
            _ => None,
        }
    }

    fn y_parity(&self) -> bool {
        match self.v {
            27 | 28 => self.v == 28,
            v => (v - 35) % 2 == 1,
        }
    }

    pub fn signature(&self) -> Signature {
        Signature::new(self.r, self.s, self.y_parity())
    }

    fn encode_signing_fields(&self, out: &mut dyn BufMut, chain_id: Option<u64>) {
        let header = Header {
            list: true,
            payload_length: self.signing_payload_length(chain_id),
        };
        header.encode(out);
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.data.encode(out);
        if let Some(chain_id) = chain_id {
            chain_id.encode(out);
            0u8.encode(out);
            0u8.encode(out);
        }
    }

    fn signing_payload_length(&self, chain_id: Option<u64>) -> usize {
        let mut len = self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to.length()
            + self.value.length()
            + self.data.length();
        if let Some(chain_id) = chain_id {
            len += chain_id.length() + 1 + 1;
        }
        len
    }

    /// The message hash that `(r, s, v)` sign: Keccak-256 of the
    /// pre-EIP-155 six-field encoding, or of the EIP-155 nine-field
    /// encoding carrying `chain_id` in place of the signature.
    pub fn signing_hash(&self, chain_id: Option<u64>) -> Hash256 {
        let mut buf = Vec::with_capacity(self.signing_payload_length(chain_id) + 8);
        self.encode_signing_fields(&mut buf, chain_id);
        keccak256(buf)
    }

    /// Recovers and returns the sending address, validating the
    /// signature's `(r, s)` range and EIP-155 `chain_id` consistency
    /// against `expected_chain_id` (pass `None` to accept any chain, e.g.
    /// for a legacy-only chain).
    pub fn sender(&self, expected_chain_id: Option<u64>) -> Result<Address, SignatureError> {
        if let (Some(tx_chain_id), Some(expected)) = (self.chain_id(), expected_chain_id) {
            if tx_chain_id != expected {
                return Err(SignatureError::InvalidRecoveryId(self.v));
            }
        }
        let hash = self.signing_hash(self.chain_id());
        self.signature().recover_address(hash)
    }

    /// The transaction hash used to key it in a block's transaction trie:
    /// Keccak-256 of the fully-signed nine-field RLP encoding.
    pub fn hash(&self) -> Hash256 {
        keccak256(alloy_rlp::encode(self))
    }

    /// `true` if this is a contract-creation transaction (`to` empty).
    pub fn is_creation(&self) -> bool {
        self.to.is_create()
    }
}

impl Transaction {
    fn payload_length(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to.length()
            + self.value.length()
            + self.data.length()
            + self.v.length()
            + self.r.length()
            + self.s.length()
    }
}

impl Encodable for Transaction {
    fn encode(&self, out: &mut dyn BufMut) {
        let header = Header {
            list: true,
            payload_length: self.payload_length(),
        };
        header.encode(out);
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.data.encode(out);
        self.v.encode(out);
        self.r.encode(out);
        self.s.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + Header { list: true, payload_length }.length()
    }
}

impl Decodable for Transaction {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let started_len = buf.len();
        let tx = Transaction {
            nonce: u64::decode(buf)?,
            gas_price: Word::decode(buf)?,
            gas_limit: u64::decode(buf)?,
            to: TxKind::decode(buf)?,
            value: Word::decode(buf)?,
            data: Bytes::decode(buf)?,
            v: u64::decode(buf)?,
            r: Word::decode(buf)?,
            s: Word::decode(buf)?,
        };
        let consumed = started_len - buf.len();
        if consumed != header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            });
        }
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rlp_round_trips_call() {
        let tx = Transaction {
            nonce: 9,
            gas_price: Word::from(20_000_000_000u64),
            gas_limit: 21000,
            to: TxKind::Call(Address::repeat_byte(0x11)),
            value: Word::from(1000u64),
            data: Bytes::new(),
            v: 37,
            r: Word::from(1u64),
            s: Word::from(2u64),
        };
        let encoded = alloy_rlp::encode(&tx);
        let decoded = Transaction::decode(&mut &encoded[..]).unwrap();
        assert_eq!(tx, decoded);
    }

    #[test]
    fn rlp_round_trips_creation() {
        let tx = Transaction {
            nonce: 0,
            gas_price: Word::from(1u64),
            gas_limit: 100_000,
            to: TxKind::Create,
            value: Word::ZERO,
            data: Bytes::from_static(&[0x60, 0x00]),
            v: 27,
            r: Word::from(1u64),
            s: Word::from(2u64),
        };
        let encoded = alloy_rlp::encode(&tx);
        let decoded = Transaction::decode(&mut &encoded[..]).unwrap();
        assert_eq!(tx, decoded);
        assert!(decoded.is_creation());
    }

    #[test]
    fn eip155_chain_id_round_trips_through_v() {
        let tx = Transaction {
            nonce: 0,
            gas_price: Word::from(1u64),
            gas_limit: 21000,
            to: TxKind::Call(Address::ZERO),
            value: Word::ZERO,
            data: Bytes::new(),
            v: 1 * 2 + 35,
            r: Word::from(1u64),
            s: Word::from(2u64),
        };
        assert_eq!(tx.chain_id(), Some(1));
    }
}
