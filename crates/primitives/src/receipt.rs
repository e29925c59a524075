use crate::LogEntry;
use alloy_primitives::{Bloom, B256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header};

/// The outcome field of a [`Receipt`].
///
/// Pre-Byzantium, this is the intermediate state root after the
/// transaction applied. EIP-658 replaced it with a one-byte status code at
/// a fork boundary; both variants are RLP round-trippable so old and new
/// receipts can share one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptOutcome {
    StateRoot(B256),
    Status(bool),
}

impl Encodable for ReceiptOutcome {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            ReceiptOutcome::StateRoot(root) => root.encode(out),
            ReceiptOutcome::Status(true) => 1u8.encode(out),
            ReceiptOutcome::Status(false) => 0u8.encode(out),
        }
    }

    fn length(&self) -> usize {
        match self {
            ReceiptOutcome::StateRoot(root) => root.length(),
            ReceiptOutcome::Status(true) => 1u8.length(),
            ReceiptOutcome::Status(false) => 0u8.length(),
        }
    }
}

impl Decodable for ReceiptOutcome {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let bytes = alloy_rlp::Bytes::decode(buf)?;
        match bytes.len() {
            32 => Ok(ReceiptOutcome::StateRoot(B256::from_slice(&bytes))),
            0 => Ok(ReceiptOutcome::Status(false)),
            1 => Ok(ReceiptOutcome::Status(bytes[0] != 0)),
            other => Err(alloy_rlp::Error::ListLengthMismatch {
                expected: 32,
                got: other,
            }),
        }
    }
}

/// A transaction receipt: the outcome (state root or status byte),
/// cumulative gas used within the block, a logs bloom, and the ordered
/// log entries emitted by the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub outcome: ReceiptOutcome,
    pub cumulative_gas_used: u64,
    pub logs_bloom: Bloom,
    pub logs: Vec<LogEntry>,
}

impl Receipt {
    pub fn success(&self) -> bool {
        matches!(self.outcome, ReceiptOutcome::Status(true))
    }
}

impl Receipt {
    fn payload_length(&self) -> usize {
        self.outcome.length()
            + self.cumulative_gas_used.length()
            + self.logs_bloom.length()
            + self.logs.length()
    }
}

impl Encodable for Receipt {
    fn encode(&self, out: &mut dyn BufMut) {
        let header = Header {
            list: true,
            payload_length: self.payload_length(),
        };
        header.encode(out);
        self.outcome.encode(out);
        self.cumulative_gas_used.encode(out);
        self.logs_bloom.encode(out);
        self.logs.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + Header { list: true, payload_length }.length()
    }
}

impl Decodable for Receipt {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let started_len = buf.len();
        let receipt = Receipt {
            outcome: ReceiptOutcome::decode(buf)?,
            cumulative_gas_used: u64::decode(buf)?,
            logs_bloom: Bloom::decode(buf)?,
            logs: Vec::<LogEntry>::decode(buf)?,
        };
        let consumed = started_len - buf.len();
        if consumed != header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            });
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes};

    #[test]
    fn rlp_round_trips_status_receipt() {
        let receipt = Receipt {
            outcome: ReceiptOutcome::Status(true),
            cumulative_gas_used: 21000,
            logs_bloom: Bloom::default(),
            logs: vec![LogEntry {
                address: Address::repeat_byte(9),
                topics: vec![B256::repeat_byte(1)],
                data: Bytes::from_static(b"hello"),
            }],
        };
        let encoded = alloy_rlp::encode(&receipt);
        let decoded = Receipt::decode(&mut &encoded[..]).unwrap();
        assert_eq!(receipt, decoded);
        assert!(decoded.success());
    }

    #[test]
    fn rlp_round_trips_state_root_receipt() {
        let receipt = Receipt {
            outcome: ReceiptOutcome::StateRoot(B256::repeat_byte(7)),
            cumulative_gas_used: 100,
            logs_bloom: Bloom::default(),
            logs: vec![],
        };
        let encoded = alloy_rlp::encode(&receipt);
        let decoded = Receipt::decode(&mut &encoded[..]).unwrap();
        assert_eq!(receipt, decoded);
    }
}
