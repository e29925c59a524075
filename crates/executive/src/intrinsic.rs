use evmcore_chainspec::Hardfork;
use evmcore_primitives::Transaction;

/// `G_transaction`: the fixed per-transaction component of intrinsic gas,
/// unchanged since Frontier.
const TX_BASE_GAS: u64 = 21_000;

/// `G_txcreate`: the surcharge for a contract-creation transaction (`to`
/// empty), unchanged since Frontier — coincidentally the same constant as
/// the `CREATE` opcode's own base cost ([`evmcore_chainspec::Schedule::GAS_CREATE`]),
/// but charged here as an intrinsic cost deducted before any VM frame runs,
/// not as an opcode cost.
const TX_CREATE_GAS: u64 = 32_000;

const TX_DATA_ZERO_GAS: u64 = 4;

/// Per-non-zero-data-byte cost before EIP-2028 (Istanbul).
const TX_DATA_NONZERO_GAS: u64 = 68;

/// Per-non-zero-data-byte cost from EIP-2028 (Istanbul), recovered from
/// `original_source`'s fork ladder as a supplement — the distilled spec's
/// "intrinsic gas" glossary entry names the rule but not this repricing.
const TX_DATA_NONZERO_GAS_ISTANBUL: u64 = 16;

/// The fixed per-transaction gas cost plus the per-byte cost of `tx.data`,
/// deducted before any VM execution (§4.2's `initialize`).
pub fn intrinsic_gas(tx: &Transaction, fork: Hardfork) -> u64 {
    let mut gas = TX_BASE_GAS;
    if tx.is_creation() {
        gas += TX_CREATE_GAS;
    }
    let nonzero_byte_gas = if fork >= Hardfork::Istanbul {
        TX_DATA_NONZERO_GAS_ISTANBUL
    } else {
        TX_DATA_NONZERO_GAS
    };
    for &byte in tx.data.iter() {
        gas += if byte == 0 { TX_DATA_ZERO_GAS } else { nonzero_byte_gas };
    }
    gas
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes};
    use evmcore_primitives::{TxKind, Word};

    fn tx(to: TxKind, data: Vec<u8>) -> Transaction {
        Transaction {
            nonce: 0,
            gas_price: Word::from(1u64),
            gas_limit: 100_000,
            to,
            value: Word::ZERO,
            data: Bytes::from(data),
            v: 27,
            r: Word::from(1u64),
            s: Word::from(2u64),
        }
    }

    #[test]
    fn plain_call_with_no_data_costs_the_base() {
        let t = tx(TxKind::Call(Address::ZERO), vec![]);
        assert_eq!(intrinsic_gas(&t, Hardfork::London), 21_000);
    }

    #[test]
    fn creation_adds_the_create_surcharge() {
        let t = tx(TxKind::Create, vec![]);
        assert_eq!(intrinsic_gas(&t, Hardfork::Frontier), 53_000);
    }

    #[test]
    fn istanbul_reprices_nonzero_data_bytes() {
        let t = tx(TxKind::Call(Address::ZERO), vec![1, 2, 3]);
        assert_eq!(intrinsic_gas(&t, Hardfork::Byzantium), 21_000 + 3 * 68);
        assert_eq!(intrinsic_gas(&t, Hardfork::Istanbul), 21_000 + 3 * 16);
    }

    #[test]
    fn zero_bytes_are_cheaper_than_nonzero() {
        let t = tx(TxKind::Call(Address::ZERO), vec![0, 0, 1]);
        assert_eq!(intrinsic_gas(&t, Hardfork::London), 21_000 + 2 * 4 + 16);
    }
}
