use crate::Hardfork;
use evmcore_primitives::Word;

/// The result of one `SSTORE`: its gas cost and the refund delta to apply
/// (positive credits the refund counter, negative reverses a previously
/// granted refund — EIP-2200's "dirty clear, then dirty-restore" case).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SstoreOutcome {
    pub gas_cost: u64,
    pub refund_delta: i64,
}

/// A fork-parameterised table of gas costs, refund rules and limits (§4.1
/// "Gas Schedule"). Plain data keyed by [`Hardfork`] — no process-wide
/// statics (§9's design note); callers hold one `Schedule` per active fork
/// and thread it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub fork: Hardfork,
}

impl Schedule {
    pub fn for_fork(fork: Hardfork) -> Self {
        Self { fork }
    }

    // ---- flat per-opcode base costs ----

    pub const GAS_ZERO: u64 = 0;
    pub const GAS_BASE: u64 = 2;
    pub const GAS_VERY_LOW: u64 = 3;
    pub const GAS_LOW: u64 = 5;
    pub const GAS_MID: u64 = 8;
    pub const GAS_HIGH: u64 = 10;
    pub const GAS_JUMPDEST: u64 = 1;
    pub const GAS_BLOCKHASH: u64 = 20;
    pub const GAS_EXP: u64 = 10;
    pub const GAS_MEMORY_WORD: u64 = 3;
    pub const GAS_COPY_WORD: u64 = 3;
    pub const GAS_LOG: u64 = 375;
    pub const GAS_LOG_DATA: u64 = 8;
    pub const GAS_LOG_TOPIC: u64 = 375;
    pub const GAS_SHA3: u64 = 30;
    pub const GAS_SHA3_WORD: u64 = 6;
    pub const GAS_CREATE: u64 = 32000;
    pub const GAS_CODE_DEPOSIT_PER_BYTE: u64 = 200;
    pub const GAS_CALL_STIPEND: u64 = 2300;
    pub const GAS_CALL_VALUE_TRANSFER: u64 = 9000;
    pub const GAS_NEW_ACCOUNT: u64 = 25000;
    pub const GAS_SELFDESTRUCT_REFUND: u64 = 24000;
    pub const GAS_CREATE2_WORD: u64 = 6;

    /// `BALANCE`/`EXTCODESIZE`/`EXTCODEHASH`/`EXTCODECOPY`'s base cost and
    /// `CALL`'s non-value-transfer base cost: 20 before Tangerine Whistle,
    /// 400 from EIP-150, 700 from Istanbul (EIP-1884 repricing of
    /// state-touching opcodes it folds into `SLOAD`'s analogue).
    pub fn ext_account_gas(&self) -> u64 {
        if self.fork >= Hardfork::Istanbul {
            700
        } else if self.fork >= Hardfork::Eip150 {
            400
        } else {
            20
        }
    }

    /// `SLOAD`'s base cost: 50 pre-EIP150, 200 from EIP-150, 800 from
    /// Istanbul's EIP-1884.
    pub fn sload_gas(&self) -> u64 {
        if self.fork >= Hardfork::Istanbul {
            800
        } else if self.fork >= Hardfork::Eip150 {
            200
        } else {
            50
        }
    }

    /// `SELFDESTRUCT`'s base cost: 0 pre-EIP150, 5000 from EIP-150 (plus
    /// the new-account surcharge below).
    pub fn selfdestruct_gas(&self) -> u64 {
        if self.fork >= Hardfork::Eip150 {
            5000
        } else {
            0
        }
    }

    /// Whether a value-bearing `SELFDESTRUCT`/`CALL` to a not-yet-existing
    /// account pays the `GAS_NEW_ACCOUNT` surcharge — active from EIP-150,
    /// restricted to genuinely new (not just empty) targets after EIP-158.
    pub fn charges_new_account_gas(&self) -> bool {
        self.fork >= Hardfork::Eip150
    }

    /// Refund granted for `SELFDESTRUCT`; removed entirely by EIP-3529
    /// (London).
    pub fn selfdestruct_refund(&self) -> i64 {
        if self.fork >= Hardfork::London {
            0
        } else {
            Self::GAS_SELFDESTRUCT_REFUND as i64
        }
    }

    /// `EXP`'s per-exponent-byte surcharge: 10 pre-Spurious-Dragon, 50 from
    /// EIP-158.
    pub fn exp_byte_gas(&self) -> u64 {
        if self.fork >= Hardfork::Eip158 {
            50
        } else {
            10
        }
    }

    /// Whether `SHL`/`SHR`/`SAR` (EIP-145) are available.
    pub fn has_shift_opcodes(&self) -> bool {
        self.fork >= Hardfork::Constantinople
    }

    /// Whether `CREATE2`, `EXTCODEHASH` are available.
    pub fn has_constantinople_opcodes(&self) -> bool {
        self.fork >= Hardfork::Constantinople
    }

    /// Whether `CHAINID`/`SELFBALANCE` are available.
    pub fn has_istanbul_opcodes(&self) -> bool {
        self.fork >= Hardfork::Istanbul
    }

    /// The EIP-150 sub-call gas cap: at most `floor(63/64 * gas_remaining)`.
    /// Pre-EIP-150, the full remaining gas may be forwarded (subject only to
    /// the amount the caller explicitly requested).
    pub fn subcall_gas_cap(&self, gas_remaining: u64) -> u64 {
        if self.fork >= Hardfork::Eip150 {
            gas_remaining - gas_remaining / 64
        } else {
            gas_remaining
        }
    }

    /// Maximum gas refundable: half of gas used pre-London, one-fifth from
    /// EIP-3529.
    pub fn max_refund(&self, gas_used: u64) -> u64 {
        let quotient = if self.fork >= Hardfork::London { 5 } else { 2 };
        gas_used / quotient
    }

    /// `CREATE`/`CREATE2`'s per-initcode-byte cost: zero until EIP-3860
    /// (Shanghai), which is beyond this schedule's latest fork — always
    /// zero here, kept as a named hook for forward compatibility.
    pub fn initcode_word_gas(&self) -> u64 {
        0
    }

    /// The exact EIP-2200/EIP-1283 tri-state `SSTORE` accounting: cost and
    /// refund delta depend on the transition between the slot's original
    /// value (at transaction start), its current value, and the new value
    /// being written.
    ///
    /// Before Istanbul, the rule is the simpler binary one: writing a
    /// nonzero value into a zero slot costs 20000 with no refund; any other
    /// write costs 5000; clearing a nonzero slot to zero additionally
    /// refunds 15000. (EIP-1283 was briefly live at Constantinople and
    /// reverted at Petersburg before Istanbul's reentrancy-safe EIP-2200 —
    /// this schedule treats Constantinople..Petersburg as pre-Istanbul,
    /// matching mainnet's actual history; see DESIGN.md.)
    pub fn sstore_cost(&self, original: Word, current: Word, new: Word) -> SstoreOutcome {
        if self.fork >= Hardfork::Istanbul {
            self.sstore_cost_eip2200(original, current, new)
        } else {
            self.sstore_cost_legacy(current, new)
        }
    }

    fn sstore_cost_legacy(&self, current: Word, new: Word) -> SstoreOutcome {
        if current.is_zero() && !new.is_zero() {
            SstoreOutcome { gas_cost: 20000, refund_delta: 0 }
        } else if !current.is_zero() && new.is_zero() {
            SstoreOutcome { gas_cost: 5000, refund_delta: 15000 }
        } else {
            SstoreOutcome { gas_cost: 5000, refund_delta: 0 }
        }
    }

    fn sstore_cost_eip2200(&self, original: Word, current: Word, new: Word) -> SstoreOutcome {
        const SLOAD_GAS: u64 = 800;
        const SSTORE_SET_GAS: u64 = 20000;
        const SSTORE_RESET_GAS: u64 = 5000;

        if current == new {
            return SstoreOutcome { gas_cost: SLOAD_GAS, refund_delta: 0 };
        }
        if original == current {
            if original.is_zero() {
                return SstoreOutcome { gas_cost: SSTORE_SET_GAS, refund_delta: 0 };
            }
            let refund = if new.is_zero() { 15000 } else { 0 };
            return SstoreOutcome { gas_cost: SSTORE_RESET_GAS, refund_delta: refund };
        }
        // original != current: the slot was already dirtied earlier in this
        // transaction. Cost is always the no-op SLOAD cost; refunds
        // reconcile the bookkeeping against what the *first* dirty write
        // already granted/charged.
        let mut refund_delta = 0i64;
        if !original.is_zero() {
            if current.is_zero() {
                refund_delta -= 15000;
            }
            if new.is_zero() {
                refund_delta += 15000;
            }
        }
        if new == original {
            if original.is_zero() {
                refund_delta += SSTORE_SET_GAS as i64 - SLOAD_GAS as i64;
            } else {
                refund_delta += SSTORE_RESET_GAS as i64 - SLOAD_GAS as i64;
            }
        }
        SstoreOutcome { gas_cost: SLOAD_GAS, refund_delta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_sstore_zero_to_zero_is_noop_cost_no_refund() {
        let s = Schedule::for_fork(Hardfork::Byzantium);
        let outcome = s.sstore_cost(Word::ZERO, Word::ZERO, Word::ZERO);
        assert_eq!(outcome.refund_delta, 0);
    }

    #[test]
    fn legacy_sstore_clear_refunds() {
        let s = Schedule::for_fork(Hardfork::Byzantium);
        let outcome = s.sstore_cost(Word::from(1u64), Word::from(1u64), Word::ZERO);
        assert_eq!(outcome.gas_cost, 5000);
        assert_eq!(outcome.refund_delta, 15000);
    }

    #[test]
    fn eip2200_dirty_restore_to_original_cancels_refund_bookkeeping() {
        let s = Schedule::for_fork(Hardfork::Istanbul);
        // original=0, first write dirties to 1 (cost 20000, no refund), then
        // back to 0 (the original) - must refund the 20000-800 delta.
        let first = s.sstore_cost(Word::ZERO, Word::ZERO, Word::from(1u64));
        assert_eq!(first.gas_cost, 20000);
        let second = s.sstore_cost(Word::ZERO, Word::from(1u64), Word::ZERO);
        assert_eq!(second.gas_cost, 800);
        assert_eq!(second.refund_delta, 20000 - 800);
    }

    #[test]
    fn refund_quotient_changes_at_london() {
        let pre = Schedule::for_fork(Hardfork::Istanbul);
        let post = Schedule::for_fork(Hardfork::London);
        assert_eq!(pre.max_refund(100_000), 50_000);
        assert_eq!(post.max_refund(100_000), 20_000);
    }

    #[test]
    fn selfdestruct_refund_removed_at_london() {
        assert_eq!(Schedule::for_fork(Hardfork::Istanbul).selfdestruct_refund(), 24000);
        assert_eq!(Schedule::for_fork(Hardfork::London).selfdestruct_refund(), 0);
    }
}
