//! The virtual machine: a fetch-decode-execute interpreter over the fixed
//! one-byte opcode set (§4.1), with a fixed 1024-slot word stack, expanding
//! byte-addressable memory, and exact gas metering against a fork-scoped
//! [`evmcore_chainspec::Schedule`].
//!
//! This crate knows nothing about world state, accounts, or transactions —
//! every effect that reaches outside the current frame (balance reads,
//! storage, logs, nested calls) goes through the [`Host`] trait, which
//! `evmcore-executive` implements. That keeps this crate's dependency graph
//! to `evmcore-primitives` and `evmcore-chainspec` only, the same
//! interpreter/environment split `revm` draws against its own `Database`
//! trait.

mod arithmetic;
mod context;
mod error;
mod interpreter;
mod jumpdest;
mod memory;
pub mod opcode;
mod stack;
mod wide;

pub use context::{
    CallKind, CallOutcome, CallRequest, CreateOutcome, CreateRequest, ExecutionEnv, Host,
    SstoreGas,
};
pub use error::VmError;
pub use interpreter::{run, RunResult, MAX_CALL_DEPTH, MAX_CODE_SIZE};
pub use jumpdest::{JumpDestCache, JumpDestinations};
pub use memory::Memory;
pub use stack::{Stack, STACK_LIMIT};

#[cfg(test)]
#[ctor::ctor]
fn init() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, B256};
    use evmcore_chainspec::{Hardfork, Schedule};
    use evmcore_primitives::{BlockEnv, LogEntry, Word};
    use std::collections::HashMap;

    /// A minimal in-memory [`Host`] for interpreter-level tests: no nested
    /// calls, no persistence beyond the test's own assertions.
    #[derive(Default)]
    struct MockHost {
        storage: HashMap<(Address, B256), Word>,
        balances: HashMap<Address, Word>,
        logs: Vec<LogEntry>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("mock host error")]
    struct MockError;

    impl Host for MockHost {
        type Error = MockError;

        fn balance(&mut self, addr: Address) -> Result<Word, Self::Error> {
            Ok(self.balances.get(&addr).copied().unwrap_or(Word::ZERO))
        }
        fn code(&mut self, _addr: Address) -> Result<Bytes, Self::Error> {
            Ok(Bytes::new())
        }
        fn code_size(&mut self, _addr: Address) -> Result<usize, Self::Error> {
            Ok(0)
        }
        fn code_hash(&mut self, _addr: Address) -> Result<B256, Self::Error> {
            Ok(B256::ZERO)
        }
        fn exists(&mut self, _addr: Address) -> Result<bool, Self::Error> {
            Ok(false)
        }
        fn sload(&mut self, addr: Address, key: B256) -> Result<Word, Self::Error> {
            Ok(self.storage.get(&(addr, key)).copied().unwrap_or(Word::ZERO))
        }
        fn sstore(&mut self, addr: Address, key: B256, value: Word) -> Result<SstoreGas, Self::Error> {
            let original = self.storage.get(&(addr, key)).copied().unwrap_or(Word::ZERO);
            self.storage.insert((addr, key), value);
            let cost = if original.is_zero() && !value.is_zero() {
                20000
            } else {
                5000
            };
            Ok(SstoreGas { gas_cost: cost, refund_delta: 0 })
        }
        fn log(&mut self, log: LogEntry) {
            self.logs.push(log);
        }
        fn selfdestruct(&mut self, _addr: Address, _beneficiary: Address) -> Result<bool, Self::Error> {
            Ok(true)
        }
        fn call(&mut self, _request: CallRequest) -> CallOutcome {
            CallOutcome { success: false, gas_remaining: 0, return_data: Bytes::new() }
        }
        fn create(&mut self, _request: CreateRequest) -> CreateOutcome {
            CreateOutcome {
                success: false,
                address: Address::ZERO,
                gas_remaining: 0,
                return_data: Bytes::new(),
            }
        }
    }

    fn test_block_env() -> BlockEnv {
        BlockEnv {
            number: 100,
            timestamp: 0,
            difficulty: Word::ZERO,
            gas_limit: 30_000_000,
            author: Address::ZERO,
            chain_id: 1,
            base_fee: None,
            recent_block_hashes: Vec::new(),
        }
    }

    fn run_code(code: &[u8], gas_limit: u64) -> RunResult {
        let block_env = test_block_env();
        let env = ExecutionEnv {
            caller: Address::ZERO,
            origin: Address::ZERO,
            this_address: Address::repeat_byte(1),
            input_data: Bytes::new(),
            apparent_value: Word::ZERO,
            gas_price: Word::ZERO,
            block_env: &block_env,
            depth: 0,
            is_static: false,
        };
        let schedule = Schedule::for_fork(Hardfork::London);
        let cache = JumpDestCache::new();
        let mut host = MockHost::default();
        let code_hash = evmcore_primitives::keccak256(code);
        run(code, code_hash, env, gas_limit, &schedule, &cache, &mut host)
    }

    #[test]
    fn add_two_numbers_and_return() {
        // PUSH1 2, PUSH1 3, ADD, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
        let code = [
            opcode::PUSH1, 2,
            opcode::PUSH1, 3,
            opcode::ADD,
            opcode::PUSH1, 0,
            opcode::MSTORE,
            opcode::PUSH1, 32,
            opcode::PUSH1, 0,
            opcode::RETURN,
        ];
        let result = run_code(&code, 100_000);
        let data = result.outcome.expect("must return");
        assert_eq!(Word::from_be_slice(&data), Word::from(5u64));
    }

    #[test]
    fn division_by_zero_is_zero_not_a_trap() {
        let code = [
            opcode::PUSH1, 0,
            opcode::PUSH1, 5,
            opcode::DIV,
            opcode::PUSH1, 0,
            opcode::MSTORE,
            opcode::PUSH1, 32,
            opcode::PUSH1, 0,
            opcode::RETURN,
        ];
        let result = run_code(&code, 100_000);
        let data = result.outcome.expect("must return");
        assert_eq!(Word::from_be_slice(&data), Word::ZERO);
    }

    #[test]
    fn out_of_gas_burns_everything() {
        let code = [opcode::PUSH1, 1, opcode::PUSH1, 1, opcode::ADD];
        let result = run_code(&code, 5);
        assert!(matches!(result.outcome, Err(VmError::OutOfGas)));
        assert_eq!(result.gas_remaining, 0);
    }

    #[test]
    fn revert_preserves_gas_and_data() {
        let code = [
            opcode::PUSH1, 0xaa,
            opcode::PUSH1, 0,
            opcode::MSTORE8,
            opcode::PUSH1, 1,
            opcode::PUSH1, 0,
            opcode::REVERT,
        ];
        let result = run_code(&code, 100_000);
        match result.outcome {
            Err(VmError::Revert(data)) => assert_eq!(&data[..], &[0xaa]),
            other => panic!("expected Revert, got {other:?}"),
        }
        assert!(result.gas_remaining > 0);
    }

    #[test]
    fn invalid_jump_destination_is_rejected() {
        let code = [opcode::PUSH1, 5, opcode::JUMP, opcode::JUMPDEST];
        let result = run_code(&code, 100_000);
        assert!(matches!(result.outcome, Err(VmError::BadJumpDestination(5))));
    }

    #[test]
    fn jump_into_push_immediate_is_rejected() {
        // JUMPDEST byte at offset 3 is really PUSH1's immediate operand.
        let code = [
            opcode::PUSH1, 3,
            opcode::JUMP,
            opcode::PUSH1, opcode::JUMPDEST,
        ];
        let result = run_code(&code, 100_000);
        assert!(matches!(result.outcome, Err(VmError::BadJumpDestination(3))));
    }

    #[test]
    fn sstore_persists_through_the_host() {
        let code = [
            opcode::PUSH1, 0x42,
            opcode::PUSH1, 0,
            opcode::SSTORE,
            opcode::STOP,
        ];
        let result = run_code(&code, 100_000);
        assert!(result.outcome.is_ok());
    }

    #[test]
    fn static_context_rejects_sstore() {
        let block_env = test_block_env();
        let env = ExecutionEnv {
            caller: Address::ZERO,
            origin: Address::ZERO,
            this_address: Address::repeat_byte(1),
            input_data: Bytes::new(),
            apparent_value: Word::ZERO,
            gas_price: Word::ZERO,
            block_env: &block_env,
            depth: 0,
            is_static: true,
        };
        let schedule = Schedule::for_fork(Hardfork::London);
        let cache = JumpDestCache::new();
        let mut host = MockHost::default();
        let code = [opcode::PUSH1, 1, opcode::PUSH1, 0, opcode::SSTORE];
        let code_hash = evmcore_primitives::keccak256(code);
        let result = run(&code, code_hash, env, 100_000, &schedule, &cache, &mut host);
        assert!(matches!(result.outcome, Err(VmError::StaticModeViolation)));
    }

    #[test]
    fn stop_with_empty_code_returns_empty() {
        let result = run_code(&[], 100_000);
        assert_eq!(result.outcome.unwrap(), Bytes::new());
    }
}
