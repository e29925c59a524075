//! [`ExecutionContext`]: the one object that implements [`Host`] for the
//! whole lifetime of a transaction (§4.2's nested-call contract). It owns
//! nothing the VM doesn't hand it directly — the mutable [`WorldState`]
//! borrow, the active [`Schedule`]/[`BlockEnv`], the transaction-scoped log
//! buffer and refund counter, and the per-slot "original value at
//! transaction start" cache EIP-2200's `SSTORE` accounting needs.
//!
//! Top-level dispatch (a transaction's own call or creation) and nested
//! `CALL`/`CREATE` opcodes both fall through the same two frame-running
//! methods ([`ExecutionContext::run_message_call_frame`] /
//! [`ExecutionContext::run_create_frame`]) — only the depth bookkeeping
//! differs, the same way a single `Executive::call`/`create` pair serves
//! both entry points in `aleth`'s C++ `Executive`.

use crate::error::ExecError;
use alloy_primitives::{Address, Bytes, B256};
use evmcore_chainspec::{ChainSpec, Hardfork, Schedule};
use evmcore_primitives::{
    contract_address, create2_address, keccak256, BlockEnv, LogEntry, Word, EMPTY_CODE_HASH,
};
use evmcore_state::{JournalMark, WorldState};
use evmcore_trie::NodeStore;
use evmcore_vm::{
    CallKind, CallOutcome, CallRequest, CreateOutcome, CreateRequest, ExecutionEnv, Host,
    JumpDestCache, SstoreGas, VmError, MAX_CALL_DEPTH, MAX_CODE_SIZE,
};
use rustc_hash::FxHashMap;

/// A combined world-state/log-buffer snapshot mark, so a reverted frame
/// loses both its state mutations and the logs it emitted (§4.2: "logs of
/// reverted frames are discarded").
struct Checkpoint {
    state: JournalMark,
    logs_len: usize,
}

pub struct ExecutionContext<'a, S: NodeStore + Clone> {
    pub state: &'a mut WorldState<S>,
    pub chain_spec: &'a ChainSpec,
    pub schedule: Schedule,
    pub block_env: &'a BlockEnv,
    pub jumpdest_cache: &'a JumpDestCache,
    /// Constant across every nested frame of this transaction.
    pub origin: Address,
    pub gas_price: Word,
    /// The depth of the frame currently executing; 0 at the top frame.
    depth: u32,
    pub logs: Vec<LogEntry>,
    /// Accumulated refund across every frame that completed without
    /// reverting (§4.2's refund is computed once at `finalize`).
    pub refund: i64,
    /// Lazily populated on a slot's first `SSTORE` this transaction —
    /// EIP-2200's "original" value, fixed for the whole transaction
    /// regardless of how many times the slot is subsequently dirtied or
    /// how many of those writes later revert.
    original_storage: FxHashMap<(Address, B256), Word>,
}

impl<'a, S: NodeStore + Clone> ExecutionContext<'a, S> {
    pub fn new(
        state: &'a mut WorldState<S>,
        chain_spec: &'a ChainSpec,
        schedule: Schedule,
        block_env: &'a BlockEnv,
        jumpdest_cache: &'a JumpDestCache,
        origin: Address,
        gas_price: Word,
    ) -> Self {
        Self {
            state,
            chain_spec,
            schedule,
            block_env,
            jumpdest_cache,
            origin,
            gas_price,
            depth: 0,
            logs: Vec::new(),
            refund: 0,
            original_storage: FxHashMap::default(),
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            state: self.state.snapshot(),
            logs_len: self.logs.len(),
        }
    }

    fn rollback(&mut self, mark: Checkpoint) {
        self.state.revert(mark.state);
        self.logs.truncate(mark.logs_len);
    }

    /// Runs a transaction's own top-level message call (`to` present) —
    /// the same frame-running logic a nested `CALL` uses, just started at
    /// depth 0 and without the depth-cap check a nested call needs.
    pub(crate) fn top_level_call(
        &mut self,
        to: Address,
        sender: Address,
        value: Word,
        input: Bytes,
        gas: u64,
    ) -> Result<CallOutcome, ExecError> {
        self.run_message_call_frame(to, to, sender, sender, value, value, input, gas, false, 0)
    }

    /// Runs a transaction's own top-level contract creation (`to` empty).
    pub(crate) fn top_level_create(
        &mut self,
        sender: Address,
        value: Word,
        init_code: Bytes,
        gas: u64,
    ) -> Result<CreateOutcome, ExecError> {
        self.run_create_frame(sender, value, init_code, gas, None, 0)
    }

    /// The shared body of every message call, whether reached via a
    /// transaction's own `to` or a nested `CALL`/`CALLCODE`/`DELEGATECALL`/
    /// `STATICCALL`: balance precondition and transfer, precompile-or-code
    /// dispatch, and the EIP-158 touched-empty sweep on success.
    #[allow(clippy::too_many_arguments)]
    fn run_message_call_frame(
        &mut self,
        code_address: Address,
        this_address: Address,
        caller: Address,
        payer: Address,
        value: Word,
        apparent_value: Word,
        input: Bytes,
        gas: u64,
        is_static: bool,
        frame_depth: u32,
    ) -> Result<CallOutcome, ExecError> {
        let mark = self.checkpoint();

        if !value.is_zero() {
            let balance = self.state.get_balance(payer)?;
            if balance < value {
                self.rollback(mark);
                return Ok(CallOutcome {
                    success: false,
                    gas_remaining: gas,
                    return_data: Bytes::new(),
                });
            }
            self.state.sub_balance(payer, value)?;
            self.state.add_balance(this_address, value)?;
        } else {
            // EIP-161: even a zero-value call touches its target.
            self.state.add_balance(this_address, Word::ZERO)?;
        }

        if let Some(kind) = self.chain_spec.precompile_at(code_address, self.block_env.number) {
            let outcome = evmcore_precompile::run(kind, &input, gas, self.schedule.fork);
            return match outcome {
                Ok((gas_used, output)) => {
                    if self.schedule.fork >= Hardfork::Eip158 {
                        self.state.sweep_if_empty(this_address)?;
                    }
                    Ok(CallOutcome {
                        success: true,
                        gas_remaining: gas - gas_used,
                        return_data: Bytes::from(output),
                    })
                }
                Err(_) => {
                    self.rollback(mark);
                    Ok(CallOutcome {
                        success: false,
                        gas_remaining: 0,
                        return_data: Bytes::new(),
                    })
                }
            };
        }

        let code = self.state.get_code(code_address)?;
        let code_hash = self.state.get_code_hash(code_address)?;
        let env = ExecutionEnv {
            caller,
            origin: self.origin,
            this_address,
            input_data: input,
            apparent_value,
            gas_price: self.gas_price,
            block_env: self.block_env,
            depth: frame_depth,
            is_static,
        };
        let old_depth = self.depth;
        self.depth = frame_depth;
        let result = evmcore_vm::run(&code, code_hash, env, gas, &self.schedule, self.jumpdest_cache, self);
        self.depth = old_depth;

        match result.outcome {
            Ok(return_data) => {
                self.refund += result.refund;
                if self.schedule.fork >= Hardfork::Eip158 {
                    self.state.sweep_if_empty(this_address)?;
                }
                Ok(CallOutcome {
                    success: true,
                    gas_remaining: result.gas_remaining,
                    return_data,
                })
            }
            Err(VmError::Revert(data)) => {
                self.rollback(mark);
                Ok(CallOutcome {
                    success: false,
                    gas_remaining: result.gas_remaining,
                    return_data: data,
                })
            }
            Err(_) => {
                self.rollback(mark);
                Ok(CallOutcome {
                    success: false,
                    gas_remaining: 0,
                    return_data: Bytes::new(),
                })
            }
        }
    }

    /// The shared body of every contract creation, whether reached via a
    /// transaction's own empty `to` or a nested `CREATE`/`CREATE2`: address
    /// derivation, collision detection, value transfer, init-code
    /// execution, and the code-deposit gas charge.
    fn run_create_frame(
        &mut self,
        caller: Address,
        value: Word,
        init_code: Bytes,
        gas: u64,
        salt: Option<B256>,
        frame_depth: u32,
    ) -> Result<CreateOutcome, ExecError> {
        let mark = self.checkpoint();

        let nonce = self.state.get_nonce(caller)?;
        let new_address = match salt {
            Some(salt) => create2_address(caller, salt, keccak256(&init_code)),
            None => contract_address(caller, nonce),
        };
        self.state.increment_nonce(caller)?;

        let collision = match self.state.get_account(new_address)? {
            Some(acc) => acc.nonce != 0 || acc.code_hash != *EMPTY_CODE_HASH,
            None => false,
        };
        if collision {
            self.rollback(mark);
            return Ok(CreateOutcome {
                success: false,
                address: Address::ZERO,
                gas_remaining: 0,
                return_data: Bytes::new(),
            });
        }

        if !value.is_zero() {
            let balance = self.state.get_balance(caller)?;
            if balance < value {
                self.rollback(mark);
                return Ok(CreateOutcome {
                    success: false,
                    address: Address::ZERO,
                    gas_remaining: gas,
                    return_data: Bytes::new(),
                });
            }
            self.state.sub_balance(caller, value)?;
        }
        self.state.add_balance(new_address, value)?;
        let start_nonce = self.chain_spec.params.account_start_nonce;
        if start_nonce != 0 {
            self.state.set_nonce(new_address, start_nonce)?;
        }

        let code_hash = keccak256(&init_code);
        let env = ExecutionEnv {
            caller,
            origin: self.origin,
            this_address: new_address,
            input_data: Bytes::new(),
            apparent_value: value,
            gas_price: self.gas_price,
            block_env: self.block_env,
            depth: frame_depth,
            is_static: false,
        };
        let old_depth = self.depth;
        self.depth = frame_depth;
        let result = evmcore_vm::run(&init_code, code_hash, env, gas, &self.schedule, self.jumpdest_cache, self);
        self.depth = old_depth;

        match result.outcome {
            Ok(return_data) => {
                if self.schedule.fork >= Hardfork::Eip158 && return_data.len() > MAX_CODE_SIZE {
                    self.rollback(mark);
                    return Ok(CreateOutcome {
                        success: false,
                        address: Address::ZERO,
                        gas_remaining: 0,
                        return_data: Bytes::new(),
                    });
                }
                let deposit_cost = return_data.len() as u64 * Schedule::GAS_CODE_DEPOSIT_PER_BYTE;
                if result.gas_remaining < deposit_cost {
                    self.rollback(mark);
                    return Ok(CreateOutcome {
                        success: false,
                        address: Address::ZERO,
                        gas_remaining: 0,
                        return_data: Bytes::new(),
                    });
                }
                self.refund += result.refund;
                self.state.set_code(new_address, return_data)?;
                Ok(CreateOutcome {
                    success: true,
                    address: new_address,
                    gas_remaining: result.gas_remaining - deposit_cost,
                    return_data: Bytes::new(),
                })
            }
            Err(VmError::Revert(data)) => {
                self.rollback(mark);
                Ok(CreateOutcome {
                    success: false,
                    address: Address::ZERO,
                    gas_remaining: result.gas_remaining,
                    return_data: data,
                })
            }
            Err(_) => {
                self.rollback(mark);
                Ok(CreateOutcome {
                    success: false,
                    address: Address::ZERO,
                    gas_remaining: 0,
                    return_data: Bytes::new(),
                })
            }
        }
    }
}

impl<'a, S: NodeStore + Clone> Host for ExecutionContext<'a, S> {
    type Error = ExecError;

    fn balance(&mut self, addr: Address) -> Result<Word, Self::Error> {
        Ok(self.state.get_balance(addr)?)
    }

    fn code(&mut self, addr: Address) -> Result<Bytes, Self::Error> {
        Ok(self.state.get_code(addr)?)
    }

    fn code_size(&mut self, addr: Address) -> Result<usize, Self::Error> {
        Ok(self.state.get_code(addr)?.len())
    }

    fn code_hash(&mut self, addr: Address) -> Result<B256, Self::Error> {
        if !self.state.exists(addr)? {
            return Ok(B256::ZERO);
        }
        Ok(self.state.get_code_hash(addr)?)
    }

    fn exists(&mut self, addr: Address) -> Result<bool, Self::Error> {
        Ok(self.state.exists(addr)?)
    }

    fn sload(&mut self, addr: Address, key: B256) -> Result<Word, Self::Error> {
        Ok(self.state.get_storage(addr, key)?)
    }

    fn sstore(&mut self, addr: Address, key: B256, value: Word) -> Result<SstoreGas, Self::Error> {
        let current = self.state.get_storage(addr, key)?;
        let original = *self.original_storage.entry((addr, key)).or_insert(current);
        let outcome = self.schedule.sstore_cost(original, current, value);
        self.state.set_storage(addr, key, value)?;
        Ok(SstoreGas {
            gas_cost: outcome.gas_cost,
            refund_delta: outcome.refund_delta,
        })
    }

    fn log(&mut self, log: LogEntry) {
        self.logs.push(log);
    }

    fn selfdestruct(&mut self, addr: Address, beneficiary: Address) -> Result<bool, Self::Error> {
        let first_time = !self.state.is_marked_for_selfdestruct(addr);
        self.state.mark_selfdestruct(addr, beneficiary);
        Ok(first_time)
    }

    fn call(&mut self, request: CallRequest) -> CallOutcome {
        let child_depth = self.depth + 1;
        if child_depth >= MAX_CALL_DEPTH {
            return CallOutcome {
                success: false,
                gas_remaining: request.gas,
                return_data: Bytes::new(),
            };
        }
        // CALLCODE never moves balance externally (payer == this_address),
        // but the balance check inside `run_message_call_frame` still
        // fires correctly since the two addresses coincide.
        let _ = CallKind::Call;
        match self.run_message_call_frame(
            request.code_address,
            request.this_address,
            request.caller,
            request.payer,
            request.value,
            request.apparent_value,
            request.input,
            request.gas,
            request.is_static,
            child_depth,
        ) {
            Ok(outcome) => outcome,
            Err(_) => CallOutcome {
                success: false,
                gas_remaining: 0,
                return_data: Bytes::new(),
            },
        }
    }

    fn create(&mut self, request: CreateRequest) -> CreateOutcome {
        let child_depth = self.depth + 1;
        if child_depth >= MAX_CALL_DEPTH {
            return CreateOutcome {
                success: false,
                address: Address::ZERO,
                gas_remaining: request.gas,
                return_data: Bytes::new(),
            };
        }
        match self.run_create_frame(
            request.caller,
            request.value,
            request.init_code,
            request.gas,
            request.salt,
            child_depth,
        ) {
            Ok(outcome) => outcome,
            Err(_) => CreateOutcome {
                success: false,
                address: Address::ZERO,
                gas_remaining: 0,
                return_data: Bytes::new(),
            },
        }
    }
}
