use alloy_primitives::{Address, Bytes, B256};
use evmcore_primitives::{BlockEnv, LogEntry, Word};
use std::fmt;

/// The per-frame execution environment established at CALL/CREATE time
/// (§4.1): everything a frame reads about who it is and who invoked it.
/// Immutable for the lifetime of the frame.
#[derive(Debug, Clone)]
pub struct ExecutionEnv<'a> {
    pub caller: Address,
    pub origin: Address,
    pub this_address: Address,
    pub input_data: Bytes,
    /// `CALLVALUE`'s answer — distinct from the balance actually moved for
    /// `DELEGATECALL` (0 moved, parent's value still apparent).
    pub apparent_value: Word,
    pub gas_price: Word,
    pub block_env: &'a BlockEnv,
    /// 0 at the top frame, +1 per nested CALL/CREATE; hard cap 1024.
    pub depth: u32,
    pub is_static: bool,
}

/// How a frame's code was reached — carried for tracing only; every
/// address/storage/value-context distinction the four call opcodes imply
/// is already resolved into [`CallRequest`]'s fields by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

/// A fully resolved nested-call request, built by the `CALL`/`CALLCODE`/
/// `DELEGATECALL`/`STATICCALL` opcode handlers and handed to [`Host::call`].
/// Each opcode differs only in how it fills these fields (§4.1's system
/// opcodes); the nested-call contract itself (§4.2) is uniform over them.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub kind: CallKind,
    /// Whose code runs.
    pub code_address: Address,
    /// `ADDRESS`/storage/balance context of the child frame.
    pub this_address: Address,
    /// The account `value` is debited from (the parent's own address for
    /// every variant; irrelevant when `value` is zero).
    pub payer: Address,
    /// `CALLER`'s answer inside the child.
    pub caller: Address,
    /// Balance actually transferred; zero for `DELEGATECALL`/`STATICCALL`.
    pub value: Word,
    /// `CALLVALUE`'s answer inside the child.
    pub apparent_value: Word,
    pub input: Bytes,
    /// Gas forwarded to the child, already capped at
    /// `Schedule::subcall_gas_cap` and stipend-adjusted by the caller.
    pub gas: u64,
    pub is_static: bool,
}

/// The outcome of a nested call, as seen by the parent frame: whether to
/// push `1` or `0`, how much of the forwarded gas to refund, and what
/// `return_data` becomes.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub success: bool,
    pub gas_remaining: u64,
    pub return_data: Bytes,
}

/// A fully resolved `CREATE`/`CREATE2` request.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub caller: Address,
    pub value: Word,
    pub init_code: Bytes,
    pub gas: u64,
    /// `Some(salt)` for `CREATE2`; `None` for `CREATE` (address derives from
    /// `caller`'s nonce instead).
    pub salt: Option<B256>,
}

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub success: bool,
    pub address: Address,
    pub gas_remaining: u64,
    pub return_data: Bytes,
}

/// The collaborator every VM frame calls out to for anything outside its
/// own stack/memory/code (§4.2's nested-call contract, §4.3's world-state
/// operations). Implemented once, over the whole transaction, by
/// `evmcore-executive`'s execution context — this crate never depends on
/// `evmcore-state` or `evmcore-executive` directly, which keeps the
/// interpreter testable against a bare mock and keeps the dependency graph
/// acyclic (the same split `revm` draws between its interpreter and its
/// `Database`/`Host` environment).
pub trait Host {
    type Error: std::error::Error + fmt::Debug + 'static;

    fn balance(&mut self, addr: Address) -> Result<Word, Self::Error>;
    fn code(&mut self, addr: Address) -> Result<Bytes, Self::Error>;
    fn code_size(&mut self, addr: Address) -> Result<usize, Self::Error>;
    fn code_hash(&mut self, addr: Address) -> Result<B256, Self::Error>;
    fn exists(&mut self, addr: Address) -> Result<bool, Self::Error>;

    fn sload(&mut self, addr: Address, key: B256) -> Result<Word, Self::Error>;
    /// Performs the `SSTORE`, returning its gas cost and refund delta
    /// already resolved against the active schedule's tri-state rule
    /// (§4.1) and this transaction's per-slot original-value cache.
    fn sstore(&mut self, addr: Address, key: B256, value: Word) -> Result<SstoreGas, Self::Error>;

    fn log(&mut self, log: LogEntry);

    /// Registers `addr` for destruction in `beneficiary`'s favour at
    /// finalize (§4.2). Returns `true` if this is the first time `addr`
    /// self-destructed this transaction (gates the refund, which is only
    /// granted once per address).
    fn selfdestruct(&mut self, addr: Address, beneficiary: Address) -> Result<bool, Self::Error>;

    /// Runs a nested `CALL`/`CALLCODE`/`DELEGATECALL`/`STATICCALL`,
    /// including the depth check, balance precondition, snapshot/revert,
    /// and precompile dispatch of §4.2.
    fn call(&mut self, request: CallRequest) -> CallOutcome;

    /// Runs a nested `CREATE`/`CREATE2`, including address derivation,
    /// collision detection, code-deposit gas, and snapshot/revert.
    fn create(&mut self, request: CreateRequest) -> CreateOutcome;
}

/// The result of one `SSTORE`, as computed by [`Host::sstore`] against the
/// active [`evmcore_chainspec::Schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SstoreGas {
    pub gas_cost: u64,
    pub refund_delta: i64,
}
