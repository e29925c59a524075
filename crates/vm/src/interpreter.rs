//! The fetch-decode-execute loop (§4.1) over one code blob. One
//! [`Interpreter`] runs exactly one frame; nested `CALL`/`CREATE` recurse
//! back into the [`Host`], which owns the frame stack and world state.

use crate::arithmetic;
use crate::context::{
    CallKind, CallOutcome, CallRequest, CreateOutcome, CreateRequest, ExecutionEnv, Host,
};
use crate::error::VmError;
use crate::jumpdest::{JumpDestCache, JumpDestinations};
use crate::memory::{as_usize, Memory};
use crate::opcode;
use crate::stack::Stack;
use crate::wide;
use alloy_primitives::{keccak256, Address, Bytes, B256};
use evmcore_chainspec::Schedule;
use evmcore_helpers::dev_trace;
use evmcore_primitives::{LogEntry, Word};
use std::sync::Arc;

/// Hard cap on nested `CALL`/`CREATE` depth (§4.2).
pub const MAX_CALL_DEPTH: u32 = 1024;

/// `EIP-170`'s deployed-code size limit.
pub const MAX_CODE_SIZE: usize = 24576;

/// What a completed frame hands back to its caller: remaining gas, the
/// refund counter delta accumulated this frame, and either the returned
/// bytes or the exception that ended it.
pub struct RunResult {
    pub gas_remaining: u64,
    pub refund: i64,
    pub outcome: Result<Bytes, VmError>,
}

/// Executes `code` under `env`, starting with `gas_limit` gas, against
/// `host`. This is the single entry point every `CALL`/`CREATE` handler
/// (inside `host.call`/`host.create`) and the Executive's top-level
/// message-call dispatch both funnel through.
pub fn run<H: Host>(
    code: &[u8],
    code_hash: B256,
    env: ExecutionEnv<'_>,
    gas_limit: u64,
    schedule: &Schedule,
    jumpdest_cache: &JumpDestCache,
    host: &mut H,
) -> RunResult {
    let dests = jumpdest_cache.get_or_analyze(code_hash, code);
    let mut interp = Interpreter {
        code,
        dests,
        env,
        schedule,
        stack: Stack::new(),
        memory: Memory::new(),
        pc: 0,
        gas: gas_limit,
        refund: 0,
        return_data: Bytes::new(),
        host,
    };
    let outcome = interp.run_loop();
    let gas_remaining = match &outcome {
        Ok(_) => interp.gas,
        Err(e) if e.preserves_gas() => interp.gas,
        Err(_) => 0,
    };
    RunResult {
        gas_remaining,
        refund: interp.refund,
        outcome,
    }
}

struct Interpreter<'a, H: Host> {
    code: &'a [u8],
    dests: Arc<JumpDestinations>,
    env: ExecutionEnv<'a>,
    schedule: &'a Schedule,
    stack: Stack,
    memory: Memory,
    pc: u64,
    gas: u64,
    refund: i64,
    /// `RETURNDATA` of the most recently completed child call/create.
    return_data: Bytes,
    host: &'a mut H,
}

impl<'a, H: Host> Interpreter<'a, H> {
    fn charge(&mut self, amount: u64) -> Result<(), VmError> {
        if self.gas < amount {
            self.gas = 0;
            return Err(VmError::OutOfGas);
        }
        self.gas -= amount;
        Ok(())
    }

    fn charge_memory(&mut self, offset: Word, len: Word) -> Result<(), VmError> {
        let cost = self
            .memory
            .expansion_cost(offset, len)
            .ok_or(VmError::OutOfGas)?;
        self.charge(cost)
    }

    fn require_not_static(&self) -> Result<(), VmError> {
        if self.env.is_static {
            Err(VmError::StaticModeViolation)
        } else {
            Ok(())
        }
    }

    fn current_code_byte(&self, pc: u64) -> u8 {
        usize::try_from(pc)
            .ok()
            .and_then(|pc| self.code.get(pc))
            .copied()
            .unwrap_or(opcode::STOP)
    }

    fn run_loop(&mut self) -> Result<Bytes, VmError> {
        loop {
            if self.pc as usize >= self.code.len() {
                return Ok(Bytes::new());
            }
            let op = self.current_code_byte(self.pc);
            dev_trace!(pc = self.pc, op = opcode::name(op), gas = self.gas, "step");
            if let Some(result) = self.dispatch(op)? {
                return Ok(result);
            }
        }
    }

    /// Executes one instruction, advancing `self.pc`. Returns `Some(data)`
    /// when the frame halts normally (`STOP`/`RETURN`), `None` to continue.
    fn dispatch(&mut self, op: u8) -> Result<Option<Bytes>, VmError> {
        match op {
            opcode::STOP => return Ok(Some(Bytes::new())),

            opcode::ADD => self.binary(Schedule::GAS_VERY_LOW, |a, b| a.wrapping_add(b))?,
            opcode::MUL => self.binary(Schedule::GAS_LOW, |a, b| a.wrapping_mul(b))?,
            opcode::SUB => self.binary(Schedule::GAS_VERY_LOW, |a, b| a.wrapping_sub(b))?,
            opcode::DIV => self.binary(Schedule::GAS_LOW, |a, b| {
                if b.is_zero() { Word::ZERO } else { a / b }
            })?,
            opcode::SDIV => self.binary(Schedule::GAS_LOW, arithmetic::sdiv)?,
            opcode::MOD => self.binary(Schedule::GAS_LOW, |a, b| {
                if b.is_zero() { Word::ZERO } else { a % b }
            })?,
            opcode::SMOD => self.binary(Schedule::GAS_LOW, arithmetic::smod)?,
            opcode::ADDMOD => self.ternary(Schedule::GAS_MID, wide::addmod)?,
            opcode::MULMOD => self.ternary(Schedule::GAS_MID, wide::mulmod)?,
            opcode::EXP => self.exp()?,
            opcode::SIGNEXTEND => self.binary(Schedule::GAS_LOW, arithmetic::signextend)?,

            opcode::LT => self.binary(Schedule::GAS_VERY_LOW, |a, b| bool_word(a < b))?,
            opcode::GT => self.binary(Schedule::GAS_VERY_LOW, |a, b| bool_word(a > b))?,
            opcode::SLT => self.binary(Schedule::GAS_VERY_LOW, |a, b| bool_word(arithmetic::slt(a, b)))?,
            opcode::SGT => self.binary(Schedule::GAS_VERY_LOW, |a, b| bool_word(arithmetic::sgt(a, b)))?,
            opcode::EQ => self.binary(Schedule::GAS_VERY_LOW, |a, b| bool_word(a == b))?,
            opcode::ISZERO => self.unary(Schedule::GAS_VERY_LOW, |a| bool_word(a.is_zero()))?,
            opcode::AND => self.binary(Schedule::GAS_VERY_LOW, |a, b| a & b)?,
            opcode::OR => self.binary(Schedule::GAS_VERY_LOW, |a, b| a | b)?,
            opcode::XOR => self.binary(Schedule::GAS_VERY_LOW, |a, b| a ^ b)?,
            opcode::NOT => self.unary(Schedule::GAS_VERY_LOW, |a| !a)?,
            opcode::BYTE => self.binary(Schedule::GAS_VERY_LOW, byte_op)?,
            opcode::SHL => self.shift_op(|value, shift| {
                if shift >= 256 { Word::ZERO } else { value << shift }
            })?,
            opcode::SHR => self.shift_op(|value, shift| {
                if shift >= 256 { Word::ZERO } else { value >> shift }
            })?,
            opcode::SAR => self.shift_op_signed()?,

            opcode::SHA3 => self.sha3()?,

            opcode::ADDRESS => self.push_env(Schedule::GAS_BASE, word_from_address(self.env.this_address))?,
            opcode::BALANCE => self.balance()?,
            opcode::ORIGIN => self.push_env(Schedule::GAS_BASE, word_from_address(self.env.origin))?,
            opcode::CALLER => self.push_env(Schedule::GAS_BASE, word_from_address(self.env.caller))?,
            opcode::CALLVALUE => self.push_env(Schedule::GAS_BASE, self.env.apparent_value)?,
            opcode::CALLDATALOAD => self.calldataload()?,
            opcode::CALLDATASIZE => {
                self.push_env(Schedule::GAS_BASE, Word::from(self.env.input_data.len() as u64))?
            }
            opcode::CALLDATACOPY => self.data_copy(|this| this.env.input_data.clone())?,
            opcode::CODESIZE => self.push_env(Schedule::GAS_BASE, Word::from(self.code.len() as u64))?,
            opcode::CODECOPY => self.data_copy(|this| Bytes::copy_from_slice(this.code))?,
            opcode::GASPRICE => self.push_env(Schedule::GAS_BASE, self.env.gas_price)?,
            opcode::EXTCODESIZE => self.extcodesize()?,
            opcode::EXTCODECOPY => self.extcodecopy()?,
            opcode::RETURNDATASIZE => {
                self.push_env(Schedule::GAS_BASE, Word::from(self.return_data.len() as u64))?
            }
            opcode::RETURNDATACOPY => self.returndatacopy()?,
            opcode::EXTCODEHASH => self.extcodehash()?,

            opcode::BLOCKHASH => self.blockhash()?,
            opcode::COINBASE => {
                self.push_env(Schedule::GAS_BASE, word_from_address(self.env.block_env.author))?
            }
            opcode::TIMESTAMP => {
                self.push_env(Schedule::GAS_BASE, Word::from(self.env.block_env.timestamp))?
            }
            opcode::NUMBER => self.push_env(Schedule::GAS_BASE, Word::from(self.env.block_env.number))?,
            opcode::DIFFICULTY => self.push_env(Schedule::GAS_BASE, self.env.block_env.difficulty)?,
            opcode::GASLIMIT => {
                self.push_env(Schedule::GAS_BASE, Word::from(self.env.block_env.gas_limit))?
            }
            opcode::CHAINID => {
                self.require_feature(self.schedule.has_istanbul_opcodes())?;
                self.push_env(Schedule::GAS_BASE, Word::from(self.env.block_env.chain_id))?
            }
            opcode::SELFBALANCE => self.selfbalance()?,

            opcode::POP => {
                self.charge(Schedule::GAS_BASE)?;
                self.stack.pop()?;
                self.advance(1);
            }
            opcode::MLOAD => self.mload()?,
            opcode::MSTORE => self.mstore()?,
            opcode::MSTORE8 => self.mstore8()?,
            opcode::SLOAD => self.sload()?,
            opcode::SSTORE => self.sstore()?,
            opcode::JUMP => self.jump()?,
            opcode::JUMPI => self.jumpi()?,
            opcode::PC => self.push_env(Schedule::GAS_BASE, Word::from(self.pc))?,
            opcode::MSIZE => self.push_env(Schedule::GAS_BASE, Word::from(self.memory.len() as u64))?,
            opcode::GAS => {
                self.charge(Schedule::GAS_BASE)?;
                let remaining = self.gas;
                self.stack.push(Word::from(remaining))?;
                self.advance(1);
            }
            opcode::JUMPDEST => {
                self.charge(Schedule::GAS_JUMPDEST)?;
                self.advance(1);
            }

            op if opcode::is_push(op) => self.push_op(op)?,
            op if opcode::is_dup(op) => {
                self.charge(Schedule::GAS_VERY_LOW)?;
                self.stack.dup((op - opcode::DUP1 + 1) as usize)?;
                self.advance(1);
            }
            op if opcode::is_swap(op) => {
                self.charge(Schedule::GAS_VERY_LOW)?;
                self.stack.swap((op - opcode::SWAP1 + 1) as usize)?;
                self.advance(1);
            }
            op if opcode::is_log(op) => self.log_op(op)?,

            opcode::CREATE => return self.create_op(false).map(Some),
            opcode::CALL => return self.call_op(CallKind::Call).map(Some),
            opcode::CALLCODE => return self.call_op(CallKind::CallCode).map(Some),
            opcode::RETURN => return self.return_op().map(Some),
            opcode::DELEGATECALL => return self.call_op(CallKind::DelegateCall).map(Some),
            opcode::CREATE2 => return self.create_op(true).map(Some),
            opcode::STATICCALL => return self.call_op(CallKind::StaticCall).map(Some),
            opcode::REVERT => return self.revert_op().map(Some),
            opcode::INVALID => return Err(VmError::InvalidInstruction(op)),
            opcode::SELFDESTRUCT => return self.selfdestruct_op().map(Some),

            _ => return Err(VmError::InvalidInstruction(op)),
        }
        Ok(None)
    }

    fn advance(&mut self, by: u64) {
        self.pc += by;
    }

    fn require_feature(&self, enabled: bool) -> Result<(), VmError> {
        if enabled {
            Ok(())
        } else {
            Err(VmError::InvalidInstruction(self.current_code_byte(self.pc)))
        }
    }

    fn binary(&mut self, gas: u64, f: impl Fn(Word, Word) -> Word) -> Result<(), VmError> {
        self.charge(gas)?;
        let a = self.stack.pop()?;
        let b = self.stack.pop()?;
        self.stack.push(f(a, b))?;
        self.advance(1);
        Ok(())
    }

    fn ternary(&mut self, gas: u64, f: impl Fn(Word, Word, Word) -> Word) -> Result<(), VmError> {
        self.charge(gas)?;
        let a = self.stack.pop()?;
        let b = self.stack.pop()?;
        let n = self.stack.pop()?;
        self.stack.push(f(a, b, n))?;
        self.advance(1);
        Ok(())
    }

    fn unary(&mut self, gas: u64, f: impl Fn(Word) -> Word) -> Result<(), VmError> {
        self.charge(gas)?;
        let a = self.stack.pop()?;
        self.stack.push(f(a))?;
        self.advance(1);
        Ok(())
    }

    fn push_env(&mut self, gas: u64, value: Word) -> Result<(), VmError> {
        self.charge(gas)?;
        self.stack.push(value)?;
        self.advance(1);
        Ok(())
    }

    fn shift_op(&mut self, f: impl Fn(Word, u32) -> Word) -> Result<(), VmError> {
        self.require_feature(self.schedule.has_shift_opcodes())?;
        self.charge(Schedule::GAS_VERY_LOW)?;
        let shift = self.stack.pop()?;
        let value = self.stack.pop()?;
        let shift = shift_amount(shift);
        self.stack.push(f(value, shift))?;
        self.advance(1);
        Ok(())
    }

    fn shift_op_signed(&mut self) -> Result<(), VmError> {
        self.require_feature(self.schedule.has_shift_opcodes())?;
        self.charge(Schedule::GAS_VERY_LOW)?;
        let shift = self.stack.pop()?;
        let value = self.stack.pop()?;
        let shift = shift_amount(shift);
        self.stack.push(arithmetic::sar(value, shift))?;
        self.advance(1);
        Ok(())
    }

    fn exp(&mut self) -> Result<(), VmError> {
        let base = self.stack.peek(1)?;
        let exponent = self.stack.peek(2)?;
        let byte_len = exp_byte_len(exponent);
        let cost = Schedule::GAS_EXP + byte_len * self.schedule.exp_byte_gas();
        self.charge(cost)?;
        self.stack.pop()?;
        self.stack.pop()?;
        self.stack.push(wrapping_pow(base, exponent))?;
        self.advance(1);
        Ok(())
    }

    fn sha3(&mut self) -> Result<(), VmError> {
        self.charge(Schedule::GAS_SHA3)?;
        let offset = self.stack.pop()?;
        let len = self.stack.pop()?;
        self.charge_memory(offset, len)?;
        let len_usize = as_usize(len).ok_or(VmError::OutOfGas)?;
        let words = (len_usize as u64 + 31) / 32;
        self.charge(words * Schedule::GAS_SHA3_WORD)?;
        let offset_usize = as_usize(offset).ok_or(VmError::OutOfGas)?;
        let data = self.memory.slice(offset_usize, len_usize);
        let hash = keccak256(data);
        self.stack.push(Word::from_be_slice(hash.as_slice()))?;
        self.advance(1);
        Ok(())
    }

    fn balance(&mut self) -> Result<(), VmError> {
        self.charge(self.schedule.ext_account_gas())?;
        let addr = self.stack.pop()?;
        let balance = self
            .host
            .balance(address_from_word(addr))
            .map_err(|_| VmError::OutOfGas)?;
        self.stack.push(balance)?;
        self.advance(1);
        Ok(())
    }

    fn selfbalance(&mut self) -> Result<(), VmError> {
        self.require_feature(self.schedule.has_istanbul_opcodes())?;
        self.charge(Schedule::GAS_LOW)?;
        let balance = self
            .host
            .balance(self.env.this_address)
            .map_err(|_| VmError::OutOfGas)?;
        self.stack.push(balance)?;
        self.advance(1);
        Ok(())
    }

    fn calldataload(&mut self) -> Result<(), VmError> {
        self.charge(Schedule::GAS_VERY_LOW)?;
        let offset = self.stack.pop()?;
        let mut buf = [0u8; 32];
        if let Some(offset) = as_usize(offset) {
            let input = &self.env.input_data;
            for i in 0..32 {
                if offset + i < input.len() {
                    buf[i] = input[offset + i];
                }
            }
        }
        self.stack.push(Word::from_be_bytes::<32>(buf))?;
        self.advance(1);
        Ok(())
    }

    fn data_copy(&mut self, source: impl Fn(&Self) -> Bytes) -> Result<(), VmError> {
        self.charge(Schedule::GAS_VERY_LOW)?;
        let dest_offset = self.stack.pop()?;
        let src_offset = self.stack.pop()?;
        let len = self.stack.pop()?;
        self.charge_memory(dest_offset, len)?;
        let len_usize = as_usize(len).ok_or(VmError::OutOfGas)?;
        let words = (len_usize as u64 + 31) / 32;
        self.charge(words * Schedule::GAS_COPY_WORD)?;
        let data = source(self);
        let src_offset = as_usize(src_offset).unwrap_or(usize::MAX);
        let dest_offset = as_usize(dest_offset).ok_or(VmError::OutOfGas)?;
        let src_slice = if src_offset < data.len() {
            &data[src_offset..]
        } else {
            &[]
        };
        self.memory.store_padded(dest_offset, len_usize, src_slice);
        self.advance(1);
        Ok(())
    }

    fn extcodesize(&mut self) -> Result<(), VmError> {
        self.charge(self.schedule.ext_account_gas())?;
        let addr = self.stack.pop()?;
        let size = self
            .host
            .code_size(address_from_word(addr))
            .map_err(|_| VmError::OutOfGas)?;
        self.stack.push(Word::from(size as u64))?;
        self.advance(1);
        Ok(())
    }

    fn extcodecopy(&mut self) -> Result<(), VmError> {
        self.charge(self.schedule.ext_account_gas())?;
        let addr = self.stack.pop()?;
        let dest_offset = self.stack.pop()?;
        let src_offset = self.stack.pop()?;
        let len = self.stack.pop()?;
        self.charge_memory(dest_offset, len)?;
        let len_usize = as_usize(len).ok_or(VmError::OutOfGas)?;
        let words = (len_usize as u64 + 31) / 32;
        self.charge(words * Schedule::GAS_COPY_WORD)?;
        let code = self
            .host
            .code(address_from_word(addr))
            .map_err(|_| VmError::OutOfGas)?;
        let src_offset = as_usize(src_offset).unwrap_or(usize::MAX);
        let dest_offset = as_usize(dest_offset).ok_or(VmError::OutOfGas)?;
        let src_slice = if src_offset < code.len() {
            &code[src_offset..]
        } else {
            &[]
        };
        self.memory.store_padded(dest_offset, len_usize, src_slice);
        self.advance(1);
        Ok(())
    }

    fn returndatacopy(&mut self) -> Result<(), VmError> {
        self.charge(Schedule::GAS_VERY_LOW)?;
        let dest_offset = self.stack.pop()?;
        let src_offset = self.stack.pop()?;
        let len = self.stack.pop()?;
        let src_offset_usize = as_usize(src_offset).ok_or(VmError::ReturnDataOutOfBounds)?;
        let len_usize = as_usize(len).ok_or(VmError::ReturnDataOutOfBounds)?;
        let end = src_offset_usize
            .checked_add(len_usize)
            .ok_or(VmError::ReturnDataOutOfBounds)?;
        if end > self.return_data.len() {
            return Err(VmError::ReturnDataOutOfBounds);
        }
        self.charge_memory(dest_offset, len)?;
        let words = (len_usize as u64 + 31) / 32;
        self.charge(words * Schedule::GAS_COPY_WORD)?;
        let dest_offset = as_usize(dest_offset).ok_or(VmError::OutOfGas)?;
        let data = self.return_data[src_offset_usize..end].to_vec();
        self.memory.store_padded(dest_offset, len_usize, &data);
        self.advance(1);
        Ok(())
    }

    fn extcodehash(&mut self) -> Result<(), VmError> {
        self.require_feature(self.schedule.has_constantinople_opcodes())?;
        self.charge(self.schedule.ext_account_gas())?;
        let addr = self.stack.pop()?;
        let addr = address_from_word(addr);
        let exists = self.host.exists(addr).map_err(|_| VmError::OutOfGas)?;
        let hash = if exists {
            self.host.code_hash(addr).map_err(|_| VmError::OutOfGas)?
        } else {
            B256::ZERO
        };
        self.stack.push(Word::from_be_slice(hash.as_slice()))?;
        self.advance(1);
        Ok(())
    }

    fn blockhash(&mut self) -> Result<(), VmError> {
        self.charge(Schedule::GAS_BLOCKHASH)?;
        let target = self.stack.pop()?;
        let target = as_usize(target).map(|t| t as u64).unwrap_or(u64::MAX);
        let hash = self.env.block_env.block_hash(target);
        self.stack.push(Word::from_be_slice(hash.as_slice()))?;
        self.advance(1);
        Ok(())
    }

    fn mload(&mut self) -> Result<(), VmError> {
        self.charge(Schedule::GAS_VERY_LOW)?;
        let offset = self.stack.pop()?;
        self.charge_memory(offset, Word::from(32u64))?;
        let offset = as_usize(offset).ok_or(VmError::OutOfGas)?;
        let value = self.memory.load32(offset);
        self.stack.push(value)?;
        self.advance(1);
        Ok(())
    }

    fn mstore(&mut self) -> Result<(), VmError> {
        self.charge(Schedule::GAS_VERY_LOW)?;
        let offset = self.stack.pop()?;
        let value = self.stack.pop()?;
        self.charge_memory(offset, Word::from(32u64))?;
        let offset = as_usize(offset).ok_or(VmError::OutOfGas)?;
        self.memory.store32(offset, value);
        self.advance(1);
        Ok(())
    }

    fn mstore8(&mut self) -> Result<(), VmError> {
        self.charge(Schedule::GAS_VERY_LOW)?;
        let offset = self.stack.pop()?;
        let value = self.stack.pop()?;
        self.charge_memory(offset, Word::from(1u64))?;
        let offset = as_usize(offset).ok_or(VmError::OutOfGas)?;
        self.memory.store8(offset, value.as_limbs()[0] as u8);
        self.advance(1);
        Ok(())
    }

    fn sload(&mut self) -> Result<(), VmError> {
        self.charge(self.schedule.sload_gas())?;
        let key = self.stack.pop()?;
        let value = self
            .host
            .sload(self.env.this_address, B256::from(key.to_be_bytes::<32>()))
            .map_err(|_| VmError::OutOfGas)?;
        self.stack.push(value)?;
        self.advance(1);
        Ok(())
    }

    fn sstore(&mut self) -> Result<(), VmError> {
        self.require_not_static()?;
        let key = self.stack.pop()?;
        let value = self.stack.pop()?;
        let outcome = self
            .host
            .sstore(self.env.this_address, B256::from(key.to_be_bytes::<32>()), value)
            .map_err(|_| VmError::OutOfGas)?;
        self.charge(outcome.gas_cost)?;
        self.refund += outcome.refund_delta;
        self.advance(1);
        Ok(())
    }

    fn jump(&mut self) -> Result<(), VmError> {
        self.charge(Schedule::GAS_MID)?;
        let dest = self.stack.pop()?;
        self.do_jump(dest)
    }

    fn jumpi(&mut self) -> Result<(), VmError> {
        self.charge(Schedule::GAS_HIGH)?;
        let dest = self.stack.pop()?;
        let cond = self.stack.pop()?;
        if cond.is_zero() {
            self.advance(1);
            Ok(())
        } else {
            self.do_jump(dest)
        }
    }

    fn do_jump(&mut self, dest: Word) -> Result<(), VmError> {
        let dest_u64 = as_usize(dest).map(|v| v as u64);
        match dest_u64 {
            Some(d) if self.dests.is_valid(d) => {
                self.pc = d;
                Ok(())
            }
            Some(d) => Err(VmError::BadJumpDestination(d)),
            None => Err(VmError::BadJumpDestination(u64::MAX)),
        }
    }

    fn push_op(&mut self, op: u8) -> Result<(), VmError> {
        self.charge(Schedule::GAS_VERY_LOW)?;
        let len = opcode::push_len(op);
        let mut buf = [0u8; 32];
        let start = (self.pc + 1) as usize;
        for i in 0..len {
            buf[32 - len + i] = self.current_code_byte((start + i) as u64);
        }
        self.stack.push(Word::from_be_bytes::<32>(buf))?;
        self.advance(1 + len as u64);
        Ok(())
    }

    fn log_op(&mut self, op: u8) -> Result<(), VmError> {
        self.require_not_static()?;
        let topic_count = (op - opcode::LOG0) as usize;
        let offset = self.stack.pop()?;
        let len = self.stack.pop()?;
        let mut topics = Vec::with_capacity(topic_count);
        for _ in 0..topic_count {
            topics.push(B256::from(self.stack.pop()?.to_be_bytes::<32>()));
        }
        self.charge_memory(offset, len)?;
        let len_usize = as_usize(len).ok_or(VmError::OutOfGas)?;
        let cost = Schedule::GAS_LOG
            + topic_count as u64 * Schedule::GAS_LOG_TOPIC
            + len_usize as u64 * Schedule::GAS_LOG_DATA;
        self.charge(cost)?;
        let offset_usize = as_usize(offset).ok_or(VmError::OutOfGas)?;
        let data = Bytes::copy_from_slice(self.memory.slice(offset_usize, len_usize));
        self.host.log(LogEntry {
            address: self.env.this_address,
            topics,
            data,
        });
        self.advance(1);
        Ok(())
    }

    fn return_op(&mut self) -> Result<Bytes, VmError> {
        let offset = self.stack.pop()?;
        let len = self.stack.pop()?;
        self.charge_memory(offset, len)?;
        let offset = as_usize(offset).ok_or(VmError::OutOfGas)?;
        let len = as_usize(len).ok_or(VmError::OutOfGas)?;
        Ok(Bytes::copy_from_slice(self.memory.slice(offset, len)))
    }

    fn revert_op(&mut self) -> Result<Bytes, VmError> {
        let offset = self.stack.pop()?;
        let len = self.stack.pop()?;
        self.charge_memory(offset, len)?;
        let offset = as_usize(offset).ok_or(VmError::OutOfGas)?;
        let len = as_usize(len).ok_or(VmError::OutOfGas)?;
        let data = Bytes::copy_from_slice(self.memory.slice(offset, len));
        Err(VmError::Revert(data))
    }

    fn selfdestruct_op(&mut self) -> Result<Bytes, VmError> {
        self.require_not_static()?;
        let beneficiary = self.stack.pop()?;
        let beneficiary = address_from_word(beneficiary);
        let mut cost = self.schedule.selfdestruct_gas();
        if self.schedule.charges_new_account_gas() {
            let balance = self
                .host
                .balance(self.env.this_address)
                .map_err(|_| VmError::OutOfGas)?;
            let beneficiary_exists = self.host.exists(beneficiary).map_err(|_| VmError::OutOfGas)?;
            if !balance.is_zero() && !beneficiary_exists {
                cost += Schedule::GAS_NEW_ACCOUNT;
            }
        }
        self.charge(cost)?;
        let first_time = self
            .host
            .selfdestruct(self.env.this_address, beneficiary)
            .map_err(|_| VmError::OutOfGas)?;
        if first_time {
            self.refund += self.schedule.selfdestruct_refund();
        }
        Ok(Bytes::new())
    }

    fn create_op(&mut self, is_create2: bool) -> Result<Bytes, VmError> {
        self.require_not_static()?;
        if is_create2 {
            self.require_feature(self.schedule.has_constantinople_opcodes())?;
        }
        let value = self.stack.pop()?;
        let offset = self.stack.pop()?;
        let len = self.stack.pop()?;
        let salt = if is_create2 { Some(self.stack.pop()?) } else { None };
        self.charge_memory(offset, len)?;
        let len_usize = as_usize(len).ok_or(VmError::OutOfGas)?;
        let offset_usize = as_usize(offset).ok_or(VmError::OutOfGas)?;
        if is_create2 {
            let words = (len_usize as u64 + 31) / 32;
            self.charge(words * Schedule::GAS_CREATE2_WORD)?;
        }
        self.charge(Schedule::GAS_CREATE)?;
        let init_code = Bytes::copy_from_slice(self.memory.slice(offset_usize, len_usize));
        let child_gas = self.schedule.subcall_gas_cap(self.gas);
        self.charge(child_gas)?;
        let request = CreateRequest {
            caller: self.env.this_address,
            value,
            init_code,
            gas: child_gas,
            salt: salt.map(|s| B256::from(s.to_be_bytes::<32>())),
        };
        let outcome: CreateOutcome = self.host.create(request);
        self.gas += outcome.gas_remaining;
        self.return_data = outcome.return_data.clone();
        let result = if outcome.success {
            Word::from_be_slice(outcome.address.into_word().as_slice())
        } else {
            Word::ZERO
        };
        self.stack.push(result)?;
        self.advance(1);
        Ok(Bytes::new())
    }

    fn call_op(&mut self, kind: CallKind) -> Result<Bytes, VmError> {
        let gas_requested = self.stack.pop()?;
        let code_address = address_from_word(self.stack.pop()?);
        let value = if matches!(kind, CallKind::DelegateCall | CallKind::StaticCall) {
            Word::ZERO
        } else {
            self.stack.pop()?
        };
        let args_offset = self.stack.pop()?;
        let args_len = self.stack.pop()?;
        let ret_offset = self.stack.pop()?;
        let ret_len = self.stack.pop()?;

        if self.env.is_static && kind == CallKind::Call && !value.is_zero() {
            return Err(VmError::StaticModeViolation);
        }

        let mut cost = self.schedule.ext_account_gas();
        let is_value_transfer = !value.is_zero();
        if is_value_transfer {
            cost += Schedule::GAS_CALL_VALUE_TRANSFER;
        }
        if matches!(kind, CallKind::Call) && self.schedule.charges_new_account_gas() && is_value_transfer {
            let exists = self.host.exists(code_address).map_err(|_| VmError::OutOfGas)?;
            if !exists {
                cost += Schedule::GAS_NEW_ACCOUNT;
            }
        }

        self.charge_memory(args_offset, args_len)?;
        self.charge_memory(ret_offset, ret_len)?;
        self.charge(cost)?;

        let args_len_usize = as_usize(args_len).ok_or(VmError::OutOfGas)?;
        let args_offset_usize = as_usize(args_offset).ok_or(VmError::OutOfGas)?;
        let input = Bytes::copy_from_slice(self.memory.slice(args_offset_usize, args_len_usize));

        let capped = self.schedule.subcall_gas_cap(self.gas).min(
            as_usize(gas_requested).map(|g| g as u64).unwrap_or(u64::MAX),
        );
        self.charge(capped)?;
        let stipend = if is_value_transfer { Schedule::GAS_CALL_STIPEND } else { 0 };
        let child_gas = capped + stipend;

        let (this_address, caller, payer) = match kind {
            CallKind::Call | CallKind::StaticCall => {
                (code_address, self.env.this_address, self.env.this_address)
            }
            CallKind::CallCode => (self.env.this_address, self.env.this_address, self.env.this_address),
            CallKind::DelegateCall => (self.env.this_address, self.env.caller, self.env.this_address),
        };
        let apparent_value = match kind {
            CallKind::DelegateCall => self.env.apparent_value,
            _ => value,
        };

        let request = CallRequest {
            kind,
            code_address,
            this_address,
            payer,
            caller,
            value,
            apparent_value,
            input,
            gas: child_gas,
            is_static: self.env.is_static || matches!(kind, CallKind::StaticCall),
        };
        let outcome: CallOutcome = self.host.call(request);
        // The stipend was free gas handed to the callee, not charged against
        // `self.gas` (only `capped` was) — an unspent stipend does not flow
        // back to the caller, so the refund is capped at what was forwarded.
        self.gas += outcome.gas_remaining.min(capped);
        self.return_data = outcome.return_data.clone();
        let ret_len_usize = as_usize(ret_len).ok_or(VmError::OutOfGas)?;
        let ret_offset_usize = as_usize(ret_offset).ok_or(VmError::OutOfGas)?;
        self.memory.store_padded(ret_offset_usize, ret_len_usize, &outcome.return_data);
        self.stack.push(bool_word(outcome.success))?;
        self.advance(1);
        Ok(Bytes::new())
    }
}

fn bool_word(b: bool) -> Word {
    if b { Word::from(1u64) } else { Word::ZERO }
}

fn word_from_address(addr: Address) -> Word {
    Word::from_be_slice(addr.into_word().as_slice())
}

fn address_from_word(w: Word) -> Address {
    Address::from_word(B256::from(w.to_be_bytes::<32>()))
}

fn byte_op(index: Word, value: Word) -> Word {
    if index >= Word::from(32u64) {
        return Word::ZERO;
    }
    let index = index.as_limbs()[0] as usize;
    let bytes = value.to_be_bytes::<32>();
    Word::from(bytes[index] as u64)
}

fn shift_amount(shift: Word) -> u32 {
    if shift > Word::from(u32::MAX) {
        u32::MAX
    } else {
        shift.as_limbs()[0] as u32
    }
}

/// Number of significant bytes in `exponent`, for `EXP`'s per-byte
/// surcharge; zero for an exponent of zero.
fn exp_byte_len(exponent: Word) -> u64 {
    let bytes = exponent.to_be_bytes::<32>();
    let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
    (32 - leading_zeros) as u64
}

/// `base.pow(exponent)` under 256-bit wraparound, by square-and-multiply.
fn wrapping_pow(base: Word, exponent: Word) -> Word {
    let mut result = Word::from(1u64);
    let mut base = base;
    let mut exponent = exponent;
    let one = Word::from(1u64);
    while !exponent.is_zero() {
        if exponent & one == one {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exponent >>= 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exp_byte_len_of_zero_is_zero() {
        assert_eq!(exp_byte_len(Word::ZERO), 0);
    }

    #[test]
    fn exp_byte_len_of_256_is_two() {
        assert_eq!(exp_byte_len(Word::from(256u64)), 2);
    }

    #[test]
    fn wrapping_pow_zero_to_zero_is_one() {
        assert_eq!(wrapping_pow(Word::ZERO, Word::ZERO), Word::from(1u64));
    }

    #[test]
    fn wrapping_pow_basic() {
        assert_eq!(wrapping_pow(Word::from(2u64), Word::from(10u64)), Word::from(1024u64));
    }

    #[test]
    fn byte_op_out_of_range_is_zero() {
        assert_eq!(byte_op(Word::from(32u64), Word::MAX), Word::ZERO);
    }

    #[test]
    fn byte_op_extracts_most_significant_byte_at_index_zero() {
        let value = Word::from(0xff00u64);
        assert_eq!(byte_op(Word::from(30u64), value), Word::from(0xffu64));
    }
}
