use crate::opcode;
use alloy_primitives::B256;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// The set of byte offsets in a code blob that are valid `JUMP`/`JUMPI`
/// targets: positions holding a `JUMPDEST` opcode that are not inside the
/// immediate-operand bytes of a preceding `PUSHn`.
///
/// Depends only on the code (§8 "idempotence of precomputation"), so it is
/// computed once per distinct code blob and cached by code hash.
#[derive(Debug, Clone)]
pub struct JumpDestinations {
    valid: Vec<bool>,
}

impl JumpDestinations {
    pub fn analyze(code: &[u8]) -> Self {
        let mut valid = vec![false; code.len()];
        let mut pc = 0usize;
        while pc < code.len() {
            let op = code[pc];
            if op == opcode::JUMPDEST {
                valid[pc] = true;
                pc += 1;
            } else {
                pc += 1 + opcode::push_len(op);
            }
        }
        Self { valid }
    }

    pub fn is_valid(&self, pc: u64) -> bool {
        usize::try_from(pc)
            .ok()
            .and_then(|pc| self.valid.get(pc))
            .copied()
            .unwrap_or(false)
    }
}

const CACHE_CAPACITY: usize = 4096;

/// An LRU cache of [`JumpDestinations`] keyed by code hash, bounded per
/// §9's "arena indexed by hash; cache is LRU with size cap" design note.
/// Safe for concurrent readers once populated (§5) — internally
/// mutex-guarded since `lru::LruCache` updates recency on read.
pub struct JumpDestCache {
    inner: Mutex<LruCache<B256, std::sync::Arc<JumpDestinations>>>,
}

impl JumpDestCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).expect("nonzero constant"),
            )),
        }
    }

    /// Returns the cached analysis for `code_hash`, computing and
    /// inserting it from `code` on a miss.
    pub fn get_or_analyze(&self, code_hash: B256, code: &[u8]) -> std::sync::Arc<JumpDestinations> {
        let mut guard = self.inner.lock().expect("jumpdest cache mutex poisoned");
        if let Some(hit) = guard.get(&code_hash) {
            return hit.clone();
        }
        let computed = std::sync::Arc::new(JumpDestinations::analyze(code));
        guard.put(code_hash, computed.clone());
        computed
    }
}

impl Default for JumpDestCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jumpdest_inside_push_immediate_is_invalid() {
        // PUSH1 0x5b (a byte that looks like JUMPDEST), then a real JUMPDEST.
        let code = [opcode::PUSH1, opcode::JUMPDEST, opcode::JUMPDEST];
        let dests = JumpDestinations::analyze(&code);
        assert!(!dests.is_valid(1), "the pushed immediate byte is not a destination");
        assert!(dests.is_valid(2));
    }

    #[test]
    fn cache_reanalyzes_on_miss_and_hits_on_repeat() {
        let cache = JumpDestCache::new();
        let code = [opcode::JUMPDEST];
        let hash = B256::repeat_byte(1);
        let first = cache.get_or_analyze(hash, &code);
        let second = cache.get_or_analyze(hash, &code);
        assert!(std::sync::Arc::ptr_eq(&first, &second));
    }
}
