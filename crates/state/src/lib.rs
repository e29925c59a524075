//! The world state: a versioned, journaled overlay of [`Account`]s and their
//! storage over [`evmcore_trie`]'s Modified Merkle-Patricia Trie, plus a
//! content-addressed code store.
//!
//! Exactly one [`WorldState`] is mutably owned by a transaction's Executive
//! at a time (§4.3/§5); nested VM frames borrow it mutably but are serially
//! scoped, and the journal lets any frame's changes be undone without
//! touching the rest.

mod error;
pub use error::StateError;

mod journal;
pub use journal::JournalMark;
use journal::JournalEntry;

mod shared_store;
pub use shared_store::SharedStore;

use alloy_primitives::{Address, Bytes, B256};
use alloy_rlp::Decodable;
use evmcore_primitives::{keccak256, Account, Word, EMPTY_CODE_HASH, EMPTY_ROOT_HASH};
pub use evmcore_trie::MemoryNodeStore;
use evmcore_trie::{NodeStore, Trie};
use rustc_hash::{FxHashMap, FxHashSet};

/// One account's cached view: its trie-committed fields plus its lazily
/// materialised storage trie.
struct AccountEntry<S> {
    account: Account,
    storage: Trie<S>,
    /// `false` once [`WorldState::kill`] (or the EIP-158 sweep) has run;
    /// distinguishes "known absent" from "not yet loaded" (which simply
    /// isn't present in the `accounts` map at all).
    exists: bool,
}

/// The per-transaction world-state view: an account/storage overlay over a
/// trie, journaled so any VM frame's mutations can be rolled back in O(n)
/// of the entries made since its snapshot.
pub struct WorldState<S: NodeStore + Clone = MemoryNodeStore> {
    trie: Trie<SharedStore<S>>,
    store: SharedStore<S>,
    accounts: FxHashMap<Address, AccountEntry<SharedStore<S>>>,
    code: FxHashMap<B256, Bytes>,
    journal: Vec<JournalEntry>,
    dirty: FxHashSet<Address>,
    /// Addresses that executed `SELFDESTRUCT` this transaction, mapped to
    /// their chosen beneficiary. Processed exactly once by
    /// [`WorldState::apply_pending_selfdestructs`] at the Executive's
    /// `finalize` step (§4.2) — never at the point `SELFDESTRUCT` runs, so a
    /// later revert of the frame that called it can simply un-register it.
    self_destructs: FxHashMap<Address, Address>,
}

impl WorldState<MemoryNodeStore> {
    /// A fresh, empty state backed by an in-memory node store — the shape
    /// used to build a genesis state or a scratch state for tests.
    pub fn new_in_memory() -> Self {
        Self::new(MemoryNodeStore::new())
    }
}

impl<S: NodeStore + Clone> WorldState<S> {
    pub fn new(store: S) -> Self {
        let shared = SharedStore::new(store);
        Self {
            trie: Trie::new(shared.clone()),
            store: shared,
            accounts: FxHashMap::default(),
            code: FxHashMap::default(),
            journal: Vec::new(),
            dirty: FxHashSet::default(),
            self_destructs: FxHashMap::default(),
        }
    }

    /// Resumes a state rooted at a previously committed state root.
    pub fn from_root(root: B256, store: S) -> Self {
        let shared = SharedStore::new(store);
        Self {
            trie: Trie::from_root(root, shared.clone()),
            store: shared,
            accounts: FxHashMap::default(),
            code: FxHashMap::default(),
            journal: Vec::new(),
            dirty: FxHashSet::default(),
            self_destructs: FxHashMap::default(),
        }
    }

    /// Registers genesis/pre-loaded code so `get_code` resolves it without
    /// a prior `set_code`. Used when seeding a state from a chain spec's
    /// `accounts` map.
    pub fn preload_code(&mut self, hash: B256, code: Bytes) {
        self.code.entry(hash).or_insert(code);
    }

    fn account_key(addr: Address) -> B256 {
        keccak256(addr.as_slice())
    }

    fn storage_key(key: B256) -> B256 {
        keccak256(key.as_slice())
    }

    /// Loads `addr`'s cache entry from the trie if not already cached,
    /// inserting an absent placeholder if it has no trie record. Reads
    /// never journal — only mutations do.
    fn load(&mut self, addr: Address) -> Result<&mut AccountEntry<SharedStore<S>>, StateError> {
        if !self.accounts.contains_key(&addr) {
            let entry = match self.trie.get(Self::account_key(addr).as_slice())? {
                Some(bytes) => {
                    let account = Account::decode(&mut &bytes[..])?;
                    AccountEntry {
                        storage: Trie::from_root(account.storage_root, self.store.clone()),
                        account,
                        exists: true,
                    }
                }
                None => AccountEntry {
                    account: Account::new_empty(),
                    storage: Trie::new(self.store.clone()),
                    exists: false,
                },
            };
            self.accounts.insert(addr, entry);
        }
        Ok(self.accounts.get_mut(&addr).expect("just inserted"))
    }

    /// Ensures `addr` is loaded and marked present, journaling its creation
    /// if it was previously absent. Every write path routes through this.
    fn load_for_write(
        &mut self,
        addr: Address,
    ) -> Result<&mut AccountEntry<SharedStore<S>>, StateError> {
        self.load(addr)?;
        let entry = self.accounts.get_mut(&addr).expect("loaded above");
        if !entry.exists {
            self.journal.push(JournalEntry::Created { addr });
            entry.exists = true;
        }
        self.dirty.insert(addr);
        Ok(self.accounts.get_mut(&addr).expect("loaded above"))
    }

    /// `None` if `addr` has no trie record (never written, never existed).
    pub fn get_account(&mut self, addr: Address) -> Result<Option<Account>, StateError> {
        let entry = self.load(addr)?;
        Ok(entry.exists.then_some(entry.account))
    }

    /// Whether `addr` currently has a trie record. Fork-aware emptiness
    /// (post-EIP-158, an empty account reads as absent) is the caller's
    /// concern via [`Account::is_empty`] plus [`WorldState::sweep_if_empty`].
    pub fn exists(&mut self, addr: Address) -> Result<bool, StateError> {
        Ok(self.load(addr)?.exists)
    }

    pub fn get_nonce(&mut self, addr: Address) -> Result<u64, StateError> {
        Ok(self.load(addr)?.account.nonce)
    }

    pub fn increment_nonce(&mut self, addr: Address) -> Result<(), StateError> {
        let old = self.load(addr)?.account.nonce;
        self.set_nonce(addr, old.wrapping_add(1))
    }

    pub fn set_nonce(&mut self, addr: Address, value: u64) -> Result<(), StateError> {
        let old = self.load(addr)?.account.nonce;
        let entry = self.load_for_write(addr)?;
        self.journal.push(JournalEntry::Nonce { addr, old });
        entry.account.nonce = value;
        Ok(())
    }

    pub fn get_balance(&mut self, addr: Address) -> Result<Word, StateError> {
        Ok(self.load(addr)?.account.balance)
    }

    pub fn set_balance(&mut self, addr: Address, value: Word) -> Result<(), StateError> {
        let old = self.load(addr)?.account.balance;
        let entry = self.load_for_write(addr)?;
        self.journal.push(JournalEntry::Balance { addr, old });
        entry.account.balance = value;
        Ok(())
    }

    pub fn add_balance(&mut self, addr: Address, amount: Word) -> Result<(), StateError> {
        if amount.is_zero() {
            // touching with a zero-value transfer still creates the account
            // record per EIP-161's "touched" rule, but must not journal a
            // no-op balance change on top of the creation entry.
            self.load_for_write(addr)?;
            return Ok(());
        }
        let old = self.load(addr)?.account.balance;
        let entry = self.load_for_write(addr)?;
        self.journal.push(JournalEntry::Balance { addr, old });
        entry.account.balance = old.wrapping_add(amount);
        Ok(())
    }

    /// Debits `amount` from `addr`'s balance.
    ///
    /// Per §3, balance underflow must never be silently wrapped; the
    /// Executive/VM are responsible for checking sufficiency before calling
    /// this (the value-transfer precondition of CALL/CREATE and the
    /// transaction entry precondition), so underflow here indicates a
    /// caller bug rather than a normal consensus outcome.
    pub fn sub_balance(&mut self, addr: Address, amount: Word) -> Result<(), StateError> {
        let old = self.load(addr)?.account.balance;
        debug_assert!(old >= amount, "sub_balance caller must pre-check sufficiency");
        let entry = self.load_for_write(addr)?;
        self.journal.push(JournalEntry::Balance { addr, old });
        entry.account.balance = old.saturating_sub(amount);
        Ok(())
    }

    pub fn get_code_hash(&mut self, addr: Address) -> Result<B256, StateError> {
        Ok(self.load(addr)?.account.code_hash)
    }

    pub fn get_code(&mut self, addr: Address) -> Result<Bytes, StateError> {
        let hash = self.load(addr)?.account.code_hash;
        Ok(self.code.get(&hash).cloned().unwrap_or_default())
    }

    pub fn get_code_by_hash(&self, hash: B256) -> Option<Bytes> {
        self.code.get(&hash).cloned()
    }

    pub fn set_code(&mut self, addr: Address, code: Bytes) -> Result<(), StateError> {
        let hash = if code.is_empty() {
            *EMPTY_CODE_HASH
        } else {
            keccak256(&code)
        };
        let old = self.load(addr)?.account.code_hash;
        let entry = self.load_for_write(addr)?;
        self.journal.push(JournalEntry::Code {
            addr,
            old_code_hash: old,
        });
        entry.account.code_hash = hash;
        self.code.entry(hash).or_insert(code);
        Ok(())
    }

    pub fn get_storage(&mut self, addr: Address, key: B256) -> Result<Word, StateError> {
        let entry = self.load(addr)?;
        match entry.storage.get(Self::storage_key(key).as_slice())? {
            Some(bytes) => Ok(Word::decode(&mut &bytes[..])?),
            None => Ok(Word::ZERO),
        }
    }

    /// Writing zero removes the key (§3: "writing zero to a key removes it").
    pub fn set_storage(&mut self, addr: Address, key: B256, value: Word) -> Result<(), StateError> {
        let old = self.get_storage(addr, key)?;
        let entry = self.load_for_write(addr)?;
        let hashed = Self::storage_key(key);
        if value.is_zero() {
            entry.storage.remove(hashed.as_slice())?;
        } else {
            entry.storage.insert(hashed.as_slice(), alloy_rlp::encode(value))?;
        }
        self.journal.push(JournalEntry::Storage { addr, key, old });
        Ok(())
    }

    /// Destroys `addr`: its record is removed from the state entirely.
    /// Balance disposition (crediting a beneficiary, or burning it on
    /// self-beneficiary) is the Executive's concern (§4.2/§9) — this only
    /// removes the account itself.
    pub fn kill(&mut self, addr: Address) -> Result<(), StateError> {
        let entry = self.load(addr)?;
        if !entry.exists {
            return Ok(());
        }
        let account = entry.account;
        let storage_root = entry.storage.root_hash();
        self.journal.push(JournalEntry::Destroyed {
            addr,
            account,
            storage_root,
        });
        let entry = self.accounts.get_mut(&addr).expect("loaded above");
        entry.exists = false;
        entry.account = Account::new_empty();
        entry.storage = Trie::new(self.store.clone());
        self.dirty.insert(addr);
        Ok(())
    }

    /// If `addr` currently exists and is empty, destroys it — the EIP-158
    /// "touched empties are swept" rule. A no-op pre-fork (the caller simply
    /// never invokes this when the active fork predates EIP-158).
    pub fn sweep_if_empty(&mut self, addr: Address) -> Result<(), StateError> {
        let entry = self.load(addr)?;
        if entry.exists && entry.account.is_empty() {
            self.kill(addr)?;
        }
        Ok(())
    }

    /// Registers `addr` for destruction with `beneficiary`, idempotently —
    /// a second `SELFDESTRUCT` by the same address in the same transaction
    /// is a no-op, matching the real opcode's behaviour (the balance was
    /// already moved out by the first call).
    pub fn mark_selfdestruct(&mut self, addr: Address, beneficiary: Address) {
        if self.self_destructs.contains_key(&addr) {
            return;
        }
        self.self_destructs.insert(addr, beneficiary);
        self.journal.push(JournalEntry::SelfDestructRegistered { addr });
    }

    pub fn is_marked_for_selfdestruct(&self, addr: Address) -> bool {
        self.self_destructs.contains_key(&addr)
    }

    /// Credits every pending self-destruct's balance to its beneficiary
    /// (or destroys it outright when the beneficiary is the account itself,
    /// §9's locked-in decision) and deletes the account, then clears the
    /// set. Called exactly once, at the Executive's `finalize` step.
    pub fn apply_pending_selfdestructs(&mut self) -> Result<(), StateError> {
        for (addr, beneficiary) in std::mem::take(&mut self.self_destructs) {
            if beneficiary != addr {
                let balance = self.get_balance(addr)?;
                if !balance.is_zero() {
                    self.add_balance(beneficiary, balance)?;
                }
            }
            self.kill(addr)?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> JournalMark {
        JournalMark(self.journal.len())
    }

    /// Undoes every mutation made since `mark`, in reverse order.
    pub fn revert(&mut self, mark: JournalMark) {
        while self.journal.len() > mark.0 {
            let entry = self.journal.pop().expect("length checked above");
            match entry {
                JournalEntry::Created { addr } => {
                    if let Some(e) = self.accounts.get_mut(&addr) {
                        e.exists = false;
                        e.account = Account::new_empty();
                        e.storage = Trie::new(self.store.clone());
                    }
                }
                JournalEntry::Balance { addr, old } => {
                    if let Some(e) = self.accounts.get_mut(&addr) {
                        e.account.balance = old;
                    }
                }
                JournalEntry::Nonce { addr, old } => {
                    if let Some(e) = self.accounts.get_mut(&addr) {
                        e.account.nonce = old;
                    }
                }
                JournalEntry::Code { addr, old_code_hash } => {
                    if let Some(e) = self.accounts.get_mut(&addr) {
                        e.account.code_hash = old_code_hash;
                    }
                }
                JournalEntry::Storage { addr, key, old } => {
                    if let Some(e) = self.accounts.get_mut(&addr) {
                        let hashed = Self::storage_key(key);
                        if old.is_zero() {
                            let _ = e.storage.remove(hashed.as_slice());
                        } else {
                            let _ = e.storage.insert(hashed.as_slice(), alloy_rlp::encode(old));
                        }
                    }
                }
                JournalEntry::Destroyed {
                    addr,
                    account,
                    storage_root,
                } => {
                    self.accounts.insert(
                        addr,
                        AccountEntry {
                            account,
                            storage: Trie::from_root(storage_root, self.store.clone()),
                            exists: true,
                        },
                    );
                }
                JournalEntry::SelfDestructRegistered { addr } => {
                    self.self_destructs.remove(&addr);
                }
            }
        }
    }

    /// Flushes every dirty account: kills removed ones, re-serialises the
    /// rest with their storage trie's current root, and returns the new
    /// state root. Non-dirty cached accounts are left untouched (their
    /// trie record is already current).
    pub fn commit(&mut self) -> Result<B256, StateError> {
        for addr in self.dirty.drain().collect::<Vec<_>>() {
            let entry = self.accounts.get_mut(&addr).expect("dirty implies cached");
            let key = Self::account_key(addr);
            if entry.exists {
                entry.account.storage_root = if entry.storage.root_hash() == *EMPTY_ROOT_HASH {
                    *EMPTY_ROOT_HASH
                } else {
                    entry.storage.root_hash()
                };
                self.trie.insert(key.as_slice(), alloy_rlp::encode(&entry.account))?;
            } else {
                self.trie.remove(key.as_slice())?;
            }
        }
        self.journal.clear();
        let root = self.trie.root_hash();
        evmcore_helpers::dev_trace!(?root, "world state committed");
        Ok(root)
    }

    pub fn state_root(&self) -> B256 {
        self.trie.root_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    #[test]
    fn first_write_creates_account() {
        let mut s = WorldState::new_in_memory();
        assert!(!s.exists(addr(1)).unwrap());
        s.add_balance(addr(1), Word::from(100u64)).unwrap();
        assert!(s.exists(addr(1)).unwrap());
        assert_eq!(s.get_balance(addr(1)).unwrap(), Word::from(100u64));
    }

    #[test]
    fn snapshot_revert_undoes_balance_and_storage() {
        let mut s = WorldState::new_in_memory();
        s.add_balance(addr(1), Word::from(100u64)).unwrap();
        s.set_storage(addr(1), B256::ZERO, Word::from(7u64)).unwrap();
        s.commit().unwrap();

        let mark = s.snapshot();
        s.add_balance(addr(1), Word::from(50u64)).unwrap();
        s.set_storage(addr(1), B256::ZERO, Word::from(9u64)).unwrap();
        s.kill(addr(1)).unwrap();
        assert!(!s.exists(addr(1)).unwrap());

        s.revert(mark);
        assert!(s.exists(addr(1)).unwrap());
        assert_eq!(s.get_balance(addr(1)).unwrap(), Word::from(100u64));
        assert_eq!(s.get_storage(addr(1), B256::ZERO).unwrap(), Word::from(7u64));
    }

    #[test]
    fn storage_write_of_zero_reads_back_as_zero() {
        let mut s = WorldState::new_in_memory();
        s.set_storage(addr(1), B256::ZERO, Word::from(5u64)).unwrap();
        s.set_storage(addr(1), B256::ZERO, Word::ZERO).unwrap();
        assert_eq!(s.get_storage(addr(1), B256::ZERO).unwrap(), Word::ZERO);
    }

    #[test]
    fn commit_then_reread_account_record_round_trips() {
        let mut s = WorldState::new_in_memory();
        s.set_balance(addr(1), Word::from(42u64)).unwrap();
        s.set_storage(addr(1), B256::repeat_byte(1), Word::from(7u64)).unwrap();
        s.set_code(addr(1), Bytes::from_static(&[0x60, 0x00])).unwrap();
        let root = s.commit().unwrap();
        assert_eq!(s.state_root(), root);

        // evict the in-memory overlay entry and force a fresh trie load.
        s.accounts.remove(&addr(1));
        assert_eq!(s.get_balance(addr(1)).unwrap(), Word::from(42u64));
        assert_eq!(
            s.get_storage(addr(1), B256::repeat_byte(1)).unwrap(),
            Word::from(7u64)
        );
    }

    #[test]
    fn eip158_sweep_removes_touched_empty_account() {
        let mut s = WorldState::new_in_memory();
        s.add_balance(addr(1), Word::from(0u64)).unwrap();
        assert!(s.exists(addr(1)).unwrap());
        s.sweep_if_empty(addr(1)).unwrap();
        assert!(!s.exists(addr(1)).unwrap());
    }

    #[test]
    fn selfdestruct_credits_beneficiary_and_kills_account() {
        let mut s = WorldState::new_in_memory();
        s.add_balance(addr(1), Word::from(100u64)).unwrap();
        s.mark_selfdestruct(addr(1), addr(2));
        s.apply_pending_selfdestructs().unwrap();
        assert!(!s.exists(addr(1)).unwrap());
        assert_eq!(s.get_balance(addr(2)).unwrap(), Word::from(100u64));
    }

    #[test]
    fn selfdestruct_to_self_destroys_balance() {
        let mut s = WorldState::new_in_memory();
        s.add_balance(addr(1), Word::from(100u64)).unwrap();
        s.mark_selfdestruct(addr(1), addr(1));
        s.apply_pending_selfdestructs().unwrap();
        assert!(!s.exists(addr(1)).unwrap());
    }

    #[test]
    fn reverting_a_selfdestruct_unregisters_it() {
        let mut s = WorldState::new_in_memory();
        s.add_balance(addr(1), Word::from(100u64)).unwrap();
        let mark = s.snapshot();
        s.mark_selfdestruct(addr(1), addr(2));
        assert!(s.is_marked_for_selfdestruct(addr(1)));
        s.revert(mark);
        assert!(!s.is_marked_for_selfdestruct(addr(1)));
    }
}
