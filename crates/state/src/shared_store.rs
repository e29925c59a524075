use evmcore_trie::{Error, NodeStore};
use std::cell::RefCell;
use std::rc::Rc;

/// A [`NodeStore`] shared by reference-count between the account trie and
/// every account's storage trie, since all of them persist into the same
/// content-addressed node arena (§4.3: "nodes >= 32 bytes are referenced by
/// their Keccak-256", one arena for the whole state).
///
/// `Rc<RefCell<_>>` rather than a lock: the core is single-threaded by
/// design (§5), so no synchronisation primitive earns its keep here.
#[derive(Debug, Default)]
pub struct SharedStore<S>(Rc<RefCell<S>>);

impl<S> SharedStore<S> {
    pub fn new(inner: S) -> Self {
        Self(Rc::new(RefCell::new(inner)))
    }
}

impl<S> Clone for SharedStore<S> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<S: NodeStore> NodeStore for SharedStore<S> {
    fn get_node(&self, hash: &alloy_primitives::B256) -> Result<Option<Vec<u8>>, Error> {
        self.0.borrow().get_node(hash)
    }

    fn put_node(&mut self, hash: alloy_primitives::B256, rlp: Vec<u8>) {
        self.0.borrow_mut().put_node(hash, rlp)
    }
}
