//! Seams between the scan and the store it inspects.
//!
//! [`BlockStore`] implements all three; tests substitute in-memory graphs.

use crate::cid::Cid;
use crate::error::Result;
use crate::keys::AllKeys;
use crate::node::Node;
use crate::pins::PinSet;
use crate::store::BlockStore;

/// Source of every id physically present in a store.
pub trait KeySource {
    /// Iterator over stored ids. Each id is yielded once, in no particular order.
    type Keys: Iterator<Item = Cid>;

    /// Start enumeration. An error here is fatal to a scan.
    fn all_keys(&self) -> Result<Self::Keys>;
}

/// Resolves an id to its decoded node.
pub trait LinkResolver {
    /// Decode the node stored under `cid`. Errors are per node.
    fn resolve(&self, cid: &Cid) -> Result<Node>;
}

/// Provides the set of recursive pin roots.
pub trait PinProvider {
    /// Load the pin roots. An error here is fatal to a scan.
    fn recursive_pins(&self) -> Result<PinSet>;
}

impl KeySource for BlockStore {
    type Keys = AllKeys;

    fn all_keys(&self) -> Result<AllKeys> {
        BlockStore::all_keys(self)
    }
}

impl LinkResolver for BlockStore {
    fn resolve(&self, cid: &Cid) -> Result<Node> {
        BlockStore::resolve(self, cid)
    }
}

impl PinProvider for BlockStore {
    fn recursive_pins(&self) -> Result<PinSet> {
        self.pins().recursive_set()
    }
}
