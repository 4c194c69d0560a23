//! Root selection: which stored objects are never demoted by a parent link.
//!
//! Every stored id starts as a candidate. Each stored node is resolved once,
//! and every child it links to is dropped from the candidates unless that
//! exact child is itself a recursive pin root. Whether the *parent* is
//! pinned plays no part in the decision.
//!
//! A node that fails to resolve stays a candidate, and since its links are
//! unknown it demotes nothing.

use crate::cid::Cid;
use crate::pins::PinSet;
use crate::traits::LinkResolver;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Result of root selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootSelection {
    /// Stored ids that survived selection.
    pub roots: BTreeSet<Cid>,
    /// Stored ids whose node could not be resolved, in visit order.
    pub unresolved: Vec<Cid>,
}

/// Select the apparent roots among `stored`.
///
/// Visits a frozen snapshot of `stored` and calls the resolver exactly once
/// per id. The returned roots are always a subset of `stored`.
pub fn select_roots<R>(stored: &BTreeSet<Cid>, pins: &PinSet, resolver: &R) -> RootSelection
where
    R: LinkResolver + ?Sized,
{
    let mut roots = stored.clone();
    let mut unresolved = Vec::new();

    for cid in stored {
        let node = match resolver.resolve(cid) {
            Ok(node) => node,
            Err(e) => {
                warn!(%cid, error = %e, "error reading dag node");
                unresolved.push(*cid);
                continue;
            }
        };

        for link in node.links() {
            if !pins.contains(&link.cid) {
                roots.remove(&link.cid);
            }
        }
    }

    debug!(
        stored = stored.len(),
        roots = roots.len(),
        unresolved = unresolved.len(),
        "root selection complete"
    );

    RootSelection { roots, unresolved }
}
