//! The full scan: enumerate, select roots, classify, rank.

use crate::classify::{ObjectInfo, classify_roots};
use crate::cid::Cid;
use crate::error::Result;
use crate::rank::rank;
use crate::roots::select_roots;
use crate::traits::{KeySource, LinkResolver, PinProvider};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Checkpoints reached during a scan, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Setup succeeded; draining stored ids.
    Started,
    /// Every stored id has been collected.
    KeysGathered,
    /// Roots have been selected.
    RootsSelected,
    /// Every root has been classified.
    Classified,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Started => "started processing keys...",
            Stage::KeysGathered => "initial key gathering complete, now finding graph roots.",
            Stage::RootsSelected => "root selection complete, classifying resulting objects",
            Stage::Classified => "classification complete, sorting output...",
        })
    }
}

/// Outcome of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Report rows, ranked.
    pub objects: Vec<ObjectInfo>,
    /// Number of ids found in the store.
    pub stored: usize,
    /// Number of recursive pin roots loaded.
    pub pins: usize,
    /// Ids that could not be resolved during root selection.
    pub unresolved: Vec<Cid>,
}

/// Run a full scan over `store`.
///
/// Starting enumeration and loading pins are the only fatal steps; every
/// per-node failure is reported and the scan continues. `on_stage` is
/// called at each [`Stage`].
pub fn scan<S>(store: &S, mut on_stage: impl FnMut(Stage)) -> Result<ScanReport>
where
    S: KeySource + LinkResolver + PinProvider + ?Sized,
{
    let keys = store.all_keys()?;
    let pins = store.recursive_pins()?;

    on_stage(Stage::Started);
    let stored: BTreeSet<Cid> = keys.collect();
    debug!(stored = stored.len(), pins = pins.len(), "keys gathered");

    on_stage(Stage::KeysGathered);
    let selection = select_roots(&stored, &pins, store);

    on_stage(Stage::RootsSelected);
    let mut objects = classify_roots(&selection.roots, &pins, store);

    on_stage(Stage::Classified);
    rank(&mut objects);

    Ok(ScanReport {
        objects,
        stored: stored.len(),
        pins: pins.len(),
        unresolved: selection.unresolved,
    })
}
