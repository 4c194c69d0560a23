//! Recursive pins: named roots whose whole subgraph must be retained.

use crate::cid::Cid;
use crate::error::{Error, Result};
use crate::store::BlockStore;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Snapshot of the recursive pin roots, fixed for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinSet {
    roots: BTreeSet<Cid>,
}

impl PinSet {
    /// An empty pin set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `cid` is a recursive pin root.
    pub fn contains(&self, cid: &Cid) -> bool {
        self.roots.contains(cid)
    }

    /// Number of pin roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Returns `true` if nothing is pinned.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Pin roots in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Cid> {
        self.roots.iter()
    }
}

impl FromIterator<Cid> for PinSet {
    fn from_iter<I: IntoIterator<Item = Cid>>(iter: I) -> Self {
        Self {
            roots: iter.into_iter().collect(),
        }
    }
}

/// Manages named recursive pins in the store.
///
/// Each pin is a file in the store's pin directory (`pins/`, or `refs/` in
/// a casq store) holding one hex id per line; the last valid line is the
/// current value.
pub struct PinManager<'a> {
    store: &'a BlockStore,
}

impl<'a> PinManager<'a> {
    /// Create a new PinManager for the given store.
    pub(crate) fn new(store: &'a BlockStore) -> Self {
        Self { store }
    }

    fn pins_dir(&self) -> PathBuf {
        self.store.pins_dir().to_path_buf()
    }

    /// Get the path to a pin file.
    fn pin_path(&self, name: &str) -> Result<PathBuf> {
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(Error::invalid_pin(format!(
                "Invalid pin name: {} (must not contain .. or path separators)",
                name
            )));
        }

        if name.is_empty() {
            return Err(Error::invalid_pin("Pin name cannot be empty"));
        }

        Ok(self.pins_dir().join(name))
    }

    /// Add or update a recursive pin.
    pub fn add(&self, name: &str, cid: &Cid) -> Result<()> {
        let path = self.pin_path(name)?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        writeln!(file, "{}", cid.to_hex())?;

        Ok(())
    }

    /// Get the current value of a pin.
    ///
    /// Returns the last non-empty, non-comment line that parses as an id.
    pub fn get(&self, name: &str) -> Result<Option<Cid>> {
        let path = self.pin_path(name)?;

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let current = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| Cid::from_hex(line).ok())
            .last();

        Ok(current)
    }

    /// List all pins as (name, id) pairs sorted by name.
    pub fn list(&self) -> Result<Vec<(String, Cid)>> {
        let pins_dir = self.pins_dir();
        if !pins_dir.is_dir() {
            return Err(Error::invalid_store(
                self.store.root(),
                "pins directory missing",
            ));
        }

        let mut pins = Vec::new();
        for entry in fs::read_dir(&pins_dir)? {
            let path = entry?.path();

            if path.is_file()
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
                && let Some(cid) = self.get(name)?
            {
                pins.push((name.to_string(), cid));
            }
        }

        pins.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(pins)
    }

    /// Remove a pin.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.pin_path(name)?;

        if !path.exists() {
            return Err(Error::pin_not_found(name));
        }

        fs::remove_file(&path)?;
        Ok(())
    }

    /// Snapshot of every pinned id.
    pub fn recursive_set(&self) -> Result<PinSet> {
        Ok(self.list()?.into_iter().map(|(_, cid)| cid).collect())
    }
}
