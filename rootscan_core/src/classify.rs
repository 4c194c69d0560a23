//! Classification of selected roots into report rows.

use crate::cid::Cid;
use crate::node::{Classification, FS_TYPE_PREFIX, FsKind};
use crate::pins::PinSet;
use crate::traits::LinkResolver;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Type label of a reported object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// The payload describes a file-system node.
    Fs(FsKind),
    /// The payload is not a file-system node, or could not be read.
    Unknown,
}

impl TypeTag {
    /// Whether this is the `unknown` tag.
    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeTag::Unknown)
    }
}

impl From<Classification> for TypeTag {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Decoded(kind) => TypeTag::Fs(kind),
            Classification::Unrecognized => TypeTag::Unknown,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Fs(kind) => write!(f, "{}-{}", FS_TYPE_PREFIX, kind),
            TypeTag::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    /// Id of the object.
    #[serde(rename = "hash")]
    pub cid: Cid,
    /// Type label.
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    /// Block size plus the stored size of its direct children.
    #[serde(rename = "size")]
    pub total_size: u64,
    /// Whether the object is itself a recursive pin root.
    pub pinned: bool,
}

/// Build one [`ObjectInfo`] per root.
///
/// Nothing is dropped here: a root that fails to resolve is reported as
/// `unknown` with size 0, and a size that cannot be computed becomes 0.
pub fn classify_roots<R>(roots: &BTreeSet<Cid>, pins: &PinSet, resolver: &R) -> Vec<ObjectInfo>
where
    R: LinkResolver + ?Sized,
{
    roots
        .iter()
        .map(|cid| classify_one(cid, pins, resolver))
        .collect()
}

fn classify_one<R>(cid: &Cid, pins: &PinSet, resolver: &R) -> ObjectInfo
where
    R: LinkResolver + ?Sized,
{
    let pinned = pins.contains(cid);

    let node = match resolver.resolve(cid) {
        Ok(node) => node,
        Err(e) => {
            warn!(%cid, error = %e, "error reading dag node");
            return ObjectInfo {
                cid: *cid,
                type_tag: TypeTag::Unknown,
                total_size: 0,
                pinned,
            };
        }
    };

    let total_size = node.size().unwrap_or_else(|e| {
        warn!(%cid, error = %e, "error getting size of object");
        0
    });

    ObjectInfo {
        cid: *cid,
        type_tag: FsKind::decode(&node).into(),
        total_size,
        pinned,
    }
}
