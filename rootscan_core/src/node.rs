//! Decoded view of a stored block and typed payload decoding.

use crate::cid::Cid;
use crate::error::{Error, Result};
use crate::object::{ChunkList, ObjectType};
use crate::tree;
use std::fmt;

/// Namespace prefix of every recognized type tag (`fs-file`, `fs-directory`, ...).
pub const FS_TYPE_PREFIX: &str = "fs";

/// A link from a node to one of its direct children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Id of the child.
    pub cid: Cid,
    /// Entry name, for tree links.
    pub name: Option<String>,
    /// Stored size of the child, or `None` if the child is not in the store.
    pub size: Option<u64>,
}

impl Link {
    /// A nameless link with a known child size.
    pub fn new(cid: Cid, size: u64) -> Self {
        Self {
            cid,
            name: None,
            size: Some(size),
        }
    }
}

/// A decoded block: its payload and ordered child links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    cid: Cid,
    object_type: ObjectType,
    payload: Vec<u8>,
    links: Vec<Link>,
    encoded_len: u64,
}

impl Node {
    /// Assemble a node.
    ///
    /// `encoded_len` is the size of the block as stored (header included).
    pub fn new(
        cid: Cid,
        object_type: ObjectType,
        payload: Vec<u8>,
        links: Vec<Link>,
        encoded_len: u64,
    ) -> Self {
        Self {
            cid,
            object_type,
            payload,
            links,
            encoded_len,
        }
    }

    /// Object type recorded in the block header.
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Payload bytes. For blobs this is the uncompressed content; for raw
    /// blocks it is the opaque data after the link table.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Direct children, in stored order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Size of the block as stored.
    pub fn encoded_len(&self) -> u64 {
        self.encoded_len
    }

    /// Total size: the block itself plus the stored size of each direct child.
    pub fn size(&self) -> Result<u64> {
        self.links.iter().try_fold(self.encoded_len, |total, link| {
            let size = link
                .size
                .ok_or_else(|| Error::unknown_link_size(link.cid.to_hex()))?;
            total
                .checked_add(size)
                .ok_or_else(|| Error::size_overflow(self.cid.to_hex()))
        })
    }
}

/// File-system node kinds a payload can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FsKind {
    /// File content stored in a single blob.
    File,
    /// File content split over chunk blobs.
    ChunkedFile,
    /// A directory listing.
    Directory,
}

/// Outcome of interpreting a payload as a file-system node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The payload describes a file-system node of this kind.
    Decoded(FsKind),
    /// The payload is not a file-system node description.
    Unrecognized,
}

impl FsKind {
    /// Name used in type tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            FsKind::File => "file",
            FsKind::ChunkedFile => "chunked-file",
            FsKind::Directory => "directory",
        }
    }

    /// Interpret a node's payload as a file-system node description.
    pub fn decode(node: &Node) -> Classification {
        match node.object_type() {
            ObjectType::Blob => Classification::Decoded(FsKind::File),
            ObjectType::ChunkList => match ChunkList::decode(node.payload()) {
                Ok(_) => Classification::Decoded(FsKind::ChunkedFile),
                Err(_) => Classification::Unrecognized,
            },
            ObjectType::Tree => match tree::decode_tree(node.payload()) {
                Ok(_) => Classification::Decoded(FsKind::Directory),
                Err(_) => Classification::Unrecognized,
            },
            ObjectType::Raw => Classification::Unrecognized,
        }
    }
}

impl fmt::Display for FsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
