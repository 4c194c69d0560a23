//! Tree encoding and directory structure.

use crate::cid::{CID_SIZE, Cid};
use crate::error::{Error, Result};
use std::io::Read;

/// Entry type in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// A blob (file).
    Blob = 1,
    /// A subtree (directory).
    Tree = 2,
}

impl EntryType {
    /// Convert to byte representation.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse from byte representation.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(EntryType::Blob),
            2 => Ok(EntryType::Tree),
            _ => Err(Error::invalid_tree_entry(format!(
                "Invalid entry type: {}",
                value
            ))),
        }
    }
}

/// File mode (POSIX permissions).
pub type FileMode = u32;

/// Common file modes.
pub mod file_modes {
    use super::FileMode;

    /// Regular file (non-executable).
    pub const REGULAR: FileMode = 0o100644;

    /// Executable file.
    pub const EXECUTABLE: FileMode = 0o100755;

    /// Directory.
    pub const DIRECTORY: FileMode = 0o040755;
}

/// An entry in a tree (file or subdirectory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Type of entry (blob or tree).
    pub entry_type: EntryType,
    /// POSIX file mode.
    pub mode: FileMode,
    /// Id of the child object.
    pub cid: Cid,
    /// Name of the entry (UTF-8).
    pub name: String,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(entry_type: EntryType, mode: FileMode, cid: Cid, name: String) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::invalid_tree_entry("Name cannot be empty"));
        }

        if name.len() > 255 {
            return Err(Error::invalid_tree_entry(format!(
                "Name too long: {} bytes (max 255)",
                name.len()
            )));
        }

        if name.contains('\0') {
            return Err(Error::invalid_tree_entry("Name cannot contain null bytes"));
        }

        Ok(Self {
            entry_type,
            mode,
            cid,
            name,
        })
    }

    /// Shorthand for a regular-file entry.
    pub fn file(name: impl Into<String>, cid: Cid) -> Result<Self> {
        Self::new(EntryType::Blob, file_modes::REGULAR, cid, name.into())
    }

    /// Shorthand for a subdirectory entry.
    pub fn dir(name: impl Into<String>, cid: Cid) -> Result<Self> {
        Self::new(EntryType::Tree, file_modes::DIRECTORY, cid, name.into())
    }

    /// Encode the entry to bytes.
    ///
    /// Format:
    /// - 1 byte: type (1=blob, 2=tree)
    /// - 4 bytes: mode (u32 LE)
    /// - 32 bytes: child id
    /// - 1 byte: name_len
    /// - N bytes: name (UTF-8)
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + 4 + CID_SIZE + 1 + self.name.len());
        buf.push(self.entry_type.to_u8());
        buf.extend_from_slice(&self.mode.to_le_bytes());
        buf.extend_from_slice(self.cid.as_bytes());
        buf.push(self.name.len() as u8);
        buf.extend_from_slice(self.name.as_bytes());
        buf
    }

    /// Decode an entry from a reader.
    pub fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let mut type_buf = [0u8; 1];
        reader.read_exact(&mut type_buf)?;
        let entry_type = EntryType::from_u8(type_buf[0])?;

        let mut mode_buf = [0u8; 4];
        reader.read_exact(&mut mode_buf)?;
        let mode = u32::from_le_bytes(mode_buf);

        let mut cid_buf = [0u8; CID_SIZE];
        reader.read_exact(&mut cid_buf)?;
        let cid = Cid::from_bytes(cid_buf);

        let mut name_len_buf = [0u8; 1];
        reader.read_exact(&mut name_len_buf)?;
        let name_len = name_len_buf[0] as usize;

        if name_len == 0 {
            return Err(Error::invalid_tree_entry("Name length is zero"));
        }

        let mut name_buf = vec![0u8; name_len];
        reader.read_exact(&mut name_buf)?;
        let name = String::from_utf8(name_buf)
            .map_err(|e| Error::invalid_tree_entry(format!("Invalid UTF-8 in name: {}", e)))?;

        Self::new(entry_type, mode, cid, name)
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    /// Compare by name (bytewise UTF-8) for canonical ordering.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.as_bytes().cmp(other.name.as_bytes())
    }
}

/// Encode a list of tree entries (sorted by name).
pub fn encode_tree(mut entries: Vec<TreeEntry>) -> Vec<u8> {
    entries.sort();

    let mut buf = Vec::new();
    for entry in entries {
        buf.extend_from_slice(&entry.encode());
    }
    buf
}

/// Decode a list of tree entries from bytes.
pub fn decode_tree(data: &[u8]) -> Result<Vec<TreeEntry>> {
    let mut reader = std::io::Cursor::new(data);
    let mut entries = Vec::new();

    while reader.position() < data.len() as u64 {
        entries.push(TreeEntry::decode(&mut reader)?);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name_validation() {
        let cid = Cid::hash_bytes(b"test");

        assert!(TreeEntry::file("", cid).is_err());
        assert!(TreeEntry::file("a".repeat(256), cid).is_err());
        assert!(TreeEntry::file("test\0file", cid).is_err());
        assert!(TreeEntry::dir("sub", cid).is_ok());
    }

    #[test]
    fn test_encode_decode_tree_sorted() {
        let cid1 = Cid::hash_bytes(b"test1");
        let cid2 = Cid::hash_bytes(b"test2");

        let entries = vec![
            TreeEntry::file("b.txt", cid1).unwrap(),
            TreeEntry::dir("a", cid2).unwrap(),
        ];

        let decoded = decode_tree(&encode_tree(entries)).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].name, "a");
        assert_eq!(decoded[0].entry_type, EntryType::Tree);
        assert_eq!(decoded[0].cid, cid2);
        assert_eq!(decoded[1].name, "b.txt");
        assert_eq!(decoded[1].mode, file_modes::REGULAR);
    }

    #[test]
    fn test_empty_tree() {
        let encoded = encode_tree(vec![]);
        assert!(encoded.is_empty());
        assert!(decode_tree(&encoded).unwrap().is_empty());
    }

    #[test]
    fn test_decode_truncated_tree() {
        let entry = TreeEntry::file("x", Cid::hash_bytes(b"x")).unwrap();
        let encoded = entry.encode();
        assert!(decode_tree(&encoded[..encoded.len() - 1]).is_err());
    }

    use proptest::prelude::*;

    fn arb_tree_entry() -> impl Strategy<Value = TreeEntry> {
        (
            prop::sample::select(vec![EntryType::Blob, EntryType::Tree]),
            any::<u32>(),
            prop::array::uniform32(any::<u8>()),
            "[a-zA-Z0-9._-]{1,64}",
        )
            .prop_map(|(entry_type, mode, bytes, name)| {
                TreeEntry::new(entry_type, mode, Cid::from_bytes(bytes), name).unwrap()
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            max_shrink_iters: 10000,
            ..ProptestConfig::default()
        })]

        /// Tree ids do not depend on the order entries were supplied in
        #[test]
        fn prop_tree_canonicalization_order_independent(
            entries in prop::collection::vec(arb_tree_entry(), 1..20).prop_filter(
                "unique names",
                |entries| {
                    let mut names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
                    names.sort();
                    names.dedup();
                    names.len() == entries.len()
                },
            )
        ) {
            let forward = Cid::hash_bytes(&encode_tree(entries.clone()));
            let mut reversed = entries;
            reversed.reverse();
            let backward = Cid::hash_bytes(&encode_tree(reversed));
            prop_assert_eq!(forward, backward);
        }
    }
}
