//! Block store management and object I/O.

use crate::chunking::{ChunkerConfig, chunk_data};
use crate::cid::{Algorithm, Cid};
use crate::error::{Error, Result};
use crate::node::{Link, Node};
use crate::object::{ChunkList, CompressionType, HEADER_SIZE, ObjectHeader, ObjectType, RawBlock};
use crate::pins::PinManager;
use crate::tree::{self, TreeEntry};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Compression threshold: blobs >= 4KB are compressed.
const COMPRESSION_THRESHOLD: usize = 4096;

/// Chunking threshold: blobs >= 1MB are chunked.
const CHUNKING_THRESHOLD: usize = 1024 * 1024;

/// Directories that may hold recursive pins, in lookup order. casq stores
/// keep their retention roots under `refs/`.
const PIN_DIRS: [&str; 2] = ["pins", "refs"];

/// A content-addressed block store on disk.
#[derive(Debug)]
pub struct BlockStore {
    root: PathBuf,
    algorithm: Algorithm,
    pins_dir: PathBuf,
}

impl BlockStore {
    /// Initialize a new store at the given path.
    ///
    /// Creates the directory structure:
    /// - `objects/blake3-256/` for storing objects
    /// - `pins/` for recursive pins
    /// - `config` file with version and algorithm
    pub fn init<P: AsRef<Path>>(root: P, algorithm: Algorithm) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("objects").join(algorithm.as_str()))?;
        let pins_dir = root.join(PIN_DIRS[0]);
        fs::create_dir_all(&pins_dir)?;

        let config_content = format!("version=1\nalgo={}\n", algorithm.as_str());
        fs::write(root.join("config"), config_content)?;

        Ok(Self {
            root,
            algorithm,
            pins_dir,
        })
    }

    /// Open an existing store at the given path.
    ///
    /// Validates the store structure and reads the configuration. Pins are
    /// read from `pins/`, or from `refs/` in a store without one.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            return Err(Error::invalid_store(&root, "directory does not exist"));
        }

        let config_path = root.join("config");
        if !config_path.exists() {
            return Err(Error::invalid_store(&root, "config file not found"));
        }

        let config_content = fs::read_to_string(&config_path)?;
        let algorithm = Self::parse_config(&root, &config_content)?;

        if !root.join("objects").join(algorithm.as_str()).exists() {
            return Err(Error::invalid_store(
                &root,
                "objects directory structure missing",
            ));
        }

        let pins_dir = PIN_DIRS
            .iter()
            .map(|dir| root.join(dir))
            .find(|dir| dir.is_dir())
            .ok_or_else(|| Error::invalid_store(&root, "pins directory missing"))?;

        Ok(Self {
            root,
            algorithm,
            pins_dir,
        })
    }

    /// Parse the config file to extract the algorithm.
    fn parse_config(root: &Path, content: &str) -> Result<Algorithm> {
        let mut version = None;
        let mut algo = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "version" => version = Some(value.trim()),
                    "algo" => algo = Some(value.trim()),
                    _ => {}
                }
            }
        }

        if version != Some("1") {
            return Err(Error::invalid_store(
                root,
                format!("unsupported config version: {:?}", version),
            ));
        }

        let algo_str = algo.ok_or_else(|| Error::invalid_store(root, "missing algo in config"))?;
        Algorithm::parse(algo_str)
    }

    /// Get the path to an object file given its id.
    ///
    /// Returns: `objects/{algorithm}/{prefix}/{suffix}`
    pub fn object_path(&self, cid: &Cid) -> PathBuf {
        self.objects_dir().join(cid.prefix()).join(cid.suffix())
    }

    /// Directory holding the object shards.
    pub(crate) fn objects_dir(&self) -> PathBuf {
        self.root.join("objects").join(self.algorithm.as_str())
    }

    /// Get the root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the algorithm used by this store.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Directory holding the named pins.
    pub fn pins_dir(&self) -> &Path {
        &self.pins_dir
    }

    /// Get the pin manager for this store.
    pub fn pins(&self) -> PinManager<'_> {
        PinManager::new(self)
    }

    /// Check whether an object is present.
    pub fn contains(&self, cid: &Cid) -> bool {
        self.object_path(cid).is_file()
    }

    /// Size of an object file as stored, or `None` if it is not present.
    pub fn stored_size(&self, cid: &Cid) -> Option<u64> {
        fs::metadata(self.object_path(cid))
            .ok()
            .filter(|meta| meta.is_file())
            .map(|meta| meta.len())
    }

    /// Read an object header from a file.
    fn read_object_header(&self, path: &Path) -> Result<ObjectHeader> {
        let mut file = fs::File::open(path)?;
        let mut header_buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_buf)
            .map_err(|e| Error::corrupted_object(path, format!("short header: {}", e)))?;
        ObjectHeader::decode(&header_buf)
    }

    /// Read the full stored payload of an object.
    fn read_object_payload(&self, path: &Path, expected_len: u64) -> Result<Vec<u8>> {
        let mut file = fs::File::open(path)?;

        let mut header_buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_buf)?;

        let mut payload = Vec::new();
        file.read_to_end(&mut payload)?;

        if payload.len() as u64 != expected_len {
            return Err(Error::corrupted_object(
                path,
                format!(
                    "Payload length mismatch: expected {}, got {}",
                    expected_len,
                    payload.len()
                ),
            ));
        }

        Ok(payload)
    }

    /// Write an object atomically using tempfile.
    fn write_object_atomic(&self, cid: &Cid, header: &ObjectHeader, payload: &[u8]) -> Result<()> {
        let obj_path = self.object_path(cid);
        let shard_dir = self.objects_dir().join(cid.prefix());
        fs::create_dir_all(&shard_dir)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(&shard_dir)?;
        temp_file.write_all(&header.encode())?;
        temp_file.write_all(payload)?;
        temp_file.flush()?;
        temp_file.persist(&obj_path)?;

        Ok(())
    }

    /// Store a blob from a reader.
    ///
    /// Returns the id of the stored blob.
    /// For data >= 1MB, uses content-defined chunking.
    /// For blobs >= 4KB, applies zstd compression.
    pub fn put_blob<R: Read>(&self, mut reader: R) -> Result<Cid> {
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;

        if payload.len() >= CHUNKING_THRESHOLD {
            return self.put_blob_chunked(&payload);
        }

        self.put_blob_whole(&payload)
    }

    /// Store data as a single blob (no chunking).
    fn put_blob_whole(&self, payload: &[u8]) -> Result<Cid> {
        let cid = Cid::hash_bytes(payload);
        if self.contains(&cid) {
            return Ok(cid);
        }

        let (final_payload, compression) = if payload.len() >= COMPRESSION_THRESHOLD {
            (compress_zstd(payload)?, CompressionType::Zstd)
        } else {
            (payload.to_vec(), CompressionType::None)
        };

        let header = ObjectHeader::new(
            ObjectType::Blob,
            self.algorithm,
            compression,
            final_payload.len() as u64,
        );
        self.write_object_atomic(&cid, &header, &final_payload)?;

        Ok(cid)
    }

    /// Store data as chunk blobs plus a chunk list.
    fn put_blob_chunked(&self, data: &[u8]) -> Result<Cid> {
        let chunks = chunk_data(data, &ChunkerConfig::default());

        let mut offset = 0;
        for chunk in &chunks {
            let end = offset + chunk.size as usize;
            self.put_blob_whole(&data[offset..end])?;
            offset = end;
        }

        // The chunk list is named by the whole data, not by its own payload
        let file_cid = Cid::hash_bytes(data);
        if self.contains(&file_cid) {
            return Ok(file_cid);
        }

        let payload = ChunkList { chunks }.encode();
        let header = ObjectHeader::new(
            ObjectType::ChunkList,
            self.algorithm,
            CompressionType::None,
            payload.len() as u64,
        );
        self.write_object_atomic(&file_cid, &header, &payload)?;

        Ok(file_cid)
    }

    /// Store a tree from a list of entries.
    ///
    /// Entries are sorted by name for canonical ordering.
    pub fn put_tree(&self, entries: Vec<TreeEntry>) -> Result<Cid> {
        let payload = tree::encode_tree(entries);
        self.put_uncompressed(ObjectType::Tree, &payload)
    }

    /// Store a raw linked block: ordered child ids plus opaque data.
    pub fn put_raw(&self, links: &[Cid], data: &[u8]) -> Result<Cid> {
        let payload = RawBlock {
            links: links.to_vec(),
            data: data.to_vec(),
        }
        .encode();
        self.put_uncompressed(ObjectType::Raw, &payload)
    }

    /// Store a metadata object named by the hash of its payload.
    fn put_uncompressed(&self, object_type: ObjectType, payload: &[u8]) -> Result<Cid> {
        let cid = Cid::hash_bytes(payload);
        if self.contains(&cid) {
            return Ok(cid);
        }

        let header = ObjectHeader::new(
            object_type,
            self.algorithm,
            CompressionType::None,
            payload.len() as u64,
        );
        self.write_object_atomic(&cid, &header, payload)?;

        Ok(cid)
    }

    /// Read and decode an object into a [`Node`].
    ///
    /// Verifies the content hash of blobs, trees and raw blocks. A tree or
    /// chunk list whose payload does not decode resolves with no links, so
    /// it is classified as unrecognized rather than failing. Each link
    /// carries the stored size of its child, or `None` when the child is
    /// not in the store.
    pub fn resolve(&self, cid: &Cid) -> Result<Node> {
        let obj_path = self.object_path(cid);
        if !obj_path.is_file() {
            return Err(Error::object_not_found(cid.to_hex()));
        }

        let header = self.read_object_header(&obj_path)?;
        let stored = self.read_object_payload(&obj_path, header.payload_len)?;
        let encoded_len = HEADER_SIZE as u64 + header.payload_len;

        let payload = match header.compression {
            CompressionType::None => stored,
            CompressionType::Zstd => decompress_zstd(&stored)?,
        };

        let (payload, children): (Vec<u8>, Vec<(Cid, Option<String>)>) = match header.object_type
        {
            ObjectType::Blob => {
                verify_hash(cid, &obj_path, &payload)?;
                (payload, Vec::new())
            }
            ObjectType::Tree => {
                verify_hash(cid, &obj_path, &payload)?;
                let children = match tree::decode_tree(&payload) {
                    Ok(entries) => entries
                        .into_iter()
                        .map(|entry| (entry.cid, Some(entry.name)))
                        .collect(),
                    Err(e) => {
                        warn!(%cid, error = %e, "undecodable tree payload, no links");
                        Vec::new()
                    }
                };
                (payload, children)
            }
            ObjectType::ChunkList => {
                let children = match ChunkList::decode(&payload) {
                    Ok(list) => list
                        .chunks
                        .into_iter()
                        .map(|chunk| (chunk.cid, None))
                        .collect(),
                    Err(e) => {
                        warn!(%cid, error = %e, "undecodable chunk list payload, no links");
                        Vec::new()
                    }
                };
                (payload, children)
            }
            ObjectType::Raw => {
                verify_hash(cid, &obj_path, &payload)?;
                let block = RawBlock::decode(&payload)?;
                let children = block.links.into_iter().map(|link| (link, None)).collect();
                (block.data, children)
            }
        };

        let links = children
            .into_iter()
            .map(|(child, name)| Link {
                cid: child,
                name,
                size: self.stored_size(&child),
            })
            .collect();

        Ok(Node::new(
            *cid,
            header.object_type,
            payload,
            links,
            encoded_len,
        ))
    }
}

/// Check that `data` hashes to `cid`.
fn verify_hash(cid: &Cid, path: &Path, data: &[u8]) -> Result<()> {
    let computed = Cid::hash_bytes(data);
    if computed != *cid {
        return Err(Error::corrupted_object(
            path,
            format!(
                "Hash mismatch: expected {}, got {}",
                cid.to_hex(),
                computed.to_hex()
            ),
        ));
    }
    Ok(())
}

/// Compress data using zstd.
fn compress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::encode_all(data, 3) // Level 3 = fast compression
        .map_err(|e| Error::compression(format!("zstd compression failed: {}", e)))
}

/// Decompress data using zstd.
fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data)
        .map_err(|e| Error::compression(format!("zstd decompression failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Classification, FsKind};
    use tempfile::TempDir;

    fn new_store() -> (TempDir, BlockStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = BlockStore::init(temp_dir.path().join("store"), Algorithm::Blake3).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_store_init() {
        let (temp_dir, store) = new_store();
        let store_path = temp_dir.path().join("store");
        assert_eq!(store.root(), store_path);

        assert!(store_path.join("objects/blake3-256").exists());
        assert!(store_path.join("pins").exists());

        let config = fs::read_to_string(store_path.join("config")).unwrap();
        assert!(config.contains("version=1"));
        assert!(config.contains("algo=blake3-256"));
    }

    #[test]
    fn test_store_open() {
        let (temp_dir, _store) = new_store();
        let store = BlockStore::open(temp_dir.path().join("store")).unwrap();
        assert_eq!(store.algorithm(), Algorithm::Blake3);
    }

    #[test]
    fn test_store_open_invalid() {
        let temp_dir = TempDir::new().unwrap();
        assert!(BlockStore::open(temp_dir.path().join("nonexistent")).is_err());

        let no_config = temp_dir.path().join("no-config");
        fs::create_dir_all(&no_config).unwrap();
        assert!(matches!(
            BlockStore::open(&no_config),
            Err(Error::InvalidStore { .. })
        ));
    }

    #[test]
    fn test_store_open_missing_pins_dir() {
        let (temp_dir, store) = new_store();
        fs::remove_dir(store.root().join("pins")).unwrap();
        assert!(BlockStore::open(temp_dir.path().join("store")).is_err());
    }

    #[test]
    fn test_store_open_casq_layout_uses_refs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("objects/blake3-256")).unwrap();
        fs::create_dir_all(root.join("refs")).unwrap();
        fs::write(root.join("config"), "version=1\nalgo=blake3-256\n").unwrap();
        fs::write(root.join("journal"), "").unwrap();

        let store = BlockStore::open(root).unwrap();
        assert_eq!(store.pins_dir(), root.join("refs"));

        let cid = store.put_blob(b"kept".as_ref()).unwrap();
        fs::write(root.join("refs/backup"), format!("{}\n", cid.to_hex())).unwrap();
        assert!(store.pins().recursive_set().unwrap().contains(&cid));
    }

    #[test]
    fn test_store_open_prefers_pins_over_refs() {
        let (temp_dir, _store) = new_store();
        let root = temp_dir.path().join("store");
        fs::create_dir_all(root.join("refs")).unwrap();

        let store = BlockStore::open(&root).unwrap();
        assert_eq!(store.pins_dir(), root.join("pins"));
    }

    #[test]
    fn test_parse_config() {
        let root = Path::new("/store");
        let content = "# comment\n\nversion=1\nalgo = blake3-256\n";
        assert_eq!(
            BlockStore::parse_config(root, content).unwrap(),
            Algorithm::Blake3
        );

        assert!(BlockStore::parse_config(root, "version=2\nalgo=blake3-256\n").is_err());
        assert!(BlockStore::parse_config(root, "version=1\n").is_err());
        assert!(BlockStore::parse_config(root, "version=1\nalgo=md5\n").is_err());
    }

    #[test]
    fn test_object_path() {
        let (_temp_dir, store) = new_store();
        let cid = Cid::hash_bytes(b"test");
        let path = store.object_path(&cid);

        assert!(path.ends_with(format!("objects/blake3-256/{}/{}", cid.prefix(), cid.suffix())));
    }

    #[test]
    fn test_put_blob_and_resolve() {
        let (_temp_dir, store) = new_store();
        let cid = store.put_blob(b"hello".as_ref()).unwrap();
        assert_eq!(cid, Cid::hash_bytes(b"hello"));

        let node = store.resolve(&cid).unwrap();
        assert_eq!(node.object_type(), ObjectType::Blob);
        assert_eq!(node.payload(), b"hello");
        assert!(node.links().is_empty());
        assert_eq!(node.encoded_len(), HEADER_SIZE as u64 + 5);
        assert_eq!(node.size().unwrap(), node.encoded_len());
        assert_eq!(store.stored_size(&cid), Some(node.encoded_len()));
    }

    #[test]
    fn test_blob_deduplication() {
        let (_temp_dir, store) = new_store();
        let first = store.put_blob(b"same".as_ref()).unwrap();
        let second = store.put_blob(b"same".as_ref()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_large_blob_is_compressed() {
        let (_temp_dir, store) = new_store();
        let data = vec![7u8; 64 * 1024];
        let cid = store.put_blob(data.as_slice()).unwrap();

        let on_disk = store.stored_size(&cid).unwrap();
        assert!(on_disk < data.len() as u64);

        let node = store.resolve(&cid).unwrap();
        assert_eq!(node.payload(), data.as_slice());
        assert_eq!(node.encoded_len(), on_disk);
    }

    #[test]
    fn test_chunked_blob_links_to_chunks() {
        let (_temp_dir, store) = new_store();
        let data = (0..3 * 1024 * 1024)
            .map(|i| (i % 251) as u8)
            .collect::<Vec<_>>();

        let cid = store.put_blob(data.as_slice()).unwrap();
        assert_eq!(cid, Cid::hash_bytes(&data));

        let node = store.resolve(&cid).unwrap();
        assert_eq!(node.object_type(), ObjectType::ChunkList);
        assert!(node.links().len() >= 2);
        for link in node.links() {
            assert!(store.contains(&link.cid));
            assert_eq!(link.size, store.stored_size(&link.cid));
        }
        assert_eq!(
            FsKind::decode(&node),
            Classification::Decoded(FsKind::ChunkedFile)
        );
    }

    #[test]
    fn test_put_tree_and_resolve_links() {
        let (_temp_dir, store) = new_store();
        let a = store.put_blob(b"file a".as_ref()).unwrap();
        let b = store.put_blob(b"file b".as_ref()).unwrap();

        let tree = store
            .put_tree(vec![
                TreeEntry::file("b.txt", b).unwrap(),
                TreeEntry::file("a.txt", a).unwrap(),
            ])
            .unwrap();

        let node = store.resolve(&tree).unwrap();
        assert_eq!(node.object_type(), ObjectType::Tree);

        let names: Vec<_> = node.links().iter().map(|l| l.name.clone()).collect();
        assert_eq!(
            names,
            vec![Some("a.txt".to_string()), Some("b.txt".to_string())]
        );
        assert_eq!(node.links()[0].cid, a);

        let expected = node.encoded_len()
            + store.stored_size(&a).unwrap()
            + store.stored_size(&b).unwrap();
        assert_eq!(node.size().unwrap(), expected);
    }

    #[test]
    fn test_malformed_tree_resolves_without_links() {
        use crate::classify::{TypeTag, classify_roots};
        use crate::pins::PinSet;
        use std::collections::BTreeSet;

        let (_temp_dir, store) = new_store();
        let bad_tree = store.put_uncompressed(ObjectType::Tree, &[9, 9, 9]).unwrap();
        let bad_list = store.put_uncompressed(ObjectType::ChunkList, &[0; 7]).unwrap();

        for cid in [bad_tree, bad_list] {
            let node = store.resolve(&cid).unwrap();
            assert!(node.links().is_empty());
            assert_eq!(FsKind::decode(&node), Classification::Unrecognized);
        }

        let roots: BTreeSet<Cid> = [bad_tree].into_iter().collect();
        let infos = classify_roots(&roots, &PinSet::new(), &store);
        assert_eq!(infos[0].type_tag, TypeTag::Unknown);
        assert_eq!(infos[0].total_size, store.stored_size(&bad_tree).unwrap());
    }

    #[test]
    fn test_tree_with_missing_child_has_unknown_size() {
        let (_temp_dir, store) = new_store();
        let missing = Cid::hash_bytes(b"never stored");
        let tree = store
            .put_tree(vec![TreeEntry::file("ghost", missing).unwrap()])
            .unwrap();

        let node = store.resolve(&tree).unwrap();
        assert_eq!(node.links()[0].size, None);
        assert!(matches!(node.size(), Err(Error::UnknownLinkSize { .. })));
    }

    #[test]
    fn test_put_raw_and_resolve() {
        let (_temp_dir, store) = new_store();
        let child = store.put_blob(b"child".as_ref()).unwrap();
        let raw = store.put_raw(&[child], b"meta").unwrap();

        let node = store.resolve(&raw).unwrap();
        assert_eq!(node.object_type(), ObjectType::Raw);
        assert_eq!(node.payload(), b"meta");
        assert_eq!(node.links().len(), 1);
        assert_eq!(node.links()[0].cid, child);
        assert_eq!(FsKind::decode(&node), Classification::Unrecognized);
    }

    #[test]
    fn test_resolve_not_found() {
        let (_temp_dir, store) = new_store();
        let result = store.resolve(&Cid::hash_bytes(b"absent"));
        assert!(matches!(result, Err(Error::ObjectNotFound { .. })));
    }

    #[test]
    fn test_resolve_detects_corruption() {
        let (_temp_dir, store) = new_store();
        let cid = store.put_blob(b"original".as_ref()).unwrap();

        let path = store.object_path(&cid);
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            store.resolve(&cid),
            Err(Error::CorruptedObject { .. })
        ));
    }

    #[test]
    fn test_resolve_short_header_and_payload_mismatch() {
        let (_temp_dir, store) = new_store();

        let short = Cid::hash_bytes(b"short");
        let path = store.object_path(&short);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"CAFS").unwrap();
        assert!(store.resolve(&short).is_err());

        let truncated = store.put_blob(b"truncate me".as_ref()).unwrap();
        let path = store.object_path(&truncated);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
        assert!(matches!(
            store.resolve(&truncated),
            Err(Error::CorruptedObject { .. })
        ));
    }

    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 32,
            max_shrink_iters: 1000,
            ..ProptestConfig::default()
        })]

        /// Blobs read back unchanged whether or not they were compressed
        #[test]
        fn prop_blob_resolve_roundtrip(data in prop::collection::vec(any::<u8>(), 0..20_000)) {
            let (_temp_dir, store) = new_store();
            let cid = store.put_blob(data.as_slice())?;
            let node = store.resolve(&cid)?;
            prop_assert_eq!(node.payload(), data.as_slice());
        }
    }
}
