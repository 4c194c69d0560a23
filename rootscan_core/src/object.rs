//! Binary object format and encoding.
//!
//! Objects are stored with a 16-byte header followed by the payload:
//!
//! ```text
//! 0x00  4   "CAFS" magic
//! 0x04  1   version (u8) = 1 or 2
//! 0x05  1   type: 1=blob, 2=tree, 3=chunk_list, 4=raw
//! 0x06  1   algo: 1=blake3-256
//! 0x07  1   compression: 0=none, 1=zstd (v1: reserved, must be 0)
//! 0x08  8   payload_len (u64 LE) - stored (possibly compressed) size
//! 0x10  ... payload
//! ```

use crate::cid::{Algorithm, CID_SIZE, Cid};
use crate::error::{Error, Result};

/// Magic bytes at the start of every object file.
pub const MAGIC: &[u8; 4] = b"CAFS";

/// Current object format version.
pub const VERSION: u8 = 2;

/// Size of the object header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// A blob (file content).
    Blob = 1,
    /// A tree (directory structure).
    Tree = 2,
    /// A chunk list (for large files split into chunks).
    ChunkList = 3,
    /// A linked block that does not describe a file-system node.
    Raw = 4,
}

impl ObjectType {
    /// Convert to byte representation.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse from byte representation.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(ObjectType::Blob),
            2 => Ok(ObjectType::Tree),
            3 => Ok(ObjectType::ChunkList),
            4 => Ok(ObjectType::Raw),
            _ => Err(Error::invalid_object_type(
                "blob, tree, chunk_list or raw",
                format!("type byte {}", value),
            )),
        }
    }

    /// Get the string name of this object type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::ChunkList => "chunk_list",
            ObjectType::Raw => "raw",
        }
    }
}

/// Compression types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// No compression.
    None = 0,
    /// Zstandard compression.
    Zstd = 1,
}

impl CompressionType {
    /// Convert to byte representation.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse from byte representation.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Zstd),
            _ => Err(Error::compression(format!(
                "Invalid compression type: {}",
                value
            ))),
        }
    }
}

/// A 16-byte object header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeader {
    /// Object format version.
    pub version: u8,
    /// Object type.
    pub object_type: ObjectType,
    /// Hash algorithm used.
    pub algorithm: Algorithm,
    /// Compression type (v2+ only).
    pub compression: CompressionType,
    /// Length of the payload in bytes (compressed size if compressed).
    pub payload_len: u64,
}

impl ObjectHeader {
    /// Create a new object header.
    pub fn new(
        object_type: ObjectType,
        algorithm: Algorithm,
        compression: CompressionType,
        payload_len: u64,
    ) -> Self {
        Self {
            version: VERSION,
            object_type,
            algorithm,
            compression,
            payload_len,
        }
    }

    /// Encode the header to a 16-byte array.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version;
        buf[5] = self.object_type.to_u8();
        buf[6] = self.algorithm.id();
        buf[7] = self.compression.to_u8();
        buf[8..16].copy_from_slice(&self.payload_len.to_le_bytes());
        buf
    }

    /// Decode a header from the first 16 bytes of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::invalid_object_type(
                format!("{}-byte header", HEADER_SIZE),
                format!("{} bytes", buf.len()),
            ));
        }

        if &buf[0..4] != MAGIC {
            return Err(Error::invalid_object_type(
                format!("magic {:?}", MAGIC),
                format!("{:?}", &buf[0..4]),
            ));
        }

        let version = buf[4];
        if version != 1 && version != 2 {
            return Err(Error::invalid_object_type(
                "version 1 or 2",
                format!("version {}", version),
            ));
        }

        let object_type = ObjectType::from_u8(buf[5])?;
        let algorithm = Algorithm::from_id(buf[6])?;

        let compression = if version == 2 {
            CompressionType::from_u8(buf[7])?
        } else {
            if buf[7] != 0 {
                return Err(Error::invalid_object_type(
                    "reserved byte 0 in v1 header",
                    format!("{}", buf[7]),
                ));
            }
            CompressionType::None
        };

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&buf[8..16]);
        let payload_len = u64::from_le_bytes(len_bytes);

        Ok(Self {
            version,
            object_type,
            algorithm,
            compression,
            payload_len,
        })
    }
}

/// A chunk entry in a ChunkList object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    /// Id of the chunk blob.
    pub cid: Cid,
    /// Size of the chunk in bytes.
    pub size: u64,
}

/// Size of a chunk entry in bytes (32-byte hash + 8-byte size).
pub const CHUNK_ENTRY_SIZE: usize = 40;

/// A chunk list object that references multiple chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkList {
    /// List of chunk entries.
    pub chunks: Vec<ChunkEntry>,
}

impl ChunkList {
    /// Encode the chunk list to bytes.
    /// Each entry is 40 bytes: 32-byte hash + 8-byte size (u64 LE).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.chunks.len() * CHUNK_ENTRY_SIZE);
        for chunk in &self.chunks {
            buf.extend_from_slice(chunk.cid.as_bytes());
            buf.extend_from_slice(&chunk.size.to_le_bytes());
        }
        buf
    }

    /// Decode a chunk list from bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if !bytes.len().is_multiple_of(CHUNK_ENTRY_SIZE) {
            return Err(Error::invalid_chunk_list(format!(
                "payload size {} is not a multiple of {}",
                bytes.len(),
                CHUNK_ENTRY_SIZE
            )));
        }

        let mut chunks = Vec::with_capacity(bytes.len() / CHUNK_ENTRY_SIZE);
        for entry in bytes.chunks_exact(CHUNK_ENTRY_SIZE) {
            let cid_bytes: [u8; CID_SIZE] = entry[..CID_SIZE]
                .try_into()
                .map_err(|_| Error::invalid_chunk_list("Failed to parse chunk hash"))?;
            let size = u64::from_le_bytes(
                entry[CID_SIZE..]
                    .try_into()
                    .map_err(|_| Error::invalid_chunk_list("Failed to parse chunk size"))?,
            );
            chunks.push(ChunkEntry {
                cid: Cid::from_bytes(cid_bytes),
                size,
            });
        }

        Ok(ChunkList { chunks })
    }
}

/// A raw linked block: an ordered list of child ids followed by opaque data.
///
/// ```text
/// 0x00  4   link count (u32 LE)
/// 0x04  32 * count  child ids
/// ...   opaque data
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// Child ids, in order.
    pub links: Vec<Cid>,
    /// Opaque data following the link table.
    pub data: Vec<u8>,
}

impl RawBlock {
    /// Encode the block to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + self.links.len() * CID_SIZE + self.data.len());
        buf.extend_from_slice(&(self.links.len() as u32).to_le_bytes());
        for link in &self.links {
            buf.extend_from_slice(link.as_bytes());
        }
        buf.extend_from_slice(&self.data);
        buf
    }

    /// Decode a raw block from bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let count_bytes: [u8; 4] = bytes
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| Error::invalid_raw_block("missing link count"))?;
        let count = u32::from_le_bytes(count_bytes) as usize;

        let table_end = count
            .checked_mul(CID_SIZE)
            .and_then(|n| n.checked_add(4))
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| {
                Error::invalid_raw_block(format!(
                    "{} links do not fit in a {}-byte payload",
                    count,
                    bytes.len()
                ))
            })?;

        let links = bytes[4..table_end]
            .chunks_exact(CID_SIZE)
            .map(|chunk| {
                let mut cid = [0u8; CID_SIZE];
                cid.copy_from_slice(chunk);
                Cid::from_bytes(cid)
            })
            .collect();

        Ok(RawBlock {
            links,
            data: bytes[table_end..].to_vec(),
        })
    }
}
