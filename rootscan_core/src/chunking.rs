//! Content-defined chunking using FastCDC.

use crate::cid::Cid;
use crate::object::ChunkEntry;

/// Configuration for the chunker.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Minimum chunk size in bytes.
    pub min_size: usize,
    /// Average (target) chunk size in bytes.
    pub avg_size: usize,
    /// Maximum chunk size in bytes.
    pub max_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_size: 256 * 1024,  // 256 KB
            avg_size: 512 * 1024,  // 512 KB
            max_size: 1024 * 1024, // 1 MB
        }
    }
}

/// Split data into content-defined chunks using FastCDC.
///
/// Returns the id and length of each chunk, in order.
pub fn chunk_data(data: &[u8], config: &ChunkerConfig) -> Vec<ChunkEntry> {
    use fastcdc::ronomon::FastCDC;

    FastCDC::new(data, config.min_size, config.avg_size, config.max_size)
        .map(|chunk| ChunkEntry {
            cid: Cid::hash_bytes(&data[chunk.offset..chunk.offset + chunk.length]),
            size: chunk.length as u64,
        })
        .collect()
}
