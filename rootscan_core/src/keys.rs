//! Enumeration of every object id in the store.

use crate::cid::Cid;
use crate::error::Result;
use crate::store::BlockStore;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Capacity of the channel between the shard walker and the consumer.
const KEY_CHANNEL_CAPACITY: usize = 1024;

/// Stream of stored ids, filled by a background walker thread.
///
/// Each id present when its shard is walked is yielded exactly once; the
/// stream ends when the walk finishes.
pub struct AllKeys {
    rx: Receiver<Cid>,
    walker: Option<JoinHandle<()>>,
}

impl Iterator for AllKeys {
    type Item = Cid;

    fn next(&mut self) -> Option<Cid> {
        match self.rx.recv() {
            Ok(cid) => Some(cid),
            Err(_) => {
                if let Some(walker) = self.walker.take()
                    && walker.join().is_err()
                {
                    warn!("key enumeration thread panicked");
                }
                None
            }
        }
    }
}

impl BlockStore {
    /// Start enumerating every stored object id.
    ///
    /// Fails up front if the objects directory cannot be read. Afterwards
    /// unreadable shards are reported and skipped, and files whose names do
    /// not form a valid id (such as in-flight temp files) are ignored.
    pub fn all_keys(&self) -> Result<AllKeys> {
        let objects_dir = self.objects_dir();
        let shards = fs::read_dir(&objects_dir)?
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!(dir = %objects_dir.display(), error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>();

        let (tx, rx) = bounded(KEY_CHANNEL_CAPACITY);
        let walker = thread::Builder::new()
            .name("rootscan-keys".to_string())
            .spawn(move || walk_shards(shards, tx))?;

        Ok(AllKeys {
            rx,
            walker: Some(walker),
        })
    }
}

fn walk_shards(shards: Vec<PathBuf>, tx: Sender<Cid>) {
    let mut sent = 0usize;
    for shard in shards {
        match send_shard(&shard, &tx) {
            Ok(Some(count)) => sent += count,
            // Consumer hung up
            Ok(None) => return,
            Err(e) => warn!(shard = %shard.display(), error = %e, "skipping unreadable shard"),
        }
    }
    debug!(keys = sent, "key enumeration complete");
}

/// Send the ids in one shard. Returns `None` once the receiver is gone.
fn send_shard(shard: &Path, tx: &Sender<Cid>) -> std::io::Result<Option<usize>> {
    let Some(prefix) = shard.file_name().and_then(|n| n.to_str()) else {
        return Ok(Some(0));
    };

    let mut count = 0;
    for entry in fs::read_dir(shard)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let Some(suffix) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if let Ok(cid) = Cid::from_shard(prefix, suffix) {
            if tx.send(cid).is_err() {
                return Ok(None);
            }
            count += 1;
        }
    }

    Ok(Some(count))
}
