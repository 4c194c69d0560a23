//! # Rootscan Core
//!
//! Finds the apparent roots of a content-addressed block store: stored
//! objects that no resolvable node links to, unless the object is itself a
//! recursive pin root. Each root is classified by the kind of file-system
//! node its payload describes, sized, flagged as pinned or not, and ranked
//! for display.
//!
//! Nothing is ever deleted.
//!
//! ## Example
//!
//! ```no_run
//! use rootscan_core::{BlockStore, scan};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = BlockStore::open("./my-store")?;
//! let report = scan(&store, |stage| println!("{}", stage))?;
//!
//! for object in &report.objects {
//!     println!("{} {} {} {}", object.cid, object.type_tag, object.total_size, object.pinned);
//! }
//! # Ok(())
//! # }
//! ```

mod chunking;
mod cid;
mod classify;
mod error;
mod keys;
mod node;
mod object;
mod pins;
mod rank;
mod roots;
mod scan;
mod store;
mod traits;
mod tree;

pub use cid::{Algorithm, Cid};
pub use classify::{ObjectInfo, TypeTag, classify_roots};
pub use error::{Error, Result};
pub use keys::AllKeys;
pub use node::{Classification, FS_TYPE_PREFIX, FsKind, Link, Node};
pub use object::ObjectType;
pub use pins::{PinManager, PinSet};
pub use rank::{compare, less, rank};
pub use roots::{RootSelection, select_roots};
pub use scan::{ScanReport, Stage, scan};
pub use store::BlockStore;
pub use traits::{KeySource, LinkResolver, PinProvider};
pub use tree::{EntryType, FileMode, TreeEntry, file_modes};
