//! File storage
//!
//! Handles the file registry, permissions, modification guards and byte stores.

pub mod backend;
pub mod guard;
pub mod permissions;
pub mod record;
pub mod registry;
pub mod results;
pub mod validation;

pub use backend::{ByteStore, FsByteStore, MemoryByteStore};
pub use guard::{ModificationGuard, ModificationState, ModificationTicket};
pub use permissions::{Permissions, validate_format};
pub use record::FileRecord;
pub use registry::{FileRegistry, WriteMode, WriteTransaction};
pub use results::{FileEntry, WriteOutcome};
