//! # Flat-File Database - Object Persistence Engine
//!
//! This module persists arbitrary domain objects to key-value text files and
//! reconstructs them on load, without runtime reflection: each entity type
//! carries a static attribute table ([`schema::EntitySchema`]) describing its
//! storage directory, fields, and computed properties.
//!
//! ## Architecture
//!
//! ```text
//! data/
//! ├── residents/     ← one <uuid>.txt record per resident
//! ├── towns/
//! ├── nations/
//! ├── worlds/
//! └── townblocks/
//! ```
//!
//! Loading is a two-phase protocol. `load_all` reconstructs every record of a
//! type and hands each entity to a registration callback; attributes that
//! reference other entity types are parked in the [`deferred`] registry. Once
//! every type has loaded, one `complete_load` call resolves the parked
//! entries against the in-memory registry, in file-declaration order.
//!
//! ## Error Handling
//!
//! - A missing or unparsable stored value keeps the field's default (silent).
//! - A single unreadable record is logged and skipped; the batch continues.
//! - Directory creation failures and paths colliding with plain files are
//!   configuration errors and abort the operation.
//! - A directory stream failing mid-iteration aborts that type's load.

pub mod codec;
pub mod deferred;
pub mod error;
pub mod migration;
pub mod record;
pub mod schema;
pub mod store;

pub use codec::{FieldAdapter, FieldKind, FieldValue};
pub use error::StorageError;
pub use record::StoredRecord;
pub use schema::{ComputedDef, EntitySchema, FieldDef, Indexed, ReferenceIndex, Saveable};
pub use store::{FlatFileDb, StoreConfig};
