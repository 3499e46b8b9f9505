//! # Townstead - Flat-File Town Persistence & Economy
//!
//! Townstead is the persistence and economy core of a town-building game
//! server: residents claim plots, found towns, and band together into
//! nations, with every entity saved to a human-readable flat-file database
//! and money movements routed through a rollback-safe transfer protocol.
//!
//! ## Features
//!
//! - **Flat-File Database**: one `key=value` text file per entity under a
//!   per-type directory, written atomically under an exclusive lock.
//! - **Static Attribute Tables**: each entity type declares its fields,
//!   kinds, and deferred cross-references in a compile-time-checked table;
//!   no runtime type introspection.
//! - **Two-Phase Loading**: bulk loads per type park cross-type references
//!   in a deferred registry, resolved in one pass once every type is in
//!   memory.
//! - **Economy Transfers**: debit-then-credit with a compensating refund on
//!   partial failure, optional closed-economy routing through a server
//!   account, and a JSON-lines money log.
//! - **Async Design**: built with Tokio.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use townstead::db::FlatFileDb;
//! use townstead::universe::load_universe;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut db = FlatFileDb::new("./data");
//!     let universe = load_universe(&mut db).await?;
//!     println!("{} residents loaded", universe.resident_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`db`] - Flat-file persistence engine (codec, schemas, store, migration)
//! - [`universe`] - Domain entities and the in-memory registry
//! - [`economy`] - Transfer protocol, ledger trait, transaction log
//! - [`config`] - Configuration management and validation

pub mod config;
pub mod db;
pub mod economy;
pub mod universe;
