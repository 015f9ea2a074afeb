//! Driftlock: persistence and coordination core for collaborative
//! infrastructure automation.
//!
//! Driftlock is the state layer a change-automation server leans on when
//! many webhook workers run at once. It owns two pieces of truth:
//!
//! - **Project locks** — which (repository, directory, workspace) tuples
//!   are currently claimed by an in-flight pull request. Acquisition is
//!   check-then-write inside one storage transaction, so concurrent
//!   attempts on the same tuple serialize and exactly one wins.
//! - **Pull status** — the merged latest plan/apply outcome of every
//!   project evaluated for an open pull request. Updates for the same
//!   head commit merge; a new head commit replaces the record.
//!
//! State lives in a single SQLite file with one ordered key/value table
//! per namespace, values stored as field-tagged JSON so the file stays
//! inspectable. A second process instance is refused at open time.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use driftlock::core::db::Store;
//!
//! let store = Store::open(Path::new("/var/lib/driftlock"))?;
//! let locks = store.list_locks()?;
//! # Ok::<(), driftlock::core::error::DriftlockError>(())
//! ```
//!
//! The store handle is constructed once, shared (`Store` is `Send + Sync`),
//! and passed explicitly to callers; there are no hidden singletons.
//!
//! # Crate Structure
//!
//! - [`core`]: store handle, record types, key codec, lock and
//!   pull-status operations
//! - `cli` (binary only): operator commands over the same library calls

pub mod core;
