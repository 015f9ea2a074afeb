//! Core persistence modules: the store handle, record types, key
//! encoding, and the lock / pull-status operations.

pub mod db;
pub mod error;
pub mod keys;
pub mod locks;
pub mod models;
pub mod pulls;
