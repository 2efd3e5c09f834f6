//! vc_store — key custody and collaborator stores for Valentine Confessions
//!
//! # Storage strategy
//! - The recipient private key lives in a single well-known slot of a
//!   device-local key-value store (`kv`).  Memory, JSON-file and OS keyring
//!   backends share one trait so tests can inject the memory store.
//! - Slot writes are whole-value replacements; the file backend writes a temp
//!   file and renames it over the old one, so readers never see a torn record.
//! - The identity directory and confession store are external collaborators.
//!   They only ever see public keys and opaque envelopes.

pub mod confessions;
pub mod custodian;
pub mod directory;
pub mod error;
pub mod json_file;
pub mod kv;
pub mod models;

pub use confessions::{ConfessionStore, FileConfessionStore, MemoryConfessionStore};
pub use custodian::{KeyCustodian, ProvisionedKey, PRIVATE_KEY_SLOT};
pub use directory::{FileDirectory, IdentityDirectory, MemoryDirectory};
pub use error::StoreError;
pub use kv::{FileKeyValueStore, KeyValueStore, KeyringKeyValueStore, MemoryKeyValueStore};
