//! Embedded, JSON-file-backed state store for an infrastructure-as-code
//! deployment engine.
//!
//! The store holds blueprint instances and their resources, links, and
//! drift, plus operational artifacts (change sets, validations, deployment
//! event streams) in process memory for O(1) access, while durably
//! mirroring every mutation to a directory of JSON files. Construct one
//! with [`StateContainer::load`] and reach each entity family through its
//! named accessor.
//!
//! Large opaque trees (`Metadata`, `SpecData`) are aliased on read rather
//! than deep-copied; see [`store::Metadata`] and the notes on
//! [`model::Resource`].

pub mod clock;
pub mod cleanup;
pub mod error;
pub mod model;
pub mod persistence;
pub mod store;

pub use cleanup::CleanupEngine;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, StoreError};
pub use store::{StateContainer, StoreOptions};
