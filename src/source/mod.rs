// src/source/mod.rs

//! Change sources: where watched items and their fingerprints come from.
//!
//! A source enumerates the namespace in one pass and can load the payload of
//! any item it enumerated. It never writes anything.
//!
//! - [`directory`] implements both traits over a directory of request files.
//! - [`patterns`] compiles the include/exclude globs applied to file names.
//! - [`hash`] provides BLAKE3 content fingerprints.

pub mod directory;
pub mod hash;
pub mod patterns;

use crate::errors::Result;
use crate::trigger::Payload;
use crate::types::{Enumeration, ItemId};

pub use directory::DirectorySource;
pub use patterns::FilePatterns;

/// Enumerates the current set of watched items.
///
/// If the namespace itself cannot be listed, fail with
/// [`SensorError::SourceUnavailable`](crate::errors::SensorError). Every
/// listed item must show up either as an observation or in
/// [`Enumeration::unreadable`]; dropping one would read as a removal.
pub trait ChangeSource: Send + Sync {
    fn enumerate(&self) -> Result<Enumeration>;
}

/// Loads the payload of a single item.
///
/// Failures are reported as
/// [`SensorError::PayloadError`](crate::errors::SensorError) and only affect
/// that item.
pub trait PayloadLoader: Send + Sync {
    fn load(&self, id: &ItemId) -> Result<Payload>;
}
