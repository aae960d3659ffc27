//! # Adapters
//!
//! Collaborators at the edge of the crate that move extracted data into
//! and out of other representations:
//!
//! - [`kv`]: a wide-row key-value store, one row per sensor and time bucket
//! - [`list`]: lists of loosely typed events keyed by series uuid
//!
//! Both work on the record model only and know nothing about PI-XML.

pub mod kv;
pub mod list;


pub use kv::{BucketSize, KeyValueStore, KvError, KvFrame, KvReader, KvWriter, MemoryStore};
pub use list::{flatten, EventList, ListError, ListFrame};
