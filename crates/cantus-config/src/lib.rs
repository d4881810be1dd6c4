//! Cantus Config - the parameter tree and the preset store.
//!
//! [`Params`] is the single serializable configuration tree the engine
//! renders from; [`ApplyKey`] is the textual `set key value` protocol over
//! its groups; [`PresetStore`] persists trees as JSON files in a directory
//! with a `_list.json` index and a `_tmp.json` session snapshot.

pub mod error;
pub mod params;
pub mod preset;

pub use error::ConfigError;
pub use params::{ApplyKey, Params};
pub use preset::PresetStore;
