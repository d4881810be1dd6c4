//! Cantus Engine - the realtime synthesizer core.
//!
//! [`Engine`] owns the parameter store, the note-event look-ahead window,
//! the spectrum ring, and both voice controllers behind one mutex. The
//! audio backend pulls byte buffers through [`Engine::render`]; a command
//! thread drains the bounded queue through [`run_command_loop`]; the report
//! thread reads snapshots ([`Engine::spectrum`], [`Engine::filter_shape`],
//! status and parameter JSON) and formats them with [`protocol`].

pub mod engine;
pub mod event;
pub mod protocol;

pub use engine::{
    run_command_loop, Changes, Engine, EngineError, CHANGE_ALL_PARAMS, CHANGE_DATA,
    CHANGE_FILTER_SHAPE, CHANGE_PRESET_LIST,
};
pub use event::EventBuckets;
