//! Module events: the wire protocol and the merged consumer stream.
//!
//! This module groups the **decoder** for event lines printed by module
//! processes and the **merged stream** the `events` command serves to
//! machine consumers.
//!
//! ## Contents
//! - [`ModuleEvent`], [`decode_line`] one stdout line in, one decoded event
//!   out
//! - [`StationEvent`], [`MergedEvents`] replay-then-tail view over the
//!   metrics and activity logs
//!
//! ## Quick reference
//! - **Producers**: module processes write protocol lines; `ModuleActor`
//!   decodes and routes them into the store.
//! - **Consumers**: the `events` command streams [`StationEvent`]s as JSON
//!   lines; desktop frontends tail that.

mod decoder;
mod merged;

pub use decoder::{decode_line, ModuleEvent};
pub use merged::{MergedEvents, StationEvent};
