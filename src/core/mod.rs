//! Runtime core: module supervision and lifecycle.
//!
//! The only public API from this module is [`Station`] plus the module
//! launch types its `run` signature needs. [`Station`] takes the singleton
//! lock, builds the event log store, and supervises one actor per module
//! together with the rewards loop until shutdown.
//!
//! Internal modules:
//! - [`module`]: module launch descriptions and the built-in Zinnia module;
//! - [`actor`]: runs one module process and routes its output into the store;
//! - [`supervisor`]: spawns the workers and drives graceful shutdown;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod actor;
mod module;
mod shutdown;
mod supervisor;

pub use module::{zinnia, ModuleSpec};
pub use supervisor::Station;
