// ErrWarden - platform/mod.rs
//
// Platform abstraction layer: directories and config, source draining,
// single-instance lock, host identification.
// Must NOT depend on: core, app.

pub mod config;
pub mod fs;
pub mod host;
pub mod lock;
