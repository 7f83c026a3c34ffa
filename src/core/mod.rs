// ErrWarden - core/mod.rs
//
// Core pipeline logic: grammar, parsing, assembly, fingerprints, suppression.
// Must NOT depend on: app or platform layers, or touch the filesystem.

pub mod assembler;
pub mod fingerprint;
pub mod grammar;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod suppression;
