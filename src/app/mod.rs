// ErrWarden - app/mod.rs
//
// Application layer: grammar selection, collaborators, and the cycle driver.
// Dependencies: core, platform, util.

pub mod driver;
pub mod grammar_mgr;
pub mod ignore_list;
pub mod sink;
