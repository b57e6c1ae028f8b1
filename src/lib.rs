//! Match-3 engine (workspace facade crate).
//!
//! Re-exports the member crates under one roof so callers can depend on a
//! single package: `match3::{types, core, engine, adapter}`.

pub use match3_adapter as adapter;
pub use match3_core as core;
pub use match3_engine as engine;
pub use match3_types as types;
