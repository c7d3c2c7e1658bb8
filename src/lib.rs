//! Food roulette core: a catalog of menu items grouped into toggleable
//! categories, a bounded history of past spins, and a selection engine that
//! draws a uniformly random item from the active pool.
//!
//! The CLI in `main.rs` is just a caller; everything with a contract lives
//! here so it can be exercised against an in-memory database.

pub mod config;
pub mod engine;
pub mod recommend;
pub mod storage;
pub mod util;
