//! larch is the in-memory index layer of a partitioned table engine: ordered,
//! duplicate-friendly tree indexes whose nodes live in a dense compacting
//! arena, with a choice between reference keys (compared by reading the
//! indexed columns through the owning row) and inline keys (fixed-width
//! integer column values copied into the key itself).

pub mod catalog;
pub mod config;
pub mod error;
pub mod index;
pub mod storage;
pub mod utils;
