//! Two-phase transport catalogue engine.
//!
//! `make_base` ingests a bus network description, compiles a routing graph
//! with a precomputed all-pairs shortest-path table, and writes a binary
//! snapshot. `process_requests` restores that snapshot and answers stop, bus,
//! map and route queries. The [`request`] module drives both phases.

pub mod catalogue;
pub mod json;
pub mod render;
pub mod request;
pub mod router;
pub mod shared;
pub mod snapshot;
pub mod svg;
