//! Engine-internal containers
//!
//! Deterministic, allocation-aware collections used by other engine crates
//! for their indexing structures.

mod robin_hood;

pub use robin_hood::{MapError, RobinHoodMap, INITIAL_CAPACITY};
