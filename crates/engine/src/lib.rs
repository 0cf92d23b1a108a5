#![forbid(unsafe_code)]

//! The boundary toward the external execution engine. The engine sees one
//! read path (a finalized, immutable snapshot of the plan) and one write
//! path (per-node execution status). It never touches plan topology, and
//! cancelling a run never rolls structural state back.

mod board;
mod status;
mod wire;

pub use board::*;
pub use status::*;
pub use wire::*;
