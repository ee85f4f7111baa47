//! Foundation types for the graph model and the execution engine.
//!
//! This module hides two design decisions that are likely to change:
//! how the "number" capability of edge weights is expressed (including the
//! per-type maximum sentinel used as an absent-distance marker), and how the
//! indexed priority queue keeps decrease-key at O(log n).

mod key;
mod pqueue;
mod weight;

pub use key::{Key, SynthesizeKey};
pub use pqueue::PriorityQueue;
pub use weight::Weight;
