//! Mapping structures: grid traversal, ancestry tree, distributed map.
//!
//! The ancestry tree and the distributed map together implement the
//! shared-storage occupancy representation: each particle reads the map
//! through its ancestry, and trimming after resampling keeps the shared
//! structure proportional to the surviving lineages.

mod ancestry;
mod distributed_map;
mod ray_tracer;

pub use ancestry::{AncestryNode, AncestryTree, Ancestors, NodeId};
pub use distributed_map::{CellState, DistributedMap};
pub use ray_tracer::{cell_of, trace};
